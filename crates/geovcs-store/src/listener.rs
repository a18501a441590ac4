use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use geovcs_types::ObjectId;

/// Callbacks for bulk store operations. Every method defaults to a no-op.
pub trait BulkOpListener: Send + Sync {
    fn found(&self, _id: &ObjectId) {}

    fn not_found(&self, _id: &ObjectId) {}

    fn inserted(&self, _id: &ObjectId) {}

    fn deleted(&self, _id: &ObjectId) {}
}

/// Listener that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl BulkOpListener for NoopListener {}

/// Fans every callback out to a list of listeners, in order.
#[derive(Clone, Default)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn BulkOpListener>>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: Arc<dyn BulkOpListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl BulkOpListener for CompositeListener {
    fn found(&self, id: &ObjectId) {
        self.listeners.iter().for_each(|l| l.found(id));
    }

    fn not_found(&self, id: &ObjectId) {
        self.listeners.iter().for_each(|l| l.not_found(id));
    }

    fn inserted(&self, id: &ObjectId) {
        self.listeners.iter().for_each(|l| l.inserted(id));
    }

    fn deleted(&self, id: &ObjectId) {
        self.listeners.iter().for_each(|l| l.deleted(id));
    }
}

/// Counts callbacks by kind.
#[derive(Debug, Default)]
pub struct CountingListener {
    found: AtomicU64,
    not_found: AtomicU64,
    inserted: AtomicU64,
    deleted: AtomicU64,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found_count(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }

    pub fn not_found_count(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    pub fn inserted_count(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }
}

impl BulkOpListener for CountingListener {
    fn found(&self, _id: &ObjectId) {
        self.found.fetch_add(1, Ordering::Relaxed);
    }

    fn not_found(&self, _id: &ObjectId) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    fn inserted(&self, _id: &ObjectId) {
        self.inserted.fetch_add(1, Ordering::Relaxed);
    }

    fn deleted(&self, _id: &ObjectId) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_fans_out_to_every_listener() {
        let a = Arc::new(CountingListener::new());
        let b = Arc::new(CountingListener::new());
        let composite = CompositeListener::new().with(a.clone()).with(b.clone());
        assert_eq!(composite.len(), 2);

        let id = ObjectId::from_bytes(b"x");
        composite.deleted(&id);
        composite.deleted(&id);
        composite.found(&id);

        assert_eq!(a.deleted_count(), 2);
        assert_eq!(b.deleted_count(), 2);
        assert_eq!(b.found_count(), 1);
        assert_eq!(b.not_found_count(), 0);
        assert_eq!(b.inserted_count(), 0);
    }

    #[test]
    fn noop_listener_accepts_everything() {
        let id = ObjectId::from_bytes(b"x");
        NoopListener.found(&id);
        NoopListener.deleted(&id);
        assert!(CompositeListener::new().is_empty());
    }
}
