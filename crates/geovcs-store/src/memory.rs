use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use geovcs_types::ObjectId;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::RevObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, RevObject>>,
    open: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            open: AtomicBool::new(true),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.read().keys().copied().collect();
        ids.sort();
        ids
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get_if_present(&self, id: &ObjectId) -> StoreResult<Option<RevObject>> {
        self.ensure_open()?;
        Ok(self.objects.read().get(id).cloned())
    }

    fn put(&self, object: RevObject) -> StoreResult<ObjectId> {
        self.ensure_open()?;
        let id = object.id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        // Same id, same content: keep whichever copy arrived first.
        self.objects.write().entry(id).or_insert(object);
        Ok(id)
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.objects.write().remove(id).is_some())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!(objects = self.len(), "closed in-memory object store");
        }
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .field("open", &self.is_open())
            .finish()
    }
}
