use std::sync::Arc;

use dashmap::DashMap;
use geovcs_store::{Bucket, NodeRef};
use parking_lot::Mutex;

use crate::walk::{BucketIndex, Consumer};

/// Serializes the events delivered for the contents of one tree.
///
/// Events are forwarded under a lock keyed by the path of the tree they
/// belong to, so a delegate that is not thread safe per tree can be used
/// with a parallel walk. Lock entries are created when a tree is entered
/// and dropped when it is left.
pub struct SynchronizedConsumer<C> {
    delegate: C,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<C: Consumer> SynchronizedConsumer<C> {
    pub fn new(delegate: C) -> Self {
        Self {
            delegate,
            locks: DashMap::new(),
        }
    }

    /// Trees currently entered and not yet left.
    pub fn open_trees(&self) -> usize {
        self.locks.len()
    }

    pub fn into_inner(self) -> C {
        self.delegate
    }

    fn lock_for(&self, tree_path: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(tree_path) {
            return Arc::clone(&lock);
        }
        Arc::clone(&self.locks.entry(tree_path.to_string()).or_default())
    }
}

fn node_of<'a>(left: Option<&'a NodeRef>, right: Option<&'a NodeRef>) -> Option<&'a NodeRef> {
    left.or(right)
}

impl<C: Consumer> Consumer for SynchronizedConsumer<C> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        let parent = node_of(left, right).map(NodeRef::parent_path).unwrap_or_default();
        let lock = self.lock_for(parent);
        let _guard = lock.lock();
        self.delegate.feature(left, right)
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        let node = node_of(left, right);
        let path = node.map(NodeRef::path).unwrap_or_default();
        self.locks.entry(path).or_default();
        let lock = self.lock_for(node.map(NodeRef::parent_path).unwrap_or_default());
        let _guard = lock.lock();
        self.delegate.tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        let node = node_of(left, right);
        {
            let lock = self.lock_for(node.map(NodeRef::parent_path).unwrap_or_default());
            let _guard = lock.lock();
            self.delegate.end_tree(left, right);
        }
        if let Some(node) = node {
            self.locks.remove(&node.path());
        }
    }

    fn bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
        let path = node_of(left_parent, right_parent).map(NodeRef::path).unwrap_or_default();
        let lock = self.lock_for(&path);
        let _guard = lock.lock();
        self.delegate.bucket(left_parent, right_parent, index, left, right)
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) {
        let path = node_of(left_parent, right_parent).map(NodeRef::path).unwrap_or_default();
        let lock = self.lock_for(&path);
        let _guard = lock.lock();
        self.delegate.end_bucket(left_parent, right_parent, index, left, right)
    }
}
