use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use geovcs_store::{Bucket, NodeRef, ObjectStore, RevTree};
use tracing::trace;

use crate::error::DiffResult;
use crate::walk::{BucketIndex, Consumer, PreOrderDiffWalk, WalkExecutor};

/// Receives diff events after the contents they cover.
///
/// `tree` fires once every change below the tree pair has been reported,
/// `bucket` once every change inside the bucket pair has. `feature`
/// returning `false` aborts the walk.
pub trait PostOrderConsumer: Send + Sync {
    fn feature(&self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) -> bool {
        true
    }

    fn tree(&self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) {}

    fn bucket(
        &self,
        _left_parent: Option<&NodeRef>,
        _right_parent: Option<&NodeRef>,
        _index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) {
    }
}

/// A diff walk that reports trees and buckets on the way out.
pub struct PostOrderDiffWalk {
    inner: PreOrderDiffWalk,
}

impl PostOrderDiffWalk {
    pub fn new(
        left: RevTree,
        right: RevTree,
        left_store: Arc<dyn ObjectStore>,
        right_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            inner: PreOrderDiffWalk::new(left, right, left_store, right_store),
        }
    }

    pub fn with_executor(mut self, executor: WalkExecutor) -> Self {
        self.inner = self.inner.with_executor(executor);
        self
    }

    pub fn walk(&self, consumer: &dyn PostOrderConsumer) -> DiffResult<()> {
        let adapter = PostOrderAdapter {
            consumer,
            frames: DashMap::new(),
            stopped: AtomicBool::new(false),
        };
        let result = self.inner.walk(&adapter);
        trace!(leftover = adapter.frames.len(), "post-order walk finished");
        result
    }

    pub fn abort_traversal(&self) {
        self.inner.abort_traversal();
    }

    pub fn await_termination(&self) {
        self.inner.await_termination();
    }
}

/// An entered but not yet exited tree or bucket pair.
enum Frame {
    Tree {
        left: Option<NodeRef>,
        right: Option<NodeRef>,
    },
    Bucket {
        left_parent: Option<NodeRef>,
        right_parent: Option<NodeRef>,
        left: Option<Bucket>,
        right: Option<Bucket>,
    },
}

/// Turns pre-order events into post-order ones.
///
/// Frames live in an arena keyed by tree path and bucket index: inserted on
/// enter, removed and reported on exit. Concurrent branches never share a
/// key, so the map needs no further locking.
struct PostOrderAdapter<'a> {
    consumer: &'a dyn PostOrderConsumer,
    frames: DashMap<(String, BucketIndex), Frame>,
    stopped: AtomicBool,
}

fn tree_path(left: Option<&NodeRef>, right: Option<&NodeRef>) -> String {
    left.or(right).map(NodeRef::path).unwrap_or_default()
}

impl Consumer for PostOrderAdapter<'_> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if self.consumer.feature(left, right) {
            true
        } else {
            self.stopped.store(true, Ordering::Release);
            false
        }
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        let frame = Frame::Tree {
            left: left.cloned(),
            right: right.cloned(),
        };
        self.frames
            .insert((tree_path(left, right), BucketIndex::ROOT), frame);
        true
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        let key = (tree_path(left, right), BucketIndex::ROOT);
        if let Some((_, Frame::Tree { left, right })) = self.frames.remove(&key) {
            if !self.stopped.load(Ordering::Acquire) {
                self.consumer.tree(left.as_ref(), right.as_ref());
            }
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
        let frame = Frame::Bucket {
            left_parent: left_parent.cloned(),
            right_parent: right_parent.cloned(),
            left: left.cloned(),
            right: right.cloned(),
        };
        self.frames
            .insert((tree_path(left_parent, right_parent), index.clone()), frame);
        true
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) {
        let key = (tree_path(left_parent, right_parent), index.clone());
        if let Some((
            _,
            Frame::Bucket {
                left_parent,
                right_parent,
                left,
                right,
            },
        )) = self.frames.remove(&key)
        {
            if !self.stopped.load(Ordering::Acquire) {
                self.consumer.bucket(
                    left_parent.as_ref(),
                    right_parent.as_ref(),
                    index,
                    left.as_ref(),
                    right.as_ref(),
                );
            }
        }
    }
}
