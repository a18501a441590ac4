use std::sync::Arc;

use geovcs_store::{Bucket, NodeRef};

use crate::walk::BucketIndex;

/// Receives the structural events of a diff walk.
///
/// `None` on the left means the right side was added; `None` on the right
/// means the left side was removed. Both sides are never `None` together.
///
/// - `tree` and `bucket` return whether to descend into that pair; every
///   call is mirrored by `end_tree`/`end_bucket` whatever the answer.
/// - `feature` returning `false` aborts the whole walk.
///
/// Walks may call a consumer from several worker threads at once. Every
/// method has a pass-through default, so decorators and aggregators only
/// override what they care about.
pub trait Consumer: Send + Sync {
    fn feature(&self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) -> bool {
        true
    }

    fn tree(&self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) -> bool {
        true
    }

    fn end_tree(&self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) {}

    fn bucket(
        &self,
        _left_parent: Option<&NodeRef>,
        _right_parent: Option<&NodeRef>,
        _index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) -> bool {
        true
    }

    fn end_bucket(
        &self,
        _left_parent: Option<&NodeRef>,
        _right_parent: Option<&NodeRef>,
        _index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) {
    }
}

impl<C: Consumer + ?Sized> Consumer for &C {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        (**self).feature(left, right)
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        (**self).tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        (**self).end_tree(left, right)
    }

    fn bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
        (**self).bucket(left_parent, right_parent, index, left, right)
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) {
        (**self).end_bucket(left_parent, right_parent, index, left, right)
    }
}

impl<C: Consumer + ?Sized> Consumer for Arc<C> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        (**self).feature(left, right)
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        (**self).tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        (**self).end_tree(left, right)
    }

    fn bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
        (**self).bucket(left_parent, right_parent, index, left, right)
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) {
        (**self).end_bucket(left_parent, right_parent, index, left, right)
    }
}

/// A consumer that accepts everything and records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopConsumer;

impl Consumer for NoopConsumer {}
