use std::sync::Arc;

use geovcs_store::{Bounded, Bucket, NodeRef};
use geovcs_types::Envelope;

use crate::walk::{BucketIndex, Consumer};

type BoundsPredicate = Arc<dyn Fn(&dyn Bounded) -> bool + Send + Sync>;

/// Forwards only the events where either side satisfies a predicate over
/// its bounds. Rejected trees and buckets are not descended into; rejected
/// features are skipped without stopping the walk.
pub struct FilteringConsumer<C> {
    delegate: C,
    predicate: BoundsPredicate,
}

impl<C: Consumer> FilteringConsumer<C> {
    pub fn new<P>(delegate: C, predicate: P) -> Self
    where
        P: Fn(&dyn Bounded) -> bool + Send + Sync + 'static,
    {
        Self {
            delegate,
            predicate: Arc::new(predicate),
        }
    }

    /// Keep only what intersects `area`. Objects without bounds are kept.
    pub fn intersecting(delegate: C, area: Envelope) -> Self {
        Self::new(delegate, move |bounded: &dyn Bounded| {
            bounded.bounds().map_or(true, |bounds| bounds.intersects(&area))
        })
    }

    pub fn into_inner(self) -> C {
        self.delegate
    }

    fn accepts(&self, left: Option<&dyn Bounded>, right: Option<&dyn Bounded>) -> bool {
        left.is_some_and(|b| (self.predicate)(b)) || right.is_some_and(|b| (self.predicate)(b))
    }

    fn accepts_refs(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.accepts(left.map(|n| n as &dyn Bounded), right.map(|n| n as &dyn Bounded))
    }

    fn accepts_buckets(&self, left: Option<&Bucket>, right: Option<&Bucket>) -> bool {
        self.accepts(left.map(|b| b as &dyn Bounded), right.map(|b| b as &dyn Bounded))
    }
}

impl<C: Consumer> Consumer for FilteringConsumer<C> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if self.accepts_refs(left, right) {
            self.delegate.feature(left, right)
        } else {
            true
        }
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.accepts_refs(left, right) && self.delegate.tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        if self.accepts_refs(left, right) {
            self.delegate.end_tree(left, right);
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
        self.accepts_buckets(left, right)
            && self.delegate.bucket(left_parent, right_parent, index, left, right)
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) {
        if self.accepts_buckets(left, right) {
            self.delegate.end_bucket(left_parent, right_parent, index, left, right);
        }
    }
}
