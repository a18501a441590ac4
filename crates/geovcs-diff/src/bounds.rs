//! Spatial extent of a diff.

use geovcs_store::{Bounded, Bucket, NodeRef};
use geovcs_types::Envelope;
use parking_lot::Mutex;

use crate::walk::{BucketIndex, Consumer};

/// Accumulates the left and right envelopes of every changed feature.
///
/// Subtrees and buckets present on one side only contribute their recorded
/// bounds and are not descended.
#[derive(Debug, Default)]
pub struct BoundsCollector {
    left: Mutex<Option<Envelope>>,
    right: Mutex<Option<Envelope>>,
}

impl BoundsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn left_bounds(&self) -> Option<Envelope> {
        *self.left.lock()
    }

    pub fn right_bounds(&self) -> Option<Envelope> {
        *self.right.lock()
    }

    /// Union of both sides.
    pub fn bounds(&self) -> Option<Envelope> {
        match (self.left_bounds(), self.right_bounds()) {
            (Some(l), r) => Some(r.map_or(l, |r| Envelope::merge(Some(l), &r))),
            (None, r) => r,
        }
    }

    fn merge(side: &Mutex<Option<Envelope>>, object: Option<&dyn Bounded>) {
        if let Some(bounds) = object.and_then(|o| o.bounds()) {
            let mut acc = side.lock();
            *acc = Some(Envelope::merge(*acc, &bounds));
        }
    }

    fn merge_pair(&self, left: Option<&dyn Bounded>, right: Option<&dyn Bounded>) {
        Self::merge(&self.left, left);
        Self::merge(&self.right, right);
    }
}

fn node_bounds(node: Option<&NodeRef>) -> Option<&dyn Bounded> {
    node.map(|n| n.node() as &dyn Bounded)
}

impl Consumer for BoundsCollector {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.merge_pair(node_bounds(left), node_bounds(right));
        true
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if left.is_some() && right.is_some() {
            return true;
        }
        self.merge_pair(node_bounds(left), node_bounds(right));
        false
    }

    fn bucket(
        &self,
        _left_parent: Option<&NodeRef>,
        _right_parent: Option<&NodeRef>,
        _index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
        if left.is_some() && right.is_some() {
            return true;
        }
        self.merge_pair(left.map(|b| b as &dyn Bounded), right.map(|b| b as &dyn Bounded));
        false
    }
}
