use std::sync::atomic::{AtomicU64, Ordering};

use geovcs_store::{Bucket, NodeRef};

use crate::walk::{BucketIndex, Consumer};

/// Stops the walk once `limit` feature events have been forwarded.
pub struct MaxFeatureDiffsLimiter<C> {
    delegate: C,
    limit: u64,
    count: AtomicU64,
}

impl<C: Consumer> MaxFeatureDiffsLimiter<C> {
    pub fn new(delegate: C, limit: u64) -> Self {
        Self {
            delegate,
            limit,
            count: AtomicU64::new(0),
        }
    }

    /// Feature events seen so far, including the one that hit the limit.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire).min(self.limit)
    }

    pub fn into_inner(self) -> C {
        self.delegate
    }
}

impl<C: Consumer> Consumer for MaxFeatureDiffsLimiter<C> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if self.count.fetch_add(1, Ordering::AcqRel) >= self.limit {
            return false;
        }
        self.delegate.feature(left, right)
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.delegate.tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        self.delegate.end_tree(left, right)
    }

    fn bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
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
        self.delegate.end_bucket(left_parent, right_parent, index, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{names, Fixture, RecordingConsumer};
    use crate::walk::PreOrderDiffWalk;

    #[test]
    fn stops_after_limit() {
        let fixture = Fixture::new();
        let all = names("f", 30);
        let points: Vec<(&str, f64, f64)> = all.iter().map(|n| (n.as_str(), 0.0, 0.0)).collect();
        let layer = fixture.layer(&points, 4);
        let limiter = MaxFeatureDiffsLimiter::new(RecordingConsumer::default(), 7);
        PreOrderDiffWalk::new(
            geovcs_store::RevTree::empty(),
            layer,
            fixture.dyn_store(),
            fixture.dyn_store(),
        )
        .walk(&limiter)
        .unwrap();
        assert_eq!(limiter.count(), 7);
        assert_eq!(limiter.into_inner().feature_pairs().len(), 7);
    }

    #[test]
    fn zero_limit_reports_nothing() {
        let limiter = MaxFeatureDiffsLimiter::new(RecordingConsumer::default(), 0);
        assert!(!limiter.feature(None, None));
        assert!(limiter.into_inner().events().is_empty());
    }
}
