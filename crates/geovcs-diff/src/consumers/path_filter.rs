use geovcs_store::node_ref::{child_towards, is_ancestor};
use geovcs_store::{Bucket, CanonicalNodeOrder, NodeRef};

use crate::walk::{BucketIndex, Consumer};

/// Restricts a walk to a set of paths.
///
/// A tree passes when it lies on the way to a filter or under one; a
/// feature passes when it is a filter or lies under one. A bucket passes
/// when its tree passes outright, or when the name leading towards a filter
/// hashes into that bucket at every depth. With no filters everything
/// passes.
pub struct PathFilteringConsumer<C> {
    delegate: C,
    filters: Vec<String>,
}

impl<C: Consumer> PathFilteringConsumer<C> {
    pub fn new<I, S>(delegate: C, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filters = filters
            .into_iter()
            .map(|f| f.into().trim_matches('/').to_string())
            .collect();
        Self { delegate, filters }
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn into_inner(self) -> C {
        self.delegate
    }

    fn covers(&self, path: &str) -> bool {
        self.filters.is_empty()
            || self
                .filters
                .iter()
                .any(|f| f.is_empty() || f == path || is_ancestor(f, path))
    }

    fn tree_applies(&self, path: &str) -> bool {
        self.covers(path) || self.filters.iter().any(|f| is_ancestor(path, f))
    }

    fn bucket_applies(&self, tree_path: &str, index: &BucketIndex) -> bool {
        if self.covers(tree_path) {
            return true;
        }
        self.filters.iter().any(|f| {
            child_towards(tree_path, f).is_some_and(|child| {
                index
                    .indexes()
                    .iter()
                    .enumerate()
                    .all(|(depth, i)| CanonicalNodeOrder::bucket(child, depth) == *i)
            })
        })
    }
}

fn path_of(left: Option<&NodeRef>, right: Option<&NodeRef>) -> String {
    left.or(right).map(NodeRef::path).unwrap_or_default()
}

impl<C: Consumer> Consumer for PathFilteringConsumer<C> {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if self.covers(&path_of(left, right)) {
            self.delegate.feature(left, right)
        } else {
            true
        }
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.tree_applies(&path_of(left, right)) && self.delegate.tree(left, right)
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        if self.tree_applies(&path_of(left, right)) {
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
        self.bucket_applies(&path_of(left_parent, right_parent), index)
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
        if self.bucket_applies(&path_of(left_parent, right_parent), index) {
            self.delegate.end_bucket(left_parent, right_parent, index, left, right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{names, Fixture, RecordingConsumer};
    use crate::walk::PreOrderDiffWalk;
    use geovcs_store::RevTree;

    fn two_layers(fixture: &Fixture, leaf_limit: usize) -> RevTree {
        let all = names("p", 25);
        let points: Vec<(&str, f64, f64)> = all.iter().map(|n| (n.as_str(), 0.0, 0.0)).collect();
        let a = fixture.layer(&points, leaf_limit);
        let b = fixture.layer(&points[..5], leaf_limit);
        fixture.root(&[("a", &a), ("b", &b)])
    }

    fn added_paths(filters: &[&str], leaf_limit: usize) -> Vec<String> {
        let fixture = Fixture::new();
        let tree = two_layers(&fixture, leaf_limit);
        let filter = PathFilteringConsumer::new(RecordingConsumer::default(), filters.iter().copied());
        PreOrderDiffWalk::new(RevTree::empty(), tree, fixture.dyn_store(), fixture.dyn_store())
            .walk(&filter)
            .unwrap();
        filter
            .into_inner()
            .feature_pairs()
            .into_iter()
            .map(|(_, r)| r)
            .collect()
    }

    #[test]
    fn tree_filter_keeps_only_that_layer() {
        let paths = added_paths(&["b"], 512);
        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|p| p.starts_with("b/")));
    }

    #[test]
    fn feature_filter_reaches_through_buckets() {
        for leaf_limit in [512, 3] {
            assert_eq!(added_paths(&["a/p17", "/b/p2/"], leaf_limit), vec!["a/p17", "b/p2"]);
        }
    }

    #[test]
    fn no_filters_pass_everything() {
        assert_eq!(added_paths(&[], 3).len(), 30);
    }

    #[test]
    fn bucket_matching_uses_the_canonical_bucket() {
        let filter = PathFilteringConsumer::new(RecordingConsumer::default(), ["a/p17"]);
        let hit = BucketIndex::ROOT
            .append(CanonicalNodeOrder::bucket("p17", 0))
            .append(CanonicalNodeOrder::bucket("p17", 1));
        assert!(filter.bucket_applies("a", &hit));
        let miss = BucketIndex::ROOT.append((CanonicalNodeOrder::bucket("p17", 0) + 1) % 32);
        assert!(!filter.bucket_applies("a", &miss));
        assert!(!filter.bucket_applies("b", &hit));
        assert!(filter.tree_applies(""));
        assert!(filter.tree_applies("a"));
        assert!(!filter.tree_applies("b"));
    }
}
