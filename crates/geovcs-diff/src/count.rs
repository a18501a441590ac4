//! Counting changed features and trees.

use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use geovcs_store::{load_tree, Bucket, NodeRef, ObjectStore, RevTree};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{DiffError, DiffResult};
use crate::walk::{BucketIndex, Consumer};

/// Totals of a diff, split by object kind and change type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffObjectCount {
    pub features_added: u64,
    pub features_removed: u64,
    pub features_changed: u64,
    pub trees_added: u64,
    pub trees_removed: u64,
    pub trees_changed: u64,
}

impl DiffObjectCount {
    pub fn features_count(&self) -> u64 {
        self.features_added + self.features_removed + self.features_changed
    }

    pub fn trees_count(&self) -> u64 {
        self.trees_added + self.trees_removed + self.trees_changed
    }

    pub fn count(&self) -> u64 {
        self.features_count() + self.trees_count()
    }
}

impl AddAssign for DiffObjectCount {
    fn add_assign(&mut self, other: Self) {
        self.features_added += other.features_added;
        self.features_removed += other.features_removed;
        self.features_changed += other.features_changed;
        self.trees_added += other.trees_added;
        self.trees_removed += other.trees_removed;
        self.trees_changed += other.trees_changed;
    }
}

#[derive(Default)]
struct Counters {
    features_added: AtomicU64,
    features_removed: AtomicU64,
    features_changed: AtomicU64,
    trees_added: AtomicU64,
    trees_removed: AtomicU64,
    trees_changed: AtomicU64,
}

/// Counts the changes of a walk.
///
/// Subtrees and buckets present on one side only are not descended: their
/// recorded `size` and `num_trees` are added directly. The root pair is
/// never counted as a changed tree.
pub struct DiffCountConsumer {
    left_store: Arc<dyn ObjectStore>,
    right_store: Arc<dyn ObjectStore>,
    counters: Counters,
    error: Mutex<Option<DiffError>>,
}

impl DiffCountConsumer {
    pub fn new(left_store: Arc<dyn ObjectStore>, right_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            left_store,
            right_store,
            counters: Counters::default(),
            error: Mutex::new(None),
        }
    }

    /// Totals so far, or the first error hit while sizing a one-sided subtree.
    pub fn count(&self) -> DiffResult<DiffObjectCount> {
        if let Some(e) = self.error.lock().take() {
            return Err(e);
        }
        let c = &self.counters;
        Ok(DiffObjectCount {
            features_added: c.features_added.load(Ordering::Acquire),
            features_removed: c.features_removed.load(Ordering::Acquire),
            features_changed: c.features_changed.load(Ordering::Acquire),
            trees_added: c.trees_added.load(Ordering::Acquire),
            trees_removed: c.trees_removed.load(Ordering::Acquire),
            trees_changed: c.trees_changed.load(Ordering::Acquire),
        })
    }

    fn load_one_sided(&self, left: bool, id: &geovcs_types::ObjectId) -> Option<RevTree> {
        let store = if left { &self.left_store } else { &self.right_store };
        match load_tree(store.as_ref(), id) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!(id = %id.short_hex(), error = %e, "cannot size one-sided subtree");
                self.error.lock().get_or_insert(e.into());
                None
            }
        }
    }

    /// Add the contents of a subtree present on one side only. `extra_trees`
    /// counts the subtree itself.
    fn add_subtree(&self, removed: bool, tree: &RevTree, extra_trees: u64) {
        let c = &self.counters;
        let (features, trees) = if removed {
            (&c.features_removed, &c.trees_removed)
        } else {
            (&c.features_added, &c.trees_added)
        };
        features.fetch_add(tree.size(), Ordering::AcqRel);
        trees.fetch_add(tree.num_trees() + extra_trees, Ordering::AcqRel);
    }
}

impl Consumer for DiffCountConsumer {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        let counter = match (left, right) {
            (None, _) => &self.counters.features_added,
            (_, None) => &self.counters.features_removed,
            _ => &self.counters.features_changed,
        };
        counter.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        match (left, right) {
            (Some(l), Some(r)) => {
                if !(l.is_root() && r.is_root()) {
                    self.counters.trees_changed.fetch_add(1, Ordering::AcqRel);
                }
                true
            }
            (Some(only), None) | (None, Some(only)) => {
                let removed = right.is_none();
                if let Some(tree) = self.load_one_sided(removed, &only.object_id()) {
                    self.add_subtree(removed, &tree, 1);
                }
                false
            }
            (None, None) => false,
        }
    }

    fn bucket(
        &self,
        _left_parent: Option<&NodeRef>,
        _right_parent: Option<&NodeRef>,
        _index: &BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> bool {
        match (left, right) {
            (Some(_), Some(_)) => true,
            (Some(only), None) | (None, Some(only)) => {
                let removed = right.is_none();
                if let Some(tree) = self.load_one_sided(removed, &only.object_id) {
                    self.add_subtree(removed, &tree, 0);
                }
                false
            }
            (None, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DiffEntryCollector;
    use crate::test_support::{names, Fixture};
    use crate::walk::{PreOrderDiffWalk, WalkExecutor};

    fn points(prefix: &str, n: usize, dx: f64) -> Vec<(String, f64, f64)> {
        names(prefix, n).into_iter().enumerate().map(|(i, name)| (name, i as f64 + dx, 0.0)).collect()
    }

    fn as_refs(points: &[(String, f64, f64)]) -> Vec<(&str, f64, f64)> {
        points.iter().map(|(n, x, y)| (n.as_str(), *x, *y)).collect()
    }

    fn count(fixture: &Fixture, left: RevTree, right: RevTree) -> DiffObjectCount {
        let consumer = DiffCountConsumer::new(fixture.dyn_store(), fixture.dyn_store());
        PreOrderDiffWalk::new(left, right, fixture.dyn_store(), fixture.dyn_store())
            .walk(&consumer)
            .unwrap();
        consumer.count().unwrap()
    }

    #[test]
    fn added_layer_is_sized_without_descending() {
        let fixture = Fixture::new();
        let layer = fixture.layer(&as_refs(&points("p", 50, 0.0)), 8);
        let root = fixture.root(&[("points", &layer)]);
        let totals = count(&fixture, RevTree::empty(), root.clone());
        assert_eq!(totals.features_added, 50);
        assert_eq!(totals.trees_added, 1);
        assert_eq!(totals.trees_changed, 0);

        let reverse = count(&fixture, root, RevTree::empty());
        assert_eq!(reverse.features_removed, 50);
        assert_eq!(reverse.trees_removed, 1);
    }

    #[test]
    fn changed_layer_counts_each_feature() {
        let fixture = Fixture::new();
        let mut before = points("p", 30, 0.0);
        let left = fixture.layer(&as_refs(&before), 8);
        before.truncate(25);
        before[0].1 = 100.0;
        before.extend(points("q", 4, 0.0));
        let right = fixture.layer(&as_refs(&before), 8);
        let totals = count(
            &fixture,
            fixture.root(&[("points", &left)]),
            fixture.root(&[("points", &right)]),
        );
        assert_eq!(totals.features_removed, 5);
        assert_eq!(totals.features_added, 4);
        assert_eq!(totals.features_changed, 1);
        assert_eq!(totals.trees_changed, 1);
        assert_eq!(totals.count(), 11);
    }

    #[test]
    fn totals_match_collected_entries() {
        let fixture = Fixture::new();
        let left = fixture.layer(&as_refs(&points("p", 80, 0.0)), 16);
        let right = fixture.layer(&as_refs(&points("p", 60, 0.5)), 16);
        let (l, r) = (fixture.root(&[("points", &left)]), fixture.root(&[("points", &right)]));

        let totals = count(&fixture, l.clone(), r.clone());
        let collector = DiffEntryCollector::new();
        PreOrderDiffWalk::new(l, r, fixture.dyn_store(), fixture.dyn_store())
            .with_executor(WalkExecutor::with_threads(4, "count-test").unwrap())
            .walk(&collector)
            .unwrap();
        let entries = collector.into_entries();
        assert_eq!(entries.len() as u64, totals.features_count());
        assert_eq!(totals.features_changed, 60);
        assert_eq!(totals.features_removed, 20);
    }

    #[test]
    fn missing_subtree_surfaces_as_error() {
        let fixture = Fixture::new();
        let ghost = geovcs_store::Node::tree("ghost", geovcs_types::ObjectId::from_bytes(b"x"), None);
        let right = RevTree::leaf(vec![ghost], Vec::new());
        let consumer = DiffCountConsumer::new(fixture.dyn_store(), fixture.dyn_store());
        PreOrderDiffWalk::new(RevTree::empty(), right, fixture.dyn_store(), fixture.dyn_store())
            .walk(&consumer)
            .unwrap();
        assert!(matches!(consumer.count(), Err(DiffError::Store(_))));
    }

    #[test]
    fn totals_add_up() {
        let mut a = DiffObjectCount { features_added: 2, trees_changed: 1, ..Default::default() };
        a += DiffObjectCount { features_removed: 3, ..Default::default() };
        assert_eq!(a.features_count(), 5);
        assert_eq!(a.trees_count(), 1);
    }
}
