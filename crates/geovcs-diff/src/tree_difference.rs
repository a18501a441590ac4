//! Tree-level differences: which subtrees were added, removed, renamed,
//! retyped or changed between two roots.
//!
//! Both sides are flattened into path maps of every tree below the root, so
//! the cost is proportional to the number of trees, not features.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use geovcs_store::{NodeRef, ObjectStore, RevTree};
use geovcs_types::ObjectId;
use tracing::debug;

use crate::depth_iter::{DepthTreeIterator, Strategy};
use crate::error::DiffResult;

/// A single tree-level change.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeChange {
    /// A tree exists on the right only.
    Added(NodeRef),
    /// A tree exists on the left only.
    Removed(NodeRef),
    /// Same path, different contents.
    Modified { old: NodeRef, new: NodeRef },
    /// Same contents moved to another path.
    Renamed { old: NodeRef, new: NodeRef },
    /// Same path and contents, different feature type.
    MetadataChanged { old: NodeRef, new: NodeRef },
}

impl TreeChange {
    /// Path on the right side, or the left one for removals.
    pub fn path(&self) -> String {
        match self {
            Self::Added(node) | Self::Removed(node) => node.path(),
            Self::Modified { new, .. } | Self::Renamed { new, .. } | Self::MetadataChanged { new, .. } => new.path(),
        }
    }
}

/// Path maps of every tree under two roots.
#[derive(Clone, Debug, Default)]
pub struct TreeDifference {
    left: BTreeMap<String, NodeRef>,
    right: BTreeMap<String, NodeRef>,
}

impl TreeDifference {
    /// Flatten `left` (read from `left_store`) and `right` (from
    /// `right_store`).
    pub fn create(
        left_store: Arc<dyn ObjectStore>,
        right_store: Arc<dyn ObjectStore>,
        left: &RevTree,
        right: &RevTree,
    ) -> DiffResult<Self> {
        let left = path_map(left_store, left)?;
        let right = path_map(right_store, right)?;
        debug!(left_trees = left.len(), right_trees = right.len(), "flattened trees");
        Ok(Self { left, right })
    }

    /// Build from already collected tree refs.
    pub fn from_refs(left: impl IntoIterator<Item = NodeRef>, right: impl IntoIterator<Item = NodeRef>) -> Self {
        fn by_path(refs: impl IntoIterator<Item = NodeRef>) -> BTreeMap<String, NodeRef> {
            refs.into_iter().map(|r| (r.path(), r)).collect()
        }
        Self {
            left: by_path(left),
            right: by_path(right),
        }
    }

    pub fn left_trees(&self) -> &BTreeMap<String, NodeRef> {
        &self.left
    }

    pub fn right_trees(&self) -> &BTreeMap<String, NodeRef> {
        &self.right
    }

    fn left_only(&self) -> impl Iterator<Item = &NodeRef> {
        self.left.iter().filter(|(path, _)| !self.right.contains_key(*path)).map(|(_, r)| r)
    }

    fn right_only(&self) -> impl Iterator<Item = &NodeRef> {
        self.right.iter().filter(|(path, _)| !self.left.contains_key(*path)).map(|(_, r)| r)
    }

    fn both(&self) -> impl Iterator<Item = (&NodeRef, &NodeRef)> {
        self.left
            .iter()
            .filter_map(|(path, l)| self.right.get(path).map(|r| (l, r)))
    }

    /// Left-only trees paired with a right-only tree holding the same
    /// contents, in left path order. Each tree is matched at most once.
    pub fn find_renames(&self) -> Vec<(NodeRef, NodeRef)> {
        let added: Vec<&NodeRef> = self.right_only().collect();
        let mut matched: HashSet<usize> = HashSet::new();
        let mut renames = Vec::new();
        for old in self.left_only() {
            let found = added
                .iter()
                .enumerate()
                .find(|(i, new)| !matched.contains(i) && new.object_id() == old.object_id());
            if let Some((i, new)) = found {
                matched.insert(i);
                renames.push((old.clone(), (*new).clone()));
            }
        }
        renames
    }

    /// Right-only trees that are not the target of a rename.
    pub fn find_new_trees(&self) -> Vec<NodeRef> {
        let renamed: HashSet<String> = self.find_renames().into_iter().map(|(_, new)| new.path()).collect();
        self.right_only()
            .filter(|r| !renamed.contains(&r.path()))
            .cloned()
            .collect()
    }

    /// Left-only trees that are not the source of a rename.
    pub fn find_deletes(&self) -> Vec<NodeRef> {
        let renamed: HashSet<String> = self.find_renames().into_iter().map(|(old, _)| old.path()).collect();
        self.left_only()
            .filter(|r| !renamed.contains(&r.path()))
            .cloned()
            .collect()
    }

    /// Trees on both sides whose only change is their feature type.
    pub fn find_pure_metadata_changes(&self) -> Vec<(NodeRef, NodeRef)> {
        self.both()
            .filter(|(l, r)| l.object_id() == r.object_id() && l.metadata_id() != r.metadata_id())
            .map(|(l, r)| (l.clone(), r.clone()))
            .collect()
    }

    /// Trees on both sides whose contents changed.
    pub fn find_changes(&self) -> Vec<(NodeRef, NodeRef)> {
        self.both()
            .filter(|(l, r)| l.object_id() != r.object_id())
            .map(|(l, r)| (l.clone(), r.clone()))
            .collect()
    }

    /// Every change: modifications and metadata changes in path order, then
    /// renames, removals and additions.
    pub fn changes(&self) -> Vec<TreeChange> {
        let mut changes = Vec::new();
        for (l, r) in self.both() {
            if l.object_id() != r.object_id() {
                changes.push(TreeChange::Modified { old: l.clone(), new: r.clone() });
            } else if l.metadata_id() != r.metadata_id() {
                changes.push(TreeChange::MetadataChanged { old: l.clone(), new: r.clone() });
            }
        }
        changes.extend(
            self.find_renames()
                .into_iter()
                .map(|(old, new)| TreeChange::Renamed { old, new }),
        );
        changes.extend(self.find_deletes().into_iter().map(TreeChange::Removed));
        changes.extend(self.find_new_trees().into_iter().map(TreeChange::Added));
        changes
    }

    /// Ids of every tree on the right side, keyed by path.
    pub fn right_ids(&self) -> BTreeMap<&str, ObjectId> {
        self.right.iter().map(|(p, r)| (p.as_str(), r.object_id())).collect()
    }
}

fn path_map(store: Arc<dyn ObjectStore>, root: &RevTree) -> DiffResult<BTreeMap<String, NodeRef>> {
    let mut map = BTreeMap::new();
    for node in DepthTreeIterator::of_root(store, root.clone(), Strategy::RecursiveTreesOnly) {
        let node = node?;
        map.insert(node.path(), node);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{points_type, Fixture};
    use geovcs_store::{AttributeDescriptor, CanonicalTreeBuilder, Node, RevFeatureType};
    use geovcs_types::FieldType;

    fn difference(fixture: &Fixture, left: &RevTree, right: &RevTree) -> TreeDifference {
        TreeDifference::create(fixture.dyn_store(), fixture.dyn_store(), left, right).unwrap()
    }

    fn paths(refs: &[NodeRef]) -> Vec<String> {
        refs.iter().map(NodeRef::path).collect()
    }

    #[test]
    fn empty_to_populated_all_new() {
        let fixture = Fixture::new();
        let a = fixture.layer(&[("a", 0.0, 0.0)], 512);
        let b = fixture.layer(&[("b", 1.0, 1.0)], 512);
        let right = fixture.root(&[("roads", &a), ("rivers", &b)]);
        let diff = difference(&fixture, &RevTree::empty(), &right);
        assert_eq!(paths(&diff.find_new_trees()), vec!["rivers", "roads"]);
        assert!(diff.find_deletes().is_empty());
        assert!(diff.changes().iter().all(|c| matches!(c, TreeChange::Added(_))));
    }

    #[test]
    fn identical_roots_have_no_changes() {
        let fixture = Fixture::new();
        let a = fixture.layer(&[("a", 0.0, 0.0)], 512);
        let root = fixture.root(&[("roads", &a)]);
        assert!(difference(&fixture, &root, &root).changes().is_empty());
    }

    #[test]
    fn renamed_tree_is_matched_by_contents() {
        let fixture = Fixture::new();
        let a = fixture.layer(&[("a", 0.0, 0.0)], 512);
        let b = fixture.layer(&[("b", 1.0, 1.0)], 512);
        let left = fixture.root(&[("roads", &a), ("old_rivers", &b)]);
        let right = fixture.root(&[("roads", &a), ("rivers", &b)]);
        let diff = difference(&fixture, &left, &right);

        let renames = diff.find_renames();
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].0.path(), "old_rivers");
        assert_eq!(renames[0].1.path(), "rivers");
        assert!(diff.find_new_trees().is_empty());
        assert!(diff.find_deletes().is_empty());
        assert_eq!(diff.changes().len(), 1);
    }

    #[test]
    fn mixed_changes() {
        let fixture = Fixture::new();
        let keep = fixture.layer(&[("k", 0.0, 0.0)], 512);
        let before = fixture.layer(&[("m", 1.0, 1.0)], 512);
        let after = fixture.layer(&[("m", 2.0, 2.0)], 512);
        let gone = fixture.layer(&[("g", 3.0, 3.0)], 512);
        let fresh = fixture.layer(&[("f", 4.0, 4.0)], 512);
        let left = fixture.root(&[("keep", &keep), ("modify", &before), ("delete", &gone)]);
        let right = fixture.root(&[("keep", &keep), ("modify", &after), ("added", &fresh)]);

        let diff = difference(&fixture, &left, &right);
        let changes = diff.changes();
        assert_eq!(changes.len(), 3);
        assert!(changes.iter().any(|c| matches!(c, TreeChange::Modified { new, .. } if new.path() == "modify")));
        assert!(changes.iter().any(|c| matches!(c, TreeChange::Removed(r) if r.path() == "delete")));
        assert!(changes.iter().any(|c| matches!(c, TreeChange::Added(r) if r.path() == "added")));
        assert_eq!(diff.find_changes().len(), 1);
    }

    #[test]
    fn feature_type_change_is_pure_metadata() {
        let fixture = Fixture::new();
        let other = RevFeatureType::new("Other", vec![AttributeDescriptor::new("id", FieldType::Long)]);
        let layer = fixture.layer(&[("a", 0.0, 0.0)], 512);
        let left = fixture.root(&[("layer", &layer)]);
        let mut builder = CanonicalTreeBuilder::new(fixture.store.as_ref());
        builder.put(Node::tree("layer", layer.id(), Some(other.id())));
        let right = builder.build().unwrap();

        let diff = difference(&fixture, &left, &right);
        let changes = diff.find_pure_metadata_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0.metadata_id(), points_type().id());
        assert_eq!(changes[0].1.metadata_id(), other.id());
        assert!(diff.find_changes().is_empty());
        assert!(matches!(diff.changes()[0], TreeChange::MetadataChanged { .. }));
    }

    #[test]
    fn nested_trees_are_flattened() {
        let fixture = Fixture::new();
        let leaf = fixture.layer(&[("a", 0.0, 0.0)], 512);
        let group = fixture.root(&[("inner", &leaf)]);
        let mut builder = CanonicalTreeBuilder::new(fixture.store.as_ref());
        builder.put(Node::tree("group", group.id(), None));
        let root = builder.build().unwrap();

        let diff = difference(&fixture, &RevTree::empty(), &root);
        assert_eq!(paths(&diff.find_new_trees()), vec!["group", "group/inner"]);
        assert_eq!(diff.right_ids().get("group/inner"), Some(&leaf.id()));
    }
}
