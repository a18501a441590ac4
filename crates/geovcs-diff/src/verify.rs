//! Split a patch into the parts that still apply to a tree and the parts
//! that do not.

use geovcs_store::{find_node, NodeRef, ObjectStore, RevTree};
use geovcs_types::ObjectId;
use tracing::debug;

use crate::error::DiffResult;
use crate::feature_diff::{FeatureDiff, FeatureTypeDiff};
use crate::patch::{FeatureInfo, Patch};

/// Outcome of [`verify_patch`]: the applicable and rejected subsets.
#[derive(Clone, Debug, Default)]
pub struct VerifyPatchResults {
    to_apply: Patch,
    to_reject: Patch,
}

impl VerifyPatchResults {
    pub fn to_apply(&self) -> &Patch {
        &self.to_apply
    }

    pub fn to_reject(&self) -> &Patch {
        &self.to_reject
    }

    pub fn into_parts(self) -> (Patch, Patch) {
        (self.to_apply, self.to_reject)
    }
}

/// Check every change of `patch` against the tree `root` read from `store`.
///
/// - a modification applies when the current feature matches each of its
///   attribute diffs;
/// - an addition applies when nothing exists at its path yet;
/// - a removal applies when the current feature and its feature type are
///   exactly the ones being removed;
/// - an altered tree applies when the current feature type at its path is
///   the recorded old one ([`ObjectId::NULL`] for a missing tree).
pub fn verify_patch(patch: &Patch, store: &dyn ObjectStore, root: &RevTree) -> DiffResult<VerifyPatchResults> {
    let mut results = VerifyPatchResults::default();

    for diff in patch.modified_features() {
        let applies = modification_applies(diff, store, root)?;
        let target = results.side(applies);
        target.add_modified_feature(diff.clone());
    }

    for info in patch.added_features() {
        let applies = find_node(store, root, info.path())?.is_none();
        results.side(applies).push_added(info.clone());
        copy_type(patch, results.side(applies), info.feature_type_id());
    }

    for info in patch.removed_features() {
        let applies = find_node(store, root, info.path())?.is_some_and(|node| removal_matches(info, &node));
        results.side(applies).push_removed(info.clone());
        copy_type(patch, results.side(applies), info.feature_type_id());
    }

    for diff in patch.altered_trees() {
        let current = find_node(store, root, diff.path())?.map_or(ObjectId::NULL, |node| node.metadata_id());
        let applies = current == diff.old_feature_type();
        let target = results.side(applies);
        target.add_altered_tree(diff.clone());
        copy_type(patch, target, diff.old_feature_type());
        copy_type(patch, target, diff.new_feature_type());
    }

    debug!(
        to_apply = results.to_apply.count(),
        to_reject = results.to_reject.count(),
        "verified patch"
    );
    Ok(results)
}

impl VerifyPatchResults {
    fn side(&mut self, applies: bool) -> &mut Patch {
        if applies {
            &mut self.to_apply
        } else {
            &mut self.to_reject
        }
    }
}

fn modification_applies(diff: &FeatureDiff, store: &dyn ObjectStore, root: &RevTree) -> DiffResult<bool> {
    let Some(node) = find_node(store, root, diff.path())? else {
        return Ok(false);
    };
    if !node.node().is_feature() || node.metadata_id().is_null() {
        return Ok(false);
    }
    let feature = store.get_feature(&node.object_id())?;
    let feature_type = store.get_feature_type(&node.metadata_id())?;
    Ok(diff.can_be_applied_on(&feature, &feature_type))
}

fn removal_matches(info: &FeatureInfo, node: &NodeRef) -> bool {
    node.node().is_feature()
        && node.object_id() == info.feature().id()
        && node.metadata_id() == info.feature_type_id()
}

fn copy_type(source: &Patch, target: &mut Patch, id: ObjectId) {
    if let Some(ft) = source.feature_type(&id) {
        target.add_feature_type(ft.clone());
    }
}
