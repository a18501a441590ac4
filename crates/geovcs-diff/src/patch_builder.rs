//! Materializing a [`Patch`] from a tree walk.

use std::sync::Arc;

use dashmap::DashMap;
use geovcs_store::{NodeRef, ObjectStore, RevFeature, RevFeatureType, RevTree};
use geovcs_types::ObjectId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::DiffConfig;
use crate::consumers::MaxFeatureDiffsLimiter;
use crate::error::{DiffError, DiffResult};
use crate::feature_diff::{FeatureDiff, FeatureTypeDiff};
use crate::patch::Patch;
use crate::walk::{Consumer, PreOrderDiffWalk};

/// Consumer that turns walk events into a [`Patch`].
///
/// Features and feature types are read from the store of their side. Added
/// and removed trees become altered trees against [`ObjectId::NULL`]; trees
/// whose feature type changed become altered trees too. The walk always
/// descends, so every feature under an added or removed tree is recorded.
pub struct PatchBuilder {
    left_store: Arc<dyn ObjectStore>,
    right_store: Arc<dyn ObjectStore>,
    report_all: bool,
    types: DashMap<ObjectId, RevFeatureType>,
    patch: Mutex<Patch>,
    error: Mutex<Option<DiffError>>,
}

impl PatchBuilder {
    pub fn new(left_store: Arc<dyn ObjectStore>, right_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            left_store,
            right_store,
            report_all: false,
            types: DashMap::new(),
            patch: Mutex::new(Patch::new()),
            error: Mutex::new(None),
        }
    }

    /// Keep unchanged attributes in modified feature diffs.
    pub fn report_all(mut self, report_all: bool) -> Self {
        self.report_all = report_all;
        self
    }

    /// The finished patch, or the first error hit while building it.
    pub fn into_patch(self) -> DiffResult<Patch> {
        if let Some(e) = self.error.into_inner() {
            return Err(e);
        }
        Ok(self.patch.into_inner())
    }

    fn store(&self, left: bool) -> &dyn ObjectStore {
        if left {
            self.left_store.as_ref()
        } else {
            self.right_store.as_ref()
        }
    }

    fn feature_type(&self, left: bool, id: ObjectId) -> DiffResult<RevFeatureType> {
        if id.is_null() {
            return Err(DiffError::UnknownFeatureType(id));
        }
        if let Some(ft) = self.types.get(&id) {
            return Ok(ft.clone());
        }
        let ft = self.store(left).get_feature_type(&id)?;
        self.types.insert(id, ft.clone());
        Ok(ft)
    }

    fn load(&self, left: bool, node: &NodeRef) -> DiffResult<(RevFeature, RevFeatureType)> {
        let feature = self.store(left).get_feature(&node.object_id())?;
        let ft = self.feature_type(left, node.metadata_id())?;
        Ok((feature, ft))
    }

    fn record_feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> DiffResult<()> {
        match (left, right) {
            (None, Some(added)) => {
                let (feature, ft) = self.load(false, added)?;
                self.patch.lock().add_added_feature(added.path(), feature, &ft);
            }
            (Some(removed), None) => {
                let (feature, ft) = self.load(true, removed)?;
                self.patch.lock().add_removed_feature(removed.path(), feature, &ft);
            }
            (Some(old), Some(new)) => {
                let (old_feature, old_type) = self.load(true, old)?;
                let (new_feature, new_type) = self.load(false, new)?;
                let diff = FeatureDiff::between(
                    new.path(),
                    Some((&old_feature, &old_type)),
                    Some((&new_feature, &new_type)),
                    self.report_all,
                )?;
                if diff.has_differences() {
                    self.patch.lock().add_modified_feature(diff);
                }
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn record_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> DiffResult<()> {
        let md = |side: Option<&NodeRef>| side.map_or(ObjectId::NULL, NodeRef::metadata_id);
        let (old, new) = (md(left), md(right));
        if old == new {
            return Ok(());
        }
        let path = right.or(left).map(NodeRef::path).unwrap_or_default();
        let mut types = Vec::with_capacity(2);
        if !old.is_null() {
            types.push(self.feature_type(true, old)?);
        }
        if !new.is_null() {
            types.push(self.feature_type(false, new)?);
        }
        let mut patch = self.patch.lock();
        for ft in types {
            patch.add_feature_type(ft);
        }
        patch.add_altered_tree(FeatureTypeDiff::new(path, old, new));
        Ok(())
    }

    fn fail(&self, e: DiffError) -> bool {
        warn!(error = %e, "patch builder stopped");
        self.error.lock().get_or_insert(e);
        false
    }
}

impl Consumer for PatchBuilder {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        match self.record_feature(left, right) {
            Ok(()) => true,
            Err(e) => self.fail(e),
        }
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if left.or(right).is_some_and(NodeRef::is_root) {
            return true;
        }
        match self.record_tree(left, right) {
            Ok(()) => true,
            Err(e) => self.fail(e),
        }
    }
}

/// Build the patch that turns `left` into `right`.
///
/// Honors the walk settings, the feature diff limit and the attribute
/// reporting mode of `config`.
pub fn create_patch(
    left_store: Arc<dyn ObjectStore>,
    right_store: Arc<dyn ObjectStore>,
    left: RevTree,
    right: RevTree,
    config: &DiffConfig,
) -> DiffResult<Patch> {
    let walk = PreOrderDiffWalk::new(left, right, left_store.clone(), right_store.clone()).with_config(&config.walk)?;
    let builder = PatchBuilder::new(left_store, right_store).report_all(config.report_all_attributes);
    match config.max_feature_diffs {
        Some(limit) => walk.walk(&MaxFeatureDiffsLimiter::new(&builder, limit))?,
        None => walk.walk(&builder)?,
    }
    let patch = builder.into_patch()?;
    debug!(changes = patch.count(), feature_types = patch.feature_types().count(), "created patch");
    Ok(patch)
}
