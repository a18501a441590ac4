//! A serializable bundle of feature and schema changes.

use std::collections::BTreeMap;
use std::fmt;

use geovcs_store::text::write_feature;
use geovcs_store::{RevFeature, RevFeatureType};
use geovcs_types::ObjectId;

use crate::feature_diff::{FeatureDiff, FeatureTypeDiff};
use crate::serializer::write_patch;

/// A whole feature added or removed by a patch.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureInfo {
    path: String,
    feature: RevFeature,
    feature_type_id: ObjectId,
}

impl FeatureInfo {
    pub fn new(path: impl Into<String>, feature: RevFeature, feature_type_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            feature,
            feature_type_id,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn feature(&self) -> &RevFeature {
        &self.feature
    }

    pub fn feature_type_id(&self) -> ObjectId {
        self.feature_type_id
    }
}

/// Added, removed and modified features plus altered trees, together with
/// every feature type they reference (deduplicated by id).
///
/// Two patches are equal when they serialize to the same text.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    added: Vec<FeatureInfo>,
    removed: Vec<FeatureInfo>,
    modified: Vec<FeatureDiff>,
    altered_trees: Vec<FeatureTypeDiff>,
    feature_types: BTreeMap<ObjectId, RevFeatureType>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty patch that already knows `feature_types`.
    pub fn with_feature_types(feature_types: impl IntoIterator<Item = RevFeatureType>) -> Self {
        let mut patch = Self::new();
        for ft in feature_types {
            patch.add_feature_type(ft);
        }
        patch
    }

    pub fn added_features(&self) -> &[FeatureInfo] {
        &self.added
    }

    pub fn removed_features(&self) -> &[FeatureInfo] {
        &self.removed
    }

    pub fn modified_features(&self) -> &[FeatureDiff] {
        &self.modified
    }

    pub fn altered_trees(&self) -> &[FeatureTypeDiff] {
        &self.altered_trees
    }

    /// Referenced feature types, ordered by id.
    pub fn feature_types(&self) -> impl Iterator<Item = &RevFeatureType> {
        self.feature_types.values()
    }

    pub fn feature_type(&self, id: &ObjectId) -> Option<&RevFeatureType> {
        self.feature_types.get(id)
    }

    pub fn add_feature_type(&mut self, feature_type: RevFeatureType) {
        self.feature_types.entry(feature_type.id()).or_insert(feature_type);
    }

    pub fn add_added_feature(&mut self, path: impl Into<String>, feature: RevFeature, feature_type: &RevFeatureType) {
        self.added.push(FeatureInfo::new(path, feature, feature_type.id()));
        self.add_feature_type(feature_type.clone());
    }

    pub fn add_removed_feature(&mut self, path: impl Into<String>, feature: RevFeature, feature_type: &RevFeatureType) {
        self.removed.push(FeatureInfo::new(path, feature, feature_type.id()));
        self.add_feature_type(feature_type.clone());
    }

    pub fn add_modified_feature(&mut self, diff: FeatureDiff) {
        for ft in [diff.old_feature_type(), diff.new_feature_type()].into_iter().flatten() {
            self.add_feature_type(ft.clone());
        }
        self.modified.push(diff);
    }

    /// Record a schema change. The feature types it names should be added
    /// with [`Patch::add_feature_type`] for the patch to be self-contained.
    pub fn add_altered_tree(&mut self, diff: FeatureTypeDiff) {
        self.altered_trees.push(diff);
    }

    pub(crate) fn push_added(&mut self, info: FeatureInfo) {
        self.added.push(info);
    }

    pub(crate) fn push_removed(&mut self, info: FeatureInfo) {
        self.removed.push(info);
    }

    /// `true` when no feature changes. Altered trees alone do not count.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of added, removed and modified features plus altered trees.
    pub fn count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len() + self.altered_trees.len()
    }

    /// The patch that undoes this one.
    pub fn reversed(&self) -> Self {
        Self {
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified: self.modified.iter().map(FeatureDiff::reversed).collect(),
            altered_trees: self.altered_trees.iter().map(FeatureTypeDiff::reversed).collect(),
            feature_types: self.feature_types.clone(),
        }
    }

    /// Human-readable listing of the attribute names an altered tree adds
    /// and removes, when both feature types are known.
    fn schema_changes(&self, diff: &FeatureTypeDiff) -> Vec<String> {
        let (Some(old), Some(new)) = (
            self.feature_type(&diff.old_feature_type()),
            self.feature_type(&diff.new_feature_type()),
        ) else {
            return Vec::new();
        };
        let removed = old
            .descriptors()
            .iter()
            .filter(|d| new.index_of(d).is_none())
            .map(|d| format!("R\t{}[{}]", d.name, d.field_type));
        let added = new
            .descriptors()
            .iter()
            .filter(|d| old.index_of(d).is_none())
            .map(|d| format!("A\t{}[{}]", d.name, d.field_type));
        removed.chain(added).collect()
    }
}

impl PartialEq for Patch {
    fn eq(&self, other: &Self) -> bool {
        write_patch(self) == write_patch(other)
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (code, infos) in [("A", &self.added), ("R", &self.removed)] {
            for info in infos {
                writeln!(f, "{code}\t{}\t{}", info.path, info.feature_type_id)?;
                writeln!(f, "{}", write_feature(&info.feature))?;
            }
        }
        for diff in &self.modified {
            writeln!(f, "M\t{}", diff.path())?;
            writeln!(f, "{diff}")?;
        }
        for diff in &self.altered_trees {
            writeln!(f, "{diff}")?;
            for line in self.schema_changes(diff) {
                writeln!(f, "{line}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{point, points_type};
    use geovcs_store::AttributeDescriptor;
    use geovcs_types::FieldType;

    fn modified(path: &str) -> FeatureDiff {
        let ft = points_type();
        let (old, new) = (point("a", 0.0, 0.0), point("a", 1.0, 1.0));
        FeatureDiff::between(path, Some((&old, &ft)), Some((&new, &ft)), false).unwrap()
    }

    #[test]
    fn feature_types_are_deduplicated() {
        let ft = points_type();
        let mut patch = Patch::new();
        patch.add_added_feature("Points/p1", point("p1", 0.0, 0.0), &ft);
        patch.add_removed_feature("Points/p2", point("p2", 0.0, 0.0), &ft);
        patch.add_modified_feature(modified("Points/p3"));
        assert_eq!(patch.feature_types().count(), 1);
        assert_eq!(patch.count(), 3);
        assert!(!patch.is_empty());
    }

    #[test]
    fn reversed_swaps_adds_and_removes() {
        let ft = points_type();
        let mut patch = Patch::new();
        patch.add_added_feature("Points/p1", point("p1", 0.0, 0.0), &ft);
        patch.add_modified_feature(modified("Points/p3"));
        patch.add_altered_tree(FeatureTypeDiff::new("Points", ObjectId::NULL, ft.id()));

        let reversed = patch.reversed();
        assert!(reversed.added_features().is_empty());
        assert_eq!(reversed.removed_features()[0].path(), "Points/p1");
        assert_eq!(reversed.modified_features()[0], patch.modified_features()[0].reversed());
        assert_eq!(reversed.altered_trees()[0].new_feature_type(), ObjectId::NULL);
        assert_eq!(reversed.feature_types().count(), 1);
        assert_eq!(reversed.reversed(), patch);
    }

    #[test]
    fn altered_tree_lists_schema_changes() {
        let old = points_type();
        let new = RevFeatureType::new(
            "Points",
            vec![
                AttributeDescriptor::new("name", FieldType::String),
                AttributeDescriptor::new("rank", FieldType::Integer),
            ],
        );
        let mut patch = Patch::with_feature_types([old.clone(), new.clone()]);
        patch.add_altered_tree(FeatureTypeDiff::new("Points", old.id(), new.id()));
        let text = patch.to_string();
        assert!(text.contains("R\tgeom[POINT]"));
        assert!(text.contains("A\trank[INTEGER]"));
        assert!(patch.is_empty());
        assert_eq!(patch.count(), 1);
    }
}
