//! Feature-level and schema-level diffs.

use std::collections::BTreeMap;
use std::fmt;

use geovcs_store::{AttributeDescriptor, RevFeature, RevFeatureType};
use geovcs_types::{ObjectId, Value};

use crate::attribute::AttributeDiff;
use crate::error::{DiffError, DiffResult};

/// Per-attribute differences between two versions of the feature at `path`.
///
/// Attributes are paired by descriptor identity (name, type, nillability and
/// CRS), so changing an attribute's declared type reports a removal of the
/// old descriptor plus an addition of the new one.
#[derive(Clone, Debug)]
pub struct FeatureDiff {
    path: String,
    diffs: BTreeMap<AttributeDescriptor, AttributeDiff>,
    old_type: Option<RevFeatureType>,
    new_type: Option<RevFeatureType>,
}

impl FeatureDiff {
    pub fn new(
        path: impl Into<String>,
        diffs: BTreeMap<AttributeDescriptor, AttributeDiff>,
        old_type: Option<RevFeatureType>,
        new_type: Option<RevFeatureType>,
    ) -> Self {
        Self {
            path: path.into(),
            diffs,
            old_type,
            new_type,
        }
    }

    /// Diff two versions of a feature. Either side may be absent for a pure
    /// addition or removal, but each present feature needs its type. With
    /// `all`, unchanged attributes shared by both types are kept too.
    pub fn between(
        path: impl Into<String>,
        old: Option<(&RevFeature, &RevFeatureType)>,
        new: Option<(&RevFeature, &RevFeatureType)>,
        all: bool,
    ) -> DiffResult<Self> {
        let path = path.into();
        let mut diffs = BTreeMap::new();
        match (old, new) {
            (None, None) => {
                return Err(DiffError::WrongDifference(format!(
                    "no feature on either side of {path}"
                )))
            }
            (Some((feature, ft)), None) => {
                for (i, d) in ft.descriptors().iter().enumerate() {
                    diffs.insert(d.clone(), AttributeDiff::between(d.field_type, feature.get(i), None));
                }
            }
            (None, Some((feature, ft))) => {
                for (i, d) in ft.descriptors().iter().enumerate() {
                    diffs.insert(d.clone(), AttributeDiff::between(d.field_type, None, feature.get(i)));
                }
            }
            (Some((old_feature, old_ft)), Some((new_feature, new_ft))) => {
                let mut matched = vec![false; new_ft.descriptors().len()];
                for (i, d) in old_ft.descriptors().iter().enumerate() {
                    let old_value = old_feature.get(i);
                    match new_ft.index_of(d) {
                        Some(j) => {
                            matched[j] = true;
                            let new_value = new_feature.get(j);
                            if all || old_value != new_value {
                                diffs.insert(d.clone(), AttributeDiff::between(d.field_type, old_value, new_value));
                            }
                        }
                        None => {
                            diffs.insert(d.clone(), AttributeDiff::between(d.field_type, old_value, None));
                        }
                    }
                }
                for (j, d) in new_ft.descriptors().iter().enumerate() {
                    if !matched[j] {
                        diffs.insert(d.clone(), AttributeDiff::between(d.field_type, None, new_feature.get(j)));
                    }
                }
            }
        }
        Ok(Self::new(
            path,
            diffs,
            old.map(|(_, ft)| ft.clone()),
            new.map(|(_, ft)| ft.clone()),
        ))
    }

    /// Full path of the feature, including its name.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn diffs(&self) -> &BTreeMap<AttributeDescriptor, AttributeDiff> {
        &self.diffs
    }

    pub fn old_feature_type(&self) -> Option<&RevFeatureType> {
        self.old_type.as_ref()
    }

    pub fn new_feature_type(&self) -> Option<&RevFeatureType> {
        self.new_type.as_ref()
    }

    /// `false` when no attribute changed. Diffs built with `all` also count
    /// their unchanged entries.
    pub fn has_differences(&self) -> bool {
        !self.diffs.is_empty()
    }

    pub fn reversed(&self) -> Self {
        Self {
            path: self.path.clone(),
            diffs: self
                .diffs
                .iter()
                .map(|(d, diff)| (d.clone(), diff.reversed()))
                .collect(),
            old_type: self.new_type.clone(),
            new_type: self.old_type.clone(),
        }
    }

    /// `true` if any attribute both diffs touch is changed incompatibly.
    pub fn conflicts(&self, other: &FeatureDiff) -> bool {
        other
            .diffs
            .iter()
            .any(|(d, theirs)| self.diffs.get(d).is_some_and(|ours| ours.conflicts(theirs)))
    }

    /// `true` if every attribute diff matches the corresponding value of
    /// `feature`; attributes `feature_type` lacks count as absent.
    pub fn can_be_applied_on(&self, feature: &RevFeature, feature_type: &RevFeatureType) -> bool {
        self.diffs
            .iter()
            .all(|(d, diff)| diff.can_be_applied_on(value_of(feature, feature_type, d)))
    }

    /// Apply to a feature of type `feature_type`, producing a feature laid out
    /// by the diff's new type (or `feature_type` when the diff has none).
    pub fn apply_on(&self, feature: &RevFeature, feature_type: &RevFeatureType) -> DiffResult<RevFeature> {
        if !self.can_be_applied_on(feature, feature_type) {
            return Err(DiffError::CannotApply(format!(
                "feature at {} does not match the diff",
                self.path
            )));
        }
        let target = self.new_type.as_ref().unwrap_or(feature_type);
        let values = target
            .descriptors()
            .iter()
            .map(|d| {
                let current = value_of(feature, feature_type, d);
                match self.diffs.get(d) {
                    Some(diff) => diff.apply_on(current),
                    None => Ok(current.cloned()),
                }
            })
            .collect::<DiffResult<Vec<_>>>()?;
        Ok(RevFeature::new(values))
    }

    /// One `<attribute>\t<diff text>` line per attribute.
    pub fn as_text(&self) -> String {
        self.diffs
            .iter()
            .map(|(d, diff)| format!("{}\t{}\n", d.name, diff.as_text()))
            .collect()
    }
}

fn value_of<'a>(
    feature: &'a RevFeature,
    feature_type: &RevFeatureType,
    descriptor: &AttributeDescriptor,
) -> Option<&'a Value> {
    feature_type.index_of(descriptor).and_then(|i| feature.get(i))
}

impl PartialEq for FeatureDiff {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.as_text() == other.as_text()
    }
}

impl fmt::Display for FeatureDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (d, diff) in &self.diffs {
            writeln!(f, "{}\t{}", d.name, diff)?;
        }
        Ok(())
    }
}

/// Change of the feature type recorded for the tree at `path`. A missing
/// side is [`ObjectId::NULL`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureTypeDiff {
    path: String,
    old: ObjectId,
    new: ObjectId,
}

impl FeatureTypeDiff {
    pub fn new(path: impl Into<String>, old: ObjectId, new: ObjectId) -> Self {
        Self {
            path: path.into(),
            old,
            new,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn old_feature_type(&self) -> ObjectId {
        self.old
    }

    pub fn new_feature_type(&self) -> ObjectId {
        self.new
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.path.clone(), self.new, self.old)
    }
}

impl fmt::Display for FeatureTypeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.path, self.old, self.new)
    }
}
