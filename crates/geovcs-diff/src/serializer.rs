//! Line-oriented patch text.
//!
//! A patch is a sequence of records separated by blank lines:
//!
//! ```text
//! FEATURE_TYPE                          feature type (one header token)
//! name\tPoints
//! ...
//!
//! A\tPoints/p1\t<feature type id>       added (R for removed) feature
//! FEATURE
//! ...
//!
//! M\tPoints/p2\t<old type id>\t<new type id>
//! geom\tM\t0/0/1\t@@ -1,2 +1,2 @@\n...
//!
//! Points\t<old type id>\t<new type id>  altered tree
//! ```
//!
//! Feature types come first so every later record can resolve its ids.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use geovcs_store::text::{read_feature, read_feature_type, write_feature, write_feature_type};
use geovcs_store::{AttributeDescriptor, RevFeatureType};
use geovcs_types::ObjectId;
use tracing::debug;

use crate::attribute::{AttributeDiff, DiffType};
use crate::error::{DiffError, DiffResult};
use crate::feature_diff::{FeatureDiff, FeatureTypeDiff};
use crate::patch::{FeatureInfo, Patch};

/// Serialize `patch`.
pub fn write_patch(patch: &Patch) -> String {
    let mut out = String::new();
    for ft in patch.feature_types() {
        out.push_str(&write_feature_type(ft));
        out.push('\n');
    }
    for (code, infos) in [("A", patch.added_features()), ("R", patch.removed_features())] {
        for info in infos {
            let _ = writeln!(out, "{code}\t{}\t{}", info.path(), info.feature_type_id());
            out.push_str(&write_feature(info.feature()));
            out.push('\n');
        }
    }
    for diff in patch.modified_features() {
        let id = |ft: Option<&RevFeatureType>| ft.map_or(ObjectId::NULL, RevFeatureType::id);
        let _ = writeln!(
            out,
            "M\t{}\t{}\t{}",
            diff.path(),
            id(diff.old_feature_type()),
            id(diff.new_feature_type())
        );
        out.push_str(&diff.as_text());
        out.push('\n');
    }
    for diff in patch.altered_trees() {
        let _ = writeln!(out, "{diff}");
        out.push('\n');
    }
    out
}

/// Parse patch text produced by [`write_patch`].
pub fn read_patch(text: &str) -> DiffResult<Patch> {
    let mut patch = Patch::new();
    for record in records(text) {
        let header: Vec<&str> = record[0].split('\t').collect();
        match header.as_slice() {
            [_] => {
                let ft = read_feature_type(&record.join("\n"))?;
                patch.add_feature_type(ft);
            }
            [path, old, new] if record.len() == 1 => {
                patch.add_altered_tree(FeatureTypeDiff::new(*path, parse_id(old)?, parse_id(new)?));
            }
            [code @ ("A" | "R"), path, type_id] => {
                let type_id = parse_id(type_id)?;
                if patch.feature_type(&type_id).is_none() {
                    return Err(DiffError::UnknownFeatureType(type_id));
                }
                let feature = read_feature(&record[1..].join("\n"))?;
                let info = FeatureInfo::new(*path, feature, type_id);
                if *code == "A" {
                    patch.push_added(info);
                } else {
                    patch.push_removed(info);
                }
            }
            ["M", path, old, new] => {
                let diff = read_modified(&patch, path, parse_id(old)?, parse_id(new)?, &record[1..])?;
                patch.add_modified_feature(diff);
            }
            _ => {
                return Err(DiffError::WrongPatchContent(format!(
                    "unrecognized record header {:?}",
                    record[0]
                )))
            }
        }
    }
    debug!(
        added = patch.added_features().len(),
        removed = patch.removed_features().len(),
        modified = patch.modified_features().len(),
        altered_trees = patch.altered_trees().len(),
        "read patch"
    );
    Ok(patch)
}

/// Non-empty line groups separated by blank lines.
fn records(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn parse_id(text: &str) -> DiffResult<ObjectId> {
    text.parse()
        .map_err(|_| DiffError::WrongPatchContent(format!("bad object id {text:?}")))
}

fn lookup_type(patch: &Patch, id: ObjectId) -> DiffResult<Option<RevFeatureType>> {
    if id.is_null() {
        return Ok(None);
    }
    patch
        .feature_type(&id)
        .cloned()
        .map(Some)
        .ok_or(DiffError::UnknownFeatureType(id))
}

/// Attribute lines are written in descriptor order, and a name can belong
/// to two descriptors when the declared type changed: one only in the old
/// type, one only in the new. Each line takes the first unused descriptor
/// with its name that fits its diff kind: `R` needs the old type, `A` the
/// new one, `M` both.
fn read_modified(
    patch: &Patch,
    path: &str,
    old_id: ObjectId,
    new_id: ObjectId,
    lines: &[&str],
) -> DiffResult<FeatureDiff> {
    let old_type = lookup_type(patch, old_id)?;
    let new_type = lookup_type(patch, new_id)?;
    let in_type = |ft: &Option<RevFeatureType>, d: &AttributeDescriptor| ft.as_ref().is_some_and(|ft| ft.index_of(d).is_some());

    let mut diffs = BTreeMap::new();
    for line in lines {
        let (name, diff_text) = line
            .split_once('\t')
            .ok_or_else(|| DiffError::WrongPatchContent(format!("bad attribute diff line {line:?}")))?;
        let kind = diff_text.split('\t').next().and_then(DiffType::from_code);
        let mut candidates: Vec<&AttributeDescriptor> = [old_type.as_ref(), new_type.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|ft| ft.descriptor(name).map(|(_, d)| d))
            .collect();
        candidates.sort();
        candidates.dedup();
        let d = candidates
            .into_iter()
            .filter(|d| !diffs.contains_key(*d))
            .find(|d| match kind {
                Some(DiffType::Removed) => in_type(&old_type, d),
                Some(DiffType::Added) => in_type(&new_type, d),
                Some(DiffType::Modified) => in_type(&old_type, d) && in_type(&new_type, d),
                _ => true,
            })
            .cloned()
            .ok_or_else(|| DiffError::UnknownAttribute {
                path: path.to_string(),
                attribute: name.to_string(),
            })?;
        let diff = AttributeDiff::from_text(d.field_type, diff_text)?;
        diffs.insert(d, diff);
    }
    Ok(FeatureDiff::new(path, diffs, old_type, new_type))
}
