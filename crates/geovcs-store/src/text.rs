//! Line-oriented text records for features and feature types.
//!
//! These records are the canonical form hashed into object ids and the
//! payload embedded in patch files:
//!
//! ```text
//! FEATURE
//! STRING\tstation 12
//! POINT\tPOINT (1 2)
//! NULL\t
//! ```
//!
//! ```text
//! FEATURE_TYPE
//! name\tStations
//! label\tSTRING\ttrue
//! geom\tPOINT\ttrue\tEPSG:4326
//! ```

use std::fmt::Write as _;

use geovcs_types::{FieldType, Value};

use crate::error::{StoreError, StoreResult};
use crate::object::{AttributeDescriptor, RevFeature, RevFeatureType};

pub const FEATURE_HEADER: &str = "FEATURE";
pub const FEATURE_TYPE_HEADER: &str = "FEATURE_TYPE";

pub(crate) fn feature_text(values: &[Option<Value>]) -> String {
    let mut out = String::from(FEATURE_HEADER);
    out.push('\n');
    for value in values {
        let field_type = FieldType::of(value.as_ref());
        let text = value.as_ref().map(Value::to_text).unwrap_or_default();
        let _ = writeln!(out, "{field_type}\t{text}");
    }
    out
}

pub(crate) fn feature_type_text(name: &str, descriptors: &[AttributeDescriptor]) -> String {
    let mut out = String::from(FEATURE_TYPE_HEADER);
    out.push('\n');
    let _ = writeln!(out, "name\t{name}");
    for d in descriptors {
        let _ = write!(out, "{}\t{}\t{}", d.name, d.field_type, d.nillable);
        if let Some(crs) = &d.crs {
            let _ = write!(out, "\t{crs}");
        }
        out.push('\n');
    }
    out
}

/// Text record of a feature.
pub fn write_feature(feature: &RevFeature) -> String {
    feature_text(feature.values())
}

/// Text record of a feature type.
pub fn write_feature_type(feature_type: &RevFeatureType) -> String {
    feature_type_text(feature_type.name(), feature_type.descriptors())
}

/// Parse a feature record. Trailing blank lines are ignored.
pub fn read_feature(text: &str) -> StoreResult<RevFeature> {
    let mut lines = text.lines().filter(|l| !l.is_empty());
    match lines.next() {
        Some(FEATURE_HEADER) => {}
        other => {
            return Err(StoreError::malformed(
                "feature",
                format!("expected {FEATURE_HEADER} header, found {other:?}"),
            ))
        }
    }
    let mut values = Vec::new();
    for line in lines {
        let (type_name, value_text) = line
            .split_once('\t')
            .ok_or_else(|| StoreError::malformed("feature", format!("missing tab in {line:?}")))?;
        let field_type: FieldType = type_name.parse()?;
        values.push(Value::from_text(field_type, value_text)?);
    }
    Ok(RevFeature::new(values))
}

/// Parse a feature type record.
pub fn read_feature_type(text: &str) -> StoreResult<RevFeatureType> {
    let mut lines = text.lines().filter(|l| !l.is_empty());
    match lines.next() {
        Some(FEATURE_TYPE_HEADER) => {}
        other => {
            return Err(StoreError::malformed(
                "feature type",
                format!("expected {FEATURE_TYPE_HEADER} header, found {other:?}"),
            ))
        }
    }
    let name = lines
        .next()
        .and_then(|l| l.strip_prefix("name\t"))
        .ok_or_else(|| StoreError::malformed("feature type", "missing name line"))?
        .to_string();

    let mut descriptors = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split('\t').collect();
        if !(3..=4).contains(&tokens.len()) {
            return Err(StoreError::malformed(
                "feature type",
                format!("wrong attribute line {line:?}"),
            ));
        }
        let nillable = tokens[2].parse::<bool>().map_err(|e| {
            StoreError::malformed("feature type", format!("nillable flag {:?}: {e}", tokens[2]))
        })?;
        descriptors.push(AttributeDescriptor {
            name: tokens[0].to_string(),
            field_type: tokens[1].parse()?,
            nillable,
            crs: tokens.get(3).map(|crs| crs.to_string()),
        });
    }
    Ok(RevFeatureType::new(name, descriptors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geovcs_types::Geometry;

    fn sample_type() -> RevFeatureType {
        RevFeatureType::new(
            "Stations",
            vec![
                AttributeDescriptor::new("label", FieldType::String),
                AttributeDescriptor::new("rank", FieldType::Integer).required(),
                AttributeDescriptor::new("geom", FieldType::Point).with_crs("EPSG:4326"),
            ],
        )
    }

    #[test]
    fn feature_record_layout() {
        let feature = RevFeature::new(vec![
            Some(Value::String("station 12".into())),
            None,
            Some(Value::Geometry(Geometry::point(1.0, 2.0))),
        ]);
        assert_eq!(
            write_feature(&feature),
            "FEATURE\nSTRING\tstation 12\nNULL\t\nPOINT\tPOINT (1 2)\n"
        );
    }

    #[test]
    fn feature_roundtrip_preserves_id() {
        let feature = RevFeature::new(vec![
            Some(Value::String("tab\there".into())),
            Some(Value::Double(0.1)),
            None,
        ]);
        let parsed = read_feature(&write_feature(&feature)).unwrap();
        assert_eq!(parsed, feature);
        assert_eq!(parsed.id(), feature.id());
    }

    #[test]
    fn feature_type_roundtrip_preserves_id() {
        let ft = sample_type();
        let text = write_feature_type(&ft);
        assert!(text.starts_with("FEATURE_TYPE\nname\tStations\n"));
        assert!(text.contains("geom\tPOINT\ttrue\tEPSG:4326\n"));
        assert!(text.contains("rank\tINTEGER\tfalse\n"));
        let parsed = read_feature_type(&text).unwrap();
        assert_eq!(parsed, ft);
        assert_eq!(parsed.id(), ft.id());
    }

    #[test]
    fn rejects_wrong_headers_and_lines() {
        assert!(matches!(
            read_feature("FEATURE_TYPE\n"),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            read_feature("FEATURE\nINTEGER 1\n"),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            read_feature("FEATURE\nWHATEVER\t1\n"),
            Err(StoreError::Type(_))
        ));
        assert!(read_feature_type("FEATURE_TYPE\nlabel\tSTRING\ttrue\n").is_err());
        assert!(read_feature_type("FEATURE_TYPE\nname\tX\nlabel\tSTRING\n").is_err());
    }
}
