//! Value-level diffs between two versions of one feature attribute.
//!
//! Scalars are compared as whole values ([`GenericAttributeDiff`]); geometry
//! attributes carry a coordinate-level edit script
//! ([`GeometryAttributeDiff`]). Both serialize to a tab-separated line whose
//! first token is the [`DiffType`] code.

use std::fmt;

use geovcs_types::{optional_from_text, optional_to_text, FieldType, Geometry, Value, ABSENT_MARKER};

use crate::error::{DiffError, DiffResult};
use crate::lcs::LcsGeometryDiff;

/// Classification of an attribute change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffType {
    Added,
    Removed,
    Modified,
    NoChange,
}

impl DiffType {
    /// Single-letter code used in diff text.
    pub fn code(&self) -> char {
        match self {
            DiffType::Added => 'A',
            DiffType::Removed => 'R',
            DiffType::Modified => 'M',
            DiffType::NoChange => 'N',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(DiffType::Added),
            "R" => Some(DiffType::Removed),
            "M" => Some(DiffType::Modified),
            "N" => Some(DiffType::NoChange),
            _ => None,
        }
    }

    fn between<T: PartialEq>(old: Option<&T>, new: Option<&T>) -> Self {
        match (old, new) {
            _ if old == new => DiffType::NoChange,
            (None, Some(_)) => DiffType::Added,
            (Some(_), None) => DiffType::Removed,
            _ => DiffType::Modified,
        }
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffType::Added => "ADDED",
            DiffType::Removed => "REMOVED",
            DiffType::Modified => "MODIFIED",
            DiffType::NoChange => "NO_CHANGE",
        };
        f.write_str(name)
    }
}

fn split_code(text: &str) -> DiffResult<(DiffType, &str)> {
    let (code, rest) = text
        .split_once('\t')
        .ok_or_else(|| DiffError::WrongDifference(format!("missing diff type in {text:?}")))?;
    let diff_type = DiffType::from_code(code)
        .ok_or_else(|| DiffError::WrongDifference(format!("unknown diff type {code:?} in {text:?}")))?;
    Ok((diff_type, rest))
}

fn value_or_missing(value: Option<&Value>) -> String {
    value.map_or_else(|| "[MISSING]".to_string(), Value::to_text)
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Old and new value of a scalar attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericAttributeDiff {
    old: Option<Value>,
    new: Option<Value>,
}

impl GenericAttributeDiff {
    pub fn new(old: Option<Value>, new: Option<Value>) -> Self {
        Self { old, new }
    }

    pub fn old_value(&self) -> Option<&Value> {
        self.old.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.new.as_ref()
    }

    pub fn diff_type(&self) -> DiffType {
        DiffType::between(self.old.as_ref(), self.new.as_ref())
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.new.clone(), self.old.clone())
    }

    pub fn can_be_applied_on(&self, value: Option<&Value>) -> bool {
        match self.diff_type() {
            DiffType::Added => value.is_none(),
            DiffType::Removed | DiffType::Modified | DiffType::NoChange => value == self.old.as_ref(),
        }
    }

    pub fn apply_on(&self, value: Option<&Value>) -> DiffResult<Option<Value>> {
        if !self.can_be_applied_on(value) {
            return Err(DiffError::CannotApply(format!(
                "expected {}, found {}",
                optional_to_text(self.old.as_ref()),
                optional_to_text(value)
            )));
        }
        Ok(match self.diff_type() {
            DiffType::NoChange => value.cloned(),
            _ => self.new.clone(),
        })
    }

    pub fn conflicts(&self, other: &Self) -> bool {
        self.new != other.new
    }

    pub fn as_text(&self) -> String {
        let diff_type = self.diff_type();
        let code = diff_type.code();
        match diff_type {
            DiffType::Added => format!("{code}\t{}", optional_to_text(self.new.as_ref())),
            DiffType::Removed | DiffType::NoChange => {
                format!("{code}\t{}", optional_to_text(self.old.as_ref()))
            }
            DiffType::Modified => format!(
                "{code}\t{}\t{}",
                optional_to_text(self.old.as_ref()),
                optional_to_text(self.new.as_ref())
            ),
        }
    }

    pub fn from_text(field_type: FieldType, text: &str) -> DiffResult<Self> {
        let (diff_type, rest) = split_code(text)?;
        let tokens: Vec<&str> = rest.split('\t').collect();
        let parse = |token: &str| optional_from_text(field_type, token).map_err(DiffError::from);
        match (diff_type, tokens.as_slice()) {
            (DiffType::Added, [new]) => Ok(Self::new(None, parse(new)?)),
            (DiffType::Removed, [old]) => Ok(Self::new(parse(old)?, None)),
            (DiffType::NoChange, [old]) => {
                let old = parse(old)?;
                Ok(Self::new(old.clone(), old))
            }
            (DiffType::Modified, [old, new]) => Ok(Self::new(parse(old)?, parse(new)?)),
            _ => Err(DiffError::WrongDifference(format!(
                "wrong number of values for {diff_type} in {text:?}"
            ))),
        }
    }
}

impl fmt::Display for GenericAttributeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diff_type() {
            DiffType::NoChange => f.write_str(&value_or_missing(self.old.as_ref())),
            _ => write!(
                f,
                "{} -> {}",
                value_or_missing(self.old.as_ref()),
                value_or_missing(self.new.as_ref())
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometries
// ---------------------------------------------------------------------------

/// Change of a geometry attribute. Modifications keep only the coordinate
/// edit script, so they apply to any geometry it matches.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryAttributeDiff {
    Added(Geometry),
    Removed(Geometry),
    Modified(LcsGeometryDiff),
    Unchanged(Option<Geometry>),
}

impl GeometryAttributeDiff {
    pub fn between(old: Option<&Geometry>, new: Option<&Geometry>) -> Self {
        match (old, new) {
            _ if old == new => GeometryAttributeDiff::Unchanged(old.cloned()),
            (None, Some(new)) => GeometryAttributeDiff::Added(new.clone()),
            (Some(old), None) => GeometryAttributeDiff::Removed(old.clone()),
            (Some(old), Some(new)) => GeometryAttributeDiff::Modified(LcsGeometryDiff::new(old, new)),
            (None, None) => GeometryAttributeDiff::Unchanged(None),
        }
    }

    pub fn diff_type(&self) -> DiffType {
        match self {
            GeometryAttributeDiff::Added(_) => DiffType::Added,
            GeometryAttributeDiff::Removed(_) => DiffType::Removed,
            GeometryAttributeDiff::Modified(_) => DiffType::Modified,
            GeometryAttributeDiff::Unchanged(_) => DiffType::NoChange,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            GeometryAttributeDiff::Added(g) => GeometryAttributeDiff::Removed(g.clone()),
            GeometryAttributeDiff::Removed(g) => GeometryAttributeDiff::Added(g.clone()),
            GeometryAttributeDiff::Modified(lcs) => GeometryAttributeDiff::Modified(lcs.reversed()),
            GeometryAttributeDiff::Unchanged(g) => GeometryAttributeDiff::Unchanged(g.clone()),
        }
    }

    pub fn can_be_applied_on(&self, geometry: Option<&Geometry>) -> bool {
        match self {
            GeometryAttributeDiff::Added(_) => geometry.is_none(),
            GeometryAttributeDiff::Removed(old) => geometry == Some(old),
            GeometryAttributeDiff::Modified(lcs) => geometry.is_some_and(|g| lcs.can_be_applied_on(g)),
            GeometryAttributeDiff::Unchanged(old) => geometry == old.as_ref(),
        }
    }

    pub fn apply_on(&self, geometry: Option<&Geometry>) -> DiffResult<Option<Geometry>> {
        match self {
            GeometryAttributeDiff::Modified(lcs) => match geometry {
                Some(g) => lcs.apply_on(g).map(Some),
                None => Err(DiffError::CannotApply("geometry diff needs a geometry".to_string())),
            },
            _ if !self.can_be_applied_on(geometry) => Err(DiffError::CannotApply(format!(
                "{} geometry diff does not match {}",
                self.diff_type(),
                geometry.map_or_else(|| ABSENT_MARKER.to_string(), Geometry::to_wkt)
            ))),
            GeometryAttributeDiff::Added(new) => Ok(Some(new.clone())),
            GeometryAttributeDiff::Removed(_) => Ok(None),
            GeometryAttributeDiff::Unchanged(_) => Ok(geometry.cloned()),
        }
    }

    /// Two diffs conflict unless they leave the geometry in the same state.
    pub fn conflicts(&self, other: &Self) -> bool {
        match (self, other) {
            (GeometryAttributeDiff::Added(a), GeometryAttributeDiff::Added(b)) => a != b,
            (GeometryAttributeDiff::Removed(_), GeometryAttributeDiff::Removed(_)) => false,
            (GeometryAttributeDiff::Modified(a), GeometryAttributeDiff::Modified(b)) => a != b,
            (GeometryAttributeDiff::Unchanged(_), GeometryAttributeDiff::Unchanged(_)) => false,
            _ => true,
        }
    }

    pub fn as_text(&self) -> String {
        let code = self.diff_type().code();
        match self {
            GeometryAttributeDiff::Added(g) | GeometryAttributeDiff::Removed(g) => {
                format!("{code}\t{}", g.to_wkt())
            }
            GeometryAttributeDiff::Modified(lcs) => format!("{code}\t{}", lcs.as_text()),
            GeometryAttributeDiff::Unchanged(g) => format!(
                "{code}\t{}",
                g.as_ref().map_or_else(|| ABSENT_MARKER.to_string(), Geometry::to_wkt)
            ),
        }
    }

    pub fn from_text(text: &str) -> DiffResult<Self> {
        let (diff_type, rest) = split_code(text)?;
        Ok(match diff_type {
            DiffType::Added => GeometryAttributeDiff::Added(Geometry::from_wkt(rest)?),
            DiffType::Removed => GeometryAttributeDiff::Removed(Geometry::from_wkt(rest)?),
            DiffType::Modified => GeometryAttributeDiff::Modified(LcsGeometryDiff::from_text(rest)?),
            DiffType::NoChange if rest == ABSENT_MARKER => GeometryAttributeDiff::Unchanged(None),
            DiffType::NoChange => GeometryAttributeDiff::Unchanged(Some(Geometry::from_wkt(rest)?)),
        })
    }
}

impl fmt::Display for GeometryAttributeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryAttributeDiff::Added(g) => write!(f, "[MISSING] -> {g}"),
            GeometryAttributeDiff::Removed(g) => write!(f, "{g} -> [MISSING]"),
            GeometryAttributeDiff::Modified(lcs) => write!(f, "{} ({lcs})", lcs.diff_text()),
            GeometryAttributeDiff::Unchanged(Some(g)) => write!(f, "{g}"),
            GeometryAttributeDiff::Unchanged(None) => f.write_str("[MISSING]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Either kind
// ---------------------------------------------------------------------------

/// Diff of one attribute, picked by the attribute's declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeDiff {
    Generic(GenericAttributeDiff),
    Geometry(GeometryAttributeDiff),
}

impl AttributeDiff {
    /// Diff two values of an attribute declared as `field_type`. Geometry
    /// types get a coordinate diff as long as both values are geometries.
    pub fn between(field_type: FieldType, old: Option<&Value>, new: Option<&Value>) -> Self {
        if field_type.is_geometry() {
            if let (Some(old_geom), Some(new_geom)) = (geometry_or_absent(old), geometry_or_absent(new)) {
                return AttributeDiff::Geometry(GeometryAttributeDiff::between(old_geom, new_geom));
            }
        }
        AttributeDiff::Generic(GenericAttributeDiff::new(old.cloned(), new.cloned()))
    }

    pub fn diff_type(&self) -> DiffType {
        match self {
            AttributeDiff::Generic(d) => d.diff_type(),
            AttributeDiff::Geometry(d) => d.diff_type(),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            AttributeDiff::Generic(d) => AttributeDiff::Generic(d.reversed()),
            AttributeDiff::Geometry(d) => AttributeDiff::Geometry(d.reversed()),
        }
    }

    pub fn can_be_applied_on(&self, value: Option<&Value>) -> bool {
        match self {
            AttributeDiff::Generic(d) => d.can_be_applied_on(value),
            AttributeDiff::Geometry(d) => match geometry_or_absent(value) {
                Some(geometry) => d.can_be_applied_on(geometry),
                None => false,
            },
        }
    }

    pub fn apply_on(&self, value: Option<&Value>) -> DiffResult<Option<Value>> {
        match self {
            AttributeDiff::Generic(d) => d.apply_on(value),
            AttributeDiff::Geometry(d) => {
                let geometry = geometry_or_absent(value).ok_or_else(|| {
                    DiffError::CannotApply(format!("not a geometry: {}", optional_to_text(value)))
                })?;
                Ok(d.apply_on(geometry)?.map(Value::Geometry))
            }
        }
    }

    /// `true` if both diffs change the attribute and disagree on the result.
    pub fn conflicts(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeDiff::Generic(a), AttributeDiff::Generic(b)) => a.conflicts(b),
            (AttributeDiff::Geometry(a), AttributeDiff::Geometry(b)) => a.conflicts(b),
            _ => true,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            AttributeDiff::Generic(d) => d.as_text(),
            AttributeDiff::Geometry(d) => d.as_text(),
        }
    }

    /// Parse diff text for an attribute declared as `field_type`.
    pub fn from_text(field_type: FieldType, text: &str) -> DiffResult<Self> {
        if field_type.is_geometry() {
            GeometryAttributeDiff::from_text(text).map(AttributeDiff::Geometry)
        } else {
            GenericAttributeDiff::from_text(field_type, text).map(AttributeDiff::Generic)
        }
    }
}

impl fmt::Display for AttributeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeDiff::Generic(d) => fmt::Display::fmt(d, f),
            AttributeDiff::Geometry(d) => fmt::Display::fmt(d, f),
        }
    }
}

/// `Some(None)` for an absent value, `Some(Some(g))` for a geometry, `None`
/// for any other value.
fn geometry_or_absent(value: Option<&Value>) -> Option<Option<&Geometry>> {
    match value {
        None => Some(None),
        Some(v) => v.as_geometry().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn text(s: &str) -> Option<Value> {
        Some(Value::String(s.to_string()))
    }

    fn geom(wkt: &str) -> Option<Value> {
        Some(Value::Geometry(Geometry::from_wkt(wkt).unwrap()))
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn classifies_changes() {
        let cases = [
            (None, text("a"), DiffType::Added),
            (text("a"), None, DiffType::Removed),
            (text("a"), text("b"), DiffType::Modified),
            (text("a"), text("a"), DiffType::NoChange),
            (None, None, DiffType::NoChange),
        ];
        for (old, new, expected) in cases {
            let diff = AttributeDiff::between(FieldType::String, old.as_ref(), new.as_ref());
            assert_eq!(diff.diff_type(), expected);
        }
    }

    #[test]
    fn geometry_types_get_coordinate_diffs() {
        let diff = AttributeDiff::between(
            FieldType::Point,
            geom("POINT (0 0)").as_ref(),
            geom("POINT (1 1)").as_ref(),
        );
        assert!(matches!(diff, AttributeDiff::Geometry(GeometryAttributeDiff::Modified(_))));

        let mismatched = AttributeDiff::between(FieldType::Point, text("x").as_ref(), None);
        assert!(matches!(mismatched, AttributeDiff::Generic(_)));
    }

    // -----------------------------------------------------------------------
    // Apply / reverse
    // -----------------------------------------------------------------------

    #[test]
    fn applies_only_on_expected_value() {
        let diff = AttributeDiff::between(FieldType::Integer, Some(&Value::Integer(1)), Some(&Value::Integer(2)));
        assert!(diff.can_be_applied_on(Some(&Value::Integer(1))));
        assert!(!diff.can_be_applied_on(Some(&Value::Integer(5))));
        assert_eq!(diff.apply_on(Some(&Value::Integer(1))).unwrap(), Some(Value::Integer(2)));
        assert!(matches!(diff.apply_on(None), Err(DiffError::CannotApply(_))));

        let added = AttributeDiff::between(FieldType::Integer, None, Some(&Value::Integer(3)));
        assert!(added.can_be_applied_on(None));
        assert!(!added.can_be_applied_on(Some(&Value::Integer(3))));
    }

    #[test]
    fn reversed_undoes_the_change() {
        let old = geom("LINESTRING (0 0, 1 1, 2 2)");
        let new = geom("LINESTRING (0 0, 1.5 1.5, 2 2, 3 3)");
        let diff = AttributeDiff::between(FieldType::LineString, old.as_ref(), new.as_ref());
        let forward = diff.apply_on(old.as_ref()).unwrap();
        assert_eq!(forward, new);
        assert_eq!(diff.reversed().apply_on(forward.as_ref()).unwrap(), old);
    }

    #[test]
    fn unchanged_applies_only_on_same_value() {
        let generic = AttributeDiff::between(FieldType::String, text("a").as_ref(), text("a").as_ref());
        assert_eq!(generic.diff_type(), DiffType::NoChange);
        assert!(generic.can_be_applied_on(text("a").as_ref()));
        assert!(!generic.can_be_applied_on(text("b").as_ref()));
        assert!(!generic.can_be_applied_on(None));
        assert!(matches!(generic.apply_on(text("b").as_ref()), Err(DiffError::CannotApply(_))));

        let geometry = AttributeDiff::between(FieldType::Point, geom("POINT (1 1)").as_ref(), geom("POINT (1 1)").as_ref());
        assert!(geometry.can_be_applied_on(geom("POINT (1 1)").as_ref()));
        assert!(!geometry.can_be_applied_on(geom("POINT (3 3)").as_ref()));
        assert!(!geometry.can_be_applied_on(None));
        assert_eq!(geometry.apply_on(geom("POINT (1 1)").as_ref()).unwrap(), geom("POINT (1 1)"));
    }

    #[test]
    fn removed_geometry_must_match() {
        let diff = AttributeDiff::between(FieldType::Point, geom("POINT (1 1)").as_ref(), None);
        assert!(diff.can_be_applied_on(geom("POINT (1 1)").as_ref()));
        assert!(!diff.can_be_applied_on(geom("POINT (2 2)").as_ref()));
        assert_eq!(diff.apply_on(geom("POINT (1 1)").as_ref()).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    #[test]
    fn conflicts_unless_same_result() {
        let a = AttributeDiff::between(FieldType::String, text("x").as_ref(), text("y").as_ref());
        let b = AttributeDiff::between(FieldType::String, text("w").as_ref(), text("y").as_ref());
        let c = AttributeDiff::between(FieldType::String, text("x").as_ref(), text("z").as_ref());
        assert!(!a.conflicts(&b));
        assert!(a.conflicts(&c));

        let g1 = AttributeDiff::between(FieldType::Point, None, geom("POINT (1 1)").as_ref());
        let g2 = AttributeDiff::between(FieldType::Point, None, geom("POINT (2 2)").as_ref());
        assert!(g1.conflicts(&g2));
        assert!(!g1.conflicts(&g1.clone()));
    }

    #[test]
    fn unchanged_geometries_never_conflict() {
        let here = AttributeDiff::between(FieldType::Point, geom("POINT (1 1)").as_ref(), geom("POINT (1 1)").as_ref());
        let there = AttributeDiff::between(FieldType::Point, geom("POINT (2 2)").as_ref(), geom("POINT (2 2)").as_ref());
        let absent = AttributeDiff::between(FieldType::Point, None, None);
        assert!(!here.conflicts(&there));
        assert!(!here.conflicts(&absent));
        assert!(here.conflicts(&AttributeDiff::between(FieldType::Point, geom("POINT (1 1)").as_ref(), None)));
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    #[test]
    fn text_forms() {
        let modified = AttributeDiff::between(FieldType::String, text("a\tb").as_ref(), text("c").as_ref());
        assert_eq!(modified.as_text(), "M\ta\\tb\tc");
        let removed = AttributeDiff::between(FieldType::Integer, Some(&Value::Integer(4)), None);
        assert_eq!(removed.as_text(), "R\t4");
        let added = AttributeDiff::between(FieldType::Point, None, geom("POINT (1 2)").as_ref());
        assert_eq!(added.as_text(), "A\tPOINT (1 2)");
        let unchanged = AttributeDiff::between(FieldType::Point, None, None);
        assert_eq!(unchanged.as_text(), "N\t\\N");
        assert_eq!(AttributeDiff::from_text(FieldType::Point, "N\t\\N").unwrap(), unchanged);
    }

    #[test]
    fn geometry_text_roundtrip() {
        let diff = AttributeDiff::between(
            FieldType::Polygon,
            geom("POLYGON ((0 0, 4 0, 4 4, 0 0))").as_ref(),
            geom("POLYGON ((0 0, 5 0, 4 4, 0 0))").as_ref(),
        );
        assert_eq!(AttributeDiff::from_text(FieldType::Polygon, &diff.as_text()).unwrap(), diff);
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "M\t1", "A\t1\t2", "X\t1", "A"] {
            assert!(
                matches!(
                    AttributeDiff::from_text(FieldType::Integer, text),
                    Err(DiffError::WrongDifference(_))
                ),
                "{text:?}"
            );
        }
        assert!(matches!(
            AttributeDiff::from_text(FieldType::Integer, "A\tnot-a-number"),
            Err(DiffError::Type(_))
        ));
    }

    fn value_of(field_type: FieldType) -> BoxedStrategy<Value> {
        match field_type {
            FieldType::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
            FieldType::Byte => any::<i8>().prop_map(Value::Byte).boxed(),
            FieldType::Short => any::<i16>().prop_map(Value::Short).boxed(),
            FieldType::Integer => any::<i32>().prop_map(Value::Integer).boxed(),
            FieldType::Long => any::<i64>().prop_map(Value::Long).boxed(),
            FieldType::Float => prop::num::f32::NORMAL.prop_map(Value::Float).boxed(),
            FieldType::Double => prop::num::f64::NORMAL.prop_map(Value::Double).boxed(),
            FieldType::DateTime => (-4_000_000_000i64..4_000_000_000, 0u32..1_000_000_000)
                .prop_map(|(secs, nanos)| Value::DateTime(DateTime::<Utc>::from_timestamp(secs, nanos).unwrap()))
                .boxed(),
            FieldType::Uuid => any::<u128>().prop_map(|v| Value::Uuid(Uuid::from_u128(v))).boxed(),
            _ => ".{0,12}".prop_map(Value::String).boxed(),
        }
    }

    fn same_type_pair() -> impl Strategy<Value = (FieldType, Option<Value>, Option<Value>)> {
        prop_oneof![
            Just(FieldType::Boolean),
            Just(FieldType::Byte),
            Just(FieldType::Short),
            Just(FieldType::Integer),
            Just(FieldType::Long),
            Just(FieldType::Float),
            Just(FieldType::Double),
            Just(FieldType::String),
            Just(FieldType::DateTime),
            Just(FieldType::Uuid),
        ]
        .prop_flat_map(|field_type| {
            (
                Just(field_type),
                prop::option::of(value_of(field_type)),
                prop::option::of(value_of(field_type)),
            )
        })
    }

    proptest! {
        #[test]
        fn generic_text_roundtrip((field_type, old, new) in same_type_pair()) {
            let diff = AttributeDiff::between(field_type, old.as_ref(), new.as_ref());
            let parsed = AttributeDiff::from_text(field_type, &diff.as_text()).unwrap();
            prop_assert_eq!(parsed.diff_type(), diff.diff_type());
            prop_assert_eq!(parsed.as_text(), diff.as_text());
            prop_assert_eq!(parsed, diff);
        }
    }
}
