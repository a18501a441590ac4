//! Attribute values and their text codec.
//!
//! Every value has a single-line text form keyed by its [`FieldType`]. The
//! same codec backs the feature record format and attribute diff text, so
//! it must round-trip exactly: strings escape backslash, tab, CR and LF,
//! floats use the shortest representation that parses back to the same bits,
//! date-times are epoch milliseconds (with a fractional part when they
//! carry sub-millisecond precision), and geometries are WKT.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;
use crate::geometry::{Geometry, GeometryType};

/// Marker for an absent value inside diff text.
pub const ABSENT_MARKER: &str = "\\N";

/// Declared type of a feature attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    Null,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Uuid,
    DateTime,
    Geometry,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl FieldType {
    pub const ALL: [FieldType; 18] = [
        FieldType::Null,
        FieldType::Boolean,
        FieldType::Byte,
        FieldType::Short,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Float,
        FieldType::Double,
        FieldType::String,
        FieldType::Uuid,
        FieldType::DateTime,
        FieldType::Geometry,
        FieldType::Point,
        FieldType::LineString,
        FieldType::Polygon,
        FieldType::MultiPoint,
        FieldType::MultiLineString,
        FieldType::MultiPolygon,
    ];

    /// Upper-case tag used in text records.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Null => "NULL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Byte => "BYTE",
            FieldType::Short => "SHORT",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::String => "STRING",
            FieldType::Uuid => "UUID",
            FieldType::DateTime => "DATETIME",
            FieldType::Geometry => "GEOMETRY",
            FieldType::Point => "POINT",
            FieldType::LineString => "LINESTRING",
            FieldType::Polygon => "POLYGON",
            FieldType::MultiPoint => "MULTIPOINT",
            FieldType::MultiLineString => "MULTILINESTRING",
            FieldType::MultiPolygon => "MULTIPOLYGON",
        }
    }

    /// `true` for `GEOMETRY` and the concrete geometry types.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            FieldType::Geometry
                | FieldType::Point
                | FieldType::LineString
                | FieldType::Polygon
                | FieldType::MultiPoint
                | FieldType::MultiLineString
                | FieldType::MultiPolygon
        )
    }

    /// The field type a value is recorded under; `NULL` for absent values.
    pub fn of(value: Option<&Value>) -> FieldType {
        value.map_or(FieldType::Null, Value::field_type)
    }

    fn of_geometry(geometry_type: GeometryType) -> FieldType {
        match geometry_type {
            GeometryType::Point => FieldType::Point,
            GeometryType::LineString => FieldType::LineString,
            GeometryType::Polygon => FieldType::Polygon,
            GeometryType::MultiPoint => FieldType::MultiPoint,
            GeometryType::MultiLineString => FieldType::MultiLineString,
            GeometryType::MultiPolygon => FieldType::MultiPolygon,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TypeError::UnknownFieldType(s.to_string()))
    }
}

/// A present attribute value. Absence is modelled as `Option<Value>::None`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Geometry(Geometry),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Boolean(_) => FieldType::Boolean,
            Value::Byte(_) => FieldType::Byte,
            Value::Short(_) => FieldType::Short,
            Value::Integer(_) => FieldType::Integer,
            Value::Long(_) => FieldType::Long,
            Value::Float(_) => FieldType::Float,
            Value::Double(_) => FieldType::Double,
            Value::String(_) => FieldType::String,
            Value::Uuid(_) => FieldType::Uuid,
            Value::DateTime(_) => FieldType::DateTime,
            Value::Geometry(g) => FieldType::of_geometry(g.geometry_type()),
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Single-line text form of this value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Boolean(v) => v.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::String(v) => escape(v),
            Value::Uuid(v) => v.hyphenated().to_string(),
            Value::DateTime(v) => datetime_to_text(v),
            Value::Geometry(v) => v.to_wkt(),
        }
    }

    /// Parse the text form of a value of the given type. `NULL` always
    /// yields `None`.
    pub fn from_text(field_type: FieldType, text: &str) -> Result<Option<Value>, TypeError> {
        let value = match field_type {
            FieldType::Null => return Ok(None),
            FieldType::Boolean => Value::Boolean(parse_scalar(field_type, text)?),
            FieldType::Byte => Value::Byte(parse_scalar(field_type, text)?),
            FieldType::Short => Value::Short(parse_scalar(field_type, text)?),
            FieldType::Integer => Value::Integer(parse_scalar(field_type, text)?),
            FieldType::Long => Value::Long(parse_scalar(field_type, text)?),
            FieldType::Float => Value::Float(parse_scalar(field_type, text)?),
            FieldType::Double => Value::Double(parse_scalar(field_type, text)?),
            FieldType::String => Value::String(
                unescape(text).map_err(|reason| invalid_value(field_type, text, reason))?,
            ),
            FieldType::Uuid => Value::Uuid(parse_scalar(field_type, text)?),
            FieldType::DateTime => Value::DateTime(
                datetime_from_text(text).map_err(|reason| invalid_value(field_type, text, reason))?,
            ),
            FieldType::Geometry
            | FieldType::Point
            | FieldType::LineString
            | FieldType::Polygon
            | FieldType::MultiPoint
            | FieldType::MultiLineString
            | FieldType::MultiPolygon => Value::Geometry(Geometry::from_wkt(text)?),
        };
        Ok(Some(value))
    }
}

/// Text form of an optional value: [`ABSENT_MARKER`] for `None`.
pub fn optional_to_text(value: Option<&Value>) -> String {
    value.map_or_else(|| ABSENT_MARKER.to_string(), Value::to_text)
}

/// Inverse of [`optional_to_text`].
pub fn optional_from_text(field_type: FieldType, text: &str) -> Result<Option<Value>, TypeError> {
    if text == ABSENT_MARKER {
        Ok(None)
    } else {
        Value::from_text(field_type, text)
    }
}

const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Epoch milliseconds as a decimal, e.g. `1700000000123` or
/// `1700000000123.456789`.
fn datetime_to_text(dt: &DateTime<Utc>) -> String {
    let nanos = i128::from(dt.timestamp()) * NANOS_PER_SEC + i128::from(dt.timestamp_subsec_nanos());
    let sign = if nanos < 0 { "-" } else { "" };
    let (millis, frac) = (nanos.abs() / NANOS_PER_MILLI, nanos.abs() % NANOS_PER_MILLI);
    if frac == 0 {
        format!("{sign}{millis}")
    } else {
        let digits = format!("{frac:06}");
        format!("{sign}{millis}.{}", digits.trim_end_matches('0'))
    }
}

fn datetime_from_text(text: &str) -> Result<DateTime<Utc>, String> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(frac) || frac.len() > 6 {
        return Err("expected epoch milliseconds".to_string());
    }
    let millis: i128 = whole.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
    let frac_nanos: i128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<6}").parse().map_err(|e: std::num::ParseIntError| e.to_string())?
    };
    let magnitude = millis * NANOS_PER_MILLI + frac_nanos;
    let nanos = if negative { -magnitude } else { magnitude };
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).map_err(|e| e.to_string())?;
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).map_err(|e| e.to_string())?;
    DateTime::<Utc>::from_timestamp(secs, subsec).ok_or_else(|| "timestamp out of range".to_string())
}

fn invalid_value(field_type: FieldType, text: &str, reason: String) -> TypeError {
    TypeError::InvalidValue {
        field_type: field_type.name().to_string(),
        text: text.to_string(),
        reason,
    }
}

fn parse_scalar<T>(field_type: FieldType, text: &str) -> Result<T, TypeError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| invalid_value(field_type, text, e.to_string()))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("unknown escape \\{other}")),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}
