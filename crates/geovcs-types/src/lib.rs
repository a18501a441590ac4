//! Foundation types for geovcs.
//!
//! geovcs stores feature data as content-addressed hash trees. This crate
//! holds the value-level vocabulary shared by the store and the diff engine.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Envelope`] -- Axis-aligned bounds used for spatial pruning
//! - [`Geometry`] -- Simple-feature geometries with a WKT codec
//! - [`FieldType`] / [`Value`] -- Attribute types and values with a text codec

pub mod envelope;
pub mod error;
pub mod geometry;
pub mod object;
pub mod value;

pub use envelope::Envelope;
pub use error::TypeError;
pub use geometry::{Coord, Geometry, GeometryType};
pub use object::ObjectId;
pub use value::{optional_from_text, optional_to_text, FieldType, Value, ABSENT_MARKER};
