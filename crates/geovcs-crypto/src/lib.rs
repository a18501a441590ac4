//! Content hashing for geovcs.
//!
//! Object ids are BLAKE3 digests of an object's canonical form, prefixed with
//! a per-kind domain tag so that a tree and a feature with identical bytes
//! never share an id.

pub mod hasher;

pub use hasher::ContentHasher;
