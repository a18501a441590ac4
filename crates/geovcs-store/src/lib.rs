//! Content-addressed object model and storage for geovcs.
//!
//! geovcs versions feature data the way git versions files: every tree,
//! feature, and feature type is an immutable object identified by the
//! BLAKE3 hash of its canonical form (domain-separated by object kind).
//!
//! # Object Types
//!
//! - [`RevTree`] -- direct child [`Node`]s, [`Bucket`] shards, or both
//! - [`RevFeature`] -- an ordered list of attribute values
//! - [`RevFeatureType`] -- the schema features conform to
//!
//! # Ordering
//!
//! [`CanonicalNodeOrder`] is the single total order over node names used to
//! sort children and to assign nodes to buckets at every depth. Readers and
//! writers must agree on it, so it lives next to the object model.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe; the diff walk issues them from many threads.
//! 3. Bulk operations report per-object outcomes through [`BulkOpListener`].
//! 4. A closed store fails every access with [`StoreError::Closed`].

pub mod builder;
pub mod error;
pub mod listener;
pub mod lookup;
pub mod memory;
pub mod node_ref;
pub mod object;
pub mod order;
pub mod text;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::CanonicalTreeBuilder;
pub use error::{StoreError, StoreResult};
pub use listener::{BulkOpListener, CompositeListener, CountingListener, NoopListener};
pub use lookup::{find_child, find_node, load_tree};
pub use memory::InMemoryObjectStore;
pub use node_ref::NodeRef;
pub use object::{
    AttributeDescriptor, Bounded, Bucket, Node, NodeType, ObjectKind, RevFeature, RevFeatureType,
    RevObject, RevTree,
};
pub use order::CanonicalNodeOrder;
pub use traits::ObjectStore;
