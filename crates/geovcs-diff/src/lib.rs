//! Diff engine for geovcs.
//!
//! Compares two versions of a feature repository tree by tree, producing a
//! stream of structural events for pluggable consumers, and turns those
//! events into counts, bounds, flat change lists or serializable patches.
//!
//! # Key Types
//!
//! - [`PreOrderDiffWalk`] / [`PostOrderDiffWalk`] -- Parallel lock-step walks over two trees
//! - [`Consumer`] -- Receives walk events; decorated by the [`consumers`] module
//! - [`DiffCountConsumer`] / [`BoundsCollector`] / [`DiffEntryCollector`] -- Aggregators
//! - [`FeatureDiff`] / [`AttributeDiff`] / [`LcsGeometryDiff`] -- Attribute-level deltas
//! - [`Patch`] / [`PatchBuilder`] -- Serializable bundles of feature and schema changes
//! - [`TreeDifference`] -- Added, removed, renamed and retyped subtrees
//! - [`DepthTreeIterator`] -- Depth-first iteration over one tree

pub mod attribute;
pub mod bounds;
pub mod config;
pub mod consumers;
pub mod count;
pub mod depth_iter;
pub mod entry;
pub mod error;
pub mod feature_diff;
pub mod lcs;
pub mod patch;
pub mod patch_builder;
pub mod serializer;
pub mod tree_difference;
pub mod verify;
pub mod walk;

#[cfg(test)]
mod test_support;

pub use attribute::{AttributeDiff, DiffType, GenericAttributeDiff, GeometryAttributeDiff};
pub use bounds::BoundsCollector;
pub use config::{DiffConfig, WalkConfig};
pub use consumers::{FilteringConsumer, MaxFeatureDiffsLimiter, PathFilteringConsumer, SynchronizedConsumer};
pub use count::{DiffCountConsumer, DiffObjectCount};
pub use depth_iter::{DepthTreeIterator, Strategy};
pub use entry::{ChangeType, DiffEntry, DiffEntryCollector};
pub use error::{DiffError, DiffResult};
pub use feature_diff::{FeatureDiff, FeatureTypeDiff};
pub use lcs::LcsGeometryDiff;
pub use patch::{FeatureInfo, Patch};
pub use patch_builder::{create_patch, PatchBuilder};
pub use serializer::{read_patch, write_patch};
pub use tree_difference::{TreeChange, TreeDifference};
pub use verify::{verify_patch, VerifyPatchResults};
pub use walk::{
    BucketIndex, Consumer, NoopConsumer, PostOrderConsumer, PostOrderDiffWalk, PreOrderDiffWalk, WalkExecutor,
};
