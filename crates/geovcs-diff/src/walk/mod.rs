//! Tree walks: the pre-order diff walk, its post-order derivation, and the
//! executor and consumer contract they share.

pub mod bucket_index;
pub mod consumer;
pub mod executor;
pub mod post_order;
pub mod pre_order;

pub use bucket_index::BucketIndex;
pub use consumer::{Consumer, NoopConsumer};
pub use executor::WalkExecutor;
pub use post_order::{PostOrderConsumer, PostOrderDiffWalk};
pub use pre_order::PreOrderDiffWalk;
