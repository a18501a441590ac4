//! Consumer decorators.
//!
//! Each wraps another [`Consumer`](crate::walk::Consumer) and forwards the
//! events it lets through, so they stack in any order:
//!
//! ```ignore
//! let consumer = MaxFeatureDiffsLimiter::new(
//!     FilteringConsumer::intersecting(&collector, area),
//!     100,
//! );
//! walk.walk(&consumer)?;
//! ```

pub mod filtering;
pub mod limiter;
pub mod path_filter;
pub mod synchronized;

pub use filtering::FilteringConsumer;
pub use limiter::MaxFeatureDiffsLimiter;
pub use path_filter::PathFilteringConsumer;
pub use synchronized::SynchronizedConsumer;
