//! Cache generations, storage backends and the serving strategies.
//!
//! A generation is a named bucket of request→response snapshots. Two live
//! generations exist at a time: one for immutable static assets, one for
//! dynamic/backend responses. Version bumps retire a generation wholesale;
//! the activate sweep in [`crate::lifecycle`] deletes anything not matching
//! the two current names.

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, MemoryStorage, SqliteStorage};
pub use traits::{CacheKey, CachedResponse, ServeSource, Served};
