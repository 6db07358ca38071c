//! Capture subsystem: cache keys and the response store.
//!
//! # Data Flow
//! ```text
//! original URL (path + query)
//!     → key.rs (flatten into CacheKey)
//!     → store.rs (exists / read / write `<dir>/<key>.json`)
//!     → record.rs (CapturedResponse <-> JSON file)
//! ```
//!
//! # Design Decisions
//! - Captures are immutable until a new capture for the same key replaces them
//! - No expiration or invalidation; entries live until removed by hand
//! - The on-disk format is stable across restarts

pub mod key;
pub mod record;
pub mod store;

pub use key::CacheKey;
pub use record::CapturedResponse;
pub use store::{FileStore, ResponseStore, StoreError};
