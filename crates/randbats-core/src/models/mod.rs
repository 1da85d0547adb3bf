//! Data models for random battle data.
//!
//! - `FormatData`, `RandomSet`: raw format files and a typed view of one set
//! - `FormatMetadata`: upstream version info kept beside each cached file
//! - `StatsSummary`, `CacheInfo`: reporting types

pub mod metadata;
pub mod set;
pub mod summary;

pub use metadata::FormatMetadata;
pub use set::{FormatData, RandomSet};
pub use summary::{CacheInfo, StatsSummary};
