//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving
//! format data locally. Files are plain JSON, and the whole cache is
//! considered stale once the last update pass is older than the
//! configured interval (24 hours by default).
//!
//! Cached data types include:
//! - Random battle sets (with stats merged in)
//! - Upstream file metadata (git blob shas)
//! - Smogon competitive sets

pub mod manager;

pub use manager::CacheManager;
