//! HTTP client module for the upstream data repositories.
//!
//! This module provides the `RemoteClient` for downloading random battle
//! set files, their probability stats, GitHub file metadata and Smogon
//! competitive sets. None of the endpoints require authentication.

pub mod client;
pub mod error;

pub use client::{RemoteClient, RemoteEndpoints};
pub use error::ApiError;
