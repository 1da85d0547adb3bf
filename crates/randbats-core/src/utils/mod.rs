//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{format_age, format_percent, normalize_name, title_case, truncate_string};
