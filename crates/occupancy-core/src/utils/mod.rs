//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{first_line, format_age, parse_leading_int, strip_html};
