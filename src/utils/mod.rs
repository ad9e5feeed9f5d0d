//! Utility modules for common functionality

pub mod sanitize;
mod string;

pub use sanitize::{mask_pii, summarize_args};
pub use string::{collapse_whitespace, truncate_str};
