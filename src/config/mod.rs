//! Configuration Module
//!
//! Handles configuration loading, validation, and management.

mod types;

pub use types::*;
