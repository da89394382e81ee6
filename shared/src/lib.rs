//! Shared types for the CLI functional test harness
//!
//! Contains the error type, logging setup and identifiers used by both the
//! harness library and its binary.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
