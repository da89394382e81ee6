//! Configuration Management
//!
//! Harness settings and their builder.

pub mod builder;
pub mod harness;

// Re-export main types
pub use builder::HarnessConfigBuilder;
pub use harness::HarnessConfig;
