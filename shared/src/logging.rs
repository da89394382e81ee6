//! Shared logging utilities for consistent tracing across the harness

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

/// Build the filter directive used by the harness binary and library
pub fn filter_directive(log_level: &str) -> String {
    format!("kcli_tester={log_level},shared={log_level}")
}

/// Initialize tracing subscriber with the given base level
///
/// `RUST_LOG` takes precedence when set so a single run can be narrowed
/// without touching the command line.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let base_level = log_level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(base_level)));

    // try_init so tests and repeated setup don't panic on a second subscriber
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for scenario-aware info logging
#[macro_export]
macro_rules! scenario_info {
    ($scenario:expr, $($arg:tt)*) => {
        tracing::info!(
            scenario = %$scenario,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for scenario-aware warning logging
#[macro_export]
macro_rules! scenario_warn {
    ($scenario:expr, $($arg:tt)*) => {
        tracing::warn!(
            scenario = %$scenario,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for scenario-aware error logging
#[macro_export]
macro_rules! scenario_error {
    ($scenario:expr, $($arg:tt)*) => {
        tracing::error!(
            scenario = %$scenario,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for scenario-aware debug logging
#[macro_export]
macro_rules! scenario_debug {
    ($scenario:expr, $($arg:tt)*) => {
        tracing::debug!(
            scenario = %$scenario,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for conditions that are tolerated but worth a look
pub fn log_tolerated(context: &str, error: &dyn std::fmt::Display) {
    warn!(
        timestamp = format_timestamp(),
        error = %error,
        "⚠️ {} failed (ignored): {}",
        context,
        error
    );
}
