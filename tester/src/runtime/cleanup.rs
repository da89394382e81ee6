//! Per-scenario cleanup of cluster resources
//!
//! Every topic or consumer group a scenario creates is registered here the
//! moment it exists. The runner drains the ledger once the scenario body has
//! finished, whatever the outcome, so one scenario's leftovers never bleed
//! into the next.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use shared::logging::log_tolerated;
use tracing::{debug, info, warn};

use crate::testing::steps::KafkaCli;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedResource {
    Topic(String),
    ConsumerGroup(String),
}

impl fmt::Display for TrackedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedResource::Topic(name) => write!(f, "topic '{}'", name),
            TrackedResource::ConsumerGroup(name) => write!(f, "consumer group '{}'", name),
        }
    }
}

/// Outcome of one cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub failed: Vec<TrackedResource>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Shared ledger of resources to delete when a scenario ends
#[derive(Debug, Clone, Default)]
pub struct CleanupManager {
    resources: Arc<Mutex<Vec<TrackedResource>>>,
}

impl CleanupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_topic(&self, name: impl Into<String>) {
        self.register(TrackedResource::Topic(name.into()));
    }

    pub fn register_group(&self, name: impl Into<String>) {
        self.register(TrackedResource::ConsumerGroup(name.into()));
    }

    /// Forget a resource the scenario already deleted itself
    pub fn forget(&self, resource: &TrackedResource) {
        self.lock().retain(|r| r != resource);
    }

    pub fn tracked(&self) -> Vec<TrackedResource> {
        self.lock().clone()
    }

    /// Delete every tracked resource: consumer groups first, then topics,
    /// newest first within each kind. Failures are logged and swallowed.
    pub async fn cleanup(&self, cli: &KafkaCli) -> CleanupReport {
        let drained: Vec<TrackedResource> = std::mem::take(&mut *self.lock());
        if drained.is_empty() {
            debug!("🧹 Nothing to clean up");
            return CleanupReport::default();
        }

        info!("🧹 Cleaning up {} resource(s)", drained.len());

        let groups = drained
            .iter()
            .rev()
            .filter(|r| matches!(r, TrackedResource::ConsumerGroup(_)));
        let topics = drained.iter().rev().filter(|r| matches!(r, TrackedResource::Topic(_)));

        let mut report = CleanupReport::default();
        for resource in groups.chain(topics) {
            report.attempted += 1;
            let step = match resource {
                TrackedResource::Topic(name) => cli.delete_topic(name).await,
                TrackedResource::ConsumerGroup(name) => cli.delete_group(name).await,
            };

            if step.check {
                debug!("🗑️ Deleted {}", resource);
            } else {
                log_tolerated(&format!("Cleanup of {}", resource), &step.result.brief());
                report.failed.push(resource.clone());
            }
        }

        if report.is_clean() {
            info!("✅ Cleanup completed ({} deleted)", report.attempted);
        } else {
            warn!(
                "⚠️ Cleanup finished with {} of {} deletions failing",
                report.failed.len(),
                report.attempted
            );
        }
        report
    }

    fn register(&self, resource: TrackedResource) {
        debug!("📌 Tracking {} for cleanup", resource);
        self.lock().push(resource);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TrackedResource>> {
        // A scenario that panicked mid-registration still leaves a usable ledger
        self.resources.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
