//! Unique resource names for topics and consumer groups

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// `<prefix>_<millis>` identifier for a cluster resource created by a scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name built on top of this one, e.g. `<topic>_group`
    pub fn derive(&self, suffix: &str) -> ResourceName {
        ResourceName(format!("{}_{}", self.0, suffix))
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generates run-scoped names from a millisecond timestamp
///
/// Suffixes are strictly increasing within one generator: two calls in the
/// same millisecond get consecutive values instead of colliding.
#[derive(Debug)]
pub struct NameGenerator {
    run_prefix: String,
    last_millis: AtomicI64,
}

impl NameGenerator {
    pub fn new(run_prefix: impl Into<String>) -> Self {
        Self {
            run_prefix: run_prefix.into(),
            last_millis: AtomicI64::new(0),
        }
    }

    pub fn run_prefix(&self) -> &str {
        &self.run_prefix
    }

    /// Name under the run prefix, e.g. `clitest_1718000000123`
    pub fn next(&self) -> ResourceName {
        self.next_with(&self.run_prefix)
    }

    /// Name with a caller-supplied semantic prefix, e.g. `clitest_cg_reset_1718000000123`
    pub fn next_scoped(&self, scope: &str) -> ResourceName {
        self.next_with(&format!("{}_{}", self.run_prefix, scope))
    }

    fn next_with(&self, prefix: &str) -> ResourceName {
        let millis = self.next_millis();
        ResourceName(format!("{}_{}", prefix, millis))
    }

    fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::SeqCst);
        loop {
            let candidate = if now > last { now } else { last + 1 };
            match self
                .last_millis
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(observed) => last = observed,
            }
        }
    }
}
