//! Literal output markers of the CLI under test
//!
//! The CLI has no machine-readable output mode, so these substrings are the
//! contract every step predicate checks against. Keep them here and nowhere
//! else.

/// `--help` description line
pub const HELP_ABOUT: &str = "A cross-platform Kafka CLI tool";

/// Subcommands `--help` must advertise
pub const HELP_SUBCOMMANDS: [&str; 3] = ["topics", "produce", "consume"];

/// Binary name printed by `--version`
pub const VERSION_BINARY_NAME: &str = "kafka-cli";

/// `topics create` success, matched case-insensitively
pub const TOPIC_CREATED: &str = "created successfully";

/// `topics list` header and empty-cluster line
pub const TOPICS_HEADER: &str = "Topics:";
pub const NO_TOPICS: &str = "No topics found";

/// `topics describe` partition count prefix, followed by the number
pub const PARTITIONS_PREFIX: &str = "Partitions: ";
pub const LEADER: &str = "Leader:";
pub const REPLICAS: &str = "Replicas:";

/// `configs alter` success
pub const CONFIGS_ALTERED: &str = "Successfully altered configs";

/// `consumer-groups list`
pub const GROUPS_HEADER: &str = "Consumer Groups:";
pub const NO_GROUPS: &str = "No consumer groups found";

/// `consumer-groups describe`
pub const GROUP_STATE: &str = "State:";
pub const NO_COMMITTED_OFFSETS: &str = "No committed offsets found";
pub const OFFSETS_TABLE_HEADER: &str = "CURRENT-OFFSET";

/// `consumer-groups reset-offsets`
pub const DRY_RUN: &str = "DRY RUN";
pub const RESET_SUCCESS: &str = "Successfully reset offsets";
pub const RESET_BY_TIMESTAMP: &str = "By timestamp";
pub const RESET_DATETIME: &str = "DateTime:";

/// `consumer-groups delete` refusal while a member is connected, matched case-insensitively
pub const ACTIVE_MEMBER: &str = "active member";

/// Generic failure tokens
pub const ERROR: &str = "Error";
pub const FAILED: &str = "Failed";

/// Partition filter as echoed by `reset-offsets`, e.g. `partitions: [0, 1]`
pub fn partition_filter(partitions: &[i32]) -> String {
    format!("partitions: {:?}", partitions)
}

/// One entry of `configs describe`, e.g. `retention.ms = 86400000`
pub fn config_entry(key: &str, value: &str) -> String {
    format!("{} = {}", key, value)
}

/// Partition count line of `topics describe`, e.g. `Partitions: 3`
pub fn partition_count(count: u32) -> String {
    format!("{}{}", PARTITIONS_PREFIX, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_filter_rendering() {
        assert_eq!(partition_filter(&[0, 1]), "partitions: [0, 1]");
        assert_eq!(partition_filter(&[2]), "partitions: [2]");
    }

    #[test]
    fn test_config_entry_rendering() {
        assert_eq!(config_entry("retention.ms", "86400000"), "retention.ms = 86400000");
    }

    #[test]
    fn test_partition_count_rendering() {
        assert_eq!(partition_count(3), "Partitions: 3");
    }
}
