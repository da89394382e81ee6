//! Extraction of structured facts from CLI text output

use std::collections::BTreeSet;

use super::markers;

/// One row of the `consumer-groups describe` offsets table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOffset {
    pub topic: String,
    pub partition: i32,
    pub current_offset: i64,
    pub log_end_offset: i64,
    pub lag: i64,
}

/// Topic names from `topics list` output (indented lines under the header)
pub fn topic_names(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter(|line| line.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| *name != markers::TOPICS_HEADER && *name != markers::NO_TOPICS)
        .map(str::to_string)
        .collect()
}

/// Partition count from `topics describe` output
pub fn partition_count(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(markers::PARTITIONS_PREFIX))
        .find_map(|rest| rest.trim().parse().ok())
}

/// Rows of the offsets table from `consumer-groups describe` output
pub fn offset_table(stdout: &str) -> Vec<PartitionOffset> {
    stdout
        .lines()
        .skip_while(|line| !line.contains(markers::OFFSETS_TABLE_HEADER))
        .skip(1)
        .filter_map(parse_offset_row)
        .collect()
}

fn parse_offset_row(line: &str) -> Option<PartitionOffset> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [topic, partition, current, log_end, lag] = fields.as_slice() else {
        return None;
    };
    Some(PartitionOffset {
        topic: topic.to_string(),
        partition: partition.parse().ok()?,
        current_offset: current.parse().ok()?,
        log_end_offset: log_end.parse().ok()?,
        lag: lag.parse().ok()?,
    })
}

/// Committed offset of one partition, if the table lists it
pub fn committed_offset(rows: &[PartitionOffset], topic: &str, partition: i32) -> Option<i64> {
    rows.iter()
        .find(|row| row.topic == topic && row.partition == partition)
        .map(|row| row.current_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "Topics:\n  __consumer_offsets\n  clitest_1\n  clitest_2\n";

    const DESCRIBE_GROUP: &str = "
Consumer Group: g1
  State: Empty
  Members: 0

  Offsets:
    TOPIC                          PARTITION  CURRENT-OFFSET  LOG-END-OFFSET  LAG
    clitest_9                      0          0               3               3
    clitest_9                      1          0               3               3
    clitest_9                      2          3               3               0
";

    #[test]
    fn test_topic_names_ignores_header_and_order() {
        let names = topic_names(LIST);
        assert_eq!(names.len(), 3);
        assert!(names.contains("clitest_1"));

        let reordered = "Topics:\n  clitest_2\n  __consumer_offsets\n  clitest_1\n";
        assert_eq!(topic_names(reordered), names);
    }

    #[test]
    fn test_topic_names_empty_cluster() {
        assert!(topic_names("No topics found\n").is_empty());
        assert!(topic_names("").is_empty());
    }

    #[test]
    fn test_partition_count_from_describe() {
        let out = "\nTopic: t\n  Partitions: 5\n    Partition 0: Leader: 1, Replicas: [1], ISR: [1]\n";
        assert_eq!(partition_count(out), Some(5));
        assert_eq!(partition_count("Topic: t\n"), None);
    }

    #[test]
    fn test_offset_table_rows() {
        let rows = offset_table(DESCRIBE_GROUP);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            PartitionOffset {
                topic: "clitest_9".into(),
                partition: 2,
                current_offset: 3,
                log_end_offset: 3,
                lag: 0,
            }
        );
        assert_eq!(committed_offset(&rows, "clitest_9", 0), Some(0));
        assert_eq!(committed_offset(&rows, "clitest_9", 7), None);
    }

    #[test]
    fn test_offset_table_absent() {
        let out = "Consumer Group: g\n  State: Empty\n\n  No committed offsets found\n";
        assert!(offset_table(out).is_empty());
    }
}
