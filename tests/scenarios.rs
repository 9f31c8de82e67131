//! Worked end-to-end scenarios exercising each merge algorithm and the
//! table operations that usually surround them in a real pipeline.

use caret_records::{ColumnValue, GroupedRecords, JoinHow, Record, Records, SequentialHow};

/// Installs a subscriber so the `#[tracing::instrument]` spans on the merge
/// entry points print under `cargo test -- --nocapture`. Safe to call from
/// every test; `try_init` is a no-op once a global subscriber is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn records(columns: &[&str], rows: &[&[(&str, u64)]]) -> Records {
    let cols = columns.iter().map(|c| ColumnValue::new(*c)).collect();
    let rows = rows
        .iter()
        .map(|row| Record::from_iter(row.iter().map(|(k, v)| (*k, *v))))
        .collect();
    Records::new(Some(rows), cols).unwrap()
}

#[test]
fn scenario_keyed_inner_join_matches_by_key() {
    init_tracing();
    let left = records(
        &["node_id", "callback_count"],
        &[&[("node_id", 1), ("callback_count", 5)], &[("node_id", 2), ("callback_count", 7)]],
    );
    let right = records(
        &["node_id", "subscription_count"],
        &[&[("node_id", 1), ("subscription_count", 2)]],
    );
    let merged = left
        .merge(&right, &["node_id".to_string()], &["node_id".to_string()], JoinHow::Inner)
        .unwrap();
    assert_eq!(merged.len(), 1);
    let row = merged.get_row(0).unwrap();
    assert_eq!(row.get("callback_count").unwrap(), 5);
    assert_eq!(row.get("subscription_count").unwrap(), 2);
}

#[test]
fn scenario_keyed_outer_join_surfaces_both_unmatched_sides() {
    let left = records(&["id", "a"], &[&[("id", 1), ("a", 10)]]);
    let right = records(&["id", "b"], &[&[("id", 2), ("b", 20)]]);
    let merged = left
        .merge(&right, &["id".to_string()], &["id".to_string()], JoinHow::Outer)
        .unwrap();
    assert_eq!(merged.len(), 2);
    let ids: Vec<u64> = merged
        .data()
        .iter()
        .map(|r| r.get_with_default("id", 0))
        .collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&2));
}

#[test]
fn scenario_sequential_merge_binds_callback_to_next_publish() {
    init_tracing();
    let callback = records(
        &["callback_start_timestamp", "topic"],
        &[&[("callback_start_timestamp", 100), ("topic", 1)]],
    );
    let publish = records(
        &["rclcpp_publish_timestamp", "topic"],
        &[&[("rclcpp_publish_timestamp", 150), ("topic", 1)]],
    );
    let merged = callback
        .merge_sequential(
            &publish,
            "callback_start_timestamp",
            "rclcpp_publish_timestamp",
            &["topic".to_string()],
            &["topic".to_string()],
            SequentialHow::Inner,
        )
        .unwrap();
    assert_eq!(merged.len(), 1);
    let row = merged.get_row(0).unwrap();
    assert_eq!(row.get("callback_start_timestamp").unwrap(), 100);
    assert_eq!(row.get("rclcpp_publish_timestamp").unwrap(), 150);
}

#[test]
fn scenario_sequential_merge_left_use_latest_binds_every_later_event() {
    let callback = records(
        &["stamp", "topic"],
        &[&[("stamp", 100), ("topic", 1)]],
    );
    let publish = records(
        &["stamp", "topic"],
        &[&[("stamp", 120), ("topic", 1)], &[("stamp", 140), ("topic", 1)]],
    );
    let merged = callback
        .merge_sequential(
            &publish,
            "stamp",
            "stamp",
            &["topic".to_string()],
            &["topic".to_string()],
            SequentialHow::LeftUseLatest,
        )
        .unwrap();
    assert_eq!(merged.len(), 2);
}

#[test]
fn scenario_groupby_partitions_by_node() {
    let records_table = records(
        &["node_id", "latency"],
        &[
            &[("node_id", 1), ("latency", 10)],
            &[("node_id", 1), ("latency", 20)],
            &[("node_id", 2), ("latency", 30)],
        ],
    );
    let groups = records_table.groupby(&["node_id".to_string()]).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups.get(&vec![1u64]).unwrap().len(), 2);
}

#[test]
fn scenario_grouped_records_get_on_miss_returns_empty_same_schema() {
    let records_table = records(&["node_id", "latency"], &[&[("node_id", 1), ("latency", 10)]]);
    let grouped = GroupedRecords::new(&records_table, &["node_id".to_string()]).unwrap();
    assert!(grouped.has(&[1]));
    assert!(!grouped.has(&[404]));
    let empty = grouped.get(&[404]).unwrap();
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.column_names(), vec!["node_id".to_string(), "latency".to_string()]);
}

#[test]
fn scenario_drop_duplicates_then_sort_is_deterministic() {
    let mut records_table = records(
        &["a"],
        &[&[("a", 3)], &[("a", 1)], &[("a", 3)], &[("a", 2)]],
    );
    records_table.drop_duplicates();
    records_table.sort(&["a".to_string()], true).unwrap();
    let values: Vec<u64> = records_table
        .data()
        .iter()
        .map(|r| r.get_with_default("a", 0))
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn scenario_append_column_and_mapper_round_trip() {
    use caret_records::Mapper;
    let mapper = Mapper::new();
    mapper.insert(1, "ok").unwrap();
    mapper.insert(2, "error").unwrap();
    let mut records_table = records(&["node_id"], &[&[("node_id", 1)], &[("node_id", 1)]]);
    records_table
        .append_column(ColumnValue::new("status").with_mapper(mapper), &[1, 2])
        .unwrap();
    let tabular = records_table.to_tabular(None);
    let status = tabular.column("status").unwrap();
    assert_eq!(status.len(), 2);
}
