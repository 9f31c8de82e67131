//! Property tests for the cross-cutting invariants that matter across all of
//! `Records`'s table operations: sort reversal, groupby partitioning,
//! drop_duplicates idempotence, the clone homomorphism, and
//! bind_drop_as_delay idempotence.

use caret_records::{ColumnValue, Record, Records};
use proptest::prelude::*;
use test_strategy::proptest;

fn build(values: &[u64]) -> Records {
    let cols = vec![ColumnValue::new("a")];
    let rows = values
        .iter()
        .map(|v| Record::from_iter([("a", *v)]))
        .collect();
    Records::new(Some(rows), cols).unwrap()
}

fn column_a(records: &Records) -> Vec<u64> {
    records.data().iter().map(|r| r.get_with_default("a", u64::MAX)).collect()
}

#[proptest]
fn sort_ascending_then_descending_reverses_a_uniquely_keyed_sequence(
    #[strategy(prop::collection::hash_set(0u64..10_000, 0..20))] unique: std::collections::HashSet<u64>,
) {
    let mut values: Vec<u64> = unique.into_iter().collect();
    let mut records = build(&values);
    records.sort(&["a".to_string()], true).unwrap();
    let ascending = column_a(&records);
    records.sort(&["a".to_string()], false).unwrap();
    let descending = column_a(&records);
    let mut expected = ascending.clone();
    expected.reverse();
    prop_assert_eq!(descending, expected);
    values.sort_unstable();
    prop_assert_eq!(ascending, values);
}

#[proptest]
fn groupby_partitions_cover_every_row_exactly_once(
    #[strategy(prop::collection::vec(0u64..5, 0..30))] values: Vec<u64>,
) {
    let records = build(&values);
    let groups = records.groupby(&["a".to_string()]).unwrap();
    let total: usize = groups.values().map(Records::len).sum();
    prop_assert_eq!(total, values.len());
    for group in groups.values() {
        let first = group.get_row(0).unwrap().get_with_default("a", u64::MAX);
        for row in group.data() {
            prop_assert_eq!(row.get_with_default("a", u64::MAX), first);
        }
    }
}

#[proptest]
fn drop_duplicates_is_idempotent(#[strategy(prop::collection::vec(0u64..5, 0..30))] values: Vec<u64>) {
    let mut records = build(&values);
    records.drop_duplicates();
    let once = column_a(&records);
    records.drop_duplicates();
    let twice = column_a(&records);
    prop_assert_eq!(once, twice);
}

#[proptest]
fn clone_is_independent_of_later_mutation(
    #[strategy(prop::collection::vec(0u64..100, 0..20))] values: Vec<u64>,
) {
    let records = build(&values);
    let mut clone = records.clone();
    clone.sort(&["a".to_string()], false).unwrap();
    prop_assert_eq!(column_a(&records), values);
}

#[proptest]
fn bind_drop_as_delay_is_idempotent(#[strategy(prop::collection::vec(0u64..20, 1..20))] values: Vec<u64>) {
    let mut records = build(&values);
    records.bind_drop_as_delay().unwrap();
    let once = column_a(&records);
    records.bind_drop_as_delay().unwrap();
    let twice = column_a(&records);
    prop_assert_eq!(once, twice);
}
