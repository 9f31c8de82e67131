//! Sequential (time-ordered) merge: pairs each left row with the right rows
//! that arrive later and share its join key, rather than matching on
//! equality alone.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::column::ColumnValue;
use crate::error::{RecordsError, Result};
use crate::record::Record;
use crate::records::{union_column_values, Records};
use crate::value::{bool_value, value_bool, Value, MAX};

use super::{Side, TMP_SIDE};

const TMP_HAS_VALID_JOIN_KEY: &str = "_tmp_has_valid_join_key";
const TMP_STAMP: &str = "_tmp_stamp";
const TMP_HAS_STAMP: &str = "_tmp_has_merge_stamp";

/// How rows without a time-matched partner are handled by
/// [`Records::merge_sequential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialHow {
    /// Emit only matched pairs.
    Inner,
    /// Emit matched pairs, plus unmatched left rows.
    Left,
    /// Emit matched pairs, plus unmatched right rows.
    Right,
    /// Emit matched pairs, plus unmatched rows from both sides.
    Outer,
    /// Like `Left`, but a left row with more than one later right
    /// candidate binds to every one of them instead of only the first.
    LeftUseLatest,
}

fn join_value(row: &Record, keys: &[String]) -> Vec<Value> {
    keys.iter().map(|k| row.get_with_default(k, MAX)).collect()
}

impl Records {
    /// A time-ordered join: rows from both sides are sorted by their
    /// respective stamp column (ties broken left-before-right), then each
    /// left row binds to the right rows that share its join key and arrive
    /// no earlier than it, with a merged row emitted per pair. A left row
    /// with no join-key match at all, or a row missing its stamp or join
    /// key, is handled according to `how`.
    ///
    /// Neither `self` nor `right` is mutated.
    #[tracing::instrument(level = "debug", skip(self, right), fields(left_rows = self.len(), right_rows = right.len(), ?how))]
    pub fn merge_sequential(
        &self,
        right: &Records,
        left_stamp_key: &str,
        right_stamp_key: &str,
        join_left_keys: &[String],
        join_right_keys: &[String],
        how: SequentialHow,
    ) -> Result<Records> {
        if !self.columns().contains(left_stamp_key) {
            return Err(RecordsError::UnknownColumn(left_stamp_key.to_string()));
        }
        if !right.columns().contains(right_stamp_key) {
            return Err(RecordsError::UnknownColumn(right_stamp_key.to_string()));
        }
        if join_left_keys.len() != join_right_keys.len() {
            return Err(RecordsError::ProgrammerError(
                "merge_sequential requires equal-length join-key lists".to_string(),
            ));
        }
        for key in join_left_keys {
            if !self.columns().contains(key) {
                return Err(RecordsError::UnknownColumn(key.clone()));
            }
        }
        for key in join_right_keys {
            if !right.columns().contains(key) {
                return Err(RecordsError::UnknownColumn(key.clone()));
            }
        }

        let output_columns = union_column_values(&[self.columns(), right.columns()]);
        let output_names: Vec<String> =
            output_columns.iter().map(|c| c.name().to_string()).collect();

        let mut left = self.clone();
        let mut right_tagged = right.clone();

        tag_side(&mut left, Side::Left)?;
        tag_side(&mut right_tagged, Side::Right)?;
        tag_stamp(&mut left, left_stamp_key)?;
        tag_stamp(&mut right_tagged, right_stamp_key)?;
        tag_valid_join_key(&mut left, join_left_keys)?;
        tag_valid_join_key(&mut right_tagged, join_right_keys)?;

        let concat_schema = union_column_values(&[left.columns(), right_tagged.columns()]);
        let mut concat = Records::new(None, concat_schema)?;
        concat.concat(&left)?;
        concat.concat(&right_tagged)?;
        concat.sort(&[TMP_STAMP.to_string(), TMP_SIDE.to_string()], true)?;

        let rows = concat.data();

        // First pass: bind each right row to the most recent preceding left
        // row sharing its join key.
        let mut to_left: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut sub_records: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
        for (idx, row) in rows.iter().enumerate() {
            if !value_bool(row.get_with_default(TMP_HAS_STAMP, 0)) {
                continue;
            }
            if !value_bool(row.get_with_default(TMP_HAS_VALID_JOIN_KEY, 0)) {
                continue;
            }
            let side = row.get(TMP_SIDE).expect("tagged above");
            if side == Side::Left.as_value() {
                to_left.insert(join_value(row, join_left_keys), idx);
            } else {
                let key = join_value(row, join_right_keys);
                if let Some(&left_idx) = to_left.get(&key) {
                    sub_records[left_idx].push(idx);
                }
            }
        }

        let emit_left = matches!(
            how,
            SequentialHow::Left | SequentialHow::Outer | SequentialHow::LeftUseLatest
        );
        let emit_right = matches!(how, SequentialHow::Right | SequentialHow::Outer);
        let bind_latest = matches!(how, SequentialHow::LeftUseLatest);

        // Second pass: walk the sorted concatenation once, emitting rows.
        let mut added: HashSet<usize> = HashSet::new();
        let mut merged_rows: Vec<Record> = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            if added.contains(&idx) {
                continue;
            }
            let has_stamp = value_bool(row.get_with_default(TMP_HAS_STAMP, 0));
            let has_valid_key = value_bool(row.get_with_default(TMP_HAS_VALID_JOIN_KEY, 0));
            let side = row.get(TMP_SIDE).expect("tagged above");

            if !has_stamp || !has_valid_key {
                if side == Side::Right.as_value() && emit_right {
                    merged_rows.push(row.clone());
                    added.insert(idx);
                } else if side == Side::Left.as_value() && emit_left {
                    merged_rows.push(row.clone());
                    added.insert(idx);
                }
                continue;
            }

            if side == Side::Right.as_value() {
                if emit_right {
                    merged_rows.push(row.clone());
                    added.insert(idx);
                }
                continue;
            }

            let subs = &sub_records[idx];
            if subs.is_empty() {
                if emit_left {
                    merged_rows.push(row.clone());
                    added.insert(idx);
                }
                continue;
            }

            for (i, &sub_idx) in subs.iter().enumerate() {
                if i >= 1 && !bind_latest {
                    break;
                }
                if added.contains(&sub_idx) {
                    // Already consumed by an earlier binding; the sort-by-stamp
                    // pass guarantees a sub index can't have been visited yet
                    // when its owning left row is processed, so this is
                    // unreachable for well-formed input but kept as a
                    // defensive guard.
                    continue;
                }
                let mut merged = row.clone();
                merged.merge(&rows[sub_idx]);
                merged_rows.push(merged);
                added.insert(idx);
                added.insert(sub_idx);
            }
        }

        let mut result = Records::new(Some(merged_rows), concat.columns().to_values())?;
        result.drop_column_names(&[
            TMP_SIDE.to_string(),
            TMP_STAMP.to_string(),
            TMP_HAS_STAMP.to_string(),
            TMP_HAS_VALID_JOIN_KEY.to_string(),
        ]);
        result.reindex_columns(&output_names)?;
        Ok(result)
    }
}

fn tag_side(records: &mut Records, side: Side) -> Result<()> {
    let values = vec![side.as_value(); records.len()];
    records.append_column(ColumnValue::new(TMP_SIDE), &values)
}

fn tag_stamp(records: &mut Records, stamp_key: &str) -> Result<()> {
    let stamps: Vec<Value> = records
        .data()
        .iter()
        .map(|row| row.get_with_default(stamp_key, MAX))
        .collect();
    let has_stamp: Vec<Value> = records
        .data()
        .iter()
        .map(|row| bool_value(row.contains(stamp_key)))
        .collect();
    records.append_column(ColumnValue::new(TMP_STAMP), &stamps)?;
    records.append_column(ColumnValue::new(TMP_HAS_STAMP), &has_stamp)
}

fn tag_valid_join_key(records: &mut Records, keys: &[String]) -> Result<()> {
    let values: Vec<Value> = records
        .data()
        .iter()
        .map(|row| bool_value(keys.is_empty() || keys.iter().all(|k| row.contains(k))))
        .collect();
    records.append_column(ColumnValue::new(TMP_HAS_VALID_JOIN_KEY), &values)
}
