//! Keyed relational merge: an inner/left/right/outer join on equality of
//! one or more join-key columns.

use crate::column::ColumnValue;
use crate::error::{RecordsError, Result};
use crate::record::Record;
use crate::records::{union_column_values, Records};
use crate::value::{bool_value, value_bool, Value, MAX};

use super::{Side, TMP_SIDE};

const TMP_HAS_VALID_JOIN_KEY: &str = "_tmp_has_valid_join_key";

fn tmp_join_key(i: usize) -> String {
    format!("_tmp_join_key_{i}")
}

/// How rows that don't find a match on the other side are handled by
/// [`Records::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHow {
    /// Emit only rows that matched on both sides.
    Inner,
    /// Emit matched rows, plus unmatched left rows.
    Left,
    /// Emit matched rows, plus unmatched right rows.
    Right,
    /// Emit matched rows, plus unmatched rows from both sides.
    Outer,
}

impl Records {
    /// A relational join: every left row is paired against every right row
    /// sharing the same values for `join_left_keys`/`join_right_keys`
    /// (matched positionally, key `i` on the left against key `i` on the
    /// right), emitting one merged row per pair — the right row's columns
    /// overlaid onto a copy of the matching left row. Rows whose join key is
    /// only partially present, or that find no partner, are handled
    /// according to `how`.
    ///
    /// Neither `self` nor `right` is mutated; both are cloned internally to
    /// build the intermediate, tagged copies the sweep needs.
    #[tracing::instrument(level = "debug", skip(self, right), fields(left_rows = self.len(), right_rows = right.len(), ?how))]
    pub fn merge(
        &self,
        right: &Records,
        join_left_keys: &[String],
        join_right_keys: &[String],
        how: JoinHow,
    ) -> Result<Records> {
        if join_left_keys.is_empty() || join_left_keys.len() != join_right_keys.len() {
            return Err(RecordsError::ProgrammerError(
                "merge requires equal-length, non-empty lists of join keys".to_string(),
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
        tag_join_keys(&mut left, join_left_keys)?;
        tag_join_keys(&mut right_tagged, join_right_keys)?;
        tag_valid_join_key(&mut left, join_left_keys)?;
        tag_valid_join_key(&mut right_tagged, join_right_keys)?;

        let concat_schema = union_column_values(&[left.columns(), right_tagged.columns()]);
        let mut concat = Records::new(None, concat_schema)?;
        concat.concat(&left)?;
        concat.concat(&right_tagged)?;

        let n = join_left_keys.len();
        let mut sort_keys: Vec<String> = (0..n).map(tmp_join_key).collect();
        sort_keys.push(TMP_SIDE.to_string());
        concat.sort(&sort_keys, true)?;

        let mut merged_rows: Vec<Record> = Vec::new();
        let mut empties: Vec<Record> = Vec::new();
        let mut left_bucket: Vec<Record> = Vec::new();
        let mut left_found: Vec<bool> = Vec::new();
        let mut current_key: Option<Vec<Value>> = None;

        for row in concat.data() {
            let has_valid = value_bool(row.get_with_default(TMP_HAS_VALID_JOIN_KEY, 0));
            if !has_valid {
                empties.push(row.clone());
                continue;
            }
            let key: Vec<Value> = (0..n)
                .map(|i| row.get(&tmp_join_key(i)).expect("tagged above"))
                .collect();
            if current_key.as_ref() != Some(&key) {
                flush_unmatched_left(&mut left_bucket, &mut left_found, &mut empties);
                current_key = Some(key);
            }
            let side = row.get(TMP_SIDE).expect("tagged above");
            if side == Side::Left.as_value() {
                left_bucket.push(row.clone());
                left_found.push(false);
            } else if left_bucket.is_empty() {
                empties.push(row.clone());
            } else {
                for (i, left_row) in left_bucket.iter().enumerate() {
                    left_found[i] = true;
                    let mut merged = left_row.clone();
                    merged.merge(row);
                    merged_rows.push(merged);
                }
            }
        }
        flush_unmatched_left(&mut left_bucket, &mut left_found, &mut empties);

        let emit_left = matches!(how, JoinHow::Left | JoinHow::Outer);
        let emit_right = matches!(how, JoinHow::Right | JoinHow::Outer);
        for row in empties {
            let side = row.get(TMP_SIDE).expect("tagged above");
            if side == Side::Left.as_value() && emit_left {
                merged_rows.push(row);
            } else if side == Side::Right.as_value() && emit_right {
                merged_rows.push(row);
            }
        }

        let mut result = Records::new(Some(merged_rows), concat.columns().to_values())?;
        let mut temp_names: Vec<String> =
            vec![TMP_SIDE.to_string(), TMP_HAS_VALID_JOIN_KEY.to_string()];
        temp_names.extend((0..n).map(tmp_join_key));
        result.drop_column_names(&temp_names);
        result.reindex_columns(&output_names)?;
        Ok(result)
    }
}

fn flush_unmatched_left(bucket: &mut Vec<Record>, found: &mut Vec<bool>, empties: &mut Vec<Record>) {
    for (row, was_found) in bucket.drain(..).zip(found.drain(..)) {
        if !was_found {
            empties.push(row);
        }
    }
}

fn tag_side(records: &mut Records, side: Side) -> Result<()> {
    let values = vec![side.as_value(); records.len()];
    records.append_column(ColumnValue::new(TMP_SIDE), &values)
}

fn tag_join_keys(records: &mut Records, keys: &[String]) -> Result<()> {
    for (i, key) in keys.iter().enumerate() {
        let values: Vec<Value> = records
            .data()
            .iter()
            .map(|row| row.get_with_default(key, MAX))
            .collect();
        records.append_column(ColumnValue::new(tmp_join_key(i)), &values)?;
    }
    Ok(())
}

fn tag_valid_join_key(records: &mut Records, keys: &[String]) -> Result<()> {
    let values: Vec<Value> = records
        .data()
        .iter()
        .map(|row| bool_value(keys.iter().all(|k| row.contains(k))))
        .collect();
    records.append_column(ColumnValue::new(TMP_HAS_VALID_JOIN_KEY), &values)
}
