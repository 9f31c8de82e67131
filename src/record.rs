//! A single row: a sparse map from column name to integer value.

use std::collections::BTreeMap;

use crate::error::{RecordsError, Result};
use crate::value::Value;

/// One row of a [`crate::Records`] table. Columns not present in `data` are
/// simply absent from this row — there's no stored "null" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record {
    data: BTreeMap<String, Value>,
}

impl Record {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from an iterator of (column, value) pairs.
    pub fn from_iter<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            data: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Whether this row has a value for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// The value stored for `name`.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.data
            .get(name)
            .copied()
            .ok_or_else(|| RecordsError::UnknownColumn(name.to_string()))
    }

    /// The value stored for `name`, or `default` if the row doesn't have it.
    pub fn get_with_default(&self, name: &str, default: Value) -> Value {
        self.data.get(name).copied().unwrap_or(default)
    }

    /// Set (or overwrite) the value for `name`.
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        self.data.insert(name.into(), value);
    }

    /// Remove the named columns from this row. Names not present are
    /// silently ignored.
    pub fn drop_columns(&mut self, names: &[String]) {
        for name in names {
            self.data.remove(name);
        }
    }

    /// Overlay `other`'s values onto this row: for columns present in both,
    /// `other`'s value wins.
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in &other.data {
            self.data.insert(name.clone(), *value);
        }
    }

    /// Rename the column `old` to `new` on this row, if `old` is present.
    /// `new` must not already be in use on this row.
    pub fn change_key(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.data.contains_key(old) {
            return Err(RecordsError::UnknownColumn(old.to_string()));
        }
        if self.data.contains_key(new) {
            return Err(RecordsError::ProgrammerError(format!(
                "cannot rename {old:?} to {new:?} on a row: {new:?} already has a value"
            )));
        }
        let value = self.data.remove(old).expect("checked above");
        self.data.insert(new.to_string(), value);
        Ok(())
    }

    /// The column names present on this row, in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// The underlying column-to-value map.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Structural equality: same columns, same values.
    pub fn equals(&self, other: &Record) -> bool {
        self == other
    }
}
