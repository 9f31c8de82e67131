//! An ordered, name-unique collection of columns, with the rename/drop/
//! reindex operations that [`crate::Records`] propagates into its rows.

use indexmap::IndexMap;

use crate::column::{Column, ColumnValue};
use crate::error::{RecordsError, Result};

/// The column schema of a [`crate::Records`]: an insertion-ordered map from
/// column name to [`Column`], with no two entries sharing a name.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    by_name: IndexMap<String, Column>,
}

impl Columns {
    /// Build a collection from a list of descriptors, rejecting duplicate
    /// names.
    pub fn new(values: Vec<ColumnValue>) -> Result<Self> {
        let mut by_name = IndexMap::with_capacity(values.len());
        for value in values {
            let name = value.name().to_string();
            if by_name.insert(name.clone(), Column::new(value)).is_some() {
                return Err(RecordsError::DuplicateColumn(name));
            }
        }
        Ok(Self { by_name })
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Whether `name` is a column in this collection.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The column bound to `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name)
    }

    /// Column names in their current order.
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    /// The descriptors in their current order, detached from this
    /// collection — used to seed a fresh `Columns` with the same schema.
    pub fn to_values(&self) -> Vec<ColumnValue> {
        self.by_name
            .values()
            .map(|c| c.value().clone())
            .collect()
    }

    /// Iterate columns in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.by_name.values()
    }

    /// Append a new column at the end, rejecting a name collision.
    pub fn append(&mut self, value: ColumnValue) -> Result<()> {
        let name = value.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RecordsError::DuplicateColumn(name));
        }
        self.by_name.insert(name, Column::new(value));
        Ok(())
    }

    /// Remove the named columns. Names not present are silently ignored,
    /// matching the rest of this crate's drop operations (dropping a column
    /// that's already gone is a no-op, not an error).
    pub fn drop(&mut self, names: &[String]) {
        for name in names {
            self.by_name.shift_remove(name);
        }
    }

    /// Rename `old` to `new`. `old` must exist and `new` must not already be
    /// in use.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.by_name.contains_key(old) {
            return Err(RecordsError::UnknownColumn(old.to_string()));
        }
        if self.by_name.contains_key(new) {
            return Err(RecordsError::ProgrammerError(format!(
                "cannot rename {old:?} to {new:?}: {new:?} already exists"
            )));
        }
        // shift_remove + reinsert at the end would disturb ordering, so
        // rebuild the map in place instead, preserving position.
        let mut rebuilt = IndexMap::with_capacity(self.by_name.len());
        for (name, column) in self.by_name.drain(..) {
            if name == old {
                let value = column.into_value();
                rebuilt.insert(new.to_string(), Column::new(value));
            } else {
                rebuilt.insert(name, column);
            }
        }
        self.by_name = rebuilt;
        Ok(())
    }

    /// Reorder the columns to match `order`, which must be a permutation of
    /// the current column names.
    pub fn reindex(&mut self, order: &[String]) -> Result<()> {
        if order.len() != self.by_name.len() {
            return Err(RecordsError::ProgrammerError(format!(
                "reindex order has {} names, columns has {}",
                order.len(),
                self.by_name.len()
            )));
        }
        let mut rebuilt = IndexMap::with_capacity(order.len());
        for name in order {
            let column = self
                .by_name
                .shift_remove(name)
                .ok_or_else(|| RecordsError::UnknownColumn(name.clone()))?;
            rebuilt.insert(name.clone(), column);
        }
        self.by_name = rebuilt;
        Ok(())
    }

    /// Rebuild with independent (deep-cloned) mappers, so mutating a mapper
    /// through the clone never affects `self`.
    pub fn deep_clone(&self) -> Columns {
        let values = self.by_name.values().map(|c| c.value().deep_clone()).collect();
        Columns::new(values).expect("cloning preserves uniqueness of names")
    }
}
