//! The row-store table: an ordered [`crate::Columns`] schema paired with an
//! ordered list of [`Record`] rows.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::column::ColumnValue;
use crate::columns::Columns;
use crate::error::{RecordsError, Result};
use crate::record::Record;
use crate::series::ColumnSeries;
use crate::tabular::{Cell, ClockConverter, Tabular};
use crate::value::{Value, MAX};

/// A column-oriented table of integer-valued rows.
///
/// `Records` owns both its schema (`Columns`) and its rows (`Vec<Record>`)
/// directly, so there's no back-reference from column to table to maintain:
/// the rename/drop/reindex operations below simply touch both fields of the
/// same struct.
#[derive(Debug)]
pub struct Records {
    columns: Columns,
    rows: Vec<Record>,
}

impl Records {
    /// Build a table from an optional initial row set and a column schema.
    /// Every row's columns must be a subset of `columns`.
    pub fn new(rows: Option<Vec<Record>>, columns: Vec<ColumnValue>) -> Result<Self> {
        let columns = Columns::new(columns)?;
        let rows = rows.unwrap_or_default();
        for row in &rows {
            for name in row.columns() {
                if !columns.contains(name) {
                    return Err(RecordsError::UnknownColumn(name.clone()));
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// The column schema.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Column names in their current order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.names()
    }

    /// The rows, in their current order.
    pub fn data(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are zero rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index`.
    pub fn get_row(&self, index: usize) -> Result<&Record> {
        self.rows.get(index).ok_or(RecordsError::OutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    /// Append one row. Every column the row carries must already exist on
    /// this table's schema.
    #[tracing::instrument(level = "trace", skip(self, record))]
    pub fn append(&mut self, record: Record) -> Result<()> {
        let unknown: Vec<String> = record
            .columns()
            .filter(|name| !self.columns.contains(name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(RecordsError::UnknownColumn(unknown.join(", ")));
        }
        self.rows.push(record);
        Ok(())
    }

    /// Append all of `other`'s rows onto this table. `other`'s columns must
    /// be a subset of this table's; mappers on matching column names are
    /// unioned in place.
    #[tracing::instrument(level = "debug", skip(self, other), fields(self_rows = self.len(), other_rows = other.len()))]
    pub fn concat(&mut self, other: &Records) -> Result<()> {
        let unknown: Vec<String> = other
            .columns
            .names()
            .into_iter()
            .filter(|name| !self.columns.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(RecordsError::UnknownColumn(unknown.join(", ")));
        }
        // Validate every shared column's mapper merge before mutating any of
        // them, so a later column's conflict can't leave an earlier column's
        // mapper already merged while `concat` as a whole reports failure.
        let mut mapper_pairs = Vec::new();
        for name in other.columns.names() {
            if let (Some(mine), Some(theirs)) = (self.columns.get(&name), other.columns.get(&name)) {
                if let (Some(mapper_mine), Some(mapper_theirs)) = (mine.mapper(), theirs.mapper()) {
                    mapper_mine.check_mergeable(mapper_theirs)?;
                    mapper_pairs.push((mapper_mine.clone(), mapper_theirs.clone()));
                }
            }
        }
        for (mapper_mine, mapper_theirs) in &mapper_pairs {
            mapper_mine.merge(mapper_theirs)?;
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    /// Add a new column, filling it with `values` — one entry per existing
    /// row, in row order.
    pub fn append_column(&mut self, column: ColumnValue, values: &[Value]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(RecordsError::LengthMismatch {
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        let name = column.name().to_string();
        self.columns.append(column)?;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.add(name.clone(), *value);
        }
        Ok(())
    }

    /// Stable-sort the rows by the tuple of `keys`, using [`MAX`] for rows
    /// missing a key column.
    pub fn sort(&mut self, keys: &[String], ascending: bool) -> Result<()> {
        if keys.is_empty() {
            return Err(RecordsError::ProgrammerError(
                "sort requires at least one key column".to_string(),
            ));
        }
        if ascending {
            self.rows.sort_by_key(|row| {
                keys.iter()
                    .map(|k| row.get_with_default(k, MAX))
                    .collect::<Vec<_>>()
            });
        } else {
            self.rows.sort_by_key(|row| {
                keys.iter()
                    .map(|k| std::cmp::Reverse(row.get_with_default(k, MAX)))
                    .collect::<Vec<_>>()
            });
        }
        Ok(())
    }

    /// Remove rows that are structurally equal to an earlier row, preserving
    /// first-occurrence order.
    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.data().clone()));
    }

    /// Partition rows by the value tuple of `keys`, grouping into
    /// same-schema sub-tables. Rows missing a key contribute [`MAX`] for it,
    /// same as `sort`.
    pub fn groupby(&self, keys: &[String]) -> Result<IndexMap<Vec<Value>, Records>> {
        let mut groups: IndexMap<Vec<Value>, Records> = IndexMap::new();
        for row in &self.rows {
            let key: Vec<Value> = keys.iter().map(|k| row.get_with_default(k, MAX)).collect();
            let group = match groups.entry(key) {
                indexmap::map::Entry::Occupied(entry) => entry.into_mut(),
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(Records::new(None, self.columns.to_values())?)
                }
            };
            group.append(row.clone())?;
        }
        Ok(groups)
    }

    /// A lazy reader over one column's values, row by row.
    pub fn get_column_series(&self, name: &str) -> Result<ColumnSeries<'_>> {
        if !self.columns.contains(name) {
            return Err(RecordsError::UnknownColumn(name.to_string()));
        }
        Ok(ColumnSeries::new(name.to_string(), self.rows.iter()))
    }

    /// Rename a column, propagating the rename into every row that carries
    /// it.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        self.columns.rename(old, new)?;
        for row in self.rows.iter_mut() {
            if row.contains(old) {
                row.change_key(old, new)?;
            }
        }
        Ok(())
    }

    /// Drop columns from both the schema and every row. Names not present
    /// are silently ignored.
    pub fn drop_column_names(&mut self, names: &[String]) {
        self.columns.drop(names);
        for row in self.rows.iter_mut() {
            row.drop_columns(names);
        }
    }

    /// Reorder the schema's columns; rows are unaffected since a row is a
    /// name-keyed map, not a positional tuple.
    pub fn reindex_columns(&mut self, order: &[String]) -> Result<()> {
        self.columns.reindex(order)
    }

    /// An independent copy of this table: rows are cloned (no interior
    /// mutability there to worry about) and mappers are deep-cloned, so
    /// mutating the clone's mappers — e.g. via a later `concat` — never
    /// reaches back into `self`.
    pub fn clone(&self) -> Records {
        Records {
            columns: self.columns.deep_clone(),
            rows: self.rows.clone(),
        }
    }

    /// Carry each column's most recent value forward onto later rows that
    /// are missing it, as if a value persisted until overwritten. Idempotent:
    /// calling it twice in a row has the same effect as calling it once.
    #[tracing::instrument(level = "debug", skip(self), fields(rows = self.len()))]
    pub fn bind_drop_as_delay(&mut self) -> Result<()> {
        let names = self.column_names();
        if names.is_empty() {
            return Ok(());
        }
        self.sort(&names, false)?;
        let mut latest: std::collections::HashMap<String, Value> = std::collections::HashMap::new();
        for row in self.rows.iter_mut() {
            for name in &names {
                if !row.contains(name) {
                    if let Some(value) = latest.get(name) {
                        row.add(name.clone(), *value);
                    }
                } else {
                    latest.insert(name.clone(), row.get(name).expect("checked above"));
                }
            }
        }
        self.sort(&names, true)?;
        Ok(())
    }

    /// Resolve each cell for presentation: through a column's mapper if it
    /// has one, through `converter` if the column is a `SystemTime` column
    /// and a converter was supplied, or as a bare integer otherwise.
    pub fn to_tabular(&self, converter: Option<&dyn ClockConverter>) -> Tabular {
        let names = self.column_names();
        let mut cells: IndexMap<String, Vec<Option<Cell>>> = IndexMap::new();
        for name in &names {
            cells.insert(name.clone(), Vec::with_capacity(self.rows.len()));
        }
        for row in &self.rows {
            for name in &names {
                let column = self.columns.get(name).expect("column in schema");
                let cell = row.data().get(name).map(|&value| {
                    if let Some(mapper) = column.mapper() {
                        Cell::Mapped(mapper.get_mapped(value))
                    } else if column.has_attribute(crate::column::ColumnAttribute::SystemTime) {
                        match converter {
                            Some(conv) => Cell::Int(conv.convert(value)),
                            None => Cell::Int(value),
                        }
                    } else {
                        Cell::Int(value)
                    }
                });
                cells.get_mut(name).expect("inserted above").push(cell);
            }
        }
        Tabular::new(names, cells)
    }
}

pub(crate) fn union_column_values(collections: &[&Columns]) -> Vec<ColumnValue> {
    collections
        .iter()
        .flat_map(|columns| columns.to_values())
        .unique_by(|value| value.name().to_string())
        .collect()
}
