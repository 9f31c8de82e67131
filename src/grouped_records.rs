//! A cached view over [`Records::groupby`], returning an empty same-schema
//! table rather than an error when a key combination wasn't present.

use indexmap::IndexMap;

use crate::column::ColumnValue;
use crate::error::Result;
use crate::records::Records;
use crate::value::Value;

/// Caches the result of grouping a [`Records`] by a fixed set of key
/// columns, so repeated lookups don't re-partition the table.
pub struct GroupedRecords {
    column_values: Vec<ColumnValue>,
    groups: IndexMap<Vec<Value>, Records>,
}

impl GroupedRecords {
    /// Group `records` by `keys`, caching the result.
    pub fn new(records: &Records, keys: &[String]) -> Result<Self> {
        Ok(Self {
            column_values: records.columns().to_values(),
            groups: records.groupby(keys)?,
        })
    }

    /// Whether `key` is one of the groups present.
    pub fn has(&self, key: &[Value]) -> bool {
        self.groups.contains_key(key)
    }

    /// The group for `key`, or an empty table with the same schema if there
    /// is no such group.
    pub fn get(&self, key: &[Value]) -> Result<Records> {
        match self.groups.get(key) {
            Some(group) => Ok(group.clone()),
            None => Records::new(None, self.column_values.clone()),
        }
    }

    /// The column descriptors of the grouped table.
    pub fn column_values(&self) -> &[ColumnValue] {
        &self.column_values
    }

    /// The column names of the grouped table.
    pub fn column_names(&self) -> Vec<String> {
        self.column_values.iter().map(|c| c.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample() -> Records {
        let cols = vec![ColumnValue::new("a"), ColumnValue::new("b")];
        let rows = vec![
            Record::from_iter([("a", 1u64), ("b", 10)]),
            Record::from_iter([("a", 1u64), ("b", 20)]),
            Record::from_iter([("a", 2u64), ("b", 30)]),
        ];
        Records::new(Some(rows), cols).unwrap()
    }

    #[test]
    fn get_returns_cached_group() {
        let grouped = GroupedRecords::new(&sample(), &["a".to_string()]).unwrap();
        assert!(grouped.has(&[1]));
        assert_eq!(grouped.get(&[1]).unwrap().len(), 2);
    }

    #[test]
    fn get_on_miss_returns_empty_same_schema() {
        let grouped = GroupedRecords::new(&sample(), &["a".to_string()]).unwrap();
        assert!(!grouped.has(&[99]));
        let empty = grouped.get(&[99]).unwrap();
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.column_names(), vec!["a".to_string(), "b".to_string()]);
    }
}
