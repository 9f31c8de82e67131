//! The cell-value domain: non-negative 64-bit integers, plus the sentinel
//! used by sorts and key extraction to stand in for "missing".

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{RecordsError, Result};

/// A single cell value. All columns in this crate hold values in this domain.
pub type Value = u64;

/// Sentinel used by [`crate::Records::sort`] and the merge algorithms'
/// key-tuple extraction to represent "missing". Never stored as a real value
/// by well-behaved callers; absence of a column on a row is expressed by the
/// row simply not containing that column.
pub const MAX: Value = u64::MAX;

pub(crate) fn bool_value(b: bool) -> Value {
    b as Value
}

pub(crate) fn value_bool(v: Value) -> bool {
    v != 0
}

/// An append-only partial function from integer handles to symbolic names,
/// attached to a [`crate::ColumnValue`].
///
/// Mappers are shared by reference across `Records` that originate from the
/// same ingestion (cheap to carry around, since entries are only ever added,
/// never removed or changed), and are deep-copied by [`crate::Records::clone`]
/// so that a clone which diverges from its origin doesn't retroactively
/// change what the original resolves.
#[derive(Debug, Clone, Default)]
pub struct Mapper(Rc<RefCell<BTreeMap<Value, String>>>);

impl Mapper {
    /// Create an empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapper from a fixed set of known entries.
    pub fn from_entries<I: IntoIterator<Item = (Value, String)>>(entries: I) -> Self {
        Self(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Record the symbolic name for `key`. Overwriting an existing entry with
    /// a different name is a programmer error: mappers are meant to be
    /// monotone.
    pub fn insert(&self, key: Value, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut inner = self.0.borrow_mut();
        match inner.get(&key) {
            Some(existing) if *existing != name => Err(RecordsError::ProgrammerError(format!(
                "mapper entry for {key} already resolves to {existing:?}, refusing to overwrite with {name:?}"
            ))),
            _ => {
                inner.insert(key, name);
                Ok(())
            }
        }
    }

    /// Resolve `key` to its symbolic name, if known.
    pub fn get(&self, key: Value) -> Option<String> {
        self.0.borrow().get(&key).cloned()
    }

    /// Resolve `key`, falling back to its decimal representation when the
    /// mapper has no entry for it — an unresolved handle should still render,
    /// not vanish.
    pub fn get_mapped(&self, key: Value) -> String {
        self.get(key).unwrap_or_else(|| key.to_string())
    }

    /// Union this mapper's entries with `other`'s in place. Entries present
    /// in both must agree; a disagreement is a programmer error, since a
    /// mapper is append-only — an id is assigned a name once and never
    /// reassigned.
    pub fn merge(&self, other: &Mapper) -> Result<()> {
        if Rc::ptr_eq(&self.0, &other.0) {
            return Ok(());
        }
        for (key, name) in other.0.borrow().iter() {
            self.insert(*key, name.clone())?;
        }
        Ok(())
    }

    /// Check whether [`merge`](Mapper::merge) would succeed, without
    /// mutating either mapper. Lets a caller validate several independent
    /// merges before committing any of them.
    pub fn check_mergeable(&self, other: &Mapper) -> Result<()> {
        if Rc::ptr_eq(&self.0, &other.0) {
            return Ok(());
        }
        let mine = self.0.borrow();
        for (key, name) in other.0.borrow().iter() {
            if let Some(existing) = mine.get(key) {
                if existing != name {
                    return Err(RecordsError::ProgrammerError(format!(
                        "mapper entry for {key} already resolves to {existing:?}, refusing to overwrite with {name:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Produce an independent mapper carrying a snapshot of this one's
    /// entries, so that further inserts on either do not affect the other.
    pub fn deep_clone(&self) -> Mapper {
        Mapper(Rc::new(RefCell::new(self.0.borrow().clone())))
    }

    /// True if `self` and `other` are the same mapper instance (shared by
    /// reference), which is the notion of mapper equality `ColumnValue`
    /// uses.
    pub fn is_same(&self, other: &Mapper) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Mapper {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other) || *self.0.borrow() == *other.0.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let m = Mapper::new();
        m.insert(1, "alpha").unwrap();
        assert_eq!(m.get(1), Some("alpha".to_string()));
        assert_eq!(m.get(2), None);
        assert_eq!(m.get_mapped(2), "2");
    }

    #[test]
    fn agreeing_insert_is_fine() {
        let m = Mapper::new();
        m.insert(1, "alpha").unwrap();
        m.insert(1, "alpha").unwrap();
    }

    #[test]
    fn disagreeing_insert_errors() {
        let m = Mapper::new();
        m.insert(1, "alpha").unwrap();
        assert!(m.insert(1, "beta").is_err());
    }

    #[test]
    fn merge_unions_entries() {
        let a = Mapper::new();
        a.insert(1, "alpha").unwrap();
        let b = Mapper::new();
        b.insert(2, "beta").unwrap();
        a.merge(&b).unwrap();
        assert_eq!(a.get(1), Some("alpha".to_string()));
        assert_eq!(a.get(2), Some("beta".to_string()));
    }

    #[test]
    fn deep_clone_diverges_independently() {
        let a = Mapper::new();
        a.insert(1, "alpha").unwrap();
        let b = a.deep_clone();
        b.insert(2, "beta").unwrap();
        assert_eq!(a.get(2), None);
        assert_eq!(b.get(2), Some("beta".to_string()));
    }
}
