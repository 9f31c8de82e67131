//! Column descriptors: the immutable metadata side of a column, and the
//! handle bound into a [`crate::Columns`] collection.

use std::collections::BTreeSet;

use crate::value::Mapper;

/// A tag describing what role a column plays, consulted by
/// [`crate::Records::to_tabular`] and by the merge algorithms (e.g. which
/// column carries a flow's timestamp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnAttribute {
    /// A nanosecond (or other monotonic clock) timestamp, eligible for clock
    /// conversion in `to_tabular`.
    SystemTime,
    /// Part of a message-flow pipeline stage identifier.
    MsgPipeline,
    /// Part of a node input/output identifier.
    NodeIo,
    /// Part of a process input/output identifier.
    PidIo,
}

/// The immutable descriptor of a column: its name, the attributes it carries,
/// and the mapper (if any) that resolves its integer values to symbolic
/// names.
///
/// Two `ColumnValue`s are equal when their names and attributes match and
/// either both lack a mapper or both share the same mapper instance —
/// mapper equality is identity, not content, since two independently built
/// mappers may happen to agree today and diverge tomorrow.
#[derive(Debug, Clone)]
pub struct ColumnValue {
    name: String,
    attributes: BTreeSet<ColumnAttribute>,
    mapper: Option<Mapper>,
}

impl ColumnValue {
    /// A bare column with no attributes and no mapper.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeSet::new(),
            mapper: None,
        }
    }

    /// Attach a mapper, consuming and returning `self` for chaining.
    pub fn with_mapper(mut self, mapper: Mapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Attach an attribute, consuming and returning `self` for chaining.
    pub fn with_attribute(mut self, attribute: ColumnAttribute) -> Self {
        self.attributes.insert(attribute);
        self
    }

    /// The column's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attributes attached to this column.
    pub fn attributes(&self) -> &BTreeSet<ColumnAttribute> {
        &self.attributes
    }

    /// Whether `attribute` is attached to this column.
    pub fn has_attribute(&self, attribute: ColumnAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// The mapper attached to this column, if any.
    pub fn mapper(&self) -> Option<&Mapper> {
        self.mapper.as_ref()
    }

    /// An independent copy of this descriptor whose mapper (if any) is
    /// deep-cloned rather than shared.
    pub fn deep_clone(&self) -> ColumnValue {
        ColumnValue {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            mapper: self.mapper.as_ref().map(Mapper::deep_clone),
        }
    }
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.attributes != other.attributes {
            return false;
        }
        match (&self.mapper, &other.mapper) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_same(b),
            _ => false,
        }
    }
}

impl Eq for ColumnValue {}

/// A column bound into a [`crate::Columns`] collection. Thin wrapper around
/// [`ColumnValue`] today, kept distinct from it because a free-standing
/// descriptor and one that participates in a collection's rename/drop/reindex
/// lifecycle are conceptually different things, even though that lifecycle
/// is actually implemented on `Columns` and `Records` rather than on `Column`
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(ColumnValue);

impl Column {
    pub(crate) fn new(value: ColumnValue) -> Self {
        Self(value)
    }

    /// The underlying descriptor.
    pub fn value(&self) -> &ColumnValue {
        &self.0
    }

    pub(crate) fn into_value(self) -> ColumnValue {
        self.0
    }
}

impl std::ops::Deref for Column {
    type Target = ColumnValue;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
