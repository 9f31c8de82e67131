//! Address-tracking flow merge: binds a SOURCE event to the SINK event that
//! ultimately consumes it, following zero or more COPY events that alias the
//! message's address along the way.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::column::ColumnValue;
use crate::error::{RecordsError, Result};
use crate::record::Record;
use crate::records::{union_column_values, Records};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Source,
    Copy,
    Sink,
}

impl RecordKind {
    fn as_value(self) -> Value {
        match self {
            RecordKind::Source => 0,
            RecordKind::Copy => 1,
            RecordKind::Sink => 2,
        }
    }
}

const TMP_KIND: &str = "_tmp_type";
const TMP_TIMESTAMP: &str = "_tmp_timestamp";

/// The column names needed to drive [`Records::merge_for_address_track`].
/// Grouped into one struct rather than seven positional string arguments.
#[derive(Debug, Clone, Copy)]
pub struct AddressTrackKeys<'a> {
    /// Stamp column on the source table.
    pub source_stamp: &'a str,
    /// Column on the source table carrying the address a matching SINK or
    /// COPY event must resolve back to.
    pub source_key: &'a str,
    /// Stamp column on the copy table.
    pub copy_stamp: &'a str,
    /// Column on the copy table carrying the address the copy reads from.
    pub copy_from: &'a str,
    /// Column on the copy table carrying the address the copy writes to.
    pub copy_to: &'a str,
    /// Stamp column on the sink table.
    pub sink_stamp: &'a str,
    /// Column on the sink table carrying the address the sink consumes.
    pub sink_from: &'a str,
}

/// A set of aliased addresses shared by every in-flight sink that has
/// converged onto it. Converging two sinks (via a COPY event that links
/// their addresses) unions their `addresses`/`members` into one shared
/// group rather than discarding either sink's row — a SOURCE that later
/// matches the group emits one row per member, not just one for the group.
struct Group {
    addresses: HashSet<Value>,
    members: Vec<usize>,
}

struct Entry {
    record: Record,
    group: Rc<RefCell<Group>>,
}

impl Records {
    /// Follow each SOURCE event forward through zero or more address-aliasing
    /// COPY events to the SINK event that consumes it, emitting one merged
    /// row per SOURCE that reaches a SINK.
    ///
    /// Implementation sweeps all three inputs in descending timestamp order
    /// (so a SINK or COPY is always seen before the SOURCE it resolves),
    /// maintaining one "in-flight" entry per address currently being
    /// tracked. A COPY event unions its `from` address into the group
    /// already tracking its `to` address; if `from` was itself already
    /// tracked under a distinct group, the two groups converge into one,
    /// keeping every sink's row alive as a member of the merged group
    /// rather than dropping one. A SOURCE event closes out and emits one
    /// merged row per member of the group whose address set contains its
    /// key — a single SOURCE can thus resolve to more than one emitted row
    /// when two independently-tracked sinks have converged onto it.
    ///
    /// None of `self`, `copy`, or `sink` is mutated.
    #[tracing::instrument(level = "debug", skip(self, copy, sink), fields(source_rows = self.len(), copy_rows = copy.len(), sink_rows = sink.len()))]
    pub fn merge_for_address_track(
        &self,
        copy: &Records,
        sink: &Records,
        keys: AddressTrackKeys<'_>,
    ) -> Result<Records> {
        for key in [keys.source_stamp, keys.source_key] {
            if !self.columns().contains(key) {
                return Err(RecordsError::UnknownColumn(format!("source.{key}")));
            }
        }
        for key in [keys.copy_stamp, keys.copy_from, keys.copy_to] {
            if !copy.columns().contains(key) {
                return Err(RecordsError::UnknownColumn(format!("copy.{key}")));
            }
        }
        for key in [keys.sink_stamp, keys.sink_from] {
            if !sink.columns().contains(key) {
                return Err(RecordsError::UnknownColumn(format!("sink.{key}")));
            }
        }

        let dropped = [
            keys.copy_from.to_string(),
            keys.copy_to.to_string(),
            keys.copy_stamp.to_string(),
            keys.sink_from.to_string(),
        ];
        let output_names: Vec<String> = union_column_values(&[
            self.columns(),
            copy.columns(),
            sink.columns(),
        ])
        .into_iter()
        .map(|c| c.name().to_string())
        .filter(|n| !dropped.contains(n))
        .collect();

        let mut source = self.clone();
        let mut copy = copy.clone();
        let mut sink = sink.clone();

        tag_kind(&mut source, RecordKind::Source)?;
        tag_kind(&mut copy, RecordKind::Copy)?;
        tag_kind(&mut sink, RecordKind::Sink)?;

        tag_timestamp_from(&mut source, keys.source_stamp)?;
        copy.rename_column(keys.copy_stamp, TMP_TIMESTAMP)?;
        tag_timestamp_from(&mut sink, keys.sink_stamp)?;

        let concat_schema =
            union_column_values(&[source.columns(), copy.columns(), sink.columns()]);
        let mut concat = Records::new(None, concat_schema)?;
        concat.concat(&source)?;
        concat.concat(&copy)?;
        concat.concat(&sink)?;
        concat.sort(&[TMP_TIMESTAMP.to_string()], false)?;

        let mut entries: Vec<Option<Entry>> = Vec::new();
        let mut addr_to_group: HashMap<Value, Rc<RefCell<Group>>> = HashMap::new();
        let mut merged_rows: Vec<Record> = Vec::new();

        for row in concat.data() {
            let kind = row.get(TMP_KIND).expect("tagged above");
            if kind == RecordKind::Sink.as_value() {
                let addr = row.get(keys.sink_from)?;
                let idx = entries.len();
                let group = Rc::new(RefCell::new(Group {
                    addresses: HashSet::from([addr]),
                    members: vec![idx],
                }));
                entries.push(Some(Entry {
                    record: row.clone(),
                    group: group.clone(),
                }));
                addr_to_group.insert(addr, group);
            } else if kind == RecordKind::Copy.as_value() {
                let to_addr = row.get(keys.copy_to)?;
                let from_addr = row.get(keys.copy_from)?;
                if let Some(group_to) = addr_to_group.get(&to_addr).cloned() {
                    if let Some(group_from) = addr_to_group.get(&from_addr).cloned() {
                        if !Rc::ptr_eq(&group_to, &group_from) {
                            // `from_addr` is already owned by a distinct
                            // in-flight group: converge the two groups into
                            // one rather than discarding either's members,
                            // so every sink that shares this alias chain is
                            // still around to be matched and emitted later.
                            let (from_addrs, from_members) = {
                                let mut from_mut = group_from.borrow_mut();
                                (
                                    std::mem::take(&mut from_mut.addresses),
                                    std::mem::take(&mut from_mut.members),
                                )
                            };
                            {
                                let mut to_mut = group_to.borrow_mut();
                                to_mut.addresses.extend(from_addrs.iter().copied());
                                to_mut.members.extend(from_members.iter().copied());
                            }
                            for addr in &from_addrs {
                                addr_to_group.insert(*addr, group_to.clone());
                            }
                            for &member in &from_members {
                                if let Some(entry) = entries[member].as_mut() {
                                    entry.group = group_to.clone();
                                }
                            }
                        }
                    }
                    group_to.borrow_mut().addresses.insert(from_addr);
                    addr_to_group.insert(from_addr, group_to);
                }
                // A copy whose `to` address isn't being tracked by any sink
                // is upstream of a flow this merge never sees a sink for;
                // it's dropped silently, matching the other two algorithms'
                // "no match, nothing to emit" handling.
            } else {
                let key = row.get(keys.source_key)?;
                if let Some(group) = addr_to_group.get(&key).cloned() {
                    let (addresses, members) = {
                        let g = group.borrow();
                        (g.addresses.clone(), g.members.clone())
                    };
                    for addr in &addresses {
                        addr_to_group.remove(addr);
                    }
                    for idx in members {
                        if let Some(entry) = entries[idx].take() {
                            let mut merged = entry.record;
                            merged.merge(row);
                            merged_rows.push(merged);
                        }
                    }
                }
            }
        }

        let mut result = Records::new(Some(merged_rows), concat.columns().to_values())?;
        let mut temp_names: Vec<String> = vec![TMP_KIND.to_string(), TMP_TIMESTAMP.to_string()];
        temp_names.extend(dropped);
        result.drop_column_names(&temp_names);
        result.reindex_columns(&output_names)?;
        Ok(result)
    }
}

fn tag_kind(records: &mut Records, kind: RecordKind) -> Result<()> {
    let values = vec![kind.as_value(); records.len()];
    records.append_column(ColumnValue::new(TMP_KIND), &values)
}

fn tag_timestamp_from(records: &mut Records, stamp_key: &str) -> Result<()> {
    let values: Vec<Value> = records
        .data()
        .iter()
        .map(|row| row.get(stamp_key))
        .collect::<Result<_>>()?;
    records.append_column(ColumnValue::new(TMP_TIMESTAMP), &values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(columns: &[&str], rows: &[&[(&str, Value)]]) -> Records {
        let cols = columns.iter().map(|c| ColumnValue::new(*c)).collect();
        let rows = rows
            .iter()
            .map(|row| Record::from_iter(row.iter().map(|(k, v)| (*k, *v))))
            .collect();
        Records::new(Some(rows), cols).unwrap()
    }

    fn keys<'a>() -> AddressTrackKeys<'a> {
        AddressTrackKeys {
            source_stamp: "source_stamp",
            source_key: "addr",
            copy_stamp: "copy_stamp",
            copy_from: "copy_from",
            copy_to: "copy_to",
            sink_stamp: "sink_stamp",
            sink_from: "sink_from",
        }
    }

    #[test]
    fn direct_source_to_sink_with_no_copies() {
        let source = records(
            &["source_stamp", "addr"],
            &[&[("source_stamp", 1), ("addr", 42)]],
        );
        let copy = records(&["copy_stamp", "copy_from", "copy_to"], &[]);
        let sink = records(
            &["sink_stamp", "sink_from"],
            &[&[("sink_stamp", 2), ("sink_from", 42)]],
        );
        let merged = source.merge_for_address_track(&copy, &sink, keys()).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn follows_a_single_copy_hop() {
        let source = records(
            &["source_stamp", "addr"],
            &[&[("source_stamp", 1), ("addr", 42)]],
        );
        let copy = records(
            &["copy_stamp", "copy_from", "copy_to"],
            &[&[("copy_stamp", 2), ("copy_from", 42), ("copy_to", 99)]],
        );
        let sink = records(
            &["sink_stamp", "sink_from"],
            &[&[("sink_stamp", 3), ("sink_from", 99)]],
        );
        let merged = source.merge_for_address_track(&copy, &sink, keys()).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn converging_sinks_both_emit_against_the_same_source() {
        // Two independently-created sinks (0xB1, 0xB2) each get copied back
        // to the same upstream address 0xA. Once the second copy links them,
        // a single SOURCE at 0xA must resolve to both sinks, not just one.
        let source = records(
            &["source_stamp", "addr"],
            &[&[("source_stamp", 1), ("addr", 0xA)]],
        );
        let copy = records(
            &["copy_stamp", "copy_from", "copy_to"],
            &[
                &[("copy_stamp", 3), ("copy_from", 0xA), ("copy_to", 0xB1)],
                &[("copy_stamp", 2), ("copy_from", 0xA), ("copy_to", 0xB2)],
            ],
        );
        let sink = records(
            &["sink_stamp", "sink_from", "label"],
            &[
                &[("sink_stamp", 5), ("sink_from", 0xB1), ("label", 1)],
                &[("sink_stamp", 4), ("sink_from", 0xB2), ("label", 2)],
            ],
        );

        let merged = source.merge_for_address_track(&copy, &sink, keys()).unwrap();

        assert_eq!(merged.len(), 2);
        let labels: Vec<u64> = merged
            .data()
            .iter()
            .map(|r| r.get("label").unwrap())
            .collect();
        assert!(labels.contains(&1));
        assert!(labels.contains(&2));
    }

    #[test]
    fn source_with_no_sink_is_dropped() {
        let source = records(
            &["source_stamp", "addr"],
            &[&[("source_stamp", 1), ("addr", 42)]],
        );
        let copy = records(&["copy_stamp", "copy_from", "copy_to"], &[]);
        let sink = records(&["sink_stamp", "sink_from"], &[]);
        let merged = source.merge_for_address_track(&copy, &sink, keys()).unwrap();
        assert_eq!(merged.len(), 0);
    }

    #[test]
    fn temp_and_input_only_columns_are_dropped() {
        let source = records(
            &["source_stamp", "addr"],
            &[&[("source_stamp", 1), ("addr", 42)]],
        );
        let copy = records(&["copy_stamp", "copy_from", "copy_to"], &[]);
        let sink = records(
            &["sink_stamp", "sink_from"],
            &[&[("sink_stamp", 2), ("sink_from", 42)]],
        );
        let merged = source.merge_for_address_track(&copy, &sink, keys()).unwrap();
        let names = merged.column_names();
        assert!(!names.contains(&"sink_from".to_string()));
        assert!(!names.contains(&"copy_from".to_string()));
        assert!(!names.contains(&"copy_to".to_string()));
        assert!(!names.contains(&"_tmp_type".to_string()));
    }
}
