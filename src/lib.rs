//! A record-merging engine for column-oriented, integer-valued row tables.
//!
//! This crate models the row store (`Record`/`Records`) that sits underneath
//! a trace-analysis pipeline's latency reconstruction: every cell is a
//! `u64` handle (a timestamp, an address, or an index into a side-table of
//! strings resolved through a [`Mapper`]), and the three merge algorithms
//! (`Records::merge`, `Records::merge_sequential`,
//! `Records::merge_for_address_track`) are what turn independently recorded
//! event streams into the joined view an analysis actually runs against.
//!
//! Nothing in this crate is safe to share across threads: a `Records` is a
//! single-owner, single-threaded value, and the merge algorithms assume they
//! have exclusive access to the inputs they read for the duration of the
//! call (though, notably, they never mutate those inputs — see each
//! algorithm's doc comment).

#![warn(missing_docs)]

mod column;
mod columns;
mod error;
mod grouped_records;
mod merge;
mod record;
mod records;
mod series;
mod tabular;
mod value;

pub use column::{Column, ColumnAttribute, ColumnValue};
pub use columns::Columns;
pub use error::RecordsError;
pub use error::Result as RecordsResult;
pub use grouped_records::GroupedRecords;
pub use merge::{merge, merge_for_address_track, merge_sequential, AddressTrackKeys, JoinHow, SequentialHow};
pub use record::Record;
pub use records::Records;
pub use series::ColumnSeries;
pub use tabular::{Cell, ClockConverter, Tabular};
pub use value::{Mapper, Value, MAX};
