//! The three join algorithms this crate provides (keyed relational merge,
//! time-ordered sequential merge, and address-tracking flow merge), plus
//! top-level free functions that mirror the instance methods one-for-one.
//!
//! The free functions exist purely so callers can write `merge(left, right,
//! ...)` instead of `left.merge(right, ...)` when that reads better at a
//! call site; they're pure delegation, since there's exactly one `Records`
//! type and so no runtime check needed to confirm `left` and `right` are the
//! same concrete implementation.

mod addr_track;
mod keyed;
mod sequential;

pub use addr_track::AddressTrackKeys;
pub use keyed::JoinHow;
pub use sequential::SequentialHow;

use crate::error::Result;
use crate::records::Records;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn as_value(self) -> Value {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

pub(crate) const TMP_SIDE: &str = "_tmp_side";

/// Relational join over `join_left_keys`/`join_right_keys`. See
/// [`Records::merge`].
pub fn merge(
    left: &Records,
    right: &Records,
    join_left_keys: &[String],
    join_right_keys: &[String],
    how: JoinHow,
) -> Result<Records> {
    left.merge(right, join_left_keys, join_right_keys, how)
}

/// Time-ordered join. See [`Records::merge_sequential`].
pub fn merge_sequential(
    left: &Records,
    right: &Records,
    left_stamp_key: &str,
    right_stamp_key: &str,
    join_left_keys: &[String],
    join_right_keys: &[String],
    how: SequentialHow,
) -> Result<Records> {
    left.merge_sequential(
        right,
        left_stamp_key,
        right_stamp_key,
        join_left_keys,
        join_right_keys,
        how,
    )
}

/// Three-way source/copy/sink flow join. See
/// [`Records::merge_for_address_track`].
pub fn merge_for_address_track(
    source: &Records,
    copy: &Records,
    sink: &Records,
    keys: AddressTrackKeys<'_>,
) -> Result<Records> {
    source.merge_for_address_track(copy, sink, keys)
}
