//! Error types shared by every operation in this crate.

use thiserror::Error;

/// Errors produced by [`crate::Record`], [`crate::Records`] and the merge
/// entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordsError {
    /// A referenced column name does not exist on the columns collection in
    /// play.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// An attempt to introduce a column name that already exists.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// A value slice handed to `append_column` doesn't have one entry per
    /// existing row.
    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A row index was out of bounds for the record collection.
    #[error("row index {index} out of range (len = {len})")]
    OutOfRange { index: usize, len: usize },

    /// A `how` value isn't valid for the operation it was passed to. Kept on
    /// this enum for completeness, but unreachable in practice: `how` is a
    /// checked enum (`JoinHow`/`SequentialHow`) at every call site, so an
    /// invalid mode is a compile error rather than something to return here.
    #[error("invalid join mode: {0}")]
    InvalidHow(String),

    /// An internal invariant was violated. These surface to the caller of
    /// the top-level operation rather than panicking, but callers should
    /// treat them as bugs in this crate or in how it's being used, not as a
    /// condition to branch on.
    #[error("internal invariant violated: {0}")]
    ProgrammerError(String),
}

/// The `Result` alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RecordsError>;
