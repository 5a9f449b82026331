//! Errors reported by this crate.
//!
//! Solver non-convergence is not an error: the solvers log a warning and
//! return their last estimate. A day before the first known era is not an
//! error either, lookups return `None`.

use std::num::ParseIntError;

use thiserror::Error;

/// Shorthand for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An era table or chronology failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
    /// A civil date that does not exist.
    #[error("no such civil date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: i32, day: i32 },
    /// A format style other than `F`, `L`, `M` or `S`.
    #[error("unknown format style {0:?}")]
    UnknownStyle(String),
}

/// What exactly is wrong with an era table or a chronology.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("line {line_num}, field {field_num}: {reason}")]
    Table {
        line_num: usize,
        field_num: usize,
        reason: TableErrorKind,
    },
    #[error("empty key in period {period:?}")]
    EmptyKey { period: String },
    #[error("period {period:?} has no eras")]
    EmptyPeriod { period: String },
    #[error("era {period}.{era} does not end after it starts")]
    NonPositiveSpan { period: String, era: String },
    #[error("era {period}.{era} starts before the previous era ends")]
    Overlap { period: String, era: String },
    #[error("era {period}.{era} appears twice")]
    DuplicateKey { period: String, era: String },
    #[error("era {period}.{era} is open-ended but not the last era")]
    OpenEnded { period: String, era: String },
    #[error("chronology parameter {0} out of range")]
    Chronology(&'static str),
}

/// Reasons for rejecting a line of an era table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableErrorKind {
    #[error("missing field")]
    MissingField,
    #[error("unexpected field")]
    ExtraField,
    #[error("invalid number: {0}")]
    InvalidInt(#[source] ParseIntError),
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("unknown lineage {0:?}")]
    UnknownLineage(String),
    #[error("era before any period")]
    NoPeriod,
}
