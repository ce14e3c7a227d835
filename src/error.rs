use thiserror::Error;

use crate::builder::Stage;
use crate::time::Time;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{table}: header has no {column:?} column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table}: row at line {line} has no {column:?} field")]
    MissingField {
        table: &'static str,
        line: u64,
        column: &'static str,
    },

    #[error("{table}: malformed row at line {line}: {source}")]
    MalformedRow {
        table: &'static str,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("{table}: read failed: {source}")]
    Read {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{step} out of order: schedule is at stage \"{current}\", expected \"{required}\"")]
    OutOfOrder {
        step: &'static str,
        required: Stage,
        current: Stage,
    },

    #[error("invalid service date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("time window start {start} is after its end {end}")]
    InvalidWindow { start: Time, end: Time },
}

pub type Result<T> = std::result::Result<T, LoadError>;
