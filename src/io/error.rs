use crate::model::types::ReactionRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to read CSV table: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("failed to parse SDF data: {details} (at line ~{line})")]
    Parse { line: usize, details: String },

    #[error("record {record} carries no valid R1H/R2H/TS role field")]
    MissingRole { record: usize },

    #[error("record {record} repeats role {role} within one triplet")]
    DuplicateRole { record: usize, role: ReactionRole },

    #[error("file ended with an incomplete triplet containing roles: {roles}")]
    IncompleteTriplet { roles: String },

    #[error("record {record} names reaction '{found}' but its triplet is '{expected}'")]
    ReactionMismatch {
        record: usize,
        expected: String,
        found: String,
    },
}

impl Error {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}
