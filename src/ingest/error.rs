use crate::model::types::ReactionRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] crate::io::Error),

    #[error(transparent)]
    Store(#[from] crate::store::Error),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record without atoms cannot be fingerprinted.
    #[error("{role} record {record} of reaction '{reaction}' has no atoms")]
    EmptyGeometry {
        reaction: String,
        role: ReactionRole,
        record: usize,
    },
}
