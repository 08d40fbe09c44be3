use crate::model::ids::{ConformerId, GroupKey};
use crate::store;
use thiserror::Error;

/// Failure to relabel one (species, level of theory) group.
///
/// A group either receives all of its new assignments or none, so every
/// variant means the group still carries its previous labels.
#[derive(Debug, Error)]
pub enum Error {
    /// A computed or carried-over label could not be stored.
    #[error("{group}: label {label:?} for conformer {conformer} cannot be stored")]
    LabelRejected {
        group: GroupKey,
        conformer: ConformerId,
        label: String,
    },

    /// Reading or writing the group failed.
    #[error("{group}: {source}")]
    Store {
        group: GroupKey,
        #[source]
        source: store::Error,
    },
}

impl Error {
    pub(crate) fn from_store(group: GroupKey, source: store::Error) -> Self {
        match source {
            store::Error::LabelRejected {
                group,
                conformer,
                label,
            } => Self::LabelRejected {
                group,
                conformer,
                label,
            },
            source => Self::Store { group, source },
        }
    }

    pub fn group(&self) -> GroupKey {
        match self {
            Error::LabelRejected { group, .. } | Error::Store { group, .. } => *group,
        }
    }

    /// The conformer the failure is about, when it names one.
    pub fn conformer(&self) -> Option<ConformerId> {
        match self {
            Error::LabelRejected { conformer, .. } => Some(*conformer),
            Error::Store { source, .. } => source.conformer(),
        }
    }
}
