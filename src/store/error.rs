use crate::model::ids::{AtomId, BatchId, ConformerId, GroupKey, LotId, ReactionId, SpeciesId};
use crate::model::geometry::MeasureKind;
use thiserror::Error;

/// Errors raised by a [`Store`](super::Store) implementation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("store I/O failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to read or write store snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("species {0} does not exist")]
    UnknownSpecies(SpeciesId),

    #[error("level of theory {0} does not exist")]
    UnknownLot(LotId),

    #[error("conformer {0} does not exist")]
    UnknownConformer(ConformerId),

    #[error("atom {0} does not exist")]
    UnknownAtom(AtomId),

    #[error("reaction {0} does not exist")]
    UnknownReaction(ReactionId),

    #[error("ingest batch {0} does not exist")]
    UnknownBatch(BatchId),

    #[error("atom {atom} does not belong to conformer {conformer}")]
    ForeignAtom { atom: AtomId, conformer: ConformerId },

    #[error("a {kind:?} measure spans {} atoms, got {atoms}", .kind.arity())]
    MeasureArity { kind: MeasureKind, atoms: usize },

    /// A conformer geometry without atoms cannot be fingerprinted or stored.
    #[error("conformer geometry for species {species} has no atoms")]
    EmptyGeometry { species: SpeciesId },

    /// A well label is not a plain identifier and cannot be stored.
    ///
    /// Raised before any row of the group is written, so the group keeps its
    /// previous labels.
    #[error("well label {label:?} for conformer {conformer} ({group}) is not storable")]
    LabelRejected {
        group: GroupKey,
        conformer: ConformerId,
        label: String,
    },

    /// A group write named a conformer that belongs to a different group.
    #[error("conformer {conformer} is not part of {group}")]
    OutsideGroup {
        group: GroupKey,
        conformer: ConformerId,
    },
}

impl Error {
    pub fn label_rejected(
        group: GroupKey,
        conformer: ConformerId,
        label: impl Into<String>,
    ) -> Self {
        Self::LabelRejected {
            group,
            conformer,
            label: label.into(),
        }
    }

    /// The conformer the error is about, if any.
    pub fn conformer(&self) -> Option<ConformerId> {
        match self {
            Error::UnknownConformer(id) => Some(*id),
            Error::ForeignAtom { conformer, .. } => Some(*conformer),
            Error::LabelRejected { conformer, .. } | Error::OutsideGroup { conformer, .. } => {
                Some(*conformer)
            }
            _ => None,
        }
    }
}
