use super::ids::{AtomId, BatchId, ConformerId, ReactionId};
use super::types::{AtomRole, ReactionRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: ReactionId,
    pub name: String,
    pub family: String,
    /// Batch that first stored the reaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchId>,
}

/// Provenance of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestBatch {
    pub id: BatchId,
    pub source_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionParticipant {
    pub reaction: ReactionId,
    pub role: ReactionRole,
    pub conformer: ConformerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomRoleTag {
    pub atom: AtomId,
    pub role: AtomRole,
}

/// Directed correspondence from a reactant atom to a transition-state atom.
///
/// Unique on `(ts_conformer, from_conformer, from_atom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtomMapEdge {
    pub ts_conformer: ConformerId,
    pub from_conformer: ConformerId,
    pub from_atom: AtomId,
    pub ts_atom: AtomId,
}

impl AtomMapEdge {
    #[inline]
    pub fn key(&self) -> (ConformerId, ConformerId, AtomId) {
        (self.ts_conformer, self.from_conformer, self.from_atom)
    }
}
