//! Persistence contract for reaction and conformer data.
//!
//! The engines in this crate never talk to a database directly. They work
//! against the [`Store`] trait, which captures what they need from a
//! persistence layer:
//!
//! - atomic upsert of a conformer keyed on (species, level of theory,
//!   geometry fingerprint), reporting whether the row was merged;
//! - idempotent insert-or-skip for atom role tags and atom-map edges;
//! - all conformers of one (species, level-of-theory) group, with features;
//! - a single all-or-nothing write of well assignments per group.
//!
//! Ingestion also records batch provenance, rate models from kinetics tables,
//! per-atom features and geometry measures through the same trait.
//!
//! [`MemoryStore`] is the bundled implementation. It keeps rows in memory and
//! persists them as a JSON snapshot.

mod error;
mod memory;

pub use error::Error;
pub use memory::MemoryStore;

use crate::model::atom::{Atom, AtomFeatures, ConformerAtom};
use crate::model::conformer::{Conformer, LevelOfTheory, Species, StoredLot, WellUpdate};
use crate::model::features::{TsFeatures, WellFeatures};
use crate::model::geometry::GeomMeasure;
use crate::model::ids::{AtomId, BatchId, ConformerId, GroupKey, LotId, ReactionId, SpeciesId};
use crate::model::kinetics::{ArrheniusRate, RateModel};
use crate::model::reaction::{AtomMapEdge, IngestBatch, Reaction, ReactionParticipant};
use crate::model::types::{AtomRole, Element};
use std::collections::BTreeMap;

/// Longest well label a store accepts.
pub const MAX_LABEL_LEN: usize = 64;

/// Returns `true` when `label` can be stored as a well label: 1 to
/// [`MAX_LABEL_LEN`] printable ASCII characters without whitespace.
pub fn is_storable_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.bytes().all(|b| b.is_ascii_graphic())
}

/// An atom to be stored with a freshly inserted conformer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAtom {
    pub element: Element,
    pub position: [f64; 3],
    pub features: AtomFeatures,
}

impl From<&Atom> for NewAtom {
    fn from(atom: &Atom) -> Self {
        Self {
            element: atom.element,
            position: atom.position,
            features: AtomFeatures::default(),
        }
    }
}

/// A conformer row to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConformer {
    pub species: SpeciesId,
    pub lot: LotId,
    pub geometry_hash: String,
    pub is_ts: bool,
    /// Label carried by the source record. `None` keeps the stored label on merge.
    pub label: Option<String>,
    pub molblock: String,
    pub atom_labels: BTreeMap<usize, String>,
    /// Atoms in source order. Only stored when the row is freshly created.
    pub atoms: Vec<NewAtom>,
}

/// Result of [`Store::upsert_conformer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub conformer: ConformerId,
    /// `true` when the geometry was already stored and the row was updated.
    pub merged: bool,
    /// Atom ids of the conformer, in atom index order.
    pub atoms: Vec<AtomId>,
}

/// Storage backend for species, conformers, features and reaction data.
///
/// Read methods return owned values so implementations may be backed by
/// anything from a `Vec` to a database connection.
pub trait Store {
    /// Finds a species by natural key, creating it if missing.
    fn resolve_species(&mut self, key: &str, smiles: Option<&str>) -> Result<SpeciesId, Error>;

    /// Finds a level of theory by value, creating it if missing.
    fn resolve_lot(&mut self, lot: &LevelOfTheory) -> Result<LotId, Error>;

    /// Inserts a conformer, or merges into the row with the same species,
    /// level of theory and geometry fingerprint.
    ///
    /// A merge updates the label (when given), TS flag, structure encoding and
    /// atom labels (when non-empty) of the existing row. Atoms are inserted only
    /// for new rows.
    fn upsert_conformer(&mut self, conformer: NewConformer) -> Result<UpsertOutcome, Error>;

    /// Overlays the present fields of `features` onto the conformer's well features.
    fn merge_well_features(
        &mut self,
        conformer: ConformerId,
        features: WellFeatures,
    ) -> Result<(), Error>;

    /// Overlays TS features for `features.lot`, keeping one row per level of theory.
    fn merge_ts_features(&mut self, conformer: ConformerId, features: TsFeatures)
    -> Result<(), Error>;

    /// Creates a batch, or with `reuse` returns the first batch already
    /// recorded under `source_label`.
    fn open_batch(
        &mut self,
        source_label: &str,
        notes: Option<&str>,
        reuse: bool,
    ) -> Result<BatchId, Error>;

    /// All batches in id order.
    fn batches(&self) -> Result<Vec<IngestBatch>, Error>;

    /// Finds a reaction by name, creating it with `family` and `batch` if
    /// missing. An existing reaction keeps its family and batch.
    fn upsert_reaction(
        &mut self,
        name: &str,
        family: &str,
        batch: Option<BatchId>,
    ) -> Result<ReactionId, Error>;

    fn reaction_by_name(&self, name: &str) -> Result<Option<Reaction>, Error>;

    /// Sets the conformer of one reaction role, replacing any previous one.
    fn set_participant(&mut self, participant: ReactionParticipant) -> Result<(), Error>;

    /// Tags an atom with a role. Returns `false` when the tag already existed.
    fn tag_atom_role(&mut self, atom: AtomId, role: AtomRole) -> Result<bool, Error>;

    /// Overwrites the present fields of `features` on a stored atom.
    fn merge_atom_features(&mut self, atom: AtomId, features: &AtomFeatures) -> Result<(), Error>;

    /// Stores a rate for `reaction`. A stored rate with the same identity
    /// (direction, source, reference, temperature range) takes the new
    /// parameters instead; the result is then `false`.
    fn upsert_rate_model(&mut self, reaction: ReactionId, rate: &ArrheniusRate)
    -> Result<bool, Error>;

    /// Rates of one reaction in insertion order.
    fn rate_models(&self, reaction: ReactionId) -> Result<Vec<RateModel>, Error>;

    /// Inserts a geometry measure. Returns `false` when one with the same
    /// (conformer, atoms, measure name) already existed.
    fn insert_geom_measure(&mut self, measure: GeomMeasure) -> Result<bool, Error>;

    fn geom_measures(&self, conformer: ConformerId) -> Result<Vec<GeomMeasure>, Error>;

    /// Inserts an atom-map edge. Returns `false` when an edge with the same
    /// (ts_conformer, from_conformer, from_atom) already existed.
    fn insert_atom_map(&mut self, edge: AtomMapEdge) -> Result<bool, Error>;

    /// Writes well assignments for one group, all or nothing.
    ///
    /// Every update is validated first; if any label is not storable or any
    /// conformer is outside `group`, nothing is written.
    fn apply_well_updates(&mut self, group: GroupKey, updates: &[WellUpdate])
    -> Result<(), Error>;

    /// Every (species, level-of-theory) pair with at least one conformer, sorted.
    fn groups(&self) -> Result<Vec<GroupKey>, Error>;

    /// All conformers of a group, with their features, in id order.
    fn group_conformers(&self, group: GroupKey) -> Result<Vec<Conformer>, Error>;

    fn species(&self, id: SpeciesId) -> Result<Option<Species>, Error>;

    fn lot(&self, id: LotId) -> Result<Option<StoredLot>, Error>;

    fn conformer(&self, id: ConformerId) -> Result<Option<Conformer>, Error>;

    /// All conformers of a species across levels of theory, in id order.
    fn species_conformers(&self, species: SpeciesId) -> Result<Vec<Conformer>, Error>;

    /// Atoms of a conformer in index order.
    fn conformer_atoms(&self, conformer: ConformerId) -> Result<Vec<ConformerAtom>, Error>;

    /// Roles tagged on one atom.
    fn atom_roles(&self, atom: AtomId) -> Result<Vec<AtomRole>, Error>;

    /// Atoms of a conformer carrying `role`, in index order.
    fn atoms_with_role(
        &self,
        conformer: ConformerId,
        role: AtomRole,
    ) -> Result<Vec<ConformerAtom>, Error>;

    /// All reactions in id order.
    fn reactions(&self) -> Result<Vec<Reaction>, Error>;

    fn participants(&self, reaction: ReactionId) -> Result<Vec<ReactionParticipant>, Error>;

    /// Atom-map edges into one TS conformer.
    fn atom_map_edges(&self, ts_conformer: ConformerId) -> Result<Vec<AtomMapEdge>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storable_labels_are_plain_ascii_tokens() {
        assert!(is_storable_label("well"));
        assert!(is_storable_label("iso12_ab"));
        assert!(is_storable_label("unknown"));
        assert!(is_storable_label("conf-3"));
        assert!(!is_storable_label(""));
        assert!(!is_storable_label("two words"));
        assert!(!is_storable_label("caf\u{e9}"));
        assert!(!is_storable_label("tab\there"));
        assert!(!is_storable_label(&"x".repeat(MAX_LABEL_LEN + 1)));
    }
}
