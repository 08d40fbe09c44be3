use super::{Error, NewConformer, Store, UpsertOutcome, is_storable_label};
use crate::model::atom::{AtomFeatures, ConformerAtom};
use crate::model::conformer::{
    Conformer, LevelOfTheory, Species, StoredLot, WellState, WellUpdate,
};
use crate::model::features::{TsFeatures, WellFeatures};
use crate::model::geometry::GeomMeasure;
use crate::model::ids::{AtomId, BatchId, ConformerId, GroupKey, LotId, ReactionId, SpeciesId};
use crate::model::kinetics::{ArrheniusRate, RateModel};
use crate::model::reaction::{
    AtomMapEdge, AtomRoleTag, IngestBatch, Reaction, ReactionParticipant,
};
use crate::model::types::AtomRole;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// In-memory [`Store`] with a JSON snapshot format.
///
/// Rows are never deleted, so every id is its row position plus one.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    species: Vec<Species>,
    lots: Vec<StoredLot>,
    conformers: Vec<Conformer>,
    atoms: Vec<ConformerAtom>,
    atom_roles: Vec<AtomRoleTag>,
    reactions: Vec<Reaction>,
    participants: Vec<ReactionParticipant>,
    atom_maps: Vec<AtomMapEdge>,
    #[serde(default)]
    batches: Vec<IngestBatch>,
    #[serde(default)]
    rate_models: Vec<RateModel>,
    #[serde(default)]
    geom_measures: Vec<GeomMeasure>,
    #[serde(skip)]
    index: Index,
}

#[derive(Debug, Default)]
struct Index {
    species_by_key: HashMap<String, SpeciesId>,
    lot_by_value: HashMap<LevelOfTheory, LotId>,
    conformer_by_key: HashMap<(SpeciesId, LotId, String), ConformerId>,
    atoms_by_conformer: HashMap<ConformerId, Vec<AtomId>>,
    roles: HashSet<AtomRoleTag>,
    reaction_by_name: HashMap<String, ReactionId>,
    atom_map_keys: HashSet<(ConformerId, ConformerId, AtomId)>,
    batch_by_label: HashMap<String, BatchId>,
    measure_keys: HashSet<(ConformerId, Vec<AtomId>, String)>,
}

fn position(id: u64) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}

fn next_id(len: usize) -> u64 {
    len as u64 + 1
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot written by [`MemoryStore::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref())?;
        let mut store: MemoryStore = serde_json::from_reader(BufReader::new(file))?;
        store.rebuild_index();
        debug!(
            "loaded store snapshot from {} ({} conformers, {} reactions)",
            path.as_ref().display(),
            store.conformers.len(),
            store.reactions.len()
        );
        Ok(store)
    }

    /// Loads `path` if it exists, otherwise starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Writes the whole store as JSON, replacing `path`.
    ///
    /// The snapshot is written next to `path` first and renamed into place, so
    /// a failed save leaves the previous snapshot intact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        std::fs::rename(&staging, path)?;
        Ok(())
    }

    pub fn conformer_count(&self) -> usize {
        self.conformers.len()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn rebuild_index(&mut self) {
        let mut index = Index::default();
        for s in &self.species {
            index.species_by_key.insert(s.key.clone(), s.id);
        }
        for l in &self.lots {
            index.lot_by_value.insert(l.lot.clone(), l.id);
        }
        for c in &self.conformers {
            index
                .conformer_by_key
                .insert((c.species, c.lot, c.geometry_hash.clone()), c.id);
        }
        for a in &self.atoms {
            index
                .atoms_by_conformer
                .entry(a.conformer)
                .or_default()
                .push(a.id);
        }
        index.roles.extend(self.atom_roles.iter().copied());
        for r in &self.reactions {
            index.reaction_by_name.insert(r.name.clone(), r.id);
        }
        index
            .atom_map_keys
            .extend(self.atom_maps.iter().map(AtomMapEdge::key));
        for b in &self.batches {
            index
                .batch_by_label
                .entry(b.source_label.clone())
                .or_insert(b.id);
        }
        index
            .measure_keys
            .extend(self.geom_measures.iter().map(GeomMeasure::key));
        self.index = index;
    }

    fn conformer_ref(&self, id: ConformerId) -> Result<&Conformer, Error> {
        position(id.get())
            .and_then(|i| self.conformers.get(i))
            .ok_or(Error::UnknownConformer(id))
    }

    fn conformer_mut(&mut self, id: ConformerId) -> Result<&mut Conformer, Error> {
        position(id.get())
            .and_then(|i| self.conformers.get_mut(i))
            .ok_or(Error::UnknownConformer(id))
    }

    fn atom_ref(&self, id: AtomId) -> Result<&ConformerAtom, Error> {
        position(id.get())
            .and_then(|i| self.atoms.get(i))
            .ok_or(Error::UnknownAtom(id))
    }

    fn atom_mut(&mut self, id: AtomId) -> Result<&mut ConformerAtom, Error> {
        position(id.get())
            .and_then(|i| self.atoms.get_mut(i))
            .ok_or(Error::UnknownAtom(id))
    }

    fn check_reaction(&self, id: ReactionId) -> Result<(), Error> {
        match position(id.get()) {
            Some(i) if i < self.reactions.len() => Ok(()),
            _ => Err(Error::UnknownReaction(id)),
        }
    }

    fn atom_rows(&self, conformer: ConformerId) -> Vec<&ConformerAtom> {
        self.index
            .atoms_by_conformer
            .get(&conformer)
            .into_iter()
            .flatten()
            .filter_map(|id| position(id.get()).and_then(|i| self.atoms.get(i)))
            .collect()
    }
}

impl Store for MemoryStore {
    fn resolve_species(&mut self, key: &str, smiles: Option<&str>) -> Result<SpeciesId, Error> {
        if let Some(id) = self.index.species_by_key.get(key) {
            let id = *id;
            if let (Some(smiles), Some(pos)) = (smiles, position(id.get())) {
                if let Some(row) = self.species.get_mut(pos) {
                    row.smiles.get_or_insert_with(|| smiles.to_string());
                }
            }
            return Ok(id);
        }
        let id = SpeciesId(next_id(self.species.len()));
        self.species.push(Species {
            id,
            key: key.to_string(),
            smiles: smiles.map(str::to_string),
        });
        self.index.species_by_key.insert(key.to_string(), id);
        Ok(id)
    }

    fn resolve_lot(&mut self, lot: &LevelOfTheory) -> Result<LotId, Error> {
        if let Some(id) = self.index.lot_by_value.get(lot) {
            return Ok(*id);
        }
        let id = LotId(next_id(self.lots.len()));
        self.lots.push(StoredLot {
            id,
            lot: lot.clone(),
        });
        self.index.lot_by_value.insert(lot.clone(), id);
        Ok(id)
    }

    fn upsert_conformer(&mut self, new: NewConformer) -> Result<UpsertOutcome, Error> {
        if position(new.species.get()).is_none_or(|i| i >= self.species.len()) {
            return Err(Error::UnknownSpecies(new.species));
        }
        if position(new.lot.get()).is_none_or(|i| i >= self.lots.len()) {
            return Err(Error::UnknownLot(new.lot));
        }

        let key = (new.species, new.lot, new.geometry_hash.clone());
        if let Some(id) = self.index.conformer_by_key.get(&key).copied() {
            let row = self.conformer_mut(id)?;
            if let Some(label) = new.label {
                row.well.label = Some(label);
            }
            row.is_ts = new.is_ts;
            row.molblock = new.molblock;
            if !new.atom_labels.is_empty() {
                row.atom_labels = new.atom_labels;
            }
            let atoms = self
                .index
                .atoms_by_conformer
                .get(&id)
                .cloned()
                .unwrap_or_default();
            return Ok(UpsertOutcome {
                conformer: id,
                merged: true,
                atoms,
            });
        }

        if new.atoms.is_empty() {
            return Err(Error::EmptyGeometry {
                species: new.species,
            });
        }

        let id = ConformerId(next_id(self.conformers.len()));
        let mut atom_ids = Vec::with_capacity(new.atoms.len());
        for (index, atom) in new.atoms.into_iter().enumerate() {
            let atom_id = AtomId(next_id(self.atoms.len()));
            self.atoms.push(ConformerAtom {
                id: atom_id,
                conformer: id,
                index,
                element: atom.element,
                position: atom.position,
                features: atom.features,
            });
            atom_ids.push(atom_id);
        }
        self.conformers.push(Conformer {
            id,
            species: new.species,
            lot: new.lot,
            geometry_hash: new.geometry_hash,
            is_ts: new.is_ts,
            well: WellState {
                label: new.label,
                ..WellState::default()
            },
            molblock: new.molblock,
            atom_labels: new.atom_labels,
            well_features: None,
            ts_features: Vec::new(),
        });
        self.index.conformer_by_key.insert(key, id);
        self.index.atoms_by_conformer.insert(id, atom_ids.clone());
        Ok(UpsertOutcome {
            conformer: id,
            merged: false,
            atoms: atom_ids,
        })
    }

    fn merge_well_features(
        &mut self,
        conformer: ConformerId,
        features: WellFeatures,
    ) -> Result<(), Error> {
        let row = self.conformer_mut(conformer)?;
        match row.well_features.as_mut() {
            Some(existing) => existing.merge_from(features),
            None => row.well_features = Some(features),
        }
        Ok(())
    }

    fn merge_ts_features(
        &mut self,
        conformer: ConformerId,
        features: TsFeatures,
    ) -> Result<(), Error> {
        if position(features.lot.get()).is_none_or(|i| i >= self.lots.len()) {
            return Err(Error::UnknownLot(features.lot));
        }
        let row = self.conformer_mut(conformer)?;
        match row.ts_features.iter_mut().find(|tf| tf.lot == features.lot) {
            Some(existing) => {
                if features.imag_freq_cm1.is_some() {
                    existing.imag_freq_cm1 = features.imag_freq_cm1;
                }
                if features.irc_verified.is_some() {
                    existing.irc_verified = features.irc_verified;
                }
                if features.e_ts.is_some() {
                    existing.e_ts = features.e_ts;
                }
            }
            None => row.ts_features.push(features),
        }
        Ok(())
    }

    fn open_batch(
        &mut self,
        source_label: &str,
        notes: Option<&str>,
        reuse: bool,
    ) -> Result<BatchId, Error> {
        if reuse {
            if let Some(id) = self.index.batch_by_label.get(source_label) {
                return Ok(*id);
            }
        }
        let id = BatchId(next_id(self.batches.len()));
        self.batches.push(IngestBatch {
            id,
            source_label: source_label.to_string(),
            notes: notes.map(str::to_string),
        });
        self.index
            .batch_by_label
            .entry(source_label.to_string())
            .or_insert(id);
        Ok(id)
    }

    fn batches(&self) -> Result<Vec<IngestBatch>, Error> {
        Ok(self.batches.clone())
    }

    fn upsert_reaction(
        &mut self,
        name: &str,
        family: &str,
        batch: Option<BatchId>,
    ) -> Result<ReactionId, Error> {
        if let Some(id) = self.index.reaction_by_name.get(name) {
            return Ok(*id);
        }
        if let Some(batch) = batch {
            if position(batch.get()).is_none_or(|i| i >= self.batches.len()) {
                return Err(Error::UnknownBatch(batch));
            }
        }
        let id = ReactionId(next_id(self.reactions.len()));
        self.reactions.push(Reaction {
            id,
            name: name.to_string(),
            family: family.to_string(),
            batch,
        });
        self.index.reaction_by_name.insert(name.to_string(), id);
        Ok(id)
    }

    fn reaction_by_name(&self, name: &str) -> Result<Option<Reaction>, Error> {
        Ok(self
            .index
            .reaction_by_name
            .get(name)
            .and_then(|id| position(id.get()))
            .and_then(|i| self.reactions.get(i))
            .cloned())
    }

    fn set_participant(&mut self, participant: ReactionParticipant) -> Result<(), Error> {
        self.check_reaction(participant.reaction)?;
        self.conformer_ref(participant.conformer)?;
        match self
            .participants
            .iter_mut()
            .find(|p| p.reaction == participant.reaction && p.role == participant.role)
        {
            Some(existing) => existing.conformer = participant.conformer,
            None => self.participants.push(participant),
        }
        Ok(())
    }

    fn tag_atom_role(&mut self, atom: AtomId, role: AtomRole) -> Result<bool, Error> {
        self.atom_ref(atom)?;
        let tag = AtomRoleTag { atom, role };
        if !self.index.roles.insert(tag) {
            return Ok(false);
        }
        self.atom_roles.push(tag);
        Ok(true)
    }

    fn merge_atom_features(&mut self, atom: AtomId, features: &AtomFeatures) -> Result<(), Error> {
        self.atom_mut(atom)?.features.merge_from(features);
        Ok(())
    }

    fn upsert_rate_model(
        &mut self,
        reaction: ReactionId,
        rate: &ArrheniusRate,
    ) -> Result<bool, Error> {
        self.check_reaction(reaction)?;
        match self
            .rate_models
            .iter_mut()
            .find(|m| m.reaction == reaction && m.rate.same_identity(rate))
        {
            Some(existing) => {
                existing.rate.merge_from(rate);
                Ok(false)
            }
            None => {
                self.rate_models.push(RateModel {
                    reaction,
                    rate: rate.clone(),
                });
                Ok(true)
            }
        }
    }

    fn rate_models(&self, reaction: ReactionId) -> Result<Vec<RateModel>, Error> {
        Ok(self
            .rate_models
            .iter()
            .filter(|m| m.reaction == reaction)
            .cloned()
            .collect())
    }

    fn insert_geom_measure(&mut self, measure: GeomMeasure) -> Result<bool, Error> {
        self.conformer_ref(measure.conformer)?;
        if measure.atoms.len() != measure.kind.arity() {
            return Err(Error::MeasureArity {
                kind: measure.kind,
                atoms: measure.atoms.len(),
            });
        }
        for atom in &measure.atoms {
            if self.atom_ref(*atom)?.conformer != measure.conformer {
                return Err(Error::ForeignAtom {
                    atom: *atom,
                    conformer: measure.conformer,
                });
            }
        }
        if !self.index.measure_keys.insert(measure.key()) {
            return Ok(false);
        }
        self.geom_measures.push(measure);
        Ok(true)
    }

    fn geom_measures(&self, conformer: ConformerId) -> Result<Vec<GeomMeasure>, Error> {
        Ok(self
            .geom_measures
            .iter()
            .filter(|m| m.conformer == conformer)
            .cloned()
            .collect())
    }

    fn insert_atom_map(&mut self, edge: AtomMapEdge) -> Result<bool, Error> {
        self.conformer_ref(edge.ts_conformer)?;
        self.conformer_ref(edge.from_conformer)?;
        self.atom_ref(edge.from_atom)?;
        self.atom_ref(edge.ts_atom)?;
        if !self.index.atom_map_keys.insert(edge.key()) {
            return Ok(false);
        }
        self.atom_maps.push(edge);
        Ok(true)
    }

    fn apply_well_updates(
        &mut self,
        group: GroupKey,
        updates: &[WellUpdate],
    ) -> Result<(), Error> {
        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            let pos = position(update.conformer.get())
                .filter(|i| *i < self.conformers.len())
                .ok_or(Error::UnknownConformer(update.conformer))?;
            if self.conformers[pos].group() != group {
                return Err(Error::OutsideGroup {
                    group,
                    conformer: update.conformer,
                });
            }
            if !is_storable_label(&update.label) {
                return Err(Error::label_rejected(
                    group,
                    update.conformer,
                    update.label.clone(),
                ));
            }
            targets.push(pos);
        }
        for (pos, update) in targets.into_iter().zip(updates) {
            self.conformers[pos].well.apply(update);
        }
        Ok(())
    }

    fn groups(&self) -> Result<Vec<GroupKey>, Error> {
        let keys: BTreeSet<GroupKey> = self.conformers.iter().map(Conformer::group).collect();
        Ok(keys.into_iter().collect())
    }

    fn group_conformers(&self, group: GroupKey) -> Result<Vec<Conformer>, Error> {
        Ok(self
            .conformers
            .iter()
            .filter(|c| c.group() == group)
            .cloned()
            .collect())
    }

    fn species(&self, id: SpeciesId) -> Result<Option<Species>, Error> {
        Ok(position(id.get()).and_then(|i| self.species.get(i)).cloned())
    }

    fn lot(&self, id: LotId) -> Result<Option<StoredLot>, Error> {
        Ok(position(id.get()).and_then(|i| self.lots.get(i)).cloned())
    }

    fn conformer(&self, id: ConformerId) -> Result<Option<Conformer>, Error> {
        Ok(position(id.get()).and_then(|i| self.conformers.get(i)).cloned())
    }

    fn species_conformers(&self, species: SpeciesId) -> Result<Vec<Conformer>, Error> {
        Ok(self
            .conformers
            .iter()
            .filter(|c| c.species == species)
            .cloned()
            .collect())
    }

    fn conformer_atoms(&self, conformer: ConformerId) -> Result<Vec<ConformerAtom>, Error> {
        self.conformer_ref(conformer)?;
        let mut atoms: Vec<ConformerAtom> =
            self.atom_rows(conformer).into_iter().cloned().collect();
        atoms.sort_by_key(|a| a.index);
        Ok(atoms)
    }

    fn atom_roles(&self, atom: AtomId) -> Result<Vec<AtomRole>, Error> {
        self.atom_ref(atom)?;
        Ok(self
            .atom_roles
            .iter()
            .filter(|t| t.atom == atom)
            .map(|t| t.role)
            .collect())
    }

    fn atoms_with_role(
        &self,
        conformer: ConformerId,
        role: AtomRole,
    ) -> Result<Vec<ConformerAtom>, Error> {
        Ok(self
            .conformer_atoms(conformer)?
            .into_iter()
            .filter(|a| self.index.roles.contains(&AtomRoleTag { atom: a.id, role }))
            .collect())
    }

    fn reactions(&self) -> Result<Vec<Reaction>, Error> {
        Ok(self.reactions.clone())
    }

    fn participants(&self, reaction: ReactionId) -> Result<Vec<ReactionParticipant>, Error> {
        Ok(self
            .participants
            .iter()
            .filter(|p| p.reaction == reaction)
            .copied()
            .collect())
    }

    fn atom_map_edges(&self, ts_conformer: ConformerId) -> Result<Vec<AtomMapEdge>, Error> {
        Ok(self
            .atom_maps
            .iter()
            .filter(|e| e.ts_conformer == ts_conformer)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conformer::WellPlacement;
    use crate::model::geometry::{FeatureFrame, MeasureKind};
    use crate::model::kinetics::{DEFAULT_RATE_MODEL, RateDirection};
    use crate::model::types::{Element, ReactionRole};
    use crate::store::NewAtom;
    use std::collections::BTreeMap;

    fn atoms(n: usize) -> Vec<NewAtom> {
        (0..n)
            .map(|i| NewAtom {
                element: if i == 0 { Element::C } else { Element::H },
                position: [i as f64, 0.0, 0.0],
                features: AtomFeatures::default(),
            })
            .collect()
    }

    fn new_conformer(species: SpeciesId, lot: LotId, hash: &str) -> NewConformer {
        NewConformer {
            species,
            lot,
            geometry_hash: hash.to_string(),
            is_ts: false,
            label: None,
            molblock: "mb".to_string(),
            atom_labels: BTreeMap::new(),
            atoms: atoms(3),
        }
    }

    fn seeded() -> (MemoryStore, SpeciesId, LotId) {
        let mut store = MemoryStore::new();
        let sp = store.resolve_species("CH4", Some("C")).unwrap();
        let lot = store
            .resolve_lot(&LevelOfTheory::parse("wb97x-d/def2-tzvp"))
            .unwrap();
        (store, sp, lot)
    }

    #[test]
    fn species_and_lot_resolution_is_find_or_create() {
        let (mut store, sp, lot) = seeded();
        assert_eq!(store.resolve_species("CH4", None).unwrap(), sp);
        assert_ne!(store.resolve_species("C2H6", None).unwrap(), sp);
        assert_eq!(
            store
                .resolve_lot(&LevelOfTheory::parse("wb97x-d/def2-tzvp"))
                .unwrap(),
            lot
        );
    }

    #[test]
    fn upsert_reports_merge_on_repeated_fingerprint() {
        let (mut store, sp, lot) = seeded();
        let first = store.upsert_conformer(new_conformer(sp, lot, "abc")).unwrap();
        assert!(!first.merged);
        assert_eq!(first.atoms.len(), 3);

        let mut again = new_conformer(sp, lot, "abc");
        again.is_ts = true;
        again.molblock = "mb2".to_string();
        again.label = Some("seed".to_string());
        let second = store.upsert_conformer(again).unwrap();
        assert!(second.merged);
        assert_eq!(second.conformer, first.conformer);
        assert_eq!(second.atoms, first.atoms);
        assert_eq!(store.conformer_count(), 1);
        assert_eq!(store.atom_count(), 3);

        let row = store.conformer(first.conformer).unwrap().unwrap();
        assert!(row.is_ts);
        assert_eq!(row.molblock, "mb2");
        assert_eq!(row.well.label.as_deref(), Some("seed"));

        let other = store.upsert_conformer(new_conformer(sp, lot, "def")).unwrap();
        assert!(!other.merged);
        assert_ne!(other.conformer, first.conformer);
    }

    #[test]
    fn same_fingerprint_at_another_lot_is_a_new_row() {
        let (mut store, sp, lot) = seeded();
        let other_lot = store.resolve_lot(&LevelOfTheory::parse("b3lyp")).unwrap();
        let a = store.upsert_conformer(new_conformer(sp, lot, "abc")).unwrap();
        let b = store
            .upsert_conformer(new_conformer(sp, other_lot, "abc"))
            .unwrap();
        assert!(!b.merged);
        assert_ne!(a.conformer, b.conformer);
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let (mut store, sp, lot) = seeded();
        let mut empty = new_conformer(sp, lot, "x");
        empty.atoms.clear();
        assert!(matches!(
            store.upsert_conformer(empty),
            Err(Error::EmptyGeometry { .. })
        ));
    }

    #[test]
    fn role_tags_and_atom_maps_are_insert_or_skip() {
        let (mut store, sp, lot) = seeded();
        let r = store.upsert_conformer(new_conformer(sp, lot, "r")).unwrap();
        let mut ts_new = new_conformer(sp, lot, "ts");
        ts_new.is_ts = true;
        let ts = store.upsert_conformer(ts_new).unwrap();

        assert!(store.tag_atom_role(r.atoms[0], AtomRole::Donor).unwrap());
        assert!(!store.tag_atom_role(r.atoms[0], AtomRole::Donor).unwrap());
        assert!(store.tag_atom_role(r.atoms[0], AtomRole::Acceptor).unwrap());
        assert_eq!(store.atom_roles(r.atoms[0]).unwrap().len(), 2);
        let donors = store.atoms_with_role(r.conformer, AtomRole::Donor).unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].index, 0);

        let edge = AtomMapEdge {
            ts_conformer: ts.conformer,
            from_conformer: r.conformer,
            from_atom: r.atoms[0],
            ts_atom: ts.atoms[0],
        };
        assert!(store.insert_atom_map(edge).unwrap());
        assert!(!store.insert_atom_map(edge).unwrap());
        assert_eq!(store.atom_map_edges(ts.conformer).unwrap(), vec![edge]);
    }

    #[test]
    fn participants_hold_one_conformer_per_role() {
        let (mut store, sp, lot) = seeded();
        let a = store.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        let b = store.upsert_conformer(new_conformer(sp, lot, "b")).unwrap();
        let rxn = store.upsert_reaction("rxn1", "H_abstraction", None).unwrap();
        assert_eq!(store.upsert_reaction("rxn1", "other", None).unwrap(), rxn);

        for conformer in [a.conformer, b.conformer] {
            store
                .set_participant(ReactionParticipant {
                    reaction: rxn,
                    role: ReactionRole::R1H,
                    conformer,
                })
                .unwrap();
        }
        let parts = store.participants(rxn).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].conformer, b.conformer);
    }

    #[test]
    fn group_write_with_rejected_label_changes_nothing() {
        let (mut store, sp, lot) = seeded();
        let a = store.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        let b = store.upsert_conformer(new_conformer(sp, lot, "b")).unwrap();
        let group = GroupKey::new(sp, lot);
        let placed = |rank| {
            Some(WellPlacement {
                rank,
                is_representative: true,
            })
        };

        let err = store
            .apply_well_updates(
                group,
                &[
                    WellUpdate {
                        conformer: a.conformer,
                        label: "well".into(),
                        placement: placed(1),
                    },
                    WellUpdate {
                        conformer: b.conformer,
                        label: "bad label".into(),
                        placement: placed(2),
                    },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, Error::LabelRejected { conformer, .. } if conformer == b.conformer));
        let untouched = store.conformer(a.conformer).unwrap().unwrap();
        assert_eq!(untouched.well, WellState::default());

        store
            .apply_well_updates(
                group,
                &[WellUpdate {
                    conformer: a.conformer,
                    label: "well".into(),
                    placement: placed(1),
                }],
            )
            .unwrap();
        let written = store.conformer(a.conformer).unwrap().unwrap();
        assert_eq!(written.well.label.as_deref(), Some("well"));
        assert_eq!(written.well.rank, Some(1));
    }

    #[test]
    fn group_write_refuses_foreign_conformers() {
        let (mut store, sp, lot) = seeded();
        let other = store.resolve_species("C2H6", None).unwrap();
        let foreign = store.upsert_conformer(new_conformer(other, lot, "f")).unwrap();
        let err = store
            .apply_well_updates(
                GroupKey::new(sp, lot),
                &[WellUpdate {
                    conformer: foreign.conformer,
                    label: "well".into(),
                    placement: None,
                }],
            )
            .unwrap_err();
        assert!(matches!(err, Error::OutsideGroup { .. }));
    }

    #[test]
    fn features_merge_per_field_and_per_lot() {
        let (mut store, sp, lot) = seeded();
        let c = store.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        store
            .merge_well_features(
                c.conformer,
                WellFeatures {
                    e_elec: Some(-1.0),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .merge_well_features(
                c.conformer,
                WellFeatures {
                    h298: Some(-2.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let wf = store
            .conformer(c.conformer)
            .unwrap()
            .unwrap()
            .well_features
            .unwrap();
        assert_eq!(wf.e_elec, Some(-1.0));
        assert_eq!(wf.h298, Some(-2.0));

        let mut tf = TsFeatures::new(lot);
        tf.e_ts = Some(12.0);
        store.merge_ts_features(c.conformer, tf).unwrap();
        let mut tf = TsFeatures::new(lot);
        tf.imag_freq_cm1 = Some(-1500.0);
        store.merge_ts_features(c.conformer, tf).unwrap();
        let row = store.conformer(c.conformer).unwrap().unwrap();
        assert_eq!(row.ts_features.len(), 1);
        assert_eq!(row.ts_features[0].e_ts, Some(12.0));
        assert_eq!(row.ts_features[0].imag_freq_cm1, Some(-1500.0));
    }

    #[test]
    fn snapshot_round_trip_rebuilds_indexes() {
        let (mut store, sp, lot) = seeded();
        let c = store.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        store.tag_atom_role(c.atoms[1], AtomRole::DHydrogen).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        store.save(&path).unwrap();

        let mut loaded = MemoryStore::load(&path).unwrap();
        let again = loaded.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        assert!(again.merged);
        assert_eq!(again.atoms, c.atoms);
        assert!(!loaded.tag_atom_role(c.atoms[1], AtomRole::DHydrogen).unwrap());
        assert_eq!(loaded.resolve_species("CH4", None).unwrap(), sp);
    }

    #[test]
    fn open_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.conformer_count(), 0);
        assert!(store.groups().unwrap().is_empty());
    }

    fn rate(direction: RateDirection, a: f64) -> ArrheniusRate {
        ArrheniusRate {
            direction,
            model: DEFAULT_RATE_MODEL.to_string(),
            a,
            n: Some(2.0),
            ea_kj_mol: 35.0,
            tmin_k: 300.0,
            tmax_k: 1500.0,
            source: Some("arrhenius_csv".to_string()),
            reference: None,
            da_factor: None,
            dn_abs: None,
            dea_kj_mol: None,
            meta: Default::default(),
        }
    }

    #[test]
    fn batches_are_reused_by_label_only_on_request() {
        let mut store = MemoryStore::new();
        let first = store.open_batch("set-a", Some("SDF: a.sdf"), false).unwrap();
        assert_eq!(store.open_batch("set-a", None, true).unwrap(), first);
        let fresh = store.open_batch("set-a", None, false).unwrap();
        assert_ne!(fresh, first);
        assert_eq!(store.batches().unwrap().len(), 2);

        let rxn = store.upsert_reaction("rxn1", "H_abstraction", Some(first)).unwrap();
        store.upsert_reaction("rxn1", "H_abstraction", Some(fresh)).unwrap();
        let stored = store.reaction_by_name("rxn1").unwrap().unwrap();
        assert_eq!(stored.id, rxn);
        assert_eq!(stored.batch, Some(first));
        assert!(store.reaction_by_name("rxn2").unwrap().is_none());
        assert!(matches!(
            store.upsert_reaction("rxn2", "H_abstraction", Some(BatchId(9))),
            Err(Error::UnknownBatch(_))
        ));
    }

    #[test]
    fn rate_models_merge_on_identity() {
        let mut store = MemoryStore::new();
        let rxn = store.upsert_reaction("rxn1", "H_abstraction", None).unwrap();
        assert!(store.upsert_rate_model(rxn, &rate(RateDirection::Forward, 1e6)).unwrap());
        assert!(store.upsert_rate_model(rxn, &rate(RateDirection::Reverse, 1e5)).unwrap());
        assert!(!store.upsert_rate_model(rxn, &rate(RateDirection::Forward, 3e6)).unwrap());

        let models = store.rate_models(rxn).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].rate.a, 3e6);
        assert!(matches!(
            store.upsert_rate_model(ReactionId(7), &rate(RateDirection::Forward, 1.0)),
            Err(Error::UnknownReaction(_))
        ));
    }

    #[test]
    fn atom_features_and_geometry_measures_attach_to_stored_atoms() {
        let (mut store, sp, lot) = seeded();
        let c = store.upsert_conformer(new_conformer(sp, lot, "a")).unwrap();
        let other = store.upsert_conformer(new_conformer(sp, lot, "b")).unwrap();

        store
            .merge_atom_features(
                c.atoms[0],
                &AtomFeatures {
                    partial_charge: Some(-0.3),
                    ..Default::default()
                },
            )
            .unwrap();
        let atoms = store.conformer_atoms(c.conformer).unwrap();
        assert_eq!(atoms[0].features.partial_charge, Some(-0.3));

        let measure = GeomMeasure {
            conformer: c.conformer,
            kind: MeasureKind::Distance,
            frame: FeatureFrame::RefDHydrogen,
            atoms: vec![c.atoms[0], c.atoms[1]],
            value: 1.09,
            measure_name: "csv_radius".to_string(),
            feature_ver: None,
        };
        assert!(store.insert_geom_measure(measure.clone()).unwrap());
        assert!(!store.insert_geom_measure(measure.clone()).unwrap());
        assert_eq!(store.geom_measures(c.conformer).unwrap(), vec![measure.clone()]);

        let foreign = GeomMeasure {
            atoms: vec![c.atoms[0], other.atoms[1]],
            ..measure.clone()
        };
        assert!(matches!(
            store.insert_geom_measure(foreign),
            Err(Error::ForeignAtom { .. })
        ));
        let short = GeomMeasure {
            kind: MeasureKind::Angle,
            ..measure
        };
        assert!(matches!(
            store.insert_geom_measure(short),
            Err(Error::MeasureArity { atoms: 2, .. })
        ));
    }
}
