//! Loading reaction triplets into a [`Store`].
//!
//! Each file is recorded as an [`IngestBatch`](crate::model::reaction::IngestBatch)
//! before its first triplet is written. For every record of a triplet the
//! [`Ingestor`]:
//!
//! 1. resolves the species (InChIKey, SMILES or `species` item, else a
//!    reaction-scoped key) and the level of theory;
//! 2. fingerprints the geometry and upserts the conformer, reporting merges;
//! 3. tags `donor`/`acceptor`/`d_hydrogen`/`a_hydrogen` atoms from
//!    `mol_properties`;
//! 4. records well features (R1H, R2H) or TS features (TS);
//! 5. overlays the per-atom table's rows, optionally as geometry measures.
//!
//! It then links the three conformers to the reaction, stores the reaction's
//! rates from the kinetics table and, unless disabled, builds the triplet's
//! atom map.

mod energy;
mod error;

pub use energy::{ts_features, well_features};
pub use error::Error;

use crate::config::IngestConfig;
use crate::fingerprint::geometry_hash;
use crate::io::{AtomTable, KineticsTable, MolRecord, ReactionTriplet, TripletReader};
use crate::mapping::{self, MappingOutcome, TripletConformers};
use crate::model::conformer::LevelOfTheory;
use crate::model::geometry::{FeatureFrame, GeomMeasure, MeasureKind};
use crate::model::ids::{AtomId, BatchId, ConformerId};
use crate::model::reaction::ReactionParticipant;
use crate::model::types::ReactionRole;
use crate::store::{NewAtom, NewConformer, Store, UpsertOutcome, is_storable_label};
use crate::wells::label::sanitize_label;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reaction family recorded for every ingested reaction.
pub const REACTION_FAMILY: &str = "H_abstraction";
/// Name given to triplets whose records carry no reaction name.
pub const UNNAMED_REACTION: &str = "unnamed_rxn";
/// `feature_ver` of measures mirrored from the per-atom table.
pub const MEASURE_FEATURE_VERSION: &str = "csv_v1";

const SPECIES_FIELDS: [&str; 5] = ["inchikey", "InChIKey", "smiles", "SMILES", "species"];
const SMILES_FIELDS: [&str; 2] = ["smiles", "SMILES"];
const LOT_FIELDS: [&str; 3] = ["level_of_theory", "lot", "LOT"];
const LABEL_FIELDS: [&str; 2] = ["well_label", "label"];

/// A conformer upsert that landed on an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEvent {
    pub reaction: String,
    pub role: ReactionRole,
    pub record: usize,
    pub conformer: ConformerId,
}

/// Counts for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub triplets: usize,
    /// Already complete reactions left alone under `skip_if_loaded`.
    pub reactions_skipped: usize,
    pub conformers_created: usize,
    pub conformers_merged: usize,
    pub atoms_inserted: usize,
    pub role_tags_added: usize,
    pub well_features: usize,
    pub ts_features: usize,
    /// Kinetics table rows stored (or, in a dry run, found) for the triplets.
    pub kinetics_rows: usize,
    pub atom_rows_matched: usize,
    /// Atoms of tabulated reactions that the per-atom table has no row for.
    pub atoms_without_row: usize,
    pub geom_measures_added: usize,
    pub mapping: MappingOutcome,
    pub merges: Vec<MergeEvent>,
}

impl IngestReport {
    pub fn absorb(&mut self, other: IngestReport) {
        self.triplets += other.triplets;
        self.reactions_skipped += other.reactions_skipped;
        self.conformers_created += other.conformers_created;
        self.conformers_merged += other.conformers_merged;
        self.atoms_inserted += other.atoms_inserted;
        self.role_tags_added += other.role_tags_added;
        self.well_features += other.well_features;
        self.ts_features += other.ts_features;
        self.kinetics_rows += other.kinetics_rows;
        self.atom_rows_matched += other.atom_rows_matched;
        self.atoms_without_row += other.atoms_without_row;
        self.geom_measures_added += other.geom_measures_added;
        self.mapping.absorb(other.mapping);
        self.merges.extend(other.merges);
    }
}

pub struct Ingestor<'s, S: Store + ?Sized> {
    store: &'s mut S,
    config: IngestConfig,
    dry_run: bool,
    kinetics: Option<&'s KineticsTable>,
    atom_table: Option<&'s AtomTable>,
    source_label: Option<String>,
    /// Batch of the stream being ingested.
    batch: Option<BatchId>,
}

impl<'s, S: Store + ?Sized> Ingestor<'s, S> {
    pub fn new(store: &'s mut S, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            dry_run: false,
            kinetics: None,
            atom_table: None,
            source_label: None,
            batch: None,
        }
    }

    /// Parse and validate only; the store is not touched.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Rates to store for every ingested reaction found in `kinetics`.
    pub fn kinetics(mut self, kinetics: &'s KineticsTable) -> Self {
        self.kinetics = Some(kinetics);
        self
    }

    /// Per-atom rows overlaid on every ingested conformer found in `table`.
    pub fn atom_table(mut self, table: &'s AtomTable) -> Self {
        self.atom_table = Some(table);
        self
    }

    /// Batch label for the following streams. Files default to their path.
    pub fn source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    pub fn ingest_file(&mut self, path: impl AsRef<Path>) -> Result<IngestReport, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let label = self
            .source_label
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        let notes = format!("SDF: {}", path.display());
        let batch = Some((label.as_str(), Some(notes.as_str())));
        let report = self.ingest_stream(BufReader::new(file), batch)?;
        info!(
            "{}: {} triplets ({} skipped), {} conformers created, {} merged",
            path.display(),
            report.triplets,
            report.reactions_skipped,
            report.conformers_created,
            report.conformers_merged
        );
        Ok(report)
    }

    /// Ingests every triplet of an SDF stream.
    ///
    /// The whole stream is read and validated before the first write, so a
    /// malformed file leaves the store untouched. A batch is recorded only
    /// when a source label was given.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R) -> Result<IngestReport, Error> {
        let label = self.source_label.clone();
        self.ingest_stream(reader, label.as_deref().map(|l| (l, None)))
    }

    fn ingest_stream<R: BufRead>(
        &mut self,
        reader: R,
        batch: Option<(&str, Option<&str>)>,
    ) -> Result<IngestReport, Error> {
        let triplets = TripletReader::new(reader, self.config.triplet_options())
            .collect::<Result<Vec<_>, _>>()?;
        for triplet in &triplets {
            validate(triplet)?;
        }

        self.batch = None;
        if let Some((label, notes)) = batch {
            if !self.dry_run {
                let id = self.store.open_batch(label, notes, self.config.reuse_batch)?;
                debug!("batch {id} ('{label}') opened");
                self.batch = Some(id);
            }
        }

        let mut report = IngestReport::default();
        let result = triplets
            .iter()
            .try_for_each(|triplet| self.ingest_triplet(triplet, &mut report));
        self.batch = None;
        result.map(|()| report)
    }

    pub fn ingest_triplet(
        &mut self,
        triplet: &ReactionTriplet,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        validate(triplet)?;
        let reaction = match triplet.reaction_name.as_deref() {
            Some(name) => name.to_string(),
            None => {
                warn!(
                    "triplet at record {} has no reaction name; using '{UNNAMED_REACTION}'",
                    triplet.r1h.record.index
                );
                UNNAMED_REACTION.to_string()
            }
        };

        report.triplets += 1;
        if self.dry_run {
            report.kinetics_rows += self.kinetics.map_or(0, |k| k.rates(&reaction).len());
            debug!("reaction '{reaction}': validated (dry run)");
            return Ok(());
        }
        if self.config.skip_if_loaded && self.is_loaded(&reaction)? {
            info!("reaction '{reaction}': all participants already stored; skipped");
            report.reactions_skipped += 1;
            return Ok(());
        }

        let r1h = self.ingest_record(&reaction, &triplet.r1h, report)?;
        let r2h = self.ingest_record(&reaction, &triplet.r2h, report)?;
        let ts = self.ingest_record(&reaction, &triplet.ts, report)?;

        let reaction_id = self.store.upsert_reaction(&reaction, REACTION_FAMILY, self.batch)?;
        for (role, conformer) in [
            (ReactionRole::R1H, r1h),
            (ReactionRole::R2H, r2h),
            (ReactionRole::TS, ts),
        ] {
            self.store.set_participant(ReactionParticipant {
                reaction: reaction_id,
                role,
                conformer,
            })?;
        }

        if let Some(kinetics) = self.kinetics {
            for rate in kinetics.rates(&reaction) {
                let created = self.store.upsert_rate_model(reaction_id, rate)?;
                report.kinetics_rows += 1;
                debug!(
                    "reaction '{reaction}': {} rate [{}, {}] K {}",
                    rate.direction,
                    rate.tmin_k,
                    rate.tmax_k,
                    if created { "stored" } else { "updated" }
                );
            }
        }

        if self.config.map_atoms {
            let conformers = TripletConformers { r1h, r2h, ts };
            let outcome = mapping::map_triplet(&mut *self.store, conformers)?;
            report.mapping.absorb(outcome);
        }
        debug!("reaction '{reaction}': stored as reaction {reaction_id}");
        Ok(())
    }

    /// `true` when `reaction` is stored with all three participants.
    fn is_loaded(&self, reaction: &str) -> Result<bool, Error> {
        Ok(match self.store.reaction_by_name(reaction)? {
            Some(stored) => self.store.participants(stored.id)?.len() == ReactionRole::ALL.len(),
            None => false,
        })
    }

    fn ingest_record(
        &mut self,
        reaction: &str,
        mol: &MolRecord,
        report: &mut IngestReport,
    ) -> Result<ConformerId, Error> {
        let record = &mol.record;
        let species_key = record
            .first_field(&SPECIES_FIELDS)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{reaction}/{}", mol.role));
        let species = self
            .store
            .resolve_species(&species_key, record.first_field(&SMILES_FIELDS))?;
        let lot_text = record
            .first_field(&LOT_FIELDS)
            .unwrap_or(&self.config.default_lot);
        let lot = self.store.resolve_lot(&LevelOfTheory::parse(lot_text))?;

        let atoms: Vec<NewAtom> = record
            .atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| {
                let mut new = NewAtom::from(atom);
                if let Some(props) = mol.atom_properties.get(&i) {
                    new.features = props.features;
                }
                new
            })
            .collect();

        let outcome = self.store.upsert_conformer(NewConformer {
            species,
            lot,
            geometry_hash: geometry_hash(&record.atoms),
            is_ts: mol.role == ReactionRole::TS,
            label: record_label(mol),
            molblock: record.molblock.clone(),
            atom_labels: mol.atom_labels(),
            atoms,
        })?;

        if outcome.merged {
            warn!(
                "reaction '{reaction}' {}: geometry already stored as conformer {}; merged",
                mol.role, outcome.conformer
            );
            report.conformers_merged += 1;
            report.merges.push(MergeEvent {
                reaction: reaction.to_string(),
                role: mol.role,
                record: record.index,
                conformer: outcome.conformer,
            });
        } else {
            report.conformers_created += 1;
            report.atoms_inserted += outcome.atoms.len();
        }

        for (index, props) in &mol.atom_properties {
            let Some(role) = props.role() else {
                continue;
            };
            match outcome.atoms.get(*index) {
                Some(atom) => {
                    if self.store.tag_atom_role(*atom, role)? {
                        report.role_tags_added += 1;
                    }
                }
                None => warn!(
                    "reaction '{reaction}' {}: '{role}' tag on atom {index} is out of range",
                    mol.role
                ),
            }
        }

        let default_unit = self.config.default_energy_unit;
        if mol.role == ReactionRole::TS {
            if let Some(features) = ts_features(record, lot, default_unit) {
                self.store.merge_ts_features(outcome.conformer, features)?;
                report.ts_features += 1;
            }
        } else if let Some(features) = well_features(record, default_unit) {
            self.store.merge_well_features(outcome.conformer, features)?;
            report.well_features += 1;
        }

        self.apply_atom_rows(reaction, mol, &outcome, report)?;
        Ok(outcome.conformer)
    }

    /// Overlays the per-atom table onto a stored conformer. Only reactions
    /// present in the table are considered.
    fn apply_atom_rows(
        &mut self,
        reaction: &str,
        mol: &MolRecord,
        outcome: &UpsertOutcome,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let Some(table) = self.atom_table else {
            return Ok(());
        };
        if !table.contains_reaction(reaction) {
            return Ok(());
        }
        let rows = table.rows(reaction, mol.role);
        let frame = FeatureFrame::for_role(mol.role);

        for (index, atom) in outcome.atoms.iter().enumerate() {
            let Some(row) = rows.and_then(|rows| rows.get(&index)) else {
                report.atoms_without_row += 1;
                continue;
            };
            report.atom_rows_matched += 1;

            if let (Some(z), Some(parsed)) = (row.atomic_number, mol.record.atoms.get(index)) {
                let actual = parsed.element.atomic_number();
                if z != actual {
                    warn!(
                        "reaction '{reaction}' {} atom {index}: table gives Z={z}, \
                         structure has Z={actual}",
                        mol.role
                    );
                }
            }
            if !row.features.is_empty() {
                self.store.merge_atom_features(*atom, &row.features)?;
            }

            if !self.config.mirror_geometry {
                continue;
            }
            let Some((kind, path, value)) = row.measure(self.config.angles_in_degrees) else {
                continue;
            };
            let Some(atoms) = path
                .iter()
                .map(|i| outcome.atoms.get(*i).copied())
                .collect::<Option<Vec<AtomId>>>()
            else {
                warn!(
                    "reaction '{reaction}' {} atom {index}: path {path:?} leaves the structure",
                    mol.role
                );
                continue;
            };
            let measure = GeomMeasure {
                conformer: outcome.conformer,
                kind,
                frame,
                atoms,
                value,
                measure_name: measure_name(kind).to_string(),
                feature_ver: Some(MEASURE_FEATURE_VERSION.to_string()),
            };
            if self.store.insert_geom_measure(measure)? {
                report.geom_measures_added += 1;
            }
        }
        Ok(())
    }
}

fn measure_name(kind: MeasureKind) -> &'static str {
    match kind {
        MeasureKind::Distance => "csv_radius",
        MeasureKind::Angle => "csv_angle",
        MeasureKind::Dihedral => "csv_dihedral",
    }
}

fn validate(triplet: &ReactionTriplet) -> Result<(), Error> {
    match triplet.records().into_iter().find(|mol| mol.record.atoms.is_empty()) {
        Some(mol) => Err(Error::EmptyGeometry {
            reaction: triplet
                .reaction_name
                .clone()
                .unwrap_or_else(|| UNNAMED_REACTION.to_string()),
            role: mol.role,
            record: mol.record.index,
        }),
        None => Ok(()),
    }
}

/// A record's own conformer label, when it has a storable one.
fn record_label(mol: &MolRecord) -> Option<String> {
    let raw = mol.record.first_field(&LABEL_FIELDS)?;
    let label = sanitize_label(raw);
    if is_storable_label(&label) {
        Some(label)
    } else {
        warn!(
            "record {}: label {raw:?} is not a plain identifier; ignored",
            mol.record.index
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::kinetics::RateDirection;
    use crate::model::types::AtomRole;
    use crate::store::MemoryStore;
    use std::io::Cursor;

    const KINETICS: &str = "reaction_label,label,A,n,Ea,Ea_units,Tmin,Tmax
rxn1,k_for (TST),1e6,1.5,10,kcal/mol,300 K,2000 K
rxn1,k_rev (TST),2e5,,45,,300,2000
rxn9,k_for,1e3,,5,,300,1000
";

    const ATOMS: &str = "rxn_id,mol_type,focus_atom_idx,q_mull,q_apt,Z,f_mag,path,radius,angle
rxn1,R1H,0,-0.4,-0.6,8,,,,
rxn1,R1H,1,0.2,,1,0.01,\"[1, 0]\",1.09,
rxn1,TS,0,-0.3,,6,,\"[1, 0, 2]\",,3.141592653589793
rxn1,TS,2,,,1,,\"[2, 0, 7]\",,1.0
";

    const COUNTS_LINE: &str = "  3  2  0  0  0  0  0  0  0  0999 V2000";

    fn record(fields: &[(&str, &str)], shift: f64) -> String {
        let mut out = format!(
            "mol\n\n\n{COUNTS_LINE}\n{}{}{}  1  2  1  0\n  1  3  1  0\nM  END\n",
            atom_line(0.0 + shift, "C"),
            atom_line(1.09 + shift, "H"),
            atom_line(-1.09 + shift, "H"),
        );
        for (name, value) in fields {
            out.push_str(&format!("> <{name}>\n{value}\n\n"));
        }
        out.push_str("$$$$\n");
        out
    }

    fn atom_line(x: f64, symbol: &str) -> String {
        let tail = "0  0  0  0  0  0  0  0  0  0  0  0";
        format!("{x:>10.4}{:>10.4}{:>10.4} {symbol:<3} {tail}\n", 0.0, 0.0)
    }

    fn triplet_text(name: &str, shift: f64) -> String {
        [
            record(
                &[
                    ("type", "R1H"),
                    ("reaction", name),
                    ("smiles", "[CH3]"),
                    ("level_of_theory", "m06-2x/cc-pvtz"),
                    (
                        "mol_properties",
                        r#"{"0": {"label": "donator"}, "1": {"label": "d_hydrogen"}}"#,
                    ),
                    ("E_elec", "-39.8"),
                    ("E_elec_units", "hartree"),
                ],
                shift,
            ),
            record(
                &[
                    ("type", "R2H"),
                    ("reaction", name),
                    ("smiles", "[OH]"),
                    ("level_of_theory", "m06-2x/cc-pvtz"),
                    (
                        "mol_properties",
                        r#"{"0": {"label": "acceptor"}, "2": {"label": "a_hydrogen"}}"#,
                    ),
                    ("H298", "-10"),
                    ("H298_units", "kcal/mol"),
                ],
                shift,
            ),
            record(
                &[
                    ("type", "TS"),
                    ("reaction", name),
                    ("level_of_theory", "m06-2x/cc-pvtz"),
                    (
                        "mol_properties",
                        r#"{"0": {"label": "*1"}, "1": {"label": "*2"}, "2": {"label": "*3"}}"#,
                    ),
                    ("imag_freq", "-1800"),
                ],
                shift,
            ),
        ]
        .concat()
    }

    #[test]
    fn ingests_triplet_with_roles_features_and_atom_map() {
        let mut store = MemoryStore::new();
        let report = Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();

        assert_eq!(report.triplets, 1);
        assert_eq!(report.conformers_created, 3);
        assert_eq!(report.conformers_merged, 0);
        assert_eq!(report.atoms_inserted, 9);
        assert_eq!(report.role_tags_added, 4);
        assert_eq!(report.well_features, 2);
        assert_eq!(report.ts_features, 1);
        assert_eq!(report.mapping.written, 4);

        let reactions = store.reactions().unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].name, "rxn1");
        assert_eq!(reactions[0].family, REACTION_FAMILY);
        let parts = store.participants(reactions[0].id).unwrap();
        assert_eq!(parts.len(), 3);

        let r1h = parts.iter().find(|p| p.role == ReactionRole::R1H).unwrap();
        let conf = store.conformer(r1h.conformer).unwrap().unwrap();
        assert!(!conf.is_ts);
        assert_eq!(conf.atom_labels.get(&0).map(String::as_str), Some("donor"));
        let wf = conf.well_features.unwrap();
        assert!((wf.e_elec.unwrap() - (-39.8 * 2625.49962)).abs() < 1e-6);
        let donors = store.atoms_with_role(r1h.conformer, AtomRole::Donor).unwrap();
        assert_eq!(donors[0].index, 0);

        let ts = parts.iter().find(|p| p.role == ReactionRole::TS).unwrap();
        let ts_conf = store.conformer(ts.conformer).unwrap().unwrap();
        assert!(ts_conf.is_ts);
        assert_eq!(ts_conf.ts_features[0].imag_freq_cm1, Some(-1800.0));
    }

    #[test]
    fn reingesting_the_same_file_merges_every_conformer() {
        let mut store = MemoryStore::new();
        let text = triplet_text("rxn1", 0.0);
        Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(text.clone()))
            .unwrap();
        let again = Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(text))
            .unwrap();

        assert_eq!(again.conformers_created, 0);
        assert_eq!(again.conformers_merged, 3);
        assert_eq!(again.merges.len(), 3);
        assert_eq!(again.atoms_inserted, 0);
        assert_eq!(again.role_tags_added, 0);
        assert_eq!(again.mapping.written, 0);
        assert_eq!(again.mapping.already_present, 4);
        assert_eq!(store.conformer_count(), 3);
        assert_eq!(store.atom_count(), 9);
    }

    #[test]
    fn shifted_geometry_creates_new_conformers() {
        let mut store = MemoryStore::new();
        let mut ingestor = Ingestor::new(&mut store, IngestConfig::default());
        ingestor
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        let report = ingestor
            .ingest_reader(Cursor::new(triplet_text("rxn2", 0.01)))
            .unwrap();
        assert_eq!(report.conformers_created, 3);
        assert_eq!(store.conformer_count(), 6);
        assert_eq!(store.reactions().unwrap().len(), 2);
    }

    #[test]
    fn dry_run_leaves_store_empty() {
        let mut store = MemoryStore::new();
        let report = Ingestor::new(&mut store, IngestConfig::default())
            .dry_run(true)
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        assert_eq!(report.triplets, 1);
        assert_eq!(store.conformer_count(), 0);
    }

    #[test]
    fn missing_identifiers_fall_back_to_reaction_scoped_species_and_default_lot() {
        let text = [
            record(&[("type", "R1H")], 0.0),
            record(&[("type", "R2H")], 0.5),
            record(&[("type", "TS")], 1.0),
        ]
        .concat();
        let mut store = MemoryStore::new();
        let config = IngestConfig {
            default_lot: "b3lyp/6-31g".to_string(),
            ..IngestConfig::default()
        };
        let report = Ingestor::new(&mut store, config)
            .ingest_reader(Cursor::new(text))
            .unwrap();
        assert_eq!(report.mapping.written, 0);
        assert_eq!(report.mapping.unresolved, 4);

        let reactions = store.reactions().unwrap();
        let rxn = &reactions[0];
        assert_eq!(rxn.name, UNNAMED_REACTION);
        let part = store.participants(rxn.id).unwrap()[0];
        let conf = store.conformer(part.conformer).unwrap().unwrap();
        let species = store.species(conf.species).unwrap().unwrap();
        assert_eq!(species.key, format!("{UNNAMED_REACTION}/{}", part.role));
        let lot = store.lot(conf.lot).unwrap().unwrap();
        assert_eq!(lot.lot.lot_string(), "b3lyp/6-31g");
    }

    #[test]
    fn malformed_file_leaves_store_untouched() {
        let text = triplet_text("rxn1", 0.0) + &record(&[("type", "R1H")], 2.0);
        let mut store = MemoryStore::new();
        let err = Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(text))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Read(crate::io::Error::IncompleteTriplet { .. })
        ));
        assert_eq!(store.conformer_count(), 0);
        assert!(store.reactions().unwrap().is_empty());
    }

    #[test]
    fn ingest_file_reports_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxn.sdf");
        std::fs::write(&path, triplet_text("rxn1", 0.0)).unwrap();

        let mut store = MemoryStore::new();
        let mut ingestor = Ingestor::new(&mut store, IngestConfig::default());
        assert_eq!(ingestor.ingest_file(&path).unwrap().triplets, 1);
        assert!(matches!(
            ingestor.ingest_file(dir.path().join("missing.sdf")),
            Err(Error::Open { .. })
        ));
    }

    #[test]
    fn kinetics_rows_are_stored_once_per_identity() {
        let kinetics = KineticsTable::from_reader(Cursor::new(KINETICS)).unwrap();
        let mut store = MemoryStore::new();
        let text = triplet_text("rxn1", 0.0);
        for _ in 0..2 {
            let report = Ingestor::new(&mut store, IngestConfig::default())
                .kinetics(&kinetics)
                .ingest_reader(Cursor::new(text.clone()))
                .unwrap();
            assert_eq!(report.kinetics_rows, 2);
        }

        let rxn = store.reaction_by_name("rxn1").unwrap().unwrap();
        let rates = store.rate_models(rxn.id).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].rate.direction, RateDirection::Forward);
        assert_eq!(rates[0].rate.model, "TST");
        assert!((rates[0].rate.ea_kj_mol - 41.84).abs() < 1e-9);
        assert_eq!(rates[1].rate.direction, RateDirection::Reverse);
        assert!(store.reaction_by_name("rxn9").unwrap().is_none());
    }

    #[test]
    fn dry_run_counts_kinetics_rows_without_storing() {
        let kinetics = KineticsTable::from_reader(Cursor::new(KINETICS)).unwrap();
        let mut store = MemoryStore::new();
        let report = Ingestor::new(&mut store, IngestConfig::default())
            .kinetics(&kinetics)
            .source_label("screening")
            .dry_run(true)
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        assert_eq!(report.kinetics_rows, 2);
        assert!(store.reactions().unwrap().is_empty());
        assert!(store.batches().unwrap().is_empty());
    }

    #[test]
    fn atom_table_overlays_features_and_mirrors_geometry() {
        let table = AtomTable::from_reader(Cursor::new(ATOMS)).unwrap();
        let config = IngestConfig {
            mirror_geometry: true,
            ..IngestConfig::default()
        };
        let mut store = MemoryStore::new();
        let report = Ingestor::new(&mut store, config.clone())
            .atom_table(&table)
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        assert_eq!(report.atom_rows_matched, 4);
        assert_eq!(report.atoms_without_row, 5);
        assert_eq!(report.geom_measures_added, 2);

        let rxn = store.reaction_by_name("rxn1").unwrap().unwrap();
        let parts = store.participants(rxn.id).unwrap();
        let conformer_of = |role: ReactionRole| {
            parts.iter().find(|p| p.role == role).unwrap().conformer
        };

        let r1h_atoms = store.conformer_atoms(conformer_of(ReactionRole::R1H)).unwrap();
        assert_eq!(r1h_atoms[0].features.partial_charge, Some(-0.4));
        assert_eq!(r1h_atoms[0].features.apt_charge, Some(-0.6));
        assert_eq!(r1h_atoms[1].features.force_magnitude, Some(0.01));
        assert!(r1h_atoms[2].features.is_empty());

        let r1h_measures = store.geom_measures(conformer_of(ReactionRole::R1H)).unwrap();
        assert_eq!(r1h_measures.len(), 1);
        assert_eq!(r1h_measures[0].kind, MeasureKind::Distance);
        assert_eq!(r1h_measures[0].frame, FeatureFrame::RefDHydrogen);
        assert_eq!(r1h_measures[0].atoms, vec![r1h_atoms[1].id, r1h_atoms[0].id]);
        assert_eq!(r1h_measures[0].measure_name, "csv_radius");
        assert_eq!(r1h_measures[0].value, 1.09);

        let ts_measures = store.geom_measures(conformer_of(ReactionRole::TS)).unwrap();
        assert_eq!(ts_measures.len(), 1);
        assert_eq!(ts_measures[0].kind, MeasureKind::Angle);
        assert_eq!(ts_measures[0].frame, FeatureFrame::None);
        assert!((ts_measures[0].value - 180.0).abs() < 1e-9);
        assert_eq!(
            ts_measures[0].feature_ver.as_deref(),
            Some(MEASURE_FEATURE_VERSION)
        );

        let again = Ingestor::new(&mut store, config)
            .atom_table(&table)
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        assert_eq!(again.atom_rows_matched, 4);
        assert_eq!(again.geom_measures_added, 0);
    }

    #[test]
    fn geometry_is_not_mirrored_unless_enabled() {
        let table = AtomTable::from_reader(Cursor::new(ATOMS)).unwrap();
        let mut store = MemoryStore::new();
        let report = Ingestor::new(&mut store, IngestConfig::default())
            .atom_table(&table)
            .ingest_reader(Cursor::new(triplet_text("rxn1", 0.0)))
            .unwrap();
        assert_eq!(report.atom_rows_matched, 4);
        assert_eq!(report.geom_measures_added, 0);

        let other = Ingestor::new(&mut store, IngestConfig::default())
            .atom_table(&table)
            .ingest_reader(Cursor::new(triplet_text("rxn2", 0.5)))
            .unwrap();
        assert_eq!(other.atom_rows_matched, 0);
        assert_eq!(other.atoms_without_row, 0);
    }

    #[test]
    fn each_file_opens_a_batch_and_reactions_keep_their_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxn.sdf");
        std::fs::write(&path, triplet_text("rxn1", 0.0)).unwrap();

        let mut store = MemoryStore::new();
        let mut ingestor = Ingestor::new(&mut store, IngestConfig::default());
        ingestor.ingest_file(&path).unwrap();
        ingestor.ingest_file(&path).unwrap();

        let batches = store.batches().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].source_label, path.display().to_string());
        assert_eq!(batches[0].notes, Some(format!("SDF: {}", path.display())));
        let rxn = store.reaction_by_name("rxn1").unwrap().unwrap();
        assert_eq!(rxn.batch, Some(batches[0].id));
    }

    #[test]
    fn labelled_runs_reuse_their_batch_on_request() {
        let config = IngestConfig {
            reuse_batch: true,
            ..IngestConfig::default()
        };
        let mut store = MemoryStore::new();
        for (name, shift) in [("rxn1", 0.0), ("rxn2", 0.5)] {
            Ingestor::new(&mut store, config.clone())
                .source_label("screening")
                .ingest_reader(Cursor::new(triplet_text(name, shift)))
                .unwrap();
        }
        let batches = store.batches().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].source_label, "screening");
        assert_eq!(batches[0].notes, None);
        for name in ["rxn1", "rxn2"] {
            let rxn = store.reaction_by_name(name).unwrap().unwrap();
            assert_eq!(rxn.batch, Some(batches[0].id));
        }

        Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(triplet_text("rxn3", 1.0)))
            .unwrap();
        assert_eq!(store.batches().unwrap().len(), 1);
        assert_eq!(store.reaction_by_name("rxn3").unwrap().unwrap().batch, None);
    }

    #[test]
    fn loaded_reactions_are_skipped_on_request() {
        let mut store = MemoryStore::new();
        let text = triplet_text("rxn1", 0.0);
        Ingestor::new(&mut store, IngestConfig::default())
            .ingest_reader(Cursor::new(text.clone()))
            .unwrap();

        let config = IngestConfig {
            skip_if_loaded: true,
            ..IngestConfig::default()
        };
        let report = Ingestor::new(&mut store, config)
            .ingest_reader(Cursor::new(text + &triplet_text("rxn2", 0.5)))
            .unwrap();
        assert_eq!(report.triplets, 2);
        assert_eq!(report.reactions_skipped, 1);
        assert_eq!(report.conformers_merged, 0);
        assert_eq!(report.conformers_created, 3);
        assert_eq!(store.reactions().unwrap().len(), 2);
    }
}
