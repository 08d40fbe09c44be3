//! Reaction data management for hydrogen-abstraction chemistry.
//!
//! `hab-forge` ingests SDF files holding reaction triplets (the two reactants
//! R1H and R2H plus the transition state), stores deduplicated conformers with
//! their energies normalized to kJ/mol, and runs the maintenance passes that
//! keep the data consistent: energy-well clustering and relabeling, atom
//! mapping across each triplet, and G298 backfill.
//!
//! # Features
//!
//! - **Geometry deduplication** — conformers are keyed on a SHA-256
//!   fingerprint of rounded coordinates and atomic numbers; resubmitting a
//!   geometry merges into the existing row and is reported as a merge
//! - **Unit normalization** — Hartree, kcal/mol, J/mol and kJ/mol energies and
//!   the usual entropy units are converted on ingestion
//! - **Well clustering** — deterministic, idempotent `well`/`iso{k}` labels
//!   per (species, level of theory) group with a fixed energy tolerance
//! - **Atom mapping** — donor, acceptor and migrating-hydrogen correspondences
//!   between reactants and TS
//! - **Companion tables** — Arrhenius rates and per-atom features from the
//!   CSV files exported next to the SDF, with optional geometry measures
//! - **Provenance** — every ingested file is recorded as a batch
//! - **Read API** — filtered, paginated conformer listings and conformer detail
//!
//! # Quick Start
//!
//! ```
//! use hab_forge::{Atom, Element, GroupKey, LevelOfTheory, WellFeatures};
//! use hab_forge::{MemoryStore, NewAtom, NewConformer, Store, StoreError};
//! use hab_forge::{geometry_hash, wells};
//!
//! let mut store = MemoryStore::new();
//! let species = store.resolve_species("VNWKTOKETHGBQD-UHFFFAOYSA-N", Some("C"))?;
//! let lot = store.resolve_lot(&LevelOfTheory::parse("wb97x-d/def2-tzvp"))?;
//!
//! // Three geometries; the first two are 5e-5 kJ/mol apart
//! for (x, g298) in [(0.0, -105.2), (0.1, -105.19995), (0.2, -98.7)] {
//!     let atoms = vec![
//!         Atom::new(Element::C, [x, 0.0, 0.0]),
//!         Atom::new(Element::H, [x + 1.09, 0.0, 0.0]),
//!     ];
//!     let outcome = store.upsert_conformer(NewConformer {
//!         species,
//!         lot,
//!         geometry_hash: geometry_hash(&atoms),
//!         is_ts: false,
//!         label: None,
//!         molblock: String::new(),
//!         atom_labels: Default::default(),
//!         atoms: atoms.iter().map(NewAtom::from).collect(),
//!     })?;
//!     assert!(!outcome.merged);
//!     let features = WellFeatures { g298: Some(g298), ..Default::default() };
//!     store.merge_well_features(outcome.conformer, features)?;
//! }
//!
//! let report = wells::relabel_all(&mut store, false)?;
//! assert_eq!(report.wells, 2);
//!
//! let labels: Vec<String> = store
//!     .group_conformers(GroupKey::new(species, lot))?
//!     .into_iter()
//!     .filter_map(|c| c.well.label)
//!     .collect();
//! assert_eq!(labels, ["well_a", "well_b", "iso1"]);
//! # Ok::<(), StoreError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — SDF reader, reaction-triplet grouping and companion CSV tables
//! - [`ingest`] — Storing triplets: dedup, role tags, energies, reactions, rates
//! - [`store`] — Persistence contract and the JSON-snapshot [`MemoryStore`]
//! - [`wells`] — Energy-well clustering and relabeling
//! - [`mapping`] — Reactant/TS atom mapping
//! - [`thermo`] — Unit conversion and G298 backfill
//! - [`query`] — Conformer listings and detail
//! - [`config`] — TOML run configuration

mod fingerprint;
mod model;
mod utils;

pub mod config;
pub mod ingest;
pub mod io;
pub mod mapping;
pub mod query;
pub mod store;
pub mod thermo;
pub mod wells;

pub use fingerprint::{geometry_hash, geometry_hash_from_parts};

pub use model::atom::{Atom, AtomFeatures, ConformerAtom};
pub use model::conformer::{
    Conformer, LevelOfTheory, Species, StoredLot, WellPlacement, WellState, WellUpdate,
};
pub use model::features::{Energy, EnergyMetric, TsFeatures, WellFeatures};
pub use model::geometry::{FeatureFrame, GeomMeasure, MeasureKind};
pub use model::ids::{AtomId, BatchId, ConformerId, GroupKey, LotId, ReactionId, SpeciesId};
pub use model::kinetics::{ArrheniusRate, RateDirection, RateModel};
pub use model::reaction::{
    AtomMapEdge, AtomRoleTag, IngestBatch, Reaction, ReactionParticipant,
};
pub use model::types::{
    AtomRole, Element, ParseAtomRoleError, ParseElementError, ParseReactionRoleError,
    ReactionRole,
};

pub use config::Config;
pub use ingest::{IngestReport, Ingestor};
pub use io::{AtomTable, KineticsTable};
pub use store::{MemoryStore, NewAtom, NewConformer, Store, UpsertOutcome};

pub use config::Error as ConfigError;
pub use ingest::Error as IngestError;
pub use io::Error as IoError;
pub use query::Error as QueryError;
pub use store::Error as StoreError;
pub use wells::Error as RelabelError;
