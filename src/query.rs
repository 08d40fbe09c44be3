//! Read API over a [`Store`]: conformer listings per species and conformer
//! detail with a displayable energy and XYZ geometry.

use crate::model::atom::ConformerAtom;
use crate::model::conformer::{Conformer, LevelOfTheory, Species};
use crate::model::features::{Energy, EnergyMetric};
use crate::model::ids::{ConformerId, LotId, SpeciesId};
use crate::store::{self, Store};
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt::Write as _;
use thiserror::Error;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum Error {
    #[error("limit must be between 1 and {MAX_LIMIT}, got {0}")]
    InvalidLimit(usize),

    #[error("well rank filter must be at least 1")]
    InvalidRank,

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Filters and paging for [`list_species_conformers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformerQuery {
    pub lot: Option<LotId>,
    pub is_ts: Option<bool>,
    /// Only conformers flagged as their well's representative.
    pub representative_only: bool,
    pub well_rank: Option<u32>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ConformerQuery {
    fn default() -> Self {
        Self {
            lot: None,
            is_ts: None,
            representative_only: false,
            well_rank: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ConformerQuery {
    fn validate(&self) -> Result<(), Error> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(Error::InvalidLimit(self.limit));
        }
        if self.well_rank == Some(0) {
            return Err(Error::InvalidRank);
        }
        Ok(())
    }

    fn matches(&self, c: &Conformer) -> bool {
        self.lot.is_none_or(|lot| c.lot == lot)
            && self.is_ts.is_none_or(|ts| c.is_ts == ts)
            && (!self.representative_only || c.well.is_representative)
            && self.well_rank.is_none_or(|rank| c.well.rank == Some(rank))
    }
}

/// One line of a conformer listing. Energies are in kJ/mol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformerRow {
    pub conformer: ConformerId,
    pub species: SpeciesId,
    pub lot: LevelOfTheory,
    pub is_ts: bool,
    pub well_label: Option<String>,
    pub well_rank: Option<u32>,
    pub is_representative: bool,
    pub g298: Option<f64>,
    pub h298: Option<f64>,
    pub e_elec: Option<f64>,
    pub zpe: Option<f64>,
    pub e0: Option<f64>,
    pub e_ts: Option<f64>,
    /// The energy a viewer should show for this conformer.
    pub energy: Option<Energy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformerDetail {
    #[serde(flatten)]
    pub row: ConformerRow,
    pub smiles: Option<String>,
    pub species_key: String,
    pub imag_freq_cm1: Option<f64>,
    pub irc_verified: Option<bool>,
    pub xyz: Option<String>,
}

/// Energy shown for a conformer: `E_TS` for a TS that has one, otherwise
/// G298 > H298 > E0 > E_elec.
pub fn display_energy(conformer: &Conformer) -> Option<Energy> {
    let e_ts = conformer
        .own_ts_features()
        .and_then(|tf| tf.e_ts)
        .filter(|_| conformer.is_ts);
    match e_ts {
        Some(value) => Some(Energy::new(EnergyMetric::ETs, value)),
        None => conformer.well_features.as_ref()?.energy(),
    }
}

fn row<S: Store + ?Sized>(store: &S, conformer: &Conformer) -> Result<ConformerRow, Error> {
    let lot = store
        .lot(conformer.lot)?
        .ok_or(store::Error::UnknownLot(conformer.lot))?;
    let wf = conformer.well_features.as_ref();
    Ok(ConformerRow {
        conformer: conformer.id,
        species: conformer.species,
        lot: lot.lot,
        is_ts: conformer.is_ts,
        well_label: conformer.well.label.clone(),
        well_rank: conformer.well.rank,
        is_representative: conformer.well.is_representative,
        g298: wf.and_then(|w| w.g298),
        h298: wf.and_then(|w| w.h298),
        e_elec: wf.and_then(|w| w.e_elec),
        zpe: wf.and_then(|w| w.zpe),
        e0: wf.and_then(|w| w.e0()),
        e_ts: conformer.own_ts_features().and_then(|tf| tf.e_ts),
        energy: display_energy(conformer),
    })
}

/// Lists conformers of `species`: TS first, then by well rank (unranked
/// last), then by id.
pub fn list_species_conformers<S: Store + ?Sized>(
    store: &S,
    species: SpeciesId,
    query: &ConformerQuery,
) -> Result<Vec<ConformerRow>, Error> {
    query.validate()?;
    store
        .species(species)?
        .ok_or(store::Error::UnknownSpecies(species))?;

    let mut conformers: Vec<Conformer> = store
        .species_conformers(species)?
        .into_iter()
        .filter(|c| query.matches(c))
        .collect();
    conformers.sort_by_key(|c| {
        (
            Reverse(c.is_ts),
            c.well.rank.is_none(),
            c.well.rank,
            c.id,
        )
    });

    conformers
        .iter()
        .skip(query.offset)
        .take(query.limit)
        .map(|c| row(store, c))
        .collect()
}

pub fn conformer_detail<S: Store + ?Sized>(
    store: &S,
    conformer: ConformerId,
) -> Result<ConformerDetail, Error> {
    let c = store
        .conformer(conformer)?
        .ok_or(store::Error::UnknownConformer(conformer))?;
    let Species { key, smiles, .. } = store
        .species(c.species)?
        .ok_or(store::Error::UnknownSpecies(c.species))?;
    let mut atoms = store.conformer_atoms(conformer)?;
    atoms.sort_by_key(|a| a.index);
    let ts = c.own_ts_features();

    Ok(ConformerDetail {
        row: row(store, &c)?,
        smiles,
        species_key: key,
        imag_freq_cm1: ts.and_then(|tf| tf.imag_freq_cm1),
        irc_verified: ts.and_then(|tf| tf.irc_verified),
        xyz: (!atoms.is_empty()).then(|| to_xyz(conformer, &atoms)),
    })
}

/// Renders atoms as XYZ text: count line, comment line, one atom per line.
pub fn to_xyz(conformer: ConformerId, atoms: &[ConformerAtom]) -> String {
    let mut out = format!("{}\nconformer {conformer}\n", atoms.len());
    for atom in atoms {
        let [x, y, z] = atom.position;
        let _ = writeln!(out, "{} {x:.6} {y:.6} {z:.6}", atom.element.symbol());
    }
    out
}
