use super::features::{TsFeatures, WellFeatures};
use super::ids::{ConformerId, GroupKey, LotId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    /// Natural key the species was resolved by (InChIKey, SMILES or a
    /// reaction-scoped fallback).
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smiles: Option<String>,
}

/// A quantum-chemistry method, basis set and solvent combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelOfTheory {
    pub method: String,
    pub basis: Option<String>,
    pub solvent: Option<String>,
}

impl LevelOfTheory {
    /// Parses `method[/basis[/solvent]]`.
    pub fn parse(lot: &str) -> Self {
        let mut parts = lot.trim().splitn(3, '/').map(str::trim);
        let method = parts.next().unwrap_or_default().to_string();
        let basis = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let solvent = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            method,
            basis,
            solvent,
        }
    }

    pub fn lot_string(&self) -> String {
        let mut out = self.method.clone();
        for part in [&self.basis, &self.solvent].into_iter().flatten() {
            out.push('/');
            out.push_str(part);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLot {
    pub id: LotId,
    pub lot: LevelOfTheory,
}

/// Well assignment fields owned by the clustering engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellState {
    pub label: Option<String>,
    pub rank: Option<u32>,
    pub is_representative: bool,
}

/// Rank and representative flag of a conformer placed in a well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellPlacement {
    pub rank: u32,
    pub is_representative: bool,
}

/// New well assignment for one conformer, as decided by the clustering engine.
///
/// `placement` is `None` for conformers without a usable energy: their label is
/// rewritten but their stored rank and representative flag stay as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellUpdate {
    pub conformer: ConformerId,
    pub label: String,
    pub placement: Option<WellPlacement>,
}

impl WellState {
    /// Applies an update; a missing placement leaves rank and flag untouched.
    pub fn apply(&mut self, update: &WellUpdate) {
        self.label = Some(update.label.clone());
        if let Some(placement) = update.placement {
            self.rank = Some(placement.rank);
            self.is_representative = placement.is_representative;
        }
    }
}

/// One 3D geometry of a species at one level of theory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conformer {
    pub id: ConformerId,
    pub species: SpeciesId,
    pub lot: LotId,
    pub geometry_hash: String,
    pub is_ts: bool,
    #[serde(default)]
    pub well: WellState,
    /// Canonical structure encoding (the V2000 molblock of the source record).
    pub molblock: String,
    /// Per-atom labels from the source record's `mol_properties`, keyed by
    /// zero-based atom index. Carries role names and TS star markers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub atom_labels: BTreeMap<usize, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_features: Option<WellFeatures>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ts_features: Vec<TsFeatures>,
}

impl Conformer {
    #[inline]
    pub fn group(&self) -> GroupKey {
        GroupKey::new(self.species, self.lot)
    }

    /// TS features recorded at this conformer's own level of theory.
    pub fn own_ts_features(&self) -> Option<&TsFeatures> {
        self.ts_features.iter().find(|tf| tf.lot == self.lot)
    }

    /// Zero-based atom index carrying the given star marker (`*1`, `*2`, `*3`).
    pub fn star_index(&self, marker: &str) -> Option<usize> {
        self.atom_labels
            .iter()
            .find(|(_, label)| label.trim() == marker)
            .map(|(idx, _)| *idx)
    }

    pub fn has_star_markers(&self) -> bool {
        self.atom_labels.values().any(|l| l.trim().starts_with('*'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_of_theory_parse_and_render() {
        let lot = LevelOfTheory::parse("wb97x-d/def2-tzvp");
        assert_eq!(lot.method, "wb97x-d");
        assert_eq!(lot.basis.as_deref(), Some("def2-tzvp"));
        assert_eq!(lot.solvent, None);
        assert_eq!(lot.lot_string(), "wb97x-d/def2-tzvp");

        let solvated = LevelOfTheory::parse(" b3lyp / 6-31g* / water ");
        assert_eq!(solvated.solvent.as_deref(), Some("water"));
        assert_eq!(solvated.lot_string(), "b3lyp/6-31g*/water");

        let bare = LevelOfTheory::parse("unknown");
        assert_eq!(bare.basis, None);
        assert_eq!(bare.lot_string(), "unknown");
    }

    #[test]
    fn star_index_finds_marker_by_label() {
        let mut labels = BTreeMap::new();
        labels.insert(0, "*1".to_string());
        labels.insert(3, " *2".to_string());
        labels.insert(5, "*3".to_string());
        let conf = Conformer {
            id: ConformerId(1),
            species: SpeciesId(1),
            lot: LotId(1),
            geometry_hash: String::new(),
            is_ts: true,
            well: WellState::default(),
            molblock: String::new(),
            atom_labels: labels,
            well_features: None,
            ts_features: Vec::new(),
        };
        assert_eq!(conf.star_index("*1"), Some(0));
        assert_eq!(conf.star_index("*2"), Some(3));
        assert_eq!(conf.star_index("*3"), Some(5));
        assert_eq!(conf.star_index("*4"), None);
        assert!(conf.has_star_markers());
    }

    #[test]
    fn well_update_without_placement_keeps_rank_and_flag() {
        let mut state = WellState {
            label: Some("iso2".into()),
            rank: Some(3),
            is_representative: true,
        };
        state.apply(&WellUpdate {
            conformer: ConformerId(9),
            label: "iso2".into(),
            placement: None,
        });
        assert_eq!(state.rank, Some(3));
        assert!(state.is_representative);

        state.apply(&WellUpdate {
            conformer: ConformerId(9),
            label: "well_b".into(),
            placement: Some(WellPlacement {
                rank: 1,
                is_representative: false,
            }),
        });
        assert_eq!(state.label.as_deref(), Some("well_b"));
        assert_eq!(state.rank, Some(1));
        assert!(!state.is_representative);
    }
}
