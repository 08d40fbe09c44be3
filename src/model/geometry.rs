use super::ids::{AtomId, ConformerId};
use super::types::ReactionRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference frame an internal coordinate was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFrame {
    /// Relative to the hydrogen the donor gives up (R1H).
    RefDHydrogen,
    /// Relative to the hydrogen on the acceptor side (R2H).
    RefAHydrogen,
    None,
}

impl FeatureFrame {
    pub fn for_role(role: ReactionRole) -> Self {
        match role {
            ReactionRole::R1H => FeatureFrame::RefDHydrogen,
            ReactionRole::R2H => FeatureFrame::RefAHydrogen,
            ReactionRole::TS => FeatureFrame::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFrame::RefDHydrogen => "ref_d_hydrogen",
            FeatureFrame::RefAHydrogen => "ref_a_hydrogen",
            FeatureFrame::None => "none",
        }
    }
}

impl fmt::Display for FeatureFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Distance,
    Angle,
    Dihedral,
}

impl MeasureKind {
    /// The kind measured over `atoms` atoms: 2, 3 or 4.
    pub fn from_arity(atoms: usize) -> Option<Self> {
        match atoms {
            2 => Some(MeasureKind::Distance),
            3 => Some(MeasureKind::Angle),
            4 => Some(MeasureKind::Dihedral),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            MeasureKind::Distance => 2,
            MeasureKind::Angle => 3,
            MeasureKind::Dihedral => 4,
        }
    }

    /// `ang` for distances, `deg` otherwise.
    pub fn unit(&self) -> &'static str {
        match self {
            MeasureKind::Distance => "ang",
            MeasureKind::Angle | MeasureKind::Dihedral => "deg",
        }
    }
}

/// A distance, angle or dihedral over atoms of one conformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomMeasure {
    pub conformer: ConformerId,
    pub kind: MeasureKind,
    pub frame: FeatureFrame,
    /// `kind.arity()` atoms of `conformer`, in path order.
    pub atoms: Vec<AtomId>,
    /// Ångström for distances, degrees for angles and dihedrals.
    pub value: f64,
    pub measure_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_ver: Option<String>,
}

impl GeomMeasure {
    /// Uniqueness key of a stored measure.
    pub fn key(&self) -> (ConformerId, Vec<AtomId>, String) {
        (self.conformer, self.atoms.clone(), self.measure_name.clone())
    }
}
