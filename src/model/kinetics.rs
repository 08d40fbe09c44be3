use super::ids::ReactionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Model name used when a rate carries none.
pub const DEFAULT_RATE_MODEL: &str = "ModifiedArrhenius";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rate direction: '{0}'")]
pub struct ParseRateDirectionError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateDirection {
    Forward,
    Reverse,
}

impl RateDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateDirection::Forward => "forward",
            RateDirection::Reverse => "reverse",
        }
    }
}

impl fmt::Display for RateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateDirection {
    type Err = ParseRateDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "for" | "f" => Ok(RateDirection::Forward),
            "reverse" | "rev" | "r" => Ok(RateDirection::Reverse),
            _ => Err(ParseRateDirectionError(s.to_string())),
        }
    }
}

/// Modified-Arrhenius parameters `k(T) = A (T/T0)^n exp(-Ea/RT)` for one
/// direction of a reaction over `[tmin_k, tmax_k]`.
///
/// `ea_kj_mol` and `dea_kj_mol` are in kJ/mol. `A` keeps its source units,
/// which are recorded in `meta["A_units"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusRate {
    pub direction: RateDirection,
    pub model: String,
    pub a: f64,
    #[serde(default)]
    pub n: Option<f64>,
    pub ea_kj_mol: f64,
    pub tmin_k: f64,
    pub tmax_k: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Multiplicative uncertainty of `A`.
    #[serde(default)]
    pub da_factor: Option<f64>,
    #[serde(default)]
    pub dn_abs: Option<f64>,
    #[serde(default)]
    pub dea_kj_mol: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl ArrheniusRate {
    /// `true` when both rates describe the same (direction, source, reference,
    /// temperature range).
    pub fn same_identity(&self, other: &ArrheniusRate) -> bool {
        self.direction == other.direction
            && self.source == other.source
            && self.reference == other.reference
            && self.tmin_k == other.tmin_k
            && self.tmax_k == other.tmax_k
    }

    /// Takes the parameters of `other`, keeping optional fields it lacks.
    pub fn merge_from(&mut self, other: &ArrheniusRate) {
        self.model.clone_from(&other.model);
        self.a = other.a;
        self.ea_kj_mol = other.ea_kj_mol;
        let optional = [
            (&mut self.n, other.n),
            (&mut self.da_factor, other.da_factor),
            (&mut self.dn_abs, other.dn_abs),
            (&mut self.dea_kj_mol, other.dea_kj_mol),
        ];
        for (slot, value) in optional {
            if value.is_some() {
                *slot = value;
            }
        }
        if !other.meta.is_empty() {
            self.meta.clone_from(&other.meta);
        }
    }
}

/// A stored rate for one reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateModel {
    pub reaction: ReactionId,
    #[serde(flatten)]
    pub rate: ArrheniusRate,
}
