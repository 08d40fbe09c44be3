//! Conversion of raw energy and entropy units to kJ/mol and kJ/mol/K.
//!
//! Unit strings come from free-form record fields, so parsing is lenient about
//! case, whitespace and the separator used for products (`*`, `·`, `⋅`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const KCAL_TO_KJ: f64 = 4.184;
pub const HARTREE_TO_KJ_PER_MOL: f64 = 2625.49962;
pub const J_TO_KJ: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized unit: '{0}'")]
pub struct ParseUnitError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "kJ/mol")]
    KjPerMol,
    #[serde(rename = "kcal/mol")]
    KcalPerMol,
    #[serde(rename = "J/mol")]
    JPerMol,
    #[serde(rename = "hartree")]
    Hartree,
}

impl EnergyUnit {
    pub fn to_kj_per_mol_factor(&self) -> f64 {
        match self {
            EnergyUnit::KjPerMol => 1.0,
            EnergyUnit::KcalPerMol => KCAL_TO_KJ,
            EnergyUnit::JPerMol => J_TO_KJ,
            EnergyUnit::Hartree => HARTREE_TO_KJ_PER_MOL,
        }
    }

    #[inline]
    pub fn to_kj_per_mol(&self, value: f64) -> f64 {
        value * self.to_kj_per_mol_factor()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyUnit::KjPerMol => "kJ/mol",
            EnergyUnit::KcalPerMol => "kcal/mol",
            EnergyUnit::JPerMol => "J/mol",
            EnergyUnit::Hartree => "hartree",
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_unit(s).as_str() {
            "kj/mol" | "kjmol^-1" | "kjmol-1" => Ok(EnergyUnit::KjPerMol),
            "kcal/mol" | "kcalmol^-1" | "kcalmol-1" => Ok(EnergyUnit::KcalPerMol),
            "j/mol" | "jmol^-1" | "jmol-1" => Ok(EnergyUnit::JPerMol),
            "hartree" | "hartrees" | "eh" | "ha" | "au" => Ok(EnergyUnit::Hartree),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntropyUnit {
    #[serde(rename = "kJ/mol/K")]
    KjPerMolK,
    #[serde(rename = "J/mol/K")]
    JPerMolK,
    #[serde(rename = "cal/mol/K")]
    CalPerMolK,
    #[serde(rename = "kcal/mol/K")]
    KcalPerMolK,
}

impl EntropyUnit {
    pub fn to_kj_per_mol_k_factor(&self) -> f64 {
        match self {
            EntropyUnit::KjPerMolK => 1.0,
            EntropyUnit::JPerMolK => J_TO_KJ,
            EntropyUnit::CalPerMolK => KCAL_TO_KJ * J_TO_KJ,
            EntropyUnit::KcalPerMolK => KCAL_TO_KJ,
        }
    }

    #[inline]
    pub fn to_kj_per_mol_k(&self, value: f64) -> f64 {
        value * self.to_kj_per_mol_k_factor()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntropyUnit::KjPerMolK => "kJ/mol/K",
            EntropyUnit::JPerMolK => "J/mol/K",
            EntropyUnit::CalPerMolK => "cal/mol/K",
            EntropyUnit::KcalPerMolK => "kcal/mol/K",
        }
    }
}

impl fmt::Display for EntropyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntropyUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_unit(s).as_str() {
            "kj/mol/k" | "kjmol^-1k^-1" | "kjmol-1k-1" => Ok(EntropyUnit::KjPerMolK),
            "j/mol/k" | "jmol^-1k^-1" | "jmol-1k-1" => Ok(EntropyUnit::JPerMolK),
            "cal/mol/k" | "calmol^-1k^-1" | "calmol-1k-1" => Ok(EntropyUnit::CalPerMolK),
            "kcal/mol/k" | "kcalmol^-1k^-1" | "kcalmol-1k-1" => Ok(EntropyUnit::KcalPerMolK),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

/// Lower-cases, strips whitespace and rewrites `x/(mol*k)` as `x/mol/k`.
fn canonical_unit(raw: &str) -> String {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '\\' => '/',
            '·' | '⋅' => '*',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    s.replace("/(mol*k)", "/mol/k").replace("*", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn energy_units_parse_common_spellings() {
        assert_eq!("kJ/mol".parse::<EnergyUnit>().unwrap(), EnergyUnit::KjPerMol);
        assert_eq!(" KCAL / MOL ".parse::<EnergyUnit>().unwrap(), EnergyUnit::KcalPerMol);
        assert_eq!("J/mol".parse::<EnergyUnit>().unwrap(), EnergyUnit::JPerMol);
        assert_eq!("Eh".parse::<EnergyUnit>().unwrap(), EnergyUnit::Hartree);
        assert_eq!("Hartree".parse::<EnergyUnit>().unwrap(), EnergyUnit::Hartree);
        assert!("eV".parse::<EnergyUnit>().is_err());
    }

    #[test]
    fn entropy_units_parse_product_forms() {
        assert_eq!("J/(mol*K)".parse::<EntropyUnit>().unwrap(), EntropyUnit::JPerMolK);
        assert_eq!("J/(mol·K)".parse::<EntropyUnit>().unwrap(), EntropyUnit::JPerMolK);
        assert_eq!("J mol^-1 K^-1".parse::<EntropyUnit>().unwrap(), EntropyUnit::JPerMolK);
        assert_eq!("cal/mol/K".parse::<EntropyUnit>().unwrap(), EntropyUnit::CalPerMolK);
        assert_eq!("kcal/(mol*K)".parse::<EntropyUnit>().unwrap(), EntropyUnit::KcalPerMolK);
        assert_eq!("kJ/mol/K".parse::<EntropyUnit>().unwrap(), EntropyUnit::KjPerMolK);
        assert!("kJ/mol".parse::<EntropyUnit>().is_err());
    }

    #[test]
    fn energy_conversion_factors() {
        let kj = |value: f64, unit: &str| unit.parse::<EnergyUnit>().unwrap().to_kj_per_mol(value);
        assert!(approx_eq(kj(1.0, "kcal/mol"), 4.184, 1e-12));
        assert!(approx_eq(kj(1500.0, "J/mol"), 1.5, 1e-12));
        assert!(approx_eq(kj(-1.0, "hartree"), -2625.49962, 1e-9));
        assert_eq!(kj(3.0, "kJ/mol"), 3.0);
    }

    #[test]
    fn entropy_conversion_factors() {
        let kj_k =
            |value: f64, unit: &str| unit.parse::<EntropyUnit>().unwrap().to_kj_per_mol_k(value);
        assert!(approx_eq(kj_k(250.0, "J/mol/K"), 0.25, 1e-12));
        assert!(approx_eq(kj_k(50.0, "cal/mol/K"), 0.2092, 1e-12));
        assert!(approx_eq(kj_k(0.05, "kcal/mol/K"), 0.2092, 1e-12));
    }
}
