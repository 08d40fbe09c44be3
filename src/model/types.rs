use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reaction role: '{0}' (expected R1H, R2H or TS)")]
pub struct ParseReactionRoleError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid atom role: '{0}'")]
pub struct ParseAtomRoleError(String);

const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Chemical element identified by its atomic number (1..=118).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);

    pub fn from_atomic_number(z: u8) -> Option<Self> {
        (1..=118).contains(&z).then_some(Self(z))
    }

    /// Parses an element symbol as it appears in a CTfile atom block.
    ///
    /// The lookup is case-insensitive on the trailing letter so that
    /// upper-cased writers (`CL`, `BR`) are accepted; deuterium and tritium
    /// are read as hydrogen.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let trimmed = symbol.trim();
        if matches!(trimmed, "D" | "T") {
            return Some(Self::H);
        }
        let mut chars = trimmed.chars();
        let first = chars.next()?.to_ascii_uppercase();
        let rest: String = chars.map(|c| c.to_ascii_lowercase()).collect();
        let normalized = format!("{first}{rest}");
        SYMBOLS
            .iter()
            .position(|s| *s == normalized)
            .map(|i| Self(i as u8 + 1))
    }

    #[inline]
    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOLS[usize::from(self.0) - 1]
    }
}

impl TryFrom<u8> for Element {
    type Error = ParseElementError;

    fn try_from(z: u8) -> Result<Self, Self::Error> {
        Self::from_atomic_number(z).ok_or_else(|| ParseElementError(z.to_string()))
    }
}

impl From<Element> for u8 {
    fn from(e: Element) -> Self {
        e.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s).ok_or_else(|| ParseElementError(s.to_string()))
    }
}

/// Role of a conformer within a hydrogen-abstraction reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReactionRole {
    /// Hydrogen donor reactant.
    R1H,
    /// Hydrogen acceptor reactant.
    R2H,
    /// Transition state.
    TS,
}

impl ReactionRole {
    pub const ALL: [ReactionRole; 3] = [ReactionRole::R1H, ReactionRole::R2H, ReactionRole::TS];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionRole::R1H => "R1H",
            ReactionRole::R2H => "R2H",
            ReactionRole::TS => "TS",
        }
    }
}

impl fmt::Display for ReactionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionRole {
    type Err = ParseReactionRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R1H" => Ok(ReactionRole::R1H),
            "R2H" => Ok(ReactionRole::R2H),
            "TS" => Ok(ReactionRole::TS),
            _ => Err(ParseReactionRoleError(s.to_string())),
        }
    }
}

/// Chemically meaningful tag on an atom of a reactant conformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomRole {
    Donor,
    Acceptor,
    /// Migrating hydrogen, donor side.
    DHydrogen,
    /// Migrating hydrogen, acceptor side.
    AHydrogen,
}

impl AtomRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomRole::Donor => "donor",
            AtomRole::Acceptor => "acceptor",
            AtomRole::DHydrogen => "d_hydrogen",
            AtomRole::AHydrogen => "a_hydrogen",
        }
    }
}

impl fmt::Display for AtomRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomRole {
    type Err = ParseAtomRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" | "donator" => Ok(AtomRole::Donor),
            "acceptor" => Ok(AtomRole::Acceptor),
            "d_hydrogen" => Ok(AtomRole::DHydrogen),
            "a_hydrogen" => Ok(AtomRole::AHydrogen),
            _ => Err(ParseAtomRoleError(s.to_string())),
        }
    }
}
