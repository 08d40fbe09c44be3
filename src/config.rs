//! Run configuration for ingestion and maintenance.
//!
//! Values come from a TOML file with `[ingest]` and `[maintenance]` tables.
//! Every key is optional and falls back to the [`Default`] shown on each field.
//!
//! ```toml
//! [ingest]
//! strict_roles = true
//! order_hint = ["R1H", "R2H", "TS"]
//! default_lot = "wb97x-d/def2-tzvp"
//! default_energy_unit = "hartree"
//! map_atoms = true
//! reuse_batch = false
//! skip_if_loaded = false
//! mirror_geometry = false
//! angles_in_degrees = false
//!
//! [maintenance]
//! temperature_k = 298.15
//! override_user_g298 = false
//! parallel = true
//! ```

use crate::io::TripletOptions;
use crate::model::types::ReactionRole;
use crate::thermo::STANDARD_TEMPERATURE_K;
use crate::thermo::units::EnergyUnit;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ingest: IngestConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Require an explicit role field on every record. Default `true`.
    pub strict_roles: bool,
    /// Positional roles used when `strict_roles` is off.
    pub order_hint: [ReactionRole; 3],
    /// Level of theory for records without a `level_of_theory` item.
    pub default_lot: String,
    /// Unit assumed for energy items without a `<field>_units` companion.
    /// When unset, such values are dropped with a warning.
    pub default_energy_unit: Option<EnergyUnit>,
    /// Build the triplet's atom map right after it is stored. Default `true`.
    pub map_atoms: bool,
    /// Record the run under an existing batch with the same source label
    /// instead of opening a new one.
    pub reuse_batch: bool,
    /// Leave reactions that already have all three participants untouched.
    pub skip_if_loaded: bool,
    /// Store the `path`/`radius`/`angle`/`dihedral` columns of the per-atom
    /// table as geometry measures.
    pub mirror_geometry: bool,
    /// The per-atom table gives angles in degrees rather than radians.
    pub angles_in_degrees: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            strict_roles: true,
            order_hint: ReactionRole::ALL,
            default_lot: "unknown".to_string(),
            default_energy_unit: None,
            map_atoms: true,
            reuse_batch: false,
            skip_if_loaded: false,
            mirror_geometry: false,
            angles_in_degrees: false,
        }
    }
}

impl IngestConfig {
    pub fn triplet_options(&self) -> TripletOptions {
        TripletOptions {
            strict_roles: self.strict_roles,
            order_hint: self.order_hint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaintenanceConfig {
    /// Temperature for G = H - T*S, in kelvin.
    pub temperature_k: f64,
    /// Recompute G298 even where the input supplied one.
    pub override_user_g298: bool,
    /// Cluster independent groups on worker threads.
    pub parallel: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            temperature_k: STANDARD_TEMPERATURE_K,
            override_user_g298: false,
            parallel: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), Error> {
        let hint = &self.ingest.order_hint;
        if ReactionRole::ALL.iter().any(|r| !hint.contains(r)) {
            return Err(Error::Invalid(format!(
                "ingest.order_hint must name R1H, R2H and TS once each, got {hint:?}"
            )));
        }
        if self.ingest.default_lot.trim().is_empty() {
            return Err(Error::Invalid("ingest.default_lot must not be empty".into()));
        }
        let t = self.maintenance.temperature_k;
        if !t.is_finite() || t <= 0.0 {
            return Err(Error::Invalid(format!(
                "maintenance.temperature_k must be a positive temperature, got {t}"
            )));
        }
        Ok(())
    }
}
