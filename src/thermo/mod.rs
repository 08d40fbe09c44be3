//! Thermochemistry helpers: unit normalization and derived free energies.

pub mod gibbs;
pub mod units;

pub use gibbs::{GibbsReport, backfill_g298, compute_g_from_hs};
pub use units::{EnergyUnit, EntropyUnit, ParseUnitError};

/// Standard temperature used for the 298 K quantities, in kelvin.
pub const STANDARD_TEMPERATURE_K: f64 = 298.15;
