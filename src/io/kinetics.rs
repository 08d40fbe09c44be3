//! Modified-Arrhenius rate tables in the RMG export layout.
//!
//! Columns: `reaction_label, label, A, A_units, n, Ea, Ea_units, T0, Tmin,
//! Tmax, dA, dn, dEa, source_comment`. The `label` column carries direction
//! and model, e.g. `k_for (TST)` or `k_rev (TST+T)`.

use super::error::Error;
use super::table::{Row, for_each_row};
use crate::model::kinetics::{ArrheniusRate, DEFAULT_RATE_MODEL, RateDirection};
use crate::thermo::units::EnergyUnit;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `source` recorded on every rate read from a table.
pub const KINETICS_SOURCE: &str = "arrhenius_csv";

/// Columns copied verbatim into each rate's `meta`, keyed by the meta name.
const META_COLUMNS: [(&str, &str); 5] = [
    ("A_units", "A_units"),
    ("Ea_units", "Ea_units"),
    ("T0", "T0"),
    ("label_raw", "label"),
    ("source_comment", "source_comment"),
];

/// Rates indexed by reaction name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KineticsTable {
    by_reaction: BTreeMap<String, Vec<ArrheniusRate>>,
}

impl KineticsTable {
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?)
    }

    /// Reads a table, skipping rows that do not describe a usable rate.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut table = Self::default();
        let mut skipped = 0usize;
        for_each_row(reader, |row| match parse_rate(row) {
            Some((reaction, rate)) => table.by_reaction.entry(reaction).or_default().push(rate),
            None => skipped += 1,
        })?;
        debug!(
            "kinetics table: {} rates for {} reactions, {skipped} rows skipped",
            table.len(),
            table.by_reaction.len()
        );
        Ok(table)
    }

    /// Rates listed for `reaction`, in file order.
    pub fn rates(&self, reaction: &str) -> &[ArrheniusRate] {
        self.by_reaction.get(reaction).map_or(&[], Vec::as_slice)
    }

    /// Number of rates across all reactions.
    pub fn len(&self) -> usize {
        self.by_reaction.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reaction.is_empty()
    }
}

fn parse_rate(row: &Row<'_>) -> Option<(String, ArrheniusRate)> {
    let reaction = row.text("reaction_label")?.to_string();
    let label = row.text("label").unwrap_or_default();
    let Some((direction, model)) = direction_and_model(label) else {
        warn!("line {}: kinetics label {label:?} names no direction; skipped", row.line);
        return None;
    };

    let ea_unit = match row.text("Ea_units") {
        None => EnergyUnit::KjPerMol,
        Some(raw) => match raw.parse::<EnergyUnit>() {
            Ok(unit) => unit,
            Err(e) => {
                warn!("line {}: Ea: {e}; skipped", row.line);
                return None;
            }
        },
    };
    let required = (
        row.number("A"),
        row.number("Ea"),
        temperature(row, "Tmin"),
        temperature(row, "Tmax"),
    );
    let (Some(a), Some(ea), Some(tmin_k), Some(tmax_k)) = required else {
        warn!(
            "line {}: rate for '{reaction}' lacks A, Ea, Tmin or Tmax; skipped",
            row.line
        );
        return None;
    };

    let meta = META_COLUMNS
        .iter()
        .filter_map(|(key, column)| Some((key.to_string(), row.text(column)?.to_string())))
        .collect();
    let rate = ArrheniusRate {
        direction,
        model,
        a,
        n: row.number("n"),
        ea_kj_mol: ea_unit.to_kj_per_mol(ea),
        tmin_k,
        tmax_k,
        source: Some(KINETICS_SOURCE.to_string()),
        reference: None,
        da_factor: row.number("dA"),
        dn_abs: row.number("dn"),
        dea_kj_mol: row.number("dEa").map(|v| ea_unit.to_kj_per_mol(v)),
        meta,
    };
    Some((reaction, rate))
}

/// Splits `k_for (TST)` into the forward direction and model `TST`.
fn direction_and_model(label: &str) -> Option<(RateDirection, String)> {
    let lower = label.trim().to_ascii_lowercase();
    let direction = if lower.starts_with("k_for") {
        RateDirection::Forward
    } else if lower.starts_with("k_rev") {
        RateDirection::Reverse
    } else {
        return None;
    };
    let model = match (label.find('('), label.rfind(')')) {
        (Some(open), Some(close)) if open < close => label[open + 1..close].trim(),
        _ => "",
    };
    let model = if model.is_empty() {
        DEFAULT_RATE_MODEL
    } else {
        model
    };
    Some((direction, model.to_string()))
}

/// Kelvin from `300`, `300K` or `300.0 K`.
fn temperature(row: &Row<'_>, name: &str) -> Option<f64> {
    let raw = row.text(name)?;
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_suffix(['K', 'k']).unwrap_or(&compact);
    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!("line {}: {name} = {raw:?} is not a temperature; ignored", row.line);
            None
        }
    }
}
