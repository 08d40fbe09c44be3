//! Energy items of a structure record, normalized to kJ/mol.
//!
//! Each energy item `<name>` may be accompanied by `<name>_units`. Values
//! whose unit is missing (with no configured default) or unrecognized are
//! dropped with a warning rather than stored in the wrong unit.

use crate::io::SdfRecord;
use crate::model::features::{TsFeatures, WellFeatures};
use crate::model::ids::LotId;
use crate::thermo::gibbs::{SOURCE_KEY, SOURCE_USER};
use crate::thermo::units::{EnergyUnit, EntropyUnit};
use log::warn;
use std::collections::BTreeMap;

pub const E_ELEC: &str = "E_elec";
pub const ZPE: &str = "ZPE";
pub const H298: &str = "H298";
pub const G298: &str = "G298";
pub const S298: &str = "S298";
pub const E_TS: &str = "E_TS";
pub const IMAG_FREQ: [&str; 2] = ["imag_freq", "imag_freq_cm1"];
pub const IRC_VERIFIED: &str = "irc_verified";

struct Fields<'a> {
    record: &'a SdfRecord,
    default_unit: Option<EnergyUnit>,
    meta: BTreeMap<String, String>,
}

impl<'a> Fields<'a> {
    fn new(record: &'a SdfRecord, default_unit: Option<EnergyUnit>) -> Self {
        Self {
            record,
            default_unit,
            meta: BTreeMap::new(),
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        let raw = self.record.field(name)?;
        let value = raw.parse::<f64>().ok().filter(|v| v.is_finite());
        if value.is_none() {
            warn!(
                "record {}: {name} = {raw:?} is not a number; ignored",
                self.record.index
            );
        }
        value
    }

    fn energy(&mut self, name: &str) -> Option<f64> {
        let value = self.number(name)?;
        let unit_key = format!("{name}_units");
        let (unit, raw_unit) = match self.record.field(&unit_key) {
            Some(raw) => match raw.parse::<EnergyUnit>() {
                Ok(unit) => (unit, raw.to_string()),
                Err(e) => {
                    warn!("record {}: {name}: {e}; value dropped", self.record.index);
                    return None;
                }
            },
            None => match self.default_unit {
                Some(unit) => (unit, unit.as_str().to_string()),
                None => {
                    warn!(
                        "record {}: {name} has no {unit_key} and no default unit \
                         is configured; value dropped",
                        self.record.index
                    );
                    return None;
                }
            },
        };
        self.meta.insert(format!("{name}_units_raw"), raw_unit);
        Some(unit.to_kj_per_mol(value))
    }

    fn entropy(&mut self, name: &str) -> Option<f64> {
        let value = self.number(name)?;
        let unit_key = format!("{name}_units");
        let Some(raw) = self.record.field(&unit_key) else {
            warn!(
                "record {}: {name} has no {unit_key}; value dropped",
                self.record.index
            );
            return None;
        };
        match raw.parse::<EntropyUnit>() {
            Ok(unit) => {
                self.meta.insert(format!("{name}_units_raw"), raw.to_string());
                Some(unit.to_kj_per_mol_k(value))
            }
            Err(e) => {
                warn!("record {}: {name}: {e}; value dropped", self.record.index);
                None
            }
        }
    }

    fn flag(&self, name: &str) -> Option<bool> {
        let raw = self.record.field(name)?;
        let value = match raw.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        };
        if value.is_none() {
            warn!(
                "record {}: {name} = {raw:?} is not a boolean; ignored",
                self.record.index
            );
        }
        value
    }
}

/// Well features of a non-TS record, or `None` when it carries no energies.
pub fn well_features(record: &SdfRecord, default_unit: Option<EnergyUnit>) -> Option<WellFeatures> {
    let mut fields = Fields::new(record, default_unit);
    let mut features = WellFeatures {
        e_elec: fields.energy(E_ELEC),
        zpe: fields.energy(ZPE),
        h298: fields.energy(H298),
        g298: fields.energy(G298),
        s298: fields.entropy(S298),
        meta: BTreeMap::new(),
    };
    if features.is_empty() {
        return None;
    }
    if features.g298.is_some() {
        fields
            .meta
            .insert(SOURCE_KEY.to_string(), SOURCE_USER.to_string());
    }
    features.meta = fields.meta;
    Some(features)
}

/// TS features of a TS record at `lot`, or `None` when it carries none.
pub fn ts_features(
    record: &SdfRecord,
    lot: LotId,
    default_unit: Option<EnergyUnit>,
) -> Option<TsFeatures> {
    let mut fields = Fields::new(record, default_unit);
    let features = TsFeatures {
        lot,
        imag_freq_cm1: IMAG_FREQ.iter().find_map(|name| fields.number(name)),
        irc_verified: fields.flag(IRC_VERIFIED),
        e_ts: fields.energy(E_TS),
    };
    (!features.is_empty()).then_some(features)
}
