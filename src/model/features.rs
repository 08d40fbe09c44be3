use super::ids::LotId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `meta` key naming where a stored G298 came from.
pub const G298_SOURCE_KEY: &str = "G298_source";
/// `meta` key holding the temperature a G298 was computed at.
pub const G298_TEMPERATURE_KEY: &str = "G_calc_T_K";

/// Energetic annotation of a non-TS conformer.
///
/// Every energy is in kJ/mol and `s298` is in kJ/mol/K; conversion from the raw
/// input units happens before a value is stored here, and the raw unit is kept
/// in `meta` under `<field>_units_raw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellFeatures {
    pub e_elec: Option<f64>,
    pub zpe: Option<f64>,
    pub h298: Option<f64>,
    pub g298: Option<f64>,
    #[serde(default)]
    pub s298: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl WellFeatures {
    /// Zero-Kelvin internal energy, `E_elec + ZPE`, when both are present.
    pub fn e0(&self) -> Option<f64> {
        Some(self.e_elec? + self.zpe?)
    }

    /// Picks the clustering energy by strict priority:
    /// G298, then H298, then E0, then E_elec.
    pub fn energy(&self) -> Option<Energy> {
        if let Some(value) = self.g298 {
            return Some(Energy::new(EnergyMetric::G298, value));
        }
        if let Some(value) = self.h298 {
            return Some(Energy::new(EnergyMetric::H298, value));
        }
        if let Some(value) = self.e0() {
            return Some(Energy::new(EnergyMetric::E0, value));
        }
        self.e_elec.map(|value| Energy::new(EnergyMetric::EElec, value))
    }

    pub fn is_empty(&self) -> bool {
        self.e_elec.is_none()
            && self.zpe.is_none()
            && self.h298.is_none()
            && self.g298.is_none()
            && self.s298.is_none()
    }

    /// Overlays the fields present in `other` onto `self`.
    ///
    /// A G298 arriving without a computation temperature drops the stored
    /// one, which described the value being replaced.
    pub fn merge_from(&mut self, other: WellFeatures) {
        if other.g298.is_some() && !other.meta.contains_key(G298_TEMPERATURE_KEY) {
            self.meta.remove(G298_TEMPERATURE_KEY);
        }
        if other.e_elec.is_some() {
            self.e_elec = other.e_elec;
        }
        if other.zpe.is_some() {
            self.zpe = other.zpe;
        }
        if other.h298.is_some() {
            self.h298 = other.h298;
        }
        if other.g298.is_some() {
            self.g298 = other.g298;
        }
        if other.s298.is_some() {
            self.s298 = other.s298;
        }
        self.meta.extend(other.meta);
    }
}

/// Energetic and vibrational annotation of a transition-state conformer,
/// scoped to one level of theory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsFeatures {
    pub lot: LotId,
    pub imag_freq_cm1: Option<f64>,
    pub irc_verified: Option<bool>,
    pub e_ts: Option<f64>,
}

impl TsFeatures {
    pub fn new(lot: LotId) -> Self {
        Self {
            lot,
            imag_freq_cm1: None,
            irc_verified: None,
            e_ts: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imag_freq_cm1.is_none() && self.irc_verified.is_none() && self.e_ts.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyMetric {
    G298,
    H298,
    E0,
    EElec,
    ETs,
}

impl EnergyMetric {
    pub fn label(&self) -> &'static str {
        match self {
            EnergyMetric::G298 => "G298",
            EnergyMetric::H298 => "H298",
            EnergyMetric::E0 => "E0",
            EnergyMetric::EElec => "E_elec",
            EnergyMetric::ETs => "E_TS",
        }
    }
}

impl fmt::Display for EnergyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An energy value in kJ/mol together with the quantity it measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Energy {
    pub metric: EnergyMetric,
    pub value: f64,
}

impl Energy {
    pub fn new(metric: EnergyMetric, value: f64) -> Self {
        Self { metric, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn energy_prefers_gibbs_over_everything() {
        let wf = WellFeatures {
            e_elec: Some(-100.0),
            zpe: Some(5.0),
            h298: Some(-90.0),
            g298: Some(-120.0),
            ..Default::default()
        };
        assert_eq!(wf.energy(), Some(Energy::new(EnergyMetric::G298, -120.0)));
    }

    #[test]
    fn energy_falls_back_through_enthalpy_e0_and_electronic() {
        let h = WellFeatures {
            e_elec: Some(-100.0),
            h298: Some(-90.0),
            ..Default::default()
        };
        assert_eq!(h.energy().map(|e| e.metric), Some(EnergyMetric::H298));

        let e0 = WellFeatures {
            e_elec: Some(-100.0),
            zpe: Some(5.5),
            ..Default::default()
        };
        let picked = e0.energy().unwrap();
        assert_eq!(picked.metric, EnergyMetric::E0);
        assert!(approx_eq(picked.value, -94.5, 1e-12));

        let elec = WellFeatures {
            e_elec: Some(-100.0),
            ..Default::default()
        };
        assert_eq!(elec.energy().map(|e| e.metric), Some(EnergyMetric::EElec));
    }

    #[test]
    fn zpe_or_entropy_alone_is_not_a_usable_energy() {
        let wf = WellFeatures {
            zpe: Some(12.0),
            s298: Some(0.3),
            ..Default::default()
        };
        assert!(wf.energy().is_none());
        assert!(wf.e0().is_none());
        assert!(!wf.is_empty());
        assert!(WellFeatures::default().is_empty());
    }

    #[test]
    fn merge_from_keeps_fields_missing_in_update() {
        let mut wf = WellFeatures {
            e_elec: Some(-1.0),
            h298: Some(-2.0),
            ..Default::default()
        };
        wf.merge_from(WellFeatures {
            g298: Some(-3.0),
            h298: Some(-2.5),
            ..Default::default()
        });
        assert_eq!(wf.e_elec, Some(-1.0));
        assert_eq!(wf.h298, Some(-2.5));
        assert_eq!(wf.g298, Some(-3.0));
    }

    #[test]
    fn user_gibbs_clears_stale_computation_temperature() {
        let mut wf = WellFeatures {
            g298: Some(-40.0),
            meta: BTreeMap::from([
                (G298_SOURCE_KEY.to_string(), "backend".to_string()),
                (G298_TEMPERATURE_KEY.to_string(), "298.15".to_string()),
            ]),
            ..Default::default()
        };
        wf.merge_from(WellFeatures {
            h298: Some(-10.0),
            ..Default::default()
        });
        assert!(wf.meta.contains_key(G298_TEMPERATURE_KEY));

        wf.merge_from(WellFeatures {
            g298: Some(-42.0),
            meta: BTreeMap::from([(G298_SOURCE_KEY.to_string(), "user".to_string())]),
            ..Default::default()
        });
        assert_eq!(wf.g298, Some(-42.0));
        assert_eq!(wf.meta[G298_SOURCE_KEY], "user");
        assert!(!wf.meta.contains_key(G298_TEMPERATURE_KEY));
    }
}
