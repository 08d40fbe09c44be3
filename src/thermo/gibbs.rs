//! Gibbs free energy backfill from enthalpy and entropy.

use crate::model::features::WellFeatures;
use crate::store::{Error, Store};
use log::{debug, info};

pub use crate::model::features::{
    G298_SOURCE_KEY as SOURCE_KEY, G298_TEMPERATURE_KEY as TEMPERATURE_KEY,
};

pub const SOURCE_USER: &str = "user";
pub const SOURCE_BACKEND: &str = "backend";

/// `G = H - T*S`, with `H` in kJ/mol and `S` in kJ/mol/K.
pub fn compute_g_from_hs(h298: Option<f64>, s298: Option<f64>, temperature_k: f64) -> Option<f64> {
    Some(h298? - temperature_k * s298?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GibbsReport {
    /// Conformers whose G298 was computed and written.
    pub updated: usize,
    /// Conformers whose input G298 was left alone.
    pub kept_user: usize,
    /// Conformers whose G298 an earlier backfill computed, left alone.
    pub kept_computed: usize,
    /// Conformers lacking H298 or S298.
    pub missing_inputs: usize,
}

/// Fills in G298 for non-TS conformers from their H298 and S298.
///
/// User-supplied values are kept unless `override_user` is set. Each computed
/// value is tagged `G298_source = backend` with the temperature in
/// `G_calc_T_K`.
pub fn backfill_g298<S: Store + ?Sized>(
    store: &mut S,
    temperature_k: f64,
    override_user: bool,
) -> Result<GibbsReport, Error> {
    let mut report = GibbsReport::default();
    for group in store.groups()? {
        for conformer in store.group_conformers(group)? {
            if conformer.is_ts {
                continue;
            }
            let Some(features) = conformer.well_features.as_ref() else {
                continue;
            };
            if features.g298.is_some() && !override_user {
                match features.meta.get(SOURCE_KEY).map(String::as_str) {
                    Some(SOURCE_BACKEND) => report.kept_computed += 1,
                    _ => report.kept_user += 1,
                }
                continue;
            }
            let Some(g298) = compute_g_from_hs(features.h298, features.s298, temperature_k) else {
                report.missing_inputs += 1;
                continue;
            };

            let mut update = WellFeatures {
                g298: Some(g298),
                ..WellFeatures::default()
            };
            update
                .meta
                .insert(SOURCE_KEY.to_string(), SOURCE_BACKEND.to_string());
            update
                .meta
                .insert(TEMPERATURE_KEY.to_string(), temperature_k.to_string());
            store.merge_well_features(conformer.id, update)?;
            debug!(
                "conformer {}: G298 = {:.4} kJ/mol at {} K",
                conformer.id, g298, temperature_k
            );
            report.updated += 1;
        }
    }
    info!(
        "G298 backfill: {} updated, kept {} user and {} computed, {} missing H298/S298",
        report.updated, report.kept_user, report.kept_computed, report.missing_inputs
    );
    Ok(report)
}
