use super::label::{UNKNOWN, member_label, sanitize_label};
use crate::model::conformer::{Conformer, WellPlacement, WellUpdate};
use crate::model::features::{Energy, WellFeatures};
use std::cmp::Ordering;

/// Absolute energy tolerance of a well, in kJ/mol.
pub const ENERGY_TOL: f64 = 1e-4;

/// Whether `value` belongs to the well opened by `anchor`.
///
/// The bound is inclusive and allows for the rounding error of the kJ/mol
/// conversion, so that `-10.0` and `-9.9999` share a well.
pub fn within_tolerance(anchor: f64, value: f64) -> bool {
    let slack = 8.0 * f64::EPSILON * anchor.abs().max(value.abs()).max(1.0);
    (value - anchor).abs() <= ENERGY_TOL + slack
}

/// A conformer with a usable energy, positioned for bucketing.
#[derive(Debug, Clone, Copy)]
struct Ranked<'a> {
    conformer: &'a Conformer,
    energy: Energy,
}

fn sort_key_cmp(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    a.energy
        .value
        .total_cmp(&b.energy.value)
        .then_with(|| a.conformer.geometry_hash.cmp(&b.conformer.geometry_hash))
        .then_with(|| a.conformer.id.cmp(&b.conformer.id))
}

/// Computes the well assignment of every conformer of one group.
///
/// Conformers with a usable energy come first, in energy order, each placed in
/// a well. The rest follow in input order with their sanitized existing label
/// (or [`UNKNOWN`]) and no placement, so their stored rank and representative
/// flag are not touched.
pub fn cluster(conformers: &[Conformer]) -> Vec<WellUpdate> {
    let mut ranked = Vec::with_capacity(conformers.len());
    let mut unranked = Vec::new();
    for conformer in conformers {
        match conformer.well_features.as_ref().and_then(WellFeatures::energy) {
            Some(energy) if energy.value.is_finite() => ranked.push(Ranked { conformer, energy }),
            _ => unranked.push(conformer),
        }
    }
    ranked.sort_by(sort_key_cmp);

    let mut buckets: Vec<Vec<Ranked<'_>>> = Vec::new();
    for entry in ranked {
        match buckets.last_mut() {
            Some(bucket) if within_tolerance(bucket[0].energy.value, entry.energy.value) => {
                bucket.push(entry)
            }
            _ => buckets.push(vec![entry]),
        }
    }

    let mut updates = Vec::with_capacity(conformers.len());
    for (i, bucket) in buckets.iter().enumerate() {
        let rank = i + 1;
        for (position, entry) in bucket.iter().enumerate() {
            updates.push(WellUpdate {
                conformer: entry.conformer.id,
                label: member_label(rank, position, bucket.len()),
                placement: Some(WellPlacement {
                    rank: u32::try_from(rank).unwrap_or(u32::MAX),
                    is_representative: position == 0,
                }),
            });
        }
    }
    for conformer in unranked {
        let label = conformer
            .well
            .label
            .as_deref()
            .map(sanitize_label)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        updates.push(WellUpdate {
            conformer: conformer.id,
            label,
            placement: None,
        });
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conformer::WellState;
    use crate::model::ids::{ConformerId, LotId, SpeciesId};
    use std::collections::BTreeMap;

    fn conformer(id: u64, hash: &str, features: Option<WellFeatures>) -> Conformer {
        Conformer {
            id: ConformerId(id),
            species: SpeciesId(1),
            lot: LotId(1),
            geometry_hash: hash.to_string(),
            is_ts: false,
            well: WellState::default(),
            molblock: String::new(),
            atom_labels: BTreeMap::new(),
            well_features: features,
            ts_features: Vec::new(),
        }
    }

    fn g298(value: f64) -> Option<WellFeatures> {
        Some(WellFeatures {
            g298: Some(value),
            ..WellFeatures::default()
        })
    }

    fn update_of(updates: &[WellUpdate], id: u64) -> &WellUpdate {
        updates
            .iter()
            .find(|u| u.conformer == ConformerId(id))
            .unwrap()
    }

    fn placement(update: &WellUpdate) -> (u32, bool) {
        let p = update.placement.unwrap();
        (p.rank, p.is_representative)
    }

    #[test]
    fn mixed_metrics_scenario() {
        let confs = vec![
            conformer(1, "aa", g298(-10.0)),
            conformer(2, "bb", g298(-9.9999)),
            conformer(
                3,
                "cc",
                Some(WellFeatures {
                    h298: Some(-5.0),
                    ..WellFeatures::default()
                }),
            ),
            conformer(4, "dd", None),
        ];
        let updates = cluster(&confs);
        assert_eq!(updates.len(), 4);

        let a = update_of(&updates, 1);
        assert_eq!(a.label, "well_a");
        assert_eq!(placement(a), (1, true));
        let b = update_of(&updates, 2);
        assert_eq!(b.label, "well_b");
        assert_eq!(placement(b), (1, false));
        let c = update_of(&updates, 3);
        assert_eq!(c.label, "iso1");
        assert_eq!(placement(c), (2, true));
        let d = update_of(&updates, 4);
        assert_eq!(d.label, "unknown");
        assert_eq!(d.placement, None);
    }

    #[test]
    fn buckets_are_anchored_on_their_first_member() {
        let confs = vec![
            conformer(1, "a", g298(0.0)),
            conformer(2, "b", g298(0.00009)),
            conformer(3, "c", g298(0.00018)),
            conformer(4, "d", g298(0.00027)),
        ];
        let updates = cluster(&confs);
        let labels: Vec<&str> = updates.iter().map(|u| u.label.as_str()).collect();
        assert_eq!(labels, ["well_a", "well_b", "iso1_a", "iso1_b"]);
        assert_eq!(placement(&updates[2]), (2, true));
        assert_eq!(placement(&updates[3]), (2, false));
    }

    #[test]
    fn tolerance_bound_is_inclusive() {
        assert!(within_tolerance(-10.0, -9.9999));
        assert!(within_tolerance(0.0, 1e-4));
        assert!(!within_tolerance(0.0, 1.0001e-4));
        assert!(!within_tolerance(-10.0, -9.9998));
    }

    #[test]
    fn ties_break_on_fingerprint_then_id() {
        let confs = vec![
            conformer(5, "zz", g298(-1.0)),
            conformer(3, "aa", g298(-1.0)),
            conformer(2, "aa", g298(-1.0)),
        ];
        let updates = cluster(&confs);
        let order: Vec<u64> = updates.iter().map(|u| u.conformer.get()).collect();
        assert_eq!(order, [2, 3, 5]);
        assert_eq!(updates[0].label, "well_a");
        assert_eq!(updates[2].label, "well_c");
    }

    #[test]
    fn energy_priority_prefers_gibbs_then_enthalpy_then_e0() {
        let confs = vec![
            conformer(
                1,
                "a",
                Some(WellFeatures {
                    g298: Some(-1.0),
                    h298: Some(-100.0),
                    ..WellFeatures::default()
                }),
            ),
            conformer(
                2,
                "b",
                Some(WellFeatures {
                    e_elec: Some(-3.0),
                    zpe: Some(1.0),
                    ..WellFeatures::default()
                }),
            ),
            conformer(
                3,
                "c",
                Some(WellFeatures {
                    e_elec: Some(-2.5),
                    ..WellFeatures::default()
                }),
            ),
        ];
        let updates = cluster(&confs);
        let order: Vec<u64> = updates.iter().map(|u| u.conformer.get()).collect();
        assert_eq!(order, [3, 2, 1]);
        assert_eq!(updates[0].label, "well");
        assert_eq!(updates[1].label, "iso1");
        assert_eq!(updates[2].label, "iso2");
    }

    #[test]
    fn exactly_one_representative_per_bucket() {
        let confs: Vec<Conformer> = (1..=9)
            .map(|i| conformer(i, &format!("h{i}"), g298((i / 3) as f64)))
            .collect();
        let updates = cluster(&confs);
        for rank in 1..=4u32 {
            let reps = updates
                .iter()
                .filter_map(|u| u.placement)
                .filter(|p| p.rank == rank && p.is_representative)
                .count();
            let members = updates
                .iter()
                .filter_map(|u| u.placement)
                .filter(|p| p.rank == rank)
                .count();
            assert_eq!(reps, usize::from(members > 0));
        }
    }

    #[test]
    fn no_energy_conformers_keep_existing_label_and_placement() {
        let mut kept = conformer(1, "a", None);
        kept.well = WellState {
            label: Some("well_b".to_string()),
            rank: Some(1),
            is_representative: true,
        };
        let mut accented = conformer(2, "b", Some(WellFeatures::default()));
        accented.well.label = Some("r\u{e9}f".to_string());
        let mut unprintable = conformer(3, "c", None);
        unprintable.well.label = Some("\u{3b1}".to_string());

        let updates = cluster(&[kept.clone(), accented, unprintable]);
        assert_eq!(updates[0].label, "well_b");
        assert_eq!(updates[0].placement, None);
        assert_eq!(updates[1].label, "rf");
        assert_eq!(updates[2].label, "unknown");

        let mut state = kept.well.clone();
        state.apply(&updates[0]);
        assert_eq!(state, kept.well);
    }

    #[test]
    fn clustering_is_idempotent() {
        let mut confs = vec![
            conformer(1, "a", g298(-3.0)),
            conformer(2, "b", g298(-3.00005)),
            conformer(3, "c", g298(7.5)),
            conformer(4, "d", None),
        ];
        let first = cluster(&confs);
        for update in &first {
            let c = confs.iter_mut().find(|c| c.id == update.conformer).unwrap();
            c.well.apply(update);
        }
        let second = cluster(&confs);
        assert_eq!(first, second);
    }

    #[test]
    fn non_finite_energies_are_unranked() {
        let confs = vec![conformer(1, "a", g298(f64::NAN)), conformer(2, "b", g298(1.0))];
        let updates = cluster(&confs);
        assert_eq!(update_of(&updates, 2).label, "well");
        assert_eq!(update_of(&updates, 1).label, "unknown");
    }
}
