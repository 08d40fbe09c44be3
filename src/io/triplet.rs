//! Grouping of SDF records into hydrogen-abstraction reaction triplets.

use super::error::Error;
use super::sdf::{SdfReader, SdfRecord};
use crate::model::atom::AtomFeatures;
use crate::model::types::{AtomRole, ReactionRole};
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Data items that may carry a record's reaction role, in lookup order.
pub const ROLE_FIELDS: [&str; 5] = ["type", "ROLE", "role", "MolRole", "mol_role"];
const REACTION_FIELDS: [&str; 2] = ["reaction", "REACTION"];
const MOL_PROPERTIES_FIELDS: [&str; 2] = ["mol_properties", "MOL_PROPERTIES"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripletOptions {
    /// Every record must name its role; otherwise fall back to `order_hint`.
    pub strict_roles: bool,
    /// Role of the first, second and third record of a triplet when no role
    /// field is present.
    pub order_hint: [ReactionRole; 3],
}

impl Default for TripletOptions {
    fn default() -> Self {
        Self {
            strict_roles: true,
            order_hint: ReactionRole::ALL,
        }
    }
}

/// Per-atom annotation from a record's `mol_properties` item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomProperties {
    /// Lower-cased label; `donator` is read as `donor`.
    pub label: Option<String>,
    pub features: AtomFeatures,
}

impl AtomProperties {
    /// The chemical role named by the label, if it names one.
    pub fn role(&self) -> Option<AtomRole> {
        self.label.as_deref()?.parse().ok()
    }
}

/// One record of a triplet with its role and decoded annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct MolRecord {
    pub role: ReactionRole,
    pub record: SdfRecord,
    pub reaction_name: Option<String>,
    /// Keyed by zero-based atom index.
    pub atom_properties: BTreeMap<usize, AtomProperties>,
}

impl MolRecord {
    /// Atom labels keyed by index, as stored on a conformer.
    pub fn atom_labels(&self) -> BTreeMap<usize, String> {
        self.atom_properties
            .iter()
            .filter_map(|(idx, p)| p.label.clone().map(|l| (*idx, l)))
            .collect()
    }
}

/// The R1H, R2H and TS records of one reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionTriplet {
    pub reaction_name: Option<String>,
    pub r1h: MolRecord,
    pub r2h: MolRecord,
    pub ts: MolRecord,
}

impl ReactionTriplet {
    pub fn get(&self, role: ReactionRole) -> &MolRecord {
        match role {
            ReactionRole::R1H => &self.r1h,
            ReactionRole::R2H => &self.r2h,
            ReactionRole::TS => &self.ts,
        }
    }

    /// Records in R1H, R2H, TS order.
    pub fn records(&self) -> [&MolRecord; 3] {
        [&self.r1h, &self.r2h, &self.ts]
    }
}

/// Reads consecutive groups of three SDF records as reaction triplets.
///
/// Within a group each role must appear once, and all records that name a
/// reaction must name the same one. A file whose record count is not a
/// multiple of three ends with an [`Error::IncompleteTriplet`].
pub struct TripletReader<R> {
    records: SdfReader<R>,
    options: TripletOptions,
    done: bool,
}

impl<R: BufRead> TripletReader<R> {
    pub fn new(reader: R, options: TripletOptions) -> Self {
        Self {
            records: SdfReader::new(reader),
            options,
            done: false,
        }
    }

    fn next_triplet(&mut self) -> Result<Option<ReactionTriplet>, Error> {
        let mut slots: [Option<MolRecord>; 3] = [None, None, None];
        let mut reaction_name: Option<String> = None;
        let mut filled = 0;

        while filled < 3 {
            let Some(record) = self.records.next() else {
                if filled == 0 {
                    return Ok(None);
                }
                let roles: Vec<&str> = ReactionRole::ALL
                    .iter()
                    .zip(&slots)
                    .filter(|(_, slot)| slot.is_some())
                    .map(|(role, _)| role.as_str())
                    .collect();
                return Err(Error::IncompleteTriplet {
                    roles: roles.join(", "),
                });
            };
            let record = record?;
            let role = detect_role(&record, &self.options)?;

            let name = record.first_field(&REACTION_FIELDS).map(str::to_string);
            if let Some(name) = &name {
                match &reaction_name {
                    None => reaction_name = Some(name.clone()),
                    Some(expected) if expected != name => {
                        return Err(Error::ReactionMismatch {
                            record: record.index,
                            expected: expected.clone(),
                            found: name.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }

            let slot = &mut slots[role_slot(role)];
            if slot.is_some() {
                return Err(Error::DuplicateRole {
                    record: record.index,
                    role,
                });
            }
            let atom_properties = record
                .first_field(&MOL_PROPERTIES_FIELDS)
                .map(|raw| parse_mol_properties(raw, record.index))
                .unwrap_or_default();
            *slot = Some(MolRecord {
                role,
                record,
                reaction_name: name,
                atom_properties,
            });
            filled += 1;
        }

        let [Some(r1h), Some(r2h), Some(ts)] = slots else {
            return Err(Error::IncompleteTriplet {
                roles: String::new(),
            });
        };
        Ok(Some(ReactionTriplet {
            reaction_name,
            r1h,
            r2h,
            ts,
        }))
    }
}

impl<R: BufRead> Iterator for TripletReader<R> {
    type Item = Result<ReactionTriplet, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_triplet().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

fn role_slot(role: ReactionRole) -> usize {
    match role {
        ReactionRole::R1H => 0,
        ReactionRole::R2H => 1,
        ReactionRole::TS => 2,
    }
}

fn detect_role(record: &SdfRecord, options: &TripletOptions) -> Result<ReactionRole, Error> {
    if options.strict_roles {
        return record
            .first_field(&ROLE_FIELDS)
            .and_then(|v| v.parse().ok())
            .ok_or(Error::MissingRole {
                record: record.index,
            });
    }
    let explicit = ROLE_FIELDS
        .iter()
        .filter_map(|name| record.field(name))
        .find_map(|v| v.parse::<ReactionRole>().ok());
    Ok(explicit.unwrap_or(options.order_hint[record.index % 3]))
}

/// Decodes a `mol_properties` item: a JSON object from atom index to an
/// object with an optional `label` and per-atom scalars.
///
/// Blank, `unknown` and `null` mean no annotations. Python-literal dicts
/// (single quotes, `None`, `True`) written by older exporters are accepted.
/// Anything else is logged and ignored.
pub fn parse_mol_properties(raw: &str, record: usize) -> BTreeMap<usize, AtomProperties> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || matches!(trimmed.to_ascii_lowercase().as_str(), "unknown" | "null") {
        return BTreeMap::new();
    }
    let value = serde_json::from_str::<Value>(trimmed)
        .or_else(|_| serde_json::from_str::<Value>(&python_literal_to_json(trimmed)));
    let map = match value {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("record {record}: mol_properties is not an object; ignoring");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!("record {record}: unreadable mol_properties ({e}); ignoring");
            return BTreeMap::new();
        }
    };

    let mut out = BTreeMap::new();
    for (key, entry) in map {
        let Ok(index) = key.trim().parse::<usize>() else {
            continue;
        };
        let Value::Object(fields) = entry else {
            continue;
        };
        let number = |names: &[&str]| names.iter().find_map(|n| fields.get(*n)?.as_f64());
        let label = fields
            .get("label")
            .and_then(Value::as_str)
            .map(normalize_label)
            .filter(|l| !l.is_empty());
        out.insert(
            index,
            AtomProperties {
                label,
                features: AtomFeatures {
                    partial_charge: number(&["q_mull", "partial_charge", "charge"]),
                    apt_charge: number(&["q_apt"]),
                    spin: number(&["spin"]),
                    mass: number(&["mass"]),
                    force_magnitude: number(&["f_mag"]),
                },
            },
        );
    }
    out
}

fn normalize_label(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    if lower == "donator" {
        "donor".to_string()
    } else {
        lower
    }
}

fn python_literal_to_json(raw: &str) -> String {
    raw.replace('\'', "\"")
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false")
}
