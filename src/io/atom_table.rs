//! Per-atom feature tables keyed by reaction, role and atom index.
//!
//! Columns: `rxn_id, mol_type, focus_atom_idx, q_mull, q_apt, spin, Z, mass,
//! f_mag, path, radius, angle, dihedral`. `path` lists the atom indices of an
//! optional internal coordinate ending at the focus atom, written `[0, 1, 2]`
//! or `(0,1,2)`; `radius`, `angle` or `dihedral` gives its value depending on
//! the path length.

use super::error::Error;
use super::table::{Row, for_each_row};
use crate::model::atom::AtomFeatures;
use crate::model::geometry::MeasureKind;
use crate::model::types::ReactionRole;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One table row for a single atom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomRow {
    pub features: AtomFeatures,
    pub atomic_number: Option<u8>,
    /// Zero-based atom indices of the row's internal coordinate.
    pub path: Option<Vec<usize>>,
    /// Ångström.
    pub radius: Option<f64>,
    pub angle: Option<f64>,
    pub dihedral: Option<f64>,
}

impl AtomRow {
    /// The internal coordinate the row describes, with angles in degrees.
    ///
    /// Angles and dihedrals are read as radians unless `angles_in_degrees`.
    pub fn measure(&self, angles_in_degrees: bool) -> Option<(MeasureKind, &[usize], f64)> {
        let path = self.path.as_deref()?;
        let kind = MeasureKind::from_arity(path.len())?;
        let value = match kind {
            MeasureKind::Distance => self.radius?,
            MeasureKind::Angle => self.angle?,
            MeasureKind::Dihedral => self.dihedral?,
        };
        let value = if kind == MeasureKind::Distance || angles_in_degrees {
            value
        } else {
            value.to_degrees()
        };
        Some((kind, path, value))
    }
}

type RoleRows = BTreeMap<ReactionRole, BTreeMap<usize, AtomRow>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomTable {
    by_reaction: BTreeMap<String, RoleRows>,
}

impl AtomTable {
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?)
    }

    /// Reads a table; rows without a reaction, a known role or an atom
    /// index are skipped. A repeated (reaction, role, atom) keeps the last row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut table = Self::default();
        let mut skipped = 0usize;
        for_each_row(reader, |row| match parse_row(row) {
            Some((reaction, role, index, atom)) => {
                table
                    .by_reaction
                    .entry(reaction)
                    .or_default()
                    .entry(role)
                    .or_default()
                    .insert(index, atom);
            }
            None => skipped += 1,
        })?;
        debug!(
            "atom table: {} rows for {} reactions, {skipped} rows skipped",
            table.len(),
            table.by_reaction.len()
        );
        Ok(table)
    }

    pub fn contains_reaction(&self, reaction: &str) -> bool {
        self.by_reaction.contains_key(reaction)
    }

    /// Rows for one participant, keyed by atom index.
    pub fn rows(&self, reaction: &str, role: ReactionRole) -> Option<&BTreeMap<usize, AtomRow>> {
        self.by_reaction.get(reaction)?.get(&role)
    }

    /// Number of atom rows across all reactions.
    pub fn len(&self) -> usize {
        self.by_reaction
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reaction.is_empty()
    }
}

fn parse_row(row: &Row<'_>) -> Option<(String, ReactionRole, usize, AtomRow)> {
    let reaction = row.text("rxn_id")?.to_string();
    let role = match row.text("mol_type")?.parse::<ReactionRole>() {
        Ok(role) => role,
        Err(e) => {
            warn!("line {}: {e}; row skipped", row.line);
            return None;
        }
    };
    let index = row.index("focus_atom_idx")?;

    let atomic_number = row
        .index("Z")
        .and_then(|z| u8::try_from(z).ok())
        .filter(|z| *z > 0);
    let path = row.text("path").and_then(|raw| {
        let parsed = parse_path(raw);
        if parsed.is_none() {
            warn!("line {}: path {raw:?} is not a list of atom indices; ignored", row.line);
        }
        parsed
    });
    let atom = AtomRow {
        features: AtomFeatures {
            partial_charge: row.number("q_mull"),
            apt_charge: row.number("q_apt"),
            spin: row.number("spin"),
            mass: row.number("mass"),
            force_magnitude: row.number("f_mag"),
        },
        atomic_number,
        path,
        radius: row.number("radius"),
        angle: row.number("angle"),
        dihedral: row.number("dihedral"),
    };
    Some((reaction, role, index, atom))
}

/// Parses `[0, 1, 2]`, `(0,1,2)` or a bare `0 1 2`.
fn parse_path(raw: &str) -> Option<Vec<usize>> {
    let inner = raw
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|path| !path.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const HEADER: &str =
        "rxn_id,mol_type,focus_atom_idx,q_mull,q_apt,spin,Z,mass,f_mag,path,radius,angle,dihedral";

    fn table(rows: &[&str]) -> AtomTable {
        let text = std::iter::once(HEADER)
            .chain(rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        AtomTable::from_reader(Cursor::new(text)).unwrap()
    }

    #[test]
    fn paths_accept_brackets_and_parentheses() {
        assert_eq!(parse_path("[0, 1, 2]"), Some(vec![0, 1, 2]));
        assert_eq!(parse_path("(3,4)"), Some(vec![3, 4]));
        assert_eq!(parse_path("5 6 7 8"), Some(vec![5, 6, 7, 8]));
        assert_eq!(parse_path("[]"), None);
        assert_eq!(parse_path("[0, a]"), None);
    }

    #[test]
    fn rows_are_grouped_by_reaction_and_role() {
        let atoms = table(&[
            "rxn1,R1H,0,-0.41,-0.5,0.0,6,12.011,0.02,,,,",
            "rxn1,R1H,1,0.12,,,1,1.008,,\"[1, 0]\",1.09,,",
            "rxn1,ts,0,-0.3,,0.4,6,,,,,,",
            "rxn2,R2H,2,,,,8,,,,,,",
        ]);
        assert_eq!(atoms.len(), 4);
        assert!(atoms.contains_reaction("rxn2"));
        assert!(!atoms.contains_reaction("rxn3"));
        assert!(atoms.rows("rxn1", ReactionRole::R2H).is_none());

        let r1h = atoms.rows("rxn1", ReactionRole::R1H).unwrap();
        assert_eq!(r1h[&0].features.partial_charge, Some(-0.41));
        assert_eq!(r1h[&0].features.apt_charge, Some(-0.5));
        assert_eq!(r1h[&0].features.force_magnitude, Some(0.02));
        assert_eq!(r1h[&0].atomic_number, Some(6));
        assert_eq!(r1h[&1].path, Some(vec![1, 0]));
        assert_eq!(
            r1h[&1].measure(false),
            Some((MeasureKind::Distance, &[1usize, 0][..], 1.09))
        );
        assert_eq!(atoms.rows("rxn1", ReactionRole::TS).unwrap()[&0].features.spin, Some(0.4));
    }

    #[test]
    fn angles_are_converted_from_radians_unless_marked_degrees() {
        let atom = AtomRow {
            path: Some(vec![2, 1, 0]),
            angle: Some(std::f64::consts::FRAC_PI_2),
            ..AtomRow::default()
        };
        let (kind, _, value) = atom.measure(false).unwrap();
        assert_eq!(kind, MeasureKind::Angle);
        assert!((value - 90.0).abs() < 1e-12);
        assert_eq!(atom.measure(true).unwrap().2, std::f64::consts::FRAC_PI_2);

        let dihedral_without_value = AtomRow {
            path: Some(vec![3, 2, 1, 0]),
            angle: Some(1.0),
            ..AtomRow::default()
        };
        assert_eq!(dihedral_without_value.measure(false), None);
        assert_eq!(AtomRow::default().measure(false), None);
    }

    #[test]
    fn rows_without_identity_are_skipped() {
        let atoms = table(&[
            ",R1H,0,0.1,,,,,,,,,",
            "rxn1,product,0,0.1,,,,,,,,,",
            "rxn1,R1H,,0.1,,,,,,,,,",
            "rxn1,R1H,-1,0.1,,,,,,,,,",
        ]);
        assert!(atoms.is_empty());
    }

    #[test]
    fn tables_are_read_from_disk() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "rxn1,TS,3,0.2,,,1,,,,,,").unwrap();
        file.flush().unwrap();

        let atoms = AtomTable::read_path(file.path()).unwrap();
        assert_eq!(atoms.rows("rxn1", ReactionRole::TS).unwrap().len(), 1);
    }
}
