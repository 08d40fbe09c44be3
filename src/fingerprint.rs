//! Geometry fingerprints for conformer deduplication.
//!
//! A fingerprint is the hex SHA-256 digest of every atom's atomic number and
//! coordinates rounded to [`DECIMALS`] places, in source atom order. Two
//! geometries with the same fingerprint are treated as the same conformer.

use crate::model::atom::Atom;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Decimal places kept per coordinate before hashing.
pub const DECIMALS: usize = 6;

const SCALE: f64 = 1e6;

/// Hashes an ordered atom list.
///
/// Total over any input; callers reject empty geometries before getting here.
pub fn geometry_hash(atoms: &[Atom]) -> String {
    geometry_hash_from_parts(atoms.iter().map(|a| (a.element.atomic_number(), a.position)))
}

/// Hashes `(atomic_number, [x, y, z])` pairs in the order given.
pub fn geometry_hash_from_parts<I>(atoms: I) -> String
where
    I: IntoIterator<Item = (u8, [f64; 3])>,
{
    let mut canonical = String::new();
    for (z, [x, y, zc]) in atoms {
        let _ = write!(
            canonical,
            "{}:{:.prec$},{:.prec$},{:.prec$};",
            z,
            round_coord(x),
            round_coord(y),
            round_coord(zc),
            prec = DECIMALS
        );
    }
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Rounds half away from zero and folds `-0.0` into `0.0` so that jitter
/// around the origin does not split otherwise identical geometries.
fn round_coord(v: f64) -> f64 {
    (v * SCALE).round() / SCALE + 0.0
}
