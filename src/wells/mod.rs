//! Energy-well clustering and relabeling.
//!
//! Within one (species, level of theory) group every conformer with a usable
//! energy (G298, else H298, else E0, else E_elec) is sorted by
//! `(energy, geometry fingerprint, id)` and greedily bucketed: a new well
//! opens whenever the energy is more than [`ENERGY_TOL`] above the first
//! member of the current well. Wells are ranked from 1 and labeled `well`,
//! `iso1`, `iso2`, ...; members of shared wells get `_a`, `_b`, ... suffixes
//! and the first member is the representative.
//!
//! Conformers without a usable energy keep their existing label (or get
//! `unknown`) and their stored rank and representative flag are left alone.
//! Relabeling reads only stored energies and labels, so re-running it on an
//! unchanged store reproduces the same assignment.

mod cluster;
mod error;
pub mod label;
mod relabel;

pub use cluster::{ENERGY_TOL, cluster, within_tolerance};
pub use error::Error;
pub use relabel::{GroupFailure, GroupSummary, RelabelReport, relabel_all, relabel_group};
