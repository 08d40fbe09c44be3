//! Value types for reaction, conformer and thermochemistry data.
//!
//! - [`types`] – Elements, reaction roles (R1H/R2H/TS) and atom roles.
//! - [`ids`] – Row identities and the (species, level-of-theory) group key.
//! - [`atom`] – Atoms as read from a record and as stored per conformer.
//! - [`conformer`] – Species, levels of theory, conformers and their well state.
//! - [`features`] – Well and transition-state energy annotations.
//! - [`reaction`] – Reactions, participants, role tags, atom-map edges and
//!   ingestion batches.
//! - [`kinetics`] – Modified-Arrhenius rates per reaction direction.
//! - [`geometry`] – Distances, angles and dihedrals over conformer atoms.
//!
//! These are plain values; nothing here talks to storage. The engines in
//! [`crate::wells`] and [`crate::mapping`] read them and decide which fields
//! change, and a [`crate::store::Store`] persists the result.

pub mod atom;
pub mod conformer;
pub mod features;
pub mod geometry;
pub mod ids;
pub mod kinetics;
pub mod reaction;
pub mod types;
