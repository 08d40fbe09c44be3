//! Reading reaction structure files.
//!
//! [`sdf::SdfReader`] walks the V2000 records of a multi-record SDF file and
//! keeps each record's structure block and data items.
//! [`triplet::TripletReader`] groups those records into R1H/R2H/TS reaction
//! triplets and decodes the per-atom `mol_properties` annotations.
//! [`kinetics::KineticsTable`] and [`atom_table::AtomTable`] read the CSV
//! tables that accompany an SDF export: Arrhenius rates per reaction and
//! per-atom features per participant.

pub mod atom_table;
pub mod error;
pub mod kinetics;
pub mod sdf;
mod table;
pub mod triplet;

pub use atom_table::{AtomRow, AtomTable};
pub use error::Error;
pub use kinetics::KineticsTable;
pub use sdf::{SdfReader, SdfRecord};
pub use triplet::{AtomProperties, MolRecord, ReactionTriplet, TripletOptions, TripletReader};
