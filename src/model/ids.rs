use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identity of a chemical species.
    SpeciesId
);
row_id!(
    /// Identity of a level of theory.
    LotId
);
row_id!(
    /// Identity of a conformer row.
    ConformerId
);
row_id!(
    /// Identity of a stored atom, unique across all conformers.
    AtomId
);
row_id!(
    /// Identity of a reaction.
    ReactionId
);
row_id!(
    /// Identity of an ingestion batch.
    BatchId
);

/// A (species, level-of-theory) pair: the unit within which energies are
/// comparable and wells are clustered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub species: SpeciesId,
    pub lot: LotId,
}

impl GroupKey {
    pub fn new(species: SpeciesId, lot: LotId) -> Self {
        Self { species, lot }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species {} / lot {}", self.species, self.lot)
    }
}
