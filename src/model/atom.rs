use super::ids::{AtomId, ConformerId};
use super::types::Element;
use serde::{Deserialize, Serialize};

/// Atom as read from a structure record, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: Element, position: [f64; 3]) -> Self {
        Self { element, position }
    }
}

/// Optional per-atom scalars from population analysis and force output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomFeatures {
    /// Mulliken partial charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_charge: Option<f64>,
    /// Atomic polar tensor charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apt_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_magnitude: Option<f64>,
}

impl AtomFeatures {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrites the fields present in `other`.
    pub fn merge_from(&mut self, other: &AtomFeatures) {
        let fields = [
            (&mut self.partial_charge, other.partial_charge),
            (&mut self.apt_charge, other.apt_charge),
            (&mut self.spin, other.spin),
            (&mut self.mass, other.mass),
            (&mut self.force_magnitude, other.force_magnitude),
        ];
        for (slot, value) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

/// One stored atom of one conformer geometry.
///
/// `index` is zero-based and dense within the conformer and follows the atom
/// order of the source record, so role tags and star markers keep pointing at
/// the same physical atom across re-ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformerAtom {
    pub id: AtomId,
    pub conformer: ConformerId,
    pub index: usize,
    pub element: Element,
    pub position: [f64; 3],
    #[serde(flatten)]
    pub features: AtomFeatures,
}

impl ConformerAtom {
    #[inline]
    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number()
    }
}
