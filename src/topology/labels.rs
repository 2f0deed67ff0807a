//! Boundary indicators for cell faces.
//!
//! Faces are addressed by `(cell, local face)` with `local face = 2·axis + side`.
//! Only faces on the domain boundary carry an indicator.

use std::collections::{BTreeMap, BTreeSet};

use crate::topology::point::{BoundaryId, CellId};

/// Local face index within a cell.
pub type FaceIndex = usize;

/// Boundary indicators keyed by `(cell, face)`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct BoundaryLabels {
    ids: BTreeMap<(CellId, FaceIndex), BoundaryId>,
}

impl BoundaryLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `id` to a face.
    ///
    /// Returns the previous indicator, if any.
    pub fn set(&mut self, cell: CellId, face: FaceIndex, id: BoundaryId) -> Option<BoundaryId> {
        self.ids.insert((cell, face), id)
    }

    /// Returns the indicator of a face, if it has one.
    pub fn get(&self, cell: CellId, face: FaceIndex) -> Option<BoundaryId> {
        self.ids.get(&(cell, face)).copied()
    }

    /// All faces tagged with `id`, in deterministic order.
    pub fn faces_with_id(&self, id: BoundaryId) -> impl Iterator<Item = (CellId, FaceIndex)> + '_ {
        self.ids
            .iter()
            .filter_map(move |(&key, &value)| (value == id).then_some(key))
    }

    /// Number of faces tagged with `id`.
    pub fn count(&self, id: BoundaryId) -> usize {
        self.ids.values().filter(|&&value| value == id).count()
    }

    /// Distinct indicators in ascending order.
    pub fn ids(&self) -> Vec<BoundaryId> {
        self.ids.values().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
