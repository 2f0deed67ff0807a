//! Ownership metadata for mesh cells and vertices.
//!
//! [`CellOwnership`] records the owning rank of every global cell. From it a
//! rank derives the [`CellStatus`] of each cell it knows about, and the owner of
//! each vertex (the smallest rank among the owners of the adjacent cells).

use crate::post_error::PostError;
use crate::topology::point::{CellId, VertexId};
use std::collections::BTreeSet;

/// Role of a cell on the current rank.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CellStatus {
    /// Owned by this rank: integrals over it are this rank's responsibility.
    LocallyOwned,
    /// Owned elsewhere but touching an owned cell; its field data is available.
    Ghost,
    /// Known only for topology; no field data is available.
    Artificial,
}

impl CellStatus {
    #[inline]
    pub fn is_locally_owned(self) -> bool {
        self == CellStatus::LocallyOwned
    }

    #[inline]
    pub fn is_artificial(self) -> bool {
        self == CellStatus::Artificial
    }
}

/// Owning rank per global cell.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CellOwnership {
    owners: Vec<usize>,
}

impl CellOwnership {
    /// Build from one owner rank per cell, validating ranks against `n_ranks`.
    pub fn from_owners(owners: Vec<usize>, n_ranks: usize) -> Result<Self, PostError> {
        if let Some((cell, &rank)) = owners.iter().enumerate().find(|&(_, &r)| r >= n_ranks) {
            return Err(PostError::InvalidMesh(format!(
                "cell {cell} assigned to rank {rank}, but only {n_ranks} ranks exist"
            )));
        }
        Ok(Self { owners })
    }

    /// Number of cells tracked.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owning rank of `cell`.
    pub fn owner(&self, cell: CellId) -> Option<usize> {
        self.owners.get(cell.get()).copied()
    }

    /// Cells owned by `rank`, in ascending order.
    pub fn owned_cells(&self, rank: usize) -> impl Iterator<Item = CellId> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter_map(move |(idx, &owner)| (owner == rank).then_some(CellId::new(idx)))
    }

    /// Classify every cell for `rank` given each cell's vertices.
    ///
    /// A non-owned cell is a ghost when it shares at least one vertex with a
    /// cell owned by `rank`; otherwise it is artificial.
    pub fn statuses_for_rank(&self, rank: usize, cell_vertices: &[Vec<VertexId>]) -> Vec<CellStatus> {
        let owned_vertices: BTreeSet<VertexId> = self
            .owned_cells(rank)
            .filter_map(|cell| cell_vertices.get(cell.get()))
            .flatten()
            .copied()
            .collect();
        self.owners
            .iter()
            .zip(cell_vertices)
            .map(|(&owner, vertices)| {
                if owner == rank {
                    CellStatus::LocallyOwned
                } else if vertices.iter().any(|v| owned_vertices.contains(v)) {
                    CellStatus::Ghost
                } else {
                    CellStatus::Artificial
                }
            })
            .collect()
    }

    /// Owner of each vertex: the smallest owner among the adjacent cells.
    ///
    /// Vertices not referenced by any cell get `None`.
    pub fn vertex_owners(&self, n_vertices: usize, cell_vertices: &[Vec<VertexId>]) -> Vec<Option<usize>> {
        let mut owners: Vec<Option<usize>> = vec![None; n_vertices];
        for (&cell_owner, vertices) in self.owners.iter().zip(cell_vertices) {
            for v in vertices {
                if let Some(slot) = owners.get_mut(v.get()) {
                    *slot = Some(slot.map_or(cell_owner, |o| o.min(cell_owner)));
                }
            }
        }
        owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> (CellOwnership, Vec<Vec<VertexId>>) {
        // 1D-like strip of three cells: [0,1] [1,2] [2,3]
        let cells = vec![
            vec![VertexId::new(0), VertexId::new(1)],
            vec![VertexId::new(1), VertexId::new(2)],
            vec![VertexId::new(2), VertexId::new(3)],
        ];
        (CellOwnership::from_owners(vec![0, 1, 2], 3).unwrap(), cells)
    }

    #[test]
    fn rejects_out_of_range_rank() {
        let err = CellOwnership::from_owners(vec![0, 2], 2).unwrap_err();
        assert!(matches!(err, PostError::InvalidMesh(_)));
    }

    #[test]
    fn statuses_mark_neighbours_as_ghosts() {
        let (own, cells) = strip();
        let st = own.statuses_for_rank(0, &cells);
        assert_eq!(
            st,
            vec![CellStatus::LocallyOwned, CellStatus::Ghost, CellStatus::Artificial]
        );
        let st = own.statuses_for_rank(1, &cells);
        assert_eq!(
            st,
            vec![CellStatus::Ghost, CellStatus::LocallyOwned, CellStatus::Ghost]
        );
    }

    #[test]
    fn vertex_owner_is_min_rank() {
        let (own, cells) = strip();
        let owners = own.vertex_owners(5, &cells);
        assert_eq!(owners, vec![Some(0), Some(0), Some(1), Some(2), None]);
    }
}
