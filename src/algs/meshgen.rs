//! Structured hypercube mesh generator with rank partitioning.
//!
//! [`BoxMeshBuilder`] describes one global `n_0 × … × n_{D-1}` grid of cells
//! together with a cell → rank assignment, and builds the [`MeshPartition`]
//! each rank sees. Global ids are lexicographic with axis 0 varying fastest,
//! so every rank numbers cells and vertices identically.
//!
//! Boundary faces are coloured `2·axis + side`: left 0, right 1, bottom 2,
//! top 3, back 4, front 5.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::post_error::PostError;
use crate::topology::labels::BoundaryLabels;
use crate::topology::mesh::{CellRecord, MeshPartition, faces_per_cell, vertices_per_cell};
use crate::topology::ownership::CellOwnership;
use crate::topology::point::{BoundaryId, CellId, VertexId};

/// Builder for partitioned structured box meshes.
#[derive(Clone, Debug)]
pub struct BoxMeshBuilder<const D: usize> {
    subdivisions: [usize; D],
    lower: [f64; D],
    upper: [f64; D],
    n_ranks: usize,
    ownership: Option<CellOwnership>,
}

fn invalid_mesh(message: impl Into<String>) -> PostError {
    PostError::InvalidMesh(message.into())
}

impl<const D: usize> BoxMeshBuilder<D> {
    /// Unit box `[0, 1]^D` with `subdivisions[a]` cells along axis `a`, one rank.
    pub fn new(subdivisions: [usize; D]) -> Self {
        Self {
            subdivisions,
            lower: [0.0; D],
            upper: [1.0; D],
            n_ranks: 1,
            ownership: None,
        }
    }

    /// Set the box corners.
    pub fn with_bounds(mut self, lower: [f64; D], upper: [f64; D]) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Partition into `n_ranks` strips of cells along axis 0.
    ///
    /// Ranks beyond the number of cell columns own nothing.
    pub fn with_strips(mut self, n_ranks: usize) -> Self {
        self.n_ranks = n_ranks;
        self.ownership = None;
        self
    }

    /// Assign every cell with `owner(cell, cell_center)`.
    pub fn with_owner_fn<F>(mut self, n_ranks: usize, owner: F) -> Result<Self, PostError>
    where
        F: Fn(CellId, [f64; D]) -> usize,
    {
        let owners = (0..self.n_cells())
            .map(|idx| owner(CellId::new(idx), self.cell_center(idx)))
            .collect();
        self.ownership = Some(CellOwnership::from_owners(owners, n_ranks)?);
        self.n_ranks = n_ranks;
        Ok(self)
    }

    /// Number of ranks the mesh is partitioned for.
    pub fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.subdivisions.iter().product()
    }

    /// Total number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.subdivisions.iter().map(|n| n + 1).product()
    }

    fn validate(&self) -> Result<(), PostError> {
        if D == 0 {
            return Err(invalid_mesh("dimension must be non-zero"));
        }
        if self.subdivisions.contains(&0) {
            return Err(invalid_mesh("subdivisions must be positive"));
        }
        if self.n_ranks == 0 {
            return Err(invalid_mesh("at least one rank is required"));
        }
        for axis in 0..D {
            if !(self.upper[axis] > self.lower[axis]) {
                return Err(invalid_mesh(format!(
                    "upper bound {} must exceed lower bound {} along axis {axis}",
                    self.upper[axis], self.lower[axis]
                )));
            }
        }
        Ok(())
    }

    fn cell_multi_index(&self, mut idx: usize) -> [usize; D] {
        let mut out = [0; D];
        for axis in 0..D {
            out[axis] = idx % self.subdivisions[axis];
            idx /= self.subdivisions[axis];
        }
        out
    }

    fn cell_index(&self, multi: &[usize; D]) -> usize {
        (0..D)
            .rev()
            .fold(0, |acc, axis| acc * self.subdivisions[axis] + multi[axis])
    }

    fn vertex_index(&self, multi: &[usize; D]) -> usize {
        (0..D)
            .rev()
            .fold(0, |acc, axis| acc * (self.subdivisions[axis] + 1) + multi[axis])
    }

    fn vertex_position(&self, multi: &[usize; D]) -> [f64; D] {
        let mut x = [0.0; D];
        for axis in 0..D {
            let h = (self.upper[axis] - self.lower[axis]) / self.subdivisions[axis] as f64;
            x[axis] = self.lower[axis] + h * multi[axis] as f64;
        }
        x
    }

    fn cell_center(&self, idx: usize) -> [f64; D] {
        let multi = self.cell_multi_index(idx);
        let lo = self.vertex_position(&multi);
        let mut x = [0.0; D];
        for axis in 0..D {
            let h = (self.upper[axis] - self.lower[axis]) / self.subdivisions[axis] as f64;
            x[axis] = lo[axis] + 0.5 * h;
        }
        x
    }

    fn cell_vertices(&self, idx: usize) -> Vec<VertexId> {
        let base = self.cell_multi_index(idx);
        (0..vertices_per_cell(D))
            .map(|local| {
                let mut multi = base;
                for (axis, m) in multi.iter_mut().enumerate() {
                    *m += (local >> axis) & 1;
                }
                VertexId::new(self.vertex_index(&multi))
            })
            .collect()
    }

    fn cell_neighbors(&self, idx: usize) -> Vec<Option<CellId>> {
        let base = self.cell_multi_index(idx);
        (0..faces_per_cell(D))
            .map(|face| {
                let (axis, side) = (face / 2, face % 2);
                let mut multi = base;
                if side == 0 {
                    multi[axis] = multi[axis].checked_sub(1)?;
                } else {
                    multi[axis] += 1;
                    if multi[axis] >= self.subdivisions[axis] {
                        return None;
                    }
                }
                Some(CellId::new(self.cell_index(&multi)))
            })
            .collect()
    }

    /// Global cell → rank assignment.
    pub fn ownership(&self) -> Result<CellOwnership, PostError> {
        self.validate()?;
        if let Some(ownership) = &self.ownership {
            return Ok(ownership.clone());
        }
        let columns = self.subdivisions[0];
        let owners = (0..self.n_cells())
            .map(|idx| self.cell_multi_index(idx)[0] * self.n_ranks / columns)
            .collect();
        CellOwnership::from_owners(owners, self.n_ranks)
    }

    /// Owner rank of every global vertex (smallest owner of adjacent cells).
    pub fn vertex_owners(&self) -> Result<Vec<usize>, PostError> {
        let ownership = self.ownership()?;
        let cell_vertices: Vec<_> = (0..self.n_cells()).map(|c| self.cell_vertices(c)).collect();
        ownership
            .vertex_owners(self.n_vertices(), &cell_vertices)
            .into_iter()
            .enumerate()
            .map(|(v, owner)| owner.ok_or_else(|| invalid_mesh(format!("vertex {v} has no cell"))))
            .collect()
    }

    /// Build the partition seen by `rank`.
    pub fn build(&self, rank: usize) -> Result<MeshPartition<D>, PostError> {
        let ownership = self.ownership()?;
        if rank >= self.n_ranks {
            return Err(invalid_mesh(format!(
                "rank {rank} out of range for {} ranks",
                self.n_ranks
            )));
        }
        let cell_vertices: Vec<_> = (0..self.n_cells()).map(|c| self.cell_vertices(c)).collect();
        let statuses = ownership.statuses_for_rank(rank, &cell_vertices);

        let mut labels = BoundaryLabels::new();
        let mut cells = Vec::with_capacity(self.n_cells());
        for (idx, (vertices, status)) in cell_vertices.into_iter().zip(statuses).enumerate() {
            let id = CellId::new(idx);
            let subdomain = ownership.owner(id).unwrap_or(rank);
            let neighbors = self.cell_neighbors(idx);
            for (face, neighbor) in neighbors.iter().enumerate() {
                if neighbor.is_none() {
                    labels.set(id, face, face as BoundaryId);
                }
            }
            cells.push(CellRecord {
                id,
                status,
                subdomain,
                vertices,
                neighbors,
            });
        }

        // axis 0 varies fastest, so iterate the product with the last axis outermost
        let positions: BTreeMap<VertexId, [f64; D]> = (0..D)
            .rev()
            .map(|axis| 0..=self.subdivisions[axis])
            .multi_cartesian_product()
            .map(|rev| {
                let mut multi = [0; D];
                for (axis, m) in rev.into_iter().rev().enumerate() {
                    multi[axis] = m;
                }
                (VertexId::new(self.vertex_index(&multi)), self.vertex_position(&multi))
            })
            .collect();

        log::debug!(
            "rank {rank}: built box mesh partition with {} cells ({} owned)",
            cells.len(),
            ownership.owned_cells(rank).count()
        );
        MeshPartition::try_new(rank, cells, positions, labels)
    }
}
