//! Degree-of-freedom numbering for vertex-based multi-component fields.
//!
//! Every vertex carries one DoF per component. Global indices are a pure
//! function of `(vertex, component)`, so all ranks agree on them without
//! communication.

use std::collections::{BTreeMap, BTreeSet};

use crate::post_error::PostError;
use crate::topology::mesh::MeshView;
use crate::topology::point::{CellId, VertexId};

/// Ordering of global DoF indices.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DofLayout {
    /// All vertices of component 0, then component 1, ... (block vector layout).
    #[default]
    Blocked,
    /// All components of vertex 0, then vertex 1, ...
    Interleaved,
}

/// Maps `(vertex, component)` to global DoF indices.
#[derive(Clone, Debug)]
pub struct DofHandler<const D: usize> {
    n_vertices: usize,
    n_components: usize,
    layout: DofLayout,
}

impl<const D: usize> DofHandler<D> {
    /// `n_vertices` is the global vertex count.
    pub fn new(n_vertices: usize, n_components: usize, layout: DofLayout) -> Self {
        Self {
            n_vertices,
            n_components,
            layout,
        }
    }

    /// Displacement (`D` components) followed by the phase field.
    pub fn phase_field(n_vertices: usize, layout: DofLayout) -> Self {
        Self::new(n_vertices, D + 1, layout)
    }

    /// Global number of DoFs.
    pub fn n_dofs(&self) -> usize {
        self.n_vertices * self.n_components
    }

    /// Components per vertex.
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Index ordering.
    pub fn layout(&self) -> DofLayout {
        self.layout
    }

    /// Global index of `component` at `vertex`.
    pub fn vertex_dof_index(&self, vertex: VertexId, component: usize) -> Result<usize, PostError> {
        if component >= self.n_components {
            return Err(PostError::InvalidComponent {
                component,
                n_components: self.n_components,
            });
        }
        let v = vertex.get();
        if v >= self.n_vertices {
            return Err(PostError::InvalidMesh(format!(
                "vertex {vertex} out of range for {} vertices",
                self.n_vertices
            )));
        }
        Ok(match self.layout {
            DofLayout::Blocked => component * self.n_vertices + v,
            DofLayout::Interleaved => v * self.n_components + component,
        })
    }

    /// DoFs of `cell`, ordered `[vertex][component]`.
    pub fn cell_dof_indices<M: MeshView<D>>(&self, mesh: &M, cell: CellId) -> Result<Vec<usize>, PostError> {
        let vertices = mesh.cell_vertices(cell);
        let mut out = Vec::with_capacity(vertices.len() * self.n_components);
        for &v in vertices {
            for c in 0..self.n_components {
                out.push(self.vertex_dof_index(v, c)?);
            }
        }
        Ok(out)
    }

    /// Sorted DoFs of all owned and ghost cells: the ghost-extended index set.
    pub fn relevant_dofs<M: MeshView<D>>(&self, mesh: &M) -> Result<Vec<usize>, PostError> {
        let mut set = BTreeSet::new();
        for cell in mesh.non_artificial_cells() {
            set.extend(self.cell_dof_indices(mesh, cell)?);
        }
        Ok(set.into_iter().collect())
    }

    /// Vertices owned by this rank: those whose smallest adjacent cell owner
    /// is the rank itself.
    pub fn locally_owned_vertices<M: MeshView<D>>(&self, mesh: &M) -> Vec<VertexId> {
        let mut min_owner: BTreeMap<VertexId, usize> = BTreeMap::new();
        for cell in mesh.non_artificial_cells() {
            let Some(owner) = mesh.subdomain_id(cell) else {
                continue;
            };
            for &v in mesh.cell_vertices(cell) {
                min_owner
                    .entry(v)
                    .and_modify(|o| *o = (*o).min(owner))
                    .or_insert(owner);
            }
        }
        let rank = mesh.rank();
        min_owner
            .into_iter()
            .filter_map(|(v, owner)| (owner == rank).then_some(v))
            .collect()
    }

    /// Sorted DoFs owned by this rank.
    pub fn locally_owned_dofs<M: MeshView<D>>(&self, mesh: &M) -> Result<Vec<usize>, PostError> {
        let mut out = Vec::new();
        for v in self.locally_owned_vertices(mesh) {
            for c in 0..self.n_components {
                out.push(self.vertex_dof_index(v, c)?);
            }
        }
        out.sort_unstable();
        Ok(out)
    }
}
