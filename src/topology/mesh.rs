//! Mesh partitions and the iteration contract the postprocessing passes use.
//!
//! Cells are `D`-dimensional hypercubes with `2^D` vertices in lexicographic
//! order (bit `a` of the local vertex index selects the upper end along axis
//! `a`) and `2·D` faces (`face = 2·axis + side`, side 0 at the lower end).
//!
//! The postprocessing algorithms never walk cell or face ranges directly.
//! They go through [`MeshView::locally_owned_cells`],
//! [`MeshView::non_artificial_cells`] and [`MeshView::faces_where`], which
//! return fresh, finite iterators on each call.

use std::collections::{BTreeMap, HashMap};

use crate::post_error::PostError;
use crate::topology::labels::{BoundaryLabels, FaceIndex};
use crate::topology::ownership::CellStatus;
use crate::topology::point::{BoundaryId, CellId, VertexId};

/// Number of vertices of a `dim`-dimensional hypercube cell.
#[inline]
pub const fn vertices_per_cell(dim: usize) -> usize {
    1 << dim
}

/// Number of faces of a `dim`-dimensional hypercube cell.
#[inline]
pub const fn faces_per_cell(dim: usize) -> usize {
    2 * dim
}

/// A face addressed through one of its adjacent cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FaceRef {
    pub cell: CellId,
    pub face: FaceIndex,
}

impl FaceRef {
    /// Axis the face is normal to.
    #[inline]
    pub fn axis(&self) -> usize {
        self.face / 2
    }

    /// 0 for the lower face along [`axis`](Self::axis), 1 for the upper one.
    #[inline]
    pub fn side(&self) -> usize {
        self.face % 2
    }
}

/// Read-only view of the part of a distributed mesh known to one rank.
pub trait MeshView<const D: usize> {
    /// Rank this partition belongs to.
    fn rank(&self) -> usize;

    /// Every cell known to this rank (owned, ghost and artificial), ascending.
    fn cells(&self) -> impl Iterator<Item = CellId> + '_;

    /// Status of `cell` on this rank. Unknown cells are artificial.
    fn cell_status(&self, cell: CellId) -> CellStatus;

    /// Owning rank of a non-artificial cell.
    fn subdomain_id(&self, cell: CellId) -> Option<usize>;

    /// Global vertex ids of `cell`. Empty for unknown cells.
    fn cell_vertices(&self, cell: CellId) -> &[VertexId];

    /// Physical position of a vertex.
    fn vertex_position(&self, vertex: VertexId) -> Option<[f64; D]>;

    /// Cell on the other side of `face`, or `None` on the domain boundary.
    fn face_neighbor(&self, cell: CellId, face: FaceIndex) -> Option<CellId>;

    /// Boundary indicator of a domain-boundary face.
    fn boundary_id(&self, cell: CellId, face: FaceIndex) -> Option<BoundaryId>;

    #[inline]
    fn is_locally_owned(&self, cell: CellId) -> bool {
        self.cell_status(cell).is_locally_owned()
    }

    #[inline]
    fn is_artificial(&self, cell: CellId) -> bool {
        self.cell_status(cell).is_artificial()
    }

    #[inline]
    fn face_at_boundary(&self, cell: CellId, face: FaceIndex) -> bool {
        self.face_neighbor(cell, face).is_none()
    }

    /// Cells owned by this rank.
    fn locally_owned_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells().filter(move |&c| self.is_locally_owned(c))
    }

    /// Owned and ghost cells, i.e. every cell with field data on this rank.
    fn non_artificial_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells().filter(move |&c| !self.is_artificial(c))
    }

    /// Faces of locally owned cells for which `pred` holds.
    fn faces_where<'a, P>(&'a self, mut pred: P) -> impl Iterator<Item = FaceRef> + 'a
    where
        P: FnMut(FaceRef) -> bool + 'a,
    {
        self.locally_owned_cells()
            .flat_map(|cell| (0..faces_per_cell(D)).map(move |face| FaceRef { cell, face }))
            .filter(move |f| pred(*f))
    }

    /// Vertex positions of `cell` in local vertex order.
    fn cell_vertex_positions(&self, cell: CellId) -> Result<Vec<[f64; D]>, PostError> {
        let vertices = self.cell_vertices(cell);
        if vertices.len() != vertices_per_cell(D) {
            return Err(PostError::InvalidMesh(format!(
                "cell {cell} has {} vertices, expected {}",
                vertices.len(),
                vertices_per_cell(D)
            )));
        }
        vertices
            .iter()
            .map(|&v| {
                self.vertex_position(v)
                    .ok_or_else(|| PostError::InvalidMesh(format!("missing position for vertex {v}")))
            })
            .collect()
    }
}

/// Topology of one cell as seen from a partition.
#[derive(Clone, Debug, PartialEq)]
pub struct CellRecord {
    pub id: CellId,
    pub status: CellStatus,
    /// Owning rank; only meaningful for owned and ghost cells.
    pub subdomain: usize,
    /// `2^D` global vertex ids, lexicographic.
    pub vertices: Vec<VertexId>,
    /// `2·D` face neighbours, `None` on the domain boundary.
    pub neighbors: Vec<Option<CellId>>,
}

/// In-memory partition of a hypercube mesh.
#[derive(Clone, Debug)]
pub struct MeshPartition<const D: usize> {
    rank: usize,
    cells: Vec<CellRecord>,
    lookup: HashMap<CellId, usize>,
    positions: BTreeMap<VertexId, [f64; D]>,
    labels: BoundaryLabels,
}

impl<const D: usize> MeshPartition<D> {
    /// Assemble a partition, validating cell arity and vertex positions.
    pub fn try_new(
        rank: usize,
        mut cells: Vec<CellRecord>,
        positions: BTreeMap<VertexId, [f64; D]>,
        labels: BoundaryLabels,
    ) -> Result<Self, PostError> {
        cells.sort_by_key(|c| c.id);
        let mut lookup = HashMap::with_capacity(cells.len());
        for (idx, cell) in cells.iter().enumerate() {
            if cell.vertices.len() != vertices_per_cell(D) {
                return Err(PostError::InvalidMesh(format!(
                    "cell {} has {} vertices, expected {}",
                    cell.id,
                    cell.vertices.len(),
                    vertices_per_cell(D)
                )));
            }
            if cell.neighbors.len() != faces_per_cell(D) {
                return Err(PostError::InvalidMesh(format!(
                    "cell {} has {} face neighbours, expected {}",
                    cell.id,
                    cell.neighbors.len(),
                    faces_per_cell(D)
                )));
            }
            if let Some(v) = cell.vertices.iter().find(|v| !positions.contains_key(v)) {
                return Err(PostError::InvalidMesh(format!(
                    "cell {} references vertex {v} without a position",
                    cell.id
                )));
            }
            if lookup.insert(cell.id, idx).is_some() {
                return Err(PostError::InvalidMesh(format!("duplicate cell {}", cell.id)));
            }
        }
        Ok(Self {
            rank,
            cells,
            lookup,
            positions,
            labels,
        })
    }

    fn record(&self, cell: CellId) -> Option<&CellRecord> {
        self.lookup.get(&cell).map(|&idx| &self.cells[idx])
    }

    /// Number of cells known to this rank.
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of locally owned cells.
    pub fn n_locally_owned_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.status.is_locally_owned())
            .count()
    }

    /// Vertices known to this rank with their positions, ascending by id.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, [f64; D])> + '_ {
        self.positions.iter().map(|(&v, &x)| (v, x))
    }

    /// Boundary indicators of this partition.
    pub fn labels(&self) -> &BoundaryLabels {
        &self.labels
    }
}

impl<const D: usize> MeshView<D> for MeshPartition<D> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().map(|c| c.id)
    }

    fn cell_status(&self, cell: CellId) -> CellStatus {
        self.record(cell)
            .map_or(CellStatus::Artificial, |c| c.status)
    }

    fn cell_vertices(&self, cell: CellId) -> &[VertexId] {
        self.record(cell)
            .map(|c| c.vertices.as_slice())
            .unwrap_or(&[])
    }

    fn subdomain_id(&self, cell: CellId) -> Option<usize> {
        self.record(cell)
            .filter(|c| !c.status.is_artificial())
            .map(|c| c.subdomain)
    }

    fn vertex_position(&self, vertex: VertexId) -> Option<[f64; D]> {
        self.positions.get(&vertex).copied()
    }

    fn face_neighbor(&self, cell: CellId, face: FaceIndex) -> Option<CellId> {
        self.record(cell)
            .and_then(|c| c.neighbors.get(face).copied().flatten())
    }

    fn boundary_id(&self, cell: CellId, face: FaceIndex) -> Option<BoundaryId> {
        if self.face_at_boundary(cell, face) {
            self.labels.get(cell, face)
        } else {
            None
        }
    }
}
