//! Solution values at the mesh vertex nearest to each query point.
//!
//! Three collective phases, each a min-reduction:
//!
//! 1. the per-point nearest distance;
//! 2. the global id of the chosen vertex, nominated only by ranks whose local
//!    nearest distance equals the global one;
//! 3. the value, contributed only by ranks bound to the chosen vertex.
//!
//! Among equidistant vertices the one with the smallest [`VertexId`] wins, on
//! every rank and in every phase, so the result does not depend on how cells
//! are distributed.

use crate::algs::communicator::Communicator;
use crate::algs::reduction::MinAccumulator;
use crate::data::dof::DofHandler;
use crate::data::vector::{DistributedVector, GhostedVector, SolutionRead};
use crate::geometry::tensor::Tensor1;
use crate::post_error::PostError;
use crate::postprocess::{ghosted_solution, reduce_min};
use crate::topology::mesh::MeshView;
use crate::topology::point::VertexId;

/// Locally nearest vertex of every query point.
struct NearestBindings {
    distances: MinAccumulator,
    vertices: Vec<Option<VertexId>>,
}

/// Samples one solution component at the nearest vertex of each query point.
#[derive(Debug)]
pub struct NearestVertexSampler<'c, C: Communicator + ?Sized> {
    comm: &'c C,
}

impl<'c, C: Communicator + ?Sized> NearestVertexSampler<'c, C> {
    pub fn new(comm: &'c C) -> Self {
        Self { comm }
    }

    /// One value per point, identical on every rank.
    ///
    /// Collective. Ties in distance go to the vertex with the smallest global
    /// id. A point for which no rank has any vertex yields
    /// [`PostError::NoVertexFound`] on every rank.
    pub fn sample<const D: usize, M: MeshView<D>>(
        &self,
        mesh: &M,
        dofs: &DofHandler<D>,
        solution: &DistributedVector,
        component: usize,
        points: &[[f64; D]],
    ) -> Result<Vec<f64>, PostError> {
        if component >= dofs.n_components() {
            return Err(PostError::InvalidComponent {
                component,
                n_components: dofs.n_components(),
            });
        }
        let n = points.len();
        let ghosted = ghosted_solution(mesh, dofs, solution, self.comm);
        let bindings = ghosted
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|_| nearest_bindings(mesh, points));

        let (local_distances, bound) = match bindings {
            Ok(b) => (Ok(b.distances), b.vertices),
            Err(e) => (Err(e), Vec::new()),
        };
        let partial: Vec<f64> = local_distances
            .as_ref()
            .map(|d| d.partial().to_vec())
            .unwrap_or_default();
        log::debug!("rank {}: nearest vertex distances {partial:?}", self.comm.rank());
        let global_distances = reduce_min(local_distances, n, self.comm);

        let nominations = global_distances
            .as_ref()
            .map_err(Clone::clone)
            .map(|global| nominate(&partial, global, &bound));
        let chosen = reduce_min(nominations, n, self.comm);

        let values = match (&ghosted, &chosen) {
            (Ok(g), Ok(chosen)) => read_chosen(g, dofs, component, chosen, &bound),
            (Err(e), _) | (_, Err(e)) => Err(e.clone()),
        };
        let values = reduce_min(values, n, self.comm)?;
        let global_distances = global_distances?;

        if let Some(i) = global_distances.iter().position(|d| d.is_infinite()) {
            return Err(PostError::NoVertexFound {
                point: points[i].to_vec(),
            });
        }
        Ok(values)
    }
}

fn nearest_bindings<const D: usize, M: MeshView<D>>(
    mesh: &M,
    points: &[[f64; D]],
) -> Result<NearestBindings, PostError> {
    let queries: Vec<Tensor1<D>> = points.iter().copied().map(Tensor1::from).collect();
    let mut distances = MinAccumulator::infinite(points.len());
    let mut bound: Vec<Option<VertexId>> = vec![None; points.len()];
    for cell in mesh.non_artificial_cells() {
        for (&vertex, position) in mesh
            .cell_vertices(cell)
            .iter()
            .zip(mesh.cell_vertex_positions(cell)?)
        {
            let position = Tensor1::from(position);
            for (i, query) in queries.iter().enumerate() {
                let d = position.distance(query);
                let lowered = distances.offer(i, d);
                let tie = d == distances.partial()[i] && bound[i].is_some_and(|b| vertex < b);
                if lowered || tie {
                    bound[i] = Some(vertex);
                }
            }
        }
    }
    Ok(NearestBindings {
        distances,
        vertices: bound,
    })
}

/// Bound vertex ids of points whose local distance is the global one, `+∞`
/// elsewhere. Ids are exact in `f64` below 2^53.
fn nominate(local: &[f64], global: &[f64], bound: &[Option<VertexId>]) -> MinAccumulator {
    let mut ids = MinAccumulator::infinite(global.len());
    for (i, (&mine, &best)) in local.iter().zip(global).enumerate() {
        if let Some(vertex) = bound[i].filter(|_| mine.is_finite() && mine == best) {
            ids.set(i, vertex.get() as f64);
        }
    }
    ids
}

/// Values on ranks bound to the chosen vertex, `+∞` elsewhere.
fn read_chosen<const D: usize>(
    ghosted: &GhostedVector,
    dofs: &DofHandler<D>,
    component: usize,
    chosen: &[f64],
    bound: &[Option<VertexId>],
) -> Result<MinAccumulator, PostError> {
    let mut values = MinAccumulator::infinite(chosen.len());
    for (i, (&id, vertex)) in chosen.iter().zip(bound).enumerate() {
        if let Some(vertex) = vertex.filter(|v| id.is_finite() && v.get() as f64 == id) {
            values.set(i, ghosted.read(dofs.vertex_dof_index(vertex, component)?)?);
        }
    }
    Ok(values)
}
