//! Distributed postprocessing passes over a phase-field fracture solution.
//!
//! Each pass follows the same shape: build a ghost-extended copy of the
//! solution, accumulate rank-local contributions over this rank's part of the
//! mesh, then combine them with one collective reduction per quantity. All
//! ranks issue the same collectives in the same order, including ranks whose
//! local phase fails; the error is returned after the collectives complete.
//!
//! - [`BoundaryLoadIntegrator`]: net traction on a tagged boundary.
//! - [`CrackOpeningProfileSampler`]: crack opening along transect lines.
//! - [`NearestVertexSampler`]: solution values at the nearest mesh vertex.
//! - [`Postprocessor`]: runs all three from a [`PostprocessConfig`].

pub mod boundary_load;
pub mod cod;
pub mod point_values;

pub use boundary_load::BoundaryLoadIntegrator;
pub use cod::{CodSettings, CrackOpeningProfileSampler, FaceVisitPolicy};
pub use point_values::NearestVertexSampler;

use serde::{Deserialize, Serialize};

use crate::algs::communicator::Communicator;
use crate::algs::reduction::{MinAccumulator, SumAccumulator};
use crate::config::PostprocessConfig;
use crate::data::dof::DofHandler;
use crate::data::vector::{DistributedVector, GhostedVector};
use crate::post_error::PostError;
use crate::topology::mesh::MeshView;
use crate::topology::point::BoundaryId;

/// Ghost-extended copy of `solution` over the non-artificial cells of `mesh`.
///
/// Collective. The ghost update runs even if the local index set cannot be
/// built, so the other ranks are never left waiting.
pub(crate) fn ghosted_solution<const D: usize, M, C>(
    mesh: &M,
    dofs: &DofHandler<D>,
    solution: &DistributedVector,
    comm: &C,
) -> Result<GhostedVector, PostError>
where
    M: MeshView<D>,
    C: Communicator + ?Sized,
{
    if solution.size() != dofs.n_dofs() {
        return Err(PostError::LengthMismatch {
            expected: dofs.n_dofs(),
            found: solution.size(),
        });
    }
    let relevant = dofs.relevant_dofs(mesh);
    let ghosted = solution.to_ghosted(relevant.as_deref().unwrap_or(&[]), comm);
    relevant?;
    ghosted
}

/// Sum-reduce a rank-local result that may have failed; a failed rank
/// contributes zeros.
pub(crate) fn reduce_sum<C: Communicator + ?Sized>(
    local: Result<SumAccumulator, PostError>,
    len: usize,
    comm: &C,
) -> Result<Vec<f64>, PostError> {
    match local {
        Ok(acc) => Ok(acc.reduce(comm)),
        Err(e) => {
            SumAccumulator::zeros(len).reduce(comm);
            Err(e)
        }
    }
}

/// Min-reduce a rank-local result that may have failed; a failed rank
/// contributes `+∞`.
pub(crate) fn reduce_min<C: Communicator + ?Sized>(
    local: Result<MinAccumulator, PostError>,
    len: usize,
    comm: &C,
) -> Result<Vec<f64>, PostError> {
    match local {
        Ok(acc) => Ok(acc.reduce(comm)),
        Err(e) => {
            MinAccumulator::infinite(len).reduce(comm);
            Err(e)
        }
    }
}

/// Results of one [`Postprocessor::run`], identical on every rank.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostprocessReport {
    /// `(boundary id, load vector)` in configuration order.
    pub boundary_loads: Vec<(BoundaryId, Vec<f64>)>,
    /// One value per configured transect line; empty without COD settings.
    pub crack_opening: Vec<f64>,
    /// One value per configured sample point.
    pub point_values: Vec<f64>,
}

/// Runs the passes named by a [`PostprocessConfig`] on one rank.
#[derive(Debug)]
pub struct Postprocessor<'c, C: Communicator + ?Sized> {
    comm: &'c C,
}

impl<'c, C: Communicator + ?Sized> Postprocessor<'c, C> {
    pub fn new(comm: &'c C) -> Self {
        Self { comm }
    }

    /// Collective: boundary loads in id order, then COD, then point values.
    pub fn run<const D: usize, M: MeshView<D>>(
        &self,
        config: &PostprocessConfig,
        mesh: &M,
        dofs: &DofHandler<D>,
        solution: &DistributedVector,
    ) -> Result<PostprocessReport, PostError> {
        config.validate(D, dofs.n_components())?;
        let points = config.sample_points_as::<D>()?;

        let loads = BoundaryLoadIntegrator::new(self.comm);
        let mut report = PostprocessReport::default();
        for &id in &config.load_boundary_ids {
            let load = loads.compute(mesh, dofs, solution, &config.elastic, id)?;
            report.boundary_loads.push((id, load.0.to_vec()));
        }
        if let Some(cod) = &config.cod {
            report.crack_opening =
                CrackOpeningProfileSampler::new(self.comm).compute(mesh, dofs, solution, cod)?;
        }
        if !points.is_empty() {
            report.point_values = NearestVertexSampler::new(self.comm).sample(
                mesh,
                dofs,
                solution,
                config.sample_component,
                &points,
            )?;
        }
        log::debug!(
            "rank {}: postprocessing pass done ({} loads, {} COD lines, {} points)",
            self.comm.rank(),
            report.boundary_loads.len(),
            report.crack_opening.len(),
            report.point_values.len()
        );
        Ok(report)
    }
}
