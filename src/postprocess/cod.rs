//! Crack opening displacement along transect lines.
//!
//! For a crack running along axis `direction`, the opening at a transect
//! `x_t = line` (with `t = (direction + 1) % dim`) is approximated by
//! integrating `0.5·(u·∇φ)` over the face quadrature points lying on the
//! transect. The gradient of the phase field only lives across the crack, so
//! the integral picks up the displacement jump.

use serde::{Deserialize, Serialize};

use crate::algs::communicator::Communicator;
use crate::algs::reduction::SumAccumulator;
use crate::data::dof::DofHandler;
use crate::data::vector::{DistributedVector, GhostedVector};
use crate::discretization::runtime::QuadratureRule;
use crate::physics::fe::{FieldEvaluator, FiniteElement, UpdateFlags, displacement, phase_field};
use crate::post_error::PostError;
use crate::postprocess::{ghosted_solution, reduce_sum};
use crate::topology::mesh::{FaceRef, MeshView};

/// Default half-width of the band around a transect line.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Gauss points per face direction.
pub const FACE_QUADRATURE_POINTS: usize = 3;

/// How often interior faces are integrated.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum FaceVisitPolicy {
    /// From both adjacent cells, each visit weighted 0.5.
    #[default]
    BothSides,
    /// Only from the adjacent cell with the smaller id.
    Once,
}

impl FaceVisitPolicy {
    fn visits<const D: usize, M: MeshView<D>>(self, mesh: &M, face: FaceRef) -> bool {
        match self {
            FaceVisitPolicy::BothSides => true,
            FaceVisitPolicy::Once => mesh
                .face_neighbor(face.cell, face.face)
                .is_none_or(|other| face.cell < other),
        }
    }
}

/// Parameters of one crack-opening evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodSettings {
    /// Axis along which the crack runs.
    pub direction: usize,
    /// Transect coordinates along the axis `(direction + 1) % dim`.
    pub lines: Vec<f64>,
    /// Points with `|x_t - line| < tolerance` lie on the transect.
    pub tolerance: f64,
    pub face_policy: FaceVisitPolicy,
}

impl Default for CodSettings {
    fn default() -> Self {
        Self {
            direction: 0,
            lines: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            face_policy: FaceVisitPolicy::default(),
        }
    }
}

impl CodSettings {
    pub fn new(direction: usize, lines: Vec<f64>) -> Self {
        Self {
            direction,
            lines,
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_face_policy(mut self, face_policy: FaceVisitPolicy) -> Self {
        self.face_policy = face_policy;
        self
    }

    /// Axis the transect coordinates are measured along.
    pub fn transect_axis(&self, dim: usize) -> usize {
        (self.direction + 1) % dim
    }

    pub fn validate(&self, dim: usize) -> Result<(), PostError> {
        if self.direction >= dim {
            return Err(PostError::InvalidDirection {
                direction: self.direction,
                dim,
            });
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(PostError::InvalidConfig(format!(
                "COD tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if let Some(bad) = self.lines.iter().find(|l| !l.is_finite()) {
            return Err(PostError::InvalidConfig(format!("COD line {bad} is not finite")));
        }
        Ok(())
    }
}

/// Samples the crack opening displacement on a set of transect lines.
#[derive(Debug)]
pub struct CrackOpeningProfileSampler<'c, C: Communicator + ?Sized> {
    comm: &'c C,
}

impl<'c, C: Communicator + ?Sized> CrackOpeningProfileSampler<'c, C> {
    pub fn new(comm: &'c C) -> Self {
        Self { comm }
    }

    /// One opening value per line of `settings`, identical on every rank.
    ///
    /// Collective. Invalid settings are rejected before any collective call.
    pub fn compute<const D: usize, M: MeshView<D>>(
        &self,
        mesh: &M,
        dofs: &DofHandler<D>,
        solution: &DistributedVector,
        settings: &CodSettings,
    ) -> Result<Vec<f64>, PostError> {
        settings.validate(D)?;
        let n_lines = settings.lines.len();
        let local = ghosted_solution(mesh, dofs, solution, self.comm)
            .and_then(|ghosted| local_cod(mesh, dofs, &ghosted, settings));
        if let Ok(acc) = &local {
            log::debug!("rank {}: partial COD {:?}", self.comm.rank(), acc.partial());
        }
        reduce_sum(local, n_lines, self.comm)
    }
}

fn local_cod<const D: usize, M: MeshView<D>>(
    mesh: &M,
    dofs: &DofHandler<D>,
    ghosted: &GhostedVector,
    settings: &CodSettings,
) -> Result<SumAccumulator, PostError> {
    let fe = FiniteElement::<D>::q1_system(dofs.n_components());
    let quadrature = QuadratureRule::gauss(FACE_QUADRATURE_POINTS, D.saturating_sub(1))?;
    let mut fv = FieldEvaluator::for_faces(&fe, quadrature, UpdateFlags::GRADIENTS)?;
    let (u, phi) = (displacement(), phase_field::<D>());
    let axis = settings.transect_axis(D);

    let mut acc = SumAccumulator::zeros(settings.lines.len());
    let policy = settings.face_policy;
    for face in mesh.faces_where(|f| policy.visits::<D, M>(mesh, f)) {
        fv.reinit_face(mesh, dofs, face.cell, face.face)?;
        let values = fv.function_values(&u, ghosted)?;
        let grads = fv.function_gradients(&phi, ghosted)?;
        for q in 0..fv.n_quadrature_points() {
            let x = fv.quadrature_point(q)[axis];
            for (k, &line) in settings.lines.iter().enumerate() {
                if (x - line).abs() < settings.tolerance {
                    let contribution = 0.5 * values[q].dot(&grads[q]) * fv.jxw(q);
                    log::trace!(
                        "cell {} face {}: point {:?} on line {line} adds {contribution}",
                        face.cell,
                        face.face,
                        fv.quadrature_point(q).0
                    );
                    acc.add(k, contribution);
                }
            }
        }
    }
    Ok(acc)
}
