//! Net traction integrated over a tagged part of the domain boundary.

use crate::algs::communicator::Communicator;
use crate::algs::reduction::SumAccumulator;
use crate::data::dof::DofHandler;
use crate::data::vector::{DistributedVector, GhostedVector};
use crate::discretization::runtime::QuadratureRule;
use crate::geometry::tensor::Tensor1;
use crate::physics::elasticity::ElasticParameters;
use crate::physics::fe::{FieldEvaluator, FiniteElement, UpdateFlags, displacement};
use crate::post_error::PostError;
use crate::postprocess::{ghosted_solution, reduce_sum};
use crate::topology::mesh::{FaceRef, MeshView};
use crate::topology::point::BoundaryId;

/// Integrates `σ(u)·n` over all domain-boundary faces carrying one id.
#[derive(Debug)]
pub struct BoundaryLoadIntegrator<'c, C: Communicator + ?Sized> {
    comm: &'c C,
}

impl<'c, C: Communicator + ?Sized> BoundaryLoadIntegrator<'c, C> {
    pub fn new(comm: &'c C) -> Self {
        Self { comm }
    }

    /// Global load vector on faces tagged `boundary_id`.
    ///
    /// Collective. An id that tags no face on this rank contributes zero; an
    /// id that tags no face anywhere yields the zero vector and a warning.
    pub fn compute<const D: usize, M: MeshView<D>>(
        &self,
        mesh: &M,
        dofs: &DofHandler<D>,
        solution: &DistributedVector,
        elastic: &ElasticParameters,
        boundary_id: BoundaryId,
    ) -> Result<Tensor1<D>, PostError> {
        elastic.validate()?;
        // slots 0..D hold the load, slot D the number of integrated faces
        let len = D + 1;
        let local = ghosted_solution(mesh, dofs, solution, self.comm)
            .and_then(|ghosted| local_load(mesh, dofs, &ghosted, elastic, boundary_id));
        if let Ok(acc) = &local {
            log::debug!(
                "rank {}: partial load on boundary {boundary_id}: {:?}",
                self.comm.rank(),
                &acc.partial()[..D]
            );
        }
        let global = reduce_sum(local, len, self.comm)?;
        if global[D] == 0.0 {
            log::warn!("boundary id {boundary_id} tags no face on any rank");
        }
        let mut load = Tensor1::zero();
        load.0.copy_from_slice(&global[..D]);
        Ok(load)
    }
}

fn local_load<const D: usize, M: MeshView<D>>(
    mesh: &M,
    dofs: &DofHandler<D>,
    ghosted: &GhostedVector,
    elastic: &ElasticParameters,
    boundary_id: BoundaryId,
) -> Result<SumAccumulator, PostError> {
    let fe = FiniteElement::<D>::q1_system(dofs.n_components());
    let quadrature = QuadratureRule::gauss(fe.degree() + 1, D.saturating_sub(1))?;
    let mut fv = FieldEvaluator::for_faces(&fe, quadrature, UpdateFlags::GRADIENTS_AND_NORMALS)?;
    let u = displacement();

    let mut acc = SumAccumulator::zeros(D + 1);
    let tagged = |f: FaceRef| {
        mesh.face_at_boundary(f.cell, f.face) && mesh.boundary_id(f.cell, f.face) == Some(boundary_id)
    };
    for face in mesh.faces_where(tagged) {
        fv.reinit_face(mesh, dofs, face.cell, face.face)?;
        let strains = fv.function_symmetric_gradients(&u, ghosted)?;
        for (q, strain) in strains.iter().enumerate() {
            let traction = elastic.stress(strain).dot(&fv.normal_vector(q));
            let jxw = fv.jxw(q);
            for d in 0..D {
                acc.add(d, traction[d] * jxw);
            }
        }
        acc.add(D, 1.0);
    }
    Ok(acc)
}
