//! Finite-element field evaluation on cells and faces.
//!
//! [`FieldEvaluator`] maps a reference quadrature rule onto one physical cell
//! (or one face of it) and evaluates solution fields at the mapped points.
//! Which field is read is decided by a [`FieldExtractor`]: [`ScalarField`]
//! yields `f64` values and [`Tensor1`] gradients, [`VectorField`] yields
//! [`Tensor1`] values and [`Tensor2`] gradients.

use std::ops::Range;

use crate::data::dof::DofHandler;
use crate::data::vector::SolutionRead;
use crate::discretization::runtime::{
    BasisTabulation, QuadratureRule, build_jacobian, invert_jacobian, lift_face_points, tabulate_q1,
};
use crate::geometry::tensor::{Tensor1, Tensor2};
use crate::post_error::PostError;
use crate::topology::labels::FaceIndex;
use crate::topology::mesh::{MeshView, faces_per_cell, vertices_per_cell};
use crate::topology::point::CellId;

/// Vertex-based multilinear element system with `n_components` components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiniteElement<const D: usize> {
    degree: usize,
    n_components: usize,
}

impl<const D: usize> FiniteElement<D> {
    /// `n_components` copies of the Q1 element.
    pub fn q1_system(n_components: usize) -> Self {
        Self {
            degree: 1,
            n_components,
        }
    }

    /// Displacement (`D` components) followed by the phase field.
    pub fn phase_field() -> Self {
        Self::q1_system(D + 1)
    }

    /// Polynomial degree of the basis.
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }
}

/// Which quantities [`FieldEvaluator`] computes on reinit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UpdateFlags {
    /// Physical shape-function gradients.
    pub gradients: bool,
    /// Outward unit normals (faces only).
    pub normals: bool,
}

impl UpdateFlags {
    pub const VALUES: UpdateFlags = UpdateFlags {
        gradients: false,
        normals: false,
    };
    pub const GRADIENTS: UpdateFlags = UpdateFlags {
        gradients: true,
        normals: false,
    };
    pub const GRADIENTS_AND_NORMALS: UpdateFlags = UpdateFlags {
        gradients: true,
        normals: true,
    };
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Domain {
    Cell,
    Face,
}

/// Quadrature-point data of the current cell or face.
#[derive(Clone, Debug)]
pub struct FieldEvaluator<'a, const D: usize> {
    fe: &'a FiniteElement<D>,
    domain: Domain,
    flags: UpdateFlags,
    weights: Vec<f64>,
    /// One tabulation for cells, one per face for faces.
    tabulations: Vec<BasisTabulation>,
    dof_indices: Vec<usize>,
    quadrature_points: Vec<Tensor1<D>>,
    jxw: Vec<f64>,
    normals: Vec<Tensor1<D>>,
    shape_gradients: Vec<Vec<Tensor1<D>>>,
    current: Option<(CellId, Option<FaceIndex>)>,
}

impl<'a, const D: usize> FieldEvaluator<'a, D> {
    fn with_tabulations(
        fe: &'a FiniteElement<D>,
        domain: Domain,
        quadrature: QuadratureRule,
        tabulations: Vec<BasisTabulation>,
        flags: UpdateFlags,
    ) -> Self {
        Self {
            fe,
            domain,
            flags,
            weights: quadrature.weights,
            tabulations,
            dof_indices: Vec::new(),
            quadrature_points: Vec::new(),
            jxw: Vec::new(),
            normals: Vec::new(),
            shape_gradients: Vec::new(),
            current: None,
        }
    }

    /// Evaluator over cell interiors with a `D`-dimensional quadrature.
    pub fn for_cells(
        fe: &'a FiniteElement<D>,
        quadrature: QuadratureRule,
        flags: UpdateFlags,
    ) -> Result<Self, PostError> {
        if quadrature.dimension() != D {
            return Err(PostError::InvalidGeometry(format!(
                "cell quadrature has dimension {}, expected {D}",
                quadrature.dimension()
            )));
        }
        let tab = tabulate_q1(D, &quadrature.points)?;
        Ok(Self::with_tabulations(fe, Domain::Cell, quadrature, vec![tab], flags))
    }

    /// Evaluator over cell faces with a `(D-1)`-dimensional quadrature.
    pub fn for_faces(
        fe: &'a FiniteElement<D>,
        quadrature: QuadratureRule,
        flags: UpdateFlags,
    ) -> Result<Self, PostError> {
        let face_dim = D.saturating_sub(1);
        if quadrature.dimension() != face_dim {
            return Err(PostError::InvalidGeometry(format!(
                "face quadrature has dimension {}, expected {face_dim}",
                quadrature.dimension()
            )));
        }
        let tabulations = (0..faces_per_cell(D))
            .map(|face| tabulate_q1(D, &lift_face_points(D, face, &quadrature.points)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_tabulations(fe, Domain::Face, quadrature, tabulations, flags))
    }

    /// Prepare evaluation on the interior of `cell`.
    pub fn reinit_cell<M: MeshView<D>>(
        &mut self,
        mesh: &M,
        dofs: &DofHandler<D>,
        cell: CellId,
    ) -> Result<(), PostError> {
        if self.domain != Domain::Cell {
            return Err(PostError::InvalidGeometry(
                "face evaluator reinitialised on a cell".to_string(),
            ));
        }
        self.reinit(mesh, dofs, cell, None)
    }

    /// Prepare evaluation on face `face` of `cell`.
    pub fn reinit_face<M: MeshView<D>>(
        &mut self,
        mesh: &M,
        dofs: &DofHandler<D>,
        cell: CellId,
        face: FaceIndex,
    ) -> Result<(), PostError> {
        if self.domain != Domain::Face {
            return Err(PostError::InvalidGeometry(
                "cell evaluator reinitialised on a face".to_string(),
            ));
        }
        if face >= faces_per_cell(D) {
            return Err(PostError::InvalidGeometry(format!(
                "face {face} out of range for a {D}-dimensional cell"
            )));
        }
        self.reinit(mesh, dofs, cell, Some(face))
    }

    fn reinit<M: MeshView<D>>(
        &mut self,
        mesh: &M,
        dofs: &DofHandler<D>,
        cell: CellId,
        face: Option<FaceIndex>,
    ) -> Result<(), PostError> {
        if dofs.n_components() != self.fe.n_components() {
            return Err(PostError::LengthMismatch {
                expected: self.fe.n_components(),
                found: dofs.n_components(),
            });
        }
        let nodes: Vec<Vec<f64>> = mesh
            .cell_vertex_positions(cell)?
            .into_iter()
            .map(|x| x.to_vec())
            .collect();
        self.dof_indices = dofs.cell_dof_indices(mesh, cell)?;
        let tab = &self.tabulations[face.unwrap_or(0)];

        let n_q = self.weights.len();
        self.quadrature_points.clear();
        self.jxw.clear();
        self.normals.clear();
        self.shape_gradients.clear();

        for q in 0..n_q {
            let jac = build_jacobian(D, &nodes, &tab.gradients[q]);
            let (det, inv) = invert_jacobian(D, &jac)?;

            let mut x = Tensor1::<D>::zero();
            for (node, value) in nodes.iter().zip(&tab.values[q]) {
                for d in 0..D {
                    x[d] += value * node[d];
                }
            }
            self.quadrature_points.push(x);

            if self.flags.gradients {
                let grads = tab.gradients[q]
                    .iter()
                    .map(|ref_grad| {
                        let mut g = Tensor1::<D>::zero();
                        for phys in 0..D {
                            g[phys] = (0..D).map(|r| inv[r * D + phys] * ref_grad[r]).sum();
                        }
                        g
                    })
                    .collect();
                self.shape_gradients.push(grads);
            }

            match face {
                None => self.jxw.push(self.weights[q] * det.abs()),
                Some(f) => {
                    // Nanson: n da = det(J) J^{-T} N dA
                    let (axis, sign) = (f / 2, if f % 2 == 0 { -1.0 } else { 1.0 });
                    let mut n = Tensor1::<D>::zero();
                    for d in 0..D {
                        n[d] = sign * inv[axis * D + d];
                    }
                    let scale = n.norm();
                    self.jxw.push(self.weights[q] * det.abs() * scale);
                    if self.flags.normals {
                        // det < 0 would flip orientation; hypercube maps keep det > 0
                        self.normals.push(n * (1.0 / scale));
                    }
                }
            }
        }
        self.current = Some((cell, face));
        Ok(())
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.weights.len()
    }

    pub fn n_components(&self) -> usize {
        self.fe.n_components()
    }

    pub fn quadrature_point(&self, q: usize) -> Tensor1<D> {
        self.quadrature_points[q]
    }

    /// Integration weight times the cell volume / face area element.
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    /// Outward unit normal; requires [`UpdateFlags::normals`].
    pub fn normal_vector(&self, q: usize) -> Tensor1<D> {
        self.normals[q]
    }

    /// Value of the shape function of local vertex `v` at point `q`.
    pub fn shape_value(&self, q: usize, v: usize) -> f64 {
        self.tabulations[self.current_face_slot()].values[q][v]
    }

    /// Physical gradient of the shape function of local vertex `v`;
    /// requires [`UpdateFlags::gradients`].
    pub fn shape_grad(&self, q: usize, v: usize) -> Tensor1<D> {
        self.shape_gradients[q][v]
    }

    fn current_face_slot(&self) -> usize {
        self.current.and_then(|(_, f)| f).unwrap_or(0)
    }

    fn local_coefficients<S: SolutionRead + ?Sized>(&self, solution: &S) -> Result<Vec<f64>, PostError> {
        self.dof_indices.iter().map(|&i| solution.read(i)).collect()
    }

    fn check<E: FieldExtractor<D>>(&self, extractor: &E, gradients: bool) -> Result<(), PostError> {
        if self.current.is_none() {
            return Err(PostError::InvalidGeometry(
                "field evaluator used before reinit".to_string(),
            ));
        }
        let range = extractor.components();
        if range.end > self.n_components() {
            return Err(PostError::InvalidComponent {
                component: range.end - 1,
                n_components: self.n_components(),
            });
        }
        if gradients && !self.flags.gradients {
            return Err(PostError::InvalidGeometry(
                "gradients requested without UpdateFlags::gradients".to_string(),
            ));
        }
        Ok(())
    }

    /// Field values at every quadrature point.
    pub fn function_values<E, S>(&self, extractor: &E, solution: &S) -> Result<Vec<E::Value>, PostError>
    where
        E: FieldExtractor<D>,
        S: SolutionRead + ?Sized,
    {
        self.check(extractor, false)?;
        let local = self.local_coefficients(solution)?;
        Ok((0..self.n_quadrature_points())
            .map(|q| extractor.value(self, q, &local))
            .collect())
    }

    /// Field gradients at every quadrature point.
    pub fn function_gradients<E, S>(
        &self,
        extractor: &E,
        solution: &S,
    ) -> Result<Vec<E::Gradient>, PostError>
    where
        E: FieldExtractor<D>,
        S: SolutionRead + ?Sized,
    {
        self.check(extractor, true)?;
        let local = self.local_coefficients(solution)?;
        Ok((0..self.n_quadrature_points())
            .map(|q| extractor.gradient(self, q, &local))
            .collect())
    }

    /// Symmetric gradients `(∇u + ∇uᵀ)/2` of a vector field.
    pub fn function_symmetric_gradients<S>(
        &self,
        extractor: &VectorField,
        solution: &S,
    ) -> Result<Vec<Tensor2<D>>, PostError>
    where
        S: SolutionRead + ?Sized,
    {
        Ok(self
            .function_gradients(extractor, solution)?
            .iter()
            .map(Tensor2::symmetrize)
            .collect())
    }
}

/// Reads one field out of the element's local coefficients.
///
/// `local` holds the cell's coefficients ordered `[vertex][component]`.
pub trait FieldExtractor<const D: usize> {
    type Value;
    type Gradient;

    /// Element components this field occupies.
    fn components(&self) -> Range<usize>;

    fn value(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> Self::Value;

    fn gradient(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> Self::Gradient;
}

/// A single scalar component, e.g. the phase field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScalarField {
    pub component: usize,
}

/// `D` consecutive components forming a vector, e.g. the displacement.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VectorField {
    pub first_component: usize,
}

impl<const D: usize> FieldExtractor<D> for ScalarField {
    type Value = f64;
    type Gradient = Tensor1<D>;

    fn components(&self) -> Range<usize> {
        self.component..self.component + 1
    }

    fn value(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> f64 {
        let nc = fv.n_components();
        (0..vertices_per_cell(D))
            .map(|v| fv.shape_value(q, v) * local[v * nc + self.component])
            .sum()
    }

    fn gradient(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> Tensor1<D> {
        let nc = fv.n_components();
        let mut g = Tensor1::zero();
        for v in 0..vertices_per_cell(D) {
            g += fv.shape_grad(q, v) * local[v * nc + self.component];
        }
        g
    }
}

impl<const D: usize> FieldExtractor<D> for VectorField {
    type Value = Tensor1<D>;
    type Gradient = Tensor2<D>;

    fn components(&self) -> Range<usize> {
        self.first_component..self.first_component + D
    }

    fn value(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> Tensor1<D> {
        let nc = fv.n_components();
        let mut u = Tensor1::zero();
        for v in 0..vertices_per_cell(D) {
            let n = fv.shape_value(q, v);
            for i in 0..D {
                u[i] += n * local[v * nc + self.first_component + i];
            }
        }
        u
    }

    fn gradient(&self, fv: &FieldEvaluator<'_, D>, q: usize, local: &[f64]) -> Tensor2<D> {
        let nc = fv.n_components();
        let mut g = Tensor2::zero();
        for v in 0..vertices_per_cell(D) {
            let grad = fv.shape_grad(q, v);
            for i in 0..D {
                let coeff = local[v * nc + self.first_component + i];
                for j in 0..D {
                    g[i][j] += coeff * grad[j];
                }
            }
        }
        g
    }
}

/// Field layout of the phase-field system: displacement, then phase field.
pub fn displacement() -> VectorField {
    VectorField { first_component: 0 }
}

/// Phase-field component of a `D`-dimensional phase-field system.
pub fn phase_field<const D: usize>() -> ScalarField {
    ScalarField { component: D }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::meshgen::BoxMeshBuilder;
    use crate::data::dof::DofLayout;
    use crate::data::vector::interpolate;

    fn setup() -> (crate::topology::mesh::MeshPartition<2>, DofHandler<2>) {
        let builder = BoxMeshBuilder::<2>::new([2, 2]).with_bounds([0.0, 0.0], [2.0, 1.0]);
        let mesh = builder.build(0).unwrap();
        let dofs = DofHandler::<2>::phase_field(builder.n_vertices(), DofLayout::Blocked);
        (mesh, dofs)
    }

    #[test]
    fn face_geometry_on_stretched_cell() {
        let (mesh, dofs) = setup();
        let fe = FiniteElement::<2>::phase_field();
        let quad = QuadratureRule::gauss(2, 1).unwrap();
        let mut fv = FieldEvaluator::for_faces(&fe, quad, UpdateFlags::GRADIENTS_AND_NORMALS).unwrap();
        // right face of cell 1 (x in [1,2], y in [0,0.5])
        fv.reinit_face(&mesh, &dofs, CellId::new(1), 1).unwrap();
        let area: f64 = (0..fv.n_quadrature_points()).map(|q| fv.jxw(q)).sum();
        assert!((area - 0.5).abs() < 1e-14);
        let n = fv.normal_vector(0);
        assert!((n[0] - 1.0).abs() < 1e-14 && n[1].abs() < 1e-14);
        assert!((fv.quadrature_point(0)[0] - 2.0).abs() < 1e-14);
        // bottom face points down
        fv.reinit_face(&mesh, &dofs, CellId::new(1), 2).unwrap();
        let n = fv.normal_vector(1);
        assert!(n[0].abs() < 1e-14 && (n[1] + 1.0).abs() < 1e-14);
        let len: f64 = (0..2).map(|q| fv.jxw(q)).sum();
        assert!((len - 1.0).abs() < 1e-14);
    }

    #[test]
    fn linear_fields_are_reproduced() {
        let (mesh, dofs) = setup();
        let u = interpolate(&dofs, &mesh, |x, c| match c {
            0 => 2.0 * x[0] + 3.0 * x[1],
            1 => -x[0],
            _ => 0.5 * x[1],
        })
        .unwrap();
        let relevant = dofs.relevant_dofs(&mesh).unwrap();
        let g = u.to_ghosted(&relevant, &NoComm).unwrap();

        let fe = FiniteElement::<2>::phase_field();
        let quad = QuadratureRule::gauss(3, 1).unwrap();
        let mut fv = FieldEvaluator::for_faces(&fe, quad, UpdateFlags::GRADIENTS).unwrap();
        fv.reinit_face(&mesh, &dofs, CellId::new(3), 0).unwrap();

        let vals = fv.function_values(&displacement(), &g).unwrap();
        let grads = fv.function_gradients(&displacement(), &g).unwrap();
        let sym = fv.function_symmetric_gradients(&displacement(), &g).unwrap();
        let phi_grad = fv.function_gradients(&phase_field::<2>(), &g).unwrap();
        for q in 0..fv.n_quadrature_points() {
            let x = fv.quadrature_point(q);
            assert!((vals[q][0] - (2.0 * x[0] + 3.0 * x[1])).abs() < 1e-13);
            assert!((vals[q][1] + x[0]).abs() < 1e-13);
            assert!((grads[q][0][1] - 3.0).abs() < 1e-13);
            assert!((grads[q][1][0] + 1.0).abs() < 1e-13);
            assert!((sym[q][0][1] - 1.0).abs() < 1e-13);
            assert!(phi_grad[q][0].abs() < 1e-13);
            assert!((phi_grad[q][1] - 0.5).abs() < 1e-13);
        }
    }

    #[test]
    fn cell_volume_and_misuse() {
        let (mesh, dofs) = setup();
        let fe = FiniteElement::<2>::phase_field();
        let mut cv =
            FieldEvaluator::for_cells(&fe, QuadratureRule::gauss(2, 2).unwrap(), UpdateFlags::VALUES)
                .unwrap();
        cv.reinit_cell(&mesh, &dofs, CellId::new(0)).unwrap();
        let vol: f64 = (0..cv.n_quadrature_points()).map(|q| cv.jxw(q)).sum();
        assert!((vol - 0.5).abs() < 1e-14);
        assert!(cv.reinit_face(&mesh, &dofs, CellId::new(0), 0).is_err());

        let zero = crate::data::vector::DistributedVector::zeros(dofs.n_dofs(), 0..dofs.n_dofs()).unwrap();
        // gradients were not requested
        assert!(cv.function_gradients(&phase_field::<2>(), &zero).is_err());
        // component 3 does not exist in a 3-component system
        assert!(matches!(
            cv.function_values(&ScalarField { component: 3 }, &zero),
            Err(PostError::InvalidComponent { .. })
        ));
        assert!(
            FieldEvaluator::for_faces(&fe, QuadratureRule::gauss(2, 2).unwrap(), UpdateFlags::VALUES)
                .is_err()
        );
    }
}
