//! Reference-element quadrature, multilinear basis tabulation and geometric
//! mapping utilities.
//!
//! The reference cell is `[-1, 1]^D`. Local vertex `v` sits at the corner whose
//! coordinate along axis `a` is `+1` when bit `a` of `v` is set and `-1`
//! otherwise; the multilinear (Q1) shape function of vertex `v` is the tensor
//! product of the matching 1D hat functions.

use crate::post_error::PostError;

/// Quadrature rule on a reference element or reference face.
#[derive(Clone, Debug)]
pub struct QuadratureRule {
    /// Name for diagnostics.
    pub name: String,
    /// Quadrature points in reference coordinates.
    pub points: Vec<Vec<f64>>,
    /// Quadrature weights.
    pub weights: Vec<f64>,
}

impl QuadratureRule {
    /// Tensor-product Gauss–Legendre rule with `n_points` points per direction
    /// in `dim` dimensions. A zero-dimensional rule is a single unit-weight point.
    pub fn gauss(n_points: usize, dim: usize) -> Result<Self, PostError> {
        if n_points == 0 {
            return Err(PostError::InvalidGeometry(
                "Gauss rule needs at least one point".to_string(),
            ));
        }
        let line = gauss_legendre_1d(n_points);
        let mut rule = QuadratureRule {
            name: String::new(),
            points: vec![Vec::new()],
            weights: vec![1.0],
        };
        for _ in 0..dim {
            rule = tensor_product_quadrature(&rule, &line);
        }
        rule.name = format!("gauss{n_points}^{dim}");
        Ok(rule)
    }

    /// Dimension of the quadrature points.
    pub fn dimension(&self) -> usize {
        self.points.first().map(|p| p.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Basis function tabulation on the reference element.
#[derive(Clone, Debug)]
pub struct BasisTabulation {
    /// Basis values per quadrature point: `[qp][basis]`.
    pub values: Vec<Vec<f64>>,
    /// Reference gradients per quadrature point: `[qp][basis][dim]`.
    pub gradients: Vec<Vec<Vec<f64>>>,
}

/// Evaluate the `2^dim` multilinear shape functions and their reference
/// gradients at `points`.
pub fn tabulate_q1(dim: usize, points: &[Vec<f64>]) -> Result<BasisTabulation, PostError> {
    let n_basis = 1usize << dim;
    let mut values = Vec::with_capacity(points.len());
    let mut gradients = Vec::with_capacity(points.len());
    for point in points {
        if point.len() != dim {
            return Err(PostError::InvalidGeometry(format!(
                "reference point has dimension {}, expected {dim}",
                point.len()
            )));
        }
        let mut vals = Vec::with_capacity(n_basis);
        let mut grads = Vec::with_capacity(n_basis);
        for v in 0..n_basis {
            // 1D factors and their derivatives for each axis
            let factors: Vec<(f64, f64)> = (0..dim)
                .map(|a| {
                    let sign = if (v >> a) & 1 == 1 { 1.0 } else { -1.0 };
                    (0.5 * (1.0 + sign * point[a]), 0.5 * sign)
                })
                .collect();
            vals.push(factors.iter().map(|f| f.0).product());
            let grad = (0..dim)
                .map(|d| {
                    factors
                        .iter()
                        .enumerate()
                        .map(|(a, f)| if a == d { f.1 } else { f.0 })
                        .product()
                })
                .collect();
            grads.push(grad);
        }
        values.push(vals);
        gradients.push(grads);
    }
    Ok(BasisTabulation { values, gradients })
}

/// Lift face quadrature points into cell reference coordinates.
///
/// Face `f = 2·axis + side` lies at `ξ_axis = -1` (side 0) or `+1` (side 1);
/// the face point's coordinates fill the remaining axes in order.
pub fn lift_face_points(dim: usize, face: usize, face_points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let axis = face / 2;
    let fixed = if face % 2 == 0 { -1.0 } else { 1.0 };
    face_points
        .iter()
        .map(|fp| {
            let mut p = Vec::with_capacity(dim);
            let mut rest = fp.iter();
            for a in 0..dim {
                if a == axis {
                    p.push(fixed);
                } else {
                    p.push(rest.next().copied().unwrap_or(0.0));
                }
            }
            p
        })
        .collect()
}

fn gauss_legendre_1d(n: usize) -> QuadratureRule {
    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];
    for i in 0..n {
        // Newton iteration on P_n starting from the Chebyshev-like guess
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let (p_n, p_prev) = legendre_pair(n, x);
            dp = n as f64 * (x * p_n - p_prev) / (x * x - 1.0);
            let dx = p_n / dp;
            x -= dx;
            if dx.abs() < 1e-16 {
                break;
            }
        }
        let (p_n, p_prev) = legendre_pair(n, x);
        if x * x != 1.0 {
            dp = n as f64 * (x * p_n - p_prev) / (x * x - 1.0);
        }
        // descending guesses, store ascending
        points[n - 1 - i] = x;
        weights[n - 1 - i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }
    QuadratureRule {
        name: format!("gauss{n}"),
        points: points.into_iter().map(|x| vec![x]).collect(),
        weights,
    }
}

/// `(P_n(x), P_{n-1}(x))` by the three-term recurrence.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    for k in 2..=n {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * p - (k - 1.0) * p_prev) / k;
        p_prev = p;
        p = next;
    }
    (p, p_prev)
}

fn tensor_product_quadrature(a: &QuadratureRule, b: &QuadratureRule) -> QuadratureRule {
    let mut points = Vec::with_capacity(a.points.len() * b.points.len());
    let mut weights = Vec::with_capacity(a.points.len() * b.points.len());
    // the last factor varies slowest, so the first coordinate varies fastest
    for (pb, wb) in b.points.iter().zip(b.weights.iter()) {
        for (pa, wa) in a.points.iter().zip(a.weights.iter()) {
            let mut pt = Vec::with_capacity(pa.len() + pb.len());
            pt.extend_from_slice(pa);
            pt.extend_from_slice(pb);
            points.push(pt);
            weights.push(wa * wb);
        }
    }
    QuadratureRule {
        name: format!("{}x{}", a.name, b.name),
        points,
        weights,
    }
}

/// Jacobian `∂x/∂ξ` at one reference point, row-major `[phys][ref]`.
pub fn build_jacobian(dim: usize, node_coords: &[Vec<f64>], ref_grads: &[Vec<f64>]) -> Vec<f64> {
    let mut jac = vec![0.0; dim * dim];
    for (node, grad) in node_coords.iter().zip(ref_grads.iter()) {
        for phys_dim in 0..dim {
            for ref_dim in 0..dim {
                jac[phys_dim * dim + ref_dim] += node[phys_dim] * grad[ref_dim];
            }
        }
    }
    jac
}

/// Relative degeneracy threshold for [`invert_jacobian`].
const DEGENERACY_TOLERANCE: f64 = 1e3 * f64::EPSILON;

/// True when `det` vanishes relative to the product of the column lengths of `jac`.
///
/// The test is invariant under uniform scaling of the cell.
fn is_degenerate(dim: usize, jac: &[f64], det: f64) -> bool {
    let scale: f64 = (0..dim)
        .map(|r| (0..dim).map(|p| jac[p * dim + r].powi(2)).sum::<f64>().sqrt())
        .product();
    !det.is_finite() || !scale.is_finite() || det.abs() <= DEGENERACY_TOLERANCE * scale
}

/// Determinant and inverse of a `dim × dim` row-major matrix, `dim ≤ 3`.
///
/// Fails when the matrix is singular relative to its own scale, so arbitrarily
/// small but well-shaped cells are accepted.
pub fn invert_jacobian(dim: usize, jac: &[f64]) -> Result<(f64, Vec<f64>), PostError> {
    let zero_det = || PostError::InvalidGeometry("zero Jacobian determinant".to_string());
    match dim {
        1 => {
            let det = jac[0];
            if is_degenerate(dim, jac, det) {
                return Err(zero_det());
            }
            Ok((det, vec![1.0 / det]))
        }
        2 => {
            let (a, b, c, d) = (jac[0], jac[1], jac[2], jac[3]);
            let det = a * d - b * c;
            if is_degenerate(dim, jac, det) {
                return Err(zero_det());
            }
            Ok((det, vec![d / det, -b / det, -c / det, a / det]))
        }
        3 => {
            let (a, b, c) = (jac[0], jac[1], jac[2]);
            let (d, e, f) = (jac[3], jac[4], jac[5]);
            let (g, h, i) = (jac[6], jac[7], jac[8]);
            let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
            if is_degenerate(dim, jac, det) {
                return Err(zero_det());
            }
            let inv = vec![
                (e * i - f * h) / det,
                (c * h - b * i) / det,
                (b * f - c * e) / det,
                (f * g - d * i) / det,
                (a * i - c * g) / det,
                (c * d - a * f) / det,
                (d * h - e * g) / det,
                (b * g - a * h) / det,
                (a * e - b * d) / det,
            ];
            Ok((det, inv))
        }
        _ => Err(PostError::InvalidGeometry(format!(
            "unsupported Jacobian dimension {dim}"
        ))),
    }
}
