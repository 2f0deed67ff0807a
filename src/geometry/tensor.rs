//! Small fixed-size tensors for field samples.
//!
//! [`Tensor1`] is a `D`-vector (points, displacements, gradients of scalar
//! fields, normals); [`Tensor2`] is a `D×D` matrix stored row-major
//! (gradients of vector fields, strains, stresses).

use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// Rank-1 tensor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tensor1<const D: usize>(pub [f64; D]);

/// Rank-2 tensor, row-major: `t[i][j]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tensor2<const D: usize>(pub [[f64; D]; D]);

impl<const D: usize> Default for Tensor1<D> {
    fn default() -> Self {
        Self([0.0; D])
    }
}

impl<const D: usize> Default for Tensor2<D> {
    fn default() -> Self {
        Self([[0.0; D]; D])
    }
}

impl<const D: usize> From<[f64; D]> for Tensor1<D> {
    fn from(a: [f64; D]) -> Self {
        Self(a)
    }
}

impl<const D: usize> Tensor1<D> {
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance between two points.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

}

impl<const D: usize> Tensor2<D> {
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn identity() -> Self {
        let mut t = Self::zero();
        for i in 0..D {
            t.0[i][i] = 1.0;
        }
        t
    }

    pub fn trace(&self) -> f64 {
        (0..D).map(|i| self.0[i][i]).sum()
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zero();
        for i in 0..D {
            for j in 0..D {
                t.0[j][i] = self.0[i][j];
            }
        }
        t
    }

    /// `(A + Aᵀ) / 2`.
    pub fn symmetrize(&self) -> Self {
        let mut t = Self::zero();
        for i in 0..D {
            for j in 0..D {
                t.0[i][j] = 0.5 * (self.0[i][j] + self.0[j][i]);
            }
        }
        t
    }

    /// Matrix-vector product `A·v`.
    pub fn dot(&self, v: &Tensor1<D>) -> Tensor1<D> {
        let mut out = Tensor1::zero();
        for i in 0..D {
            out.0[i] = (0..D).map(|j| self.0[i][j] * v.0[j]).sum();
        }
        out
    }
}

impl<const D: usize> Index<usize> for Tensor1<D> {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl<const D: usize> IndexMut<usize> for Tensor1<D> {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl<const D: usize> Index<usize> for Tensor2<D> {
    type Output = [f64; D];
    fn index(&self, i: usize) -> &[f64; D] {
        &self.0[i]
    }
}

impl<const D: usize> IndexMut<usize> for Tensor2<D> {
    fn index_mut(&mut self, i: usize) -> &mut [f64; D] {
        &mut self.0[i]
    }
}

impl<const D: usize> Add for Tensor1<D> {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const D: usize> AddAssign for Tensor1<D> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl<const D: usize> Sub for Tensor1<D> {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a -= b;
        }
        self
    }
}

impl<const D: usize> Mul<f64> for Tensor1<D> {
    type Output = Self;
    fn mul(mut self, s: f64) -> Self {
        for a in self.0.iter_mut() {
            *a *= s;
        }
        self
    }
}

impl<const D: usize> Add for Tensor2<D> {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const D: usize> AddAssign for Tensor2<D> {
    fn add_assign(&mut self, rhs: Self) {
        for (row, other) in self.0.iter_mut().zip(rhs.0) {
            for (a, b) in row.iter_mut().zip(other) {
                *a += b;
            }
        }
    }
}

impl<const D: usize> Mul<f64> for Tensor2<D> {
    type Output = Self;
    fn mul(mut self, s: f64) -> Self {
        for row in self.0.iter_mut() {
            for a in row.iter_mut() {
                *a *= s;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_ops() {
        let a = Tensor1([3.0, 4.0]);
        let b = Tensor1([0.0, 1.0]);
        assert_eq!(a.norm(), 5.0);
        assert_eq!(a.dot(&b), 4.0);
        assert_eq!(a.distance(&Tensor1([0.0, 0.0])), 5.0);
        assert_eq!((a + b * 2.0).0, [3.0, 6.0]);
    }

    #[test]
    fn matrix_ops() {
        let g = Tensor2([[1.0, 2.0], [4.0, 3.0]]);
        assert_eq!(g.trace(), 4.0);
        assert_eq!(g.symmetrize(), Tensor2([[1.0, 3.0], [3.0, 3.0]]));
        assert_eq!(g.transpose().0[0][1], 4.0);
        assert_eq!(g.dot(&Tensor1([1.0, 0.0])).0, [1.0, 4.0]);
        assert_eq!((Tensor2::<3>::identity() * 2.0).trace(), 6.0);
    }
}
