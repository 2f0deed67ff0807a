//! Linear isotropic elasticity.

use serde::{Deserialize, Serialize};

use crate::geometry::tensor::Tensor2;
use crate::post_error::PostError;

/// Lamé constants of an isotropic linear-elastic material.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticParameters {
    /// First Lamé parameter λ.
    pub lame_constant: f64,
    /// Shear modulus μ.
    pub shear_modulus: f64,
}

impl ElasticParameters {
    pub fn new(lame_constant: f64, shear_modulus: f64) -> Self {
        Self {
            lame_constant,
            shear_modulus,
        }
    }

    /// Lamé constants from Young's modulus and Poisson's ratio.
    pub fn from_young_poisson(young: f64, poisson: f64) -> Result<Self, PostError> {
        if !(young > 0.0) {
            return Err(PostError::InvalidConfig(format!(
                "Young's modulus must be positive, got {young}"
            )));
        }
        if !(poisson > -1.0 && poisson < 0.5) {
            return Err(PostError::InvalidConfig(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {poisson}"
            )));
        }
        let mu = young / (2.0 * (1.0 + poisson));
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        Ok(Self::new(lambda, mu))
    }

    /// Both constants finite and μ > 0.
    pub fn validate(&self) -> Result<(), PostError> {
        if !self.lame_constant.is_finite() || !self.shear_modulus.is_finite() {
            return Err(PostError::InvalidConfig(
                "elastic constants must be finite".to_string(),
            ));
        }
        if self.shear_modulus <= 0.0 {
            return Err(PostError::InvalidConfig(format!(
                "shear modulus must be positive, got {}",
                self.shear_modulus
            )));
        }
        Ok(())
    }

    /// Cauchy stress `λ tr(ε) I + 2μ ε` for a small strain `ε`.
    pub fn stress<const D: usize>(&self, strain: &Tensor2<D>) -> Tensor2<D> {
        Tensor2::identity() * (self.lame_constant * strain.trace()) + *strain * (2.0 * self.shear_modulus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn young_poisson_conversion() {
        let p = ElasticParameters::from_young_poisson(2.5, 0.25).unwrap();
        assert!((p.shear_modulus - 1.0).abs() < 1e-15);
        assert!((p.lame_constant - 1.0).abs() < 1e-15);
        assert!(ElasticParameters::from_young_poisson(1.0, 0.5).is_err());
        assert!(ElasticParameters::from_young_poisson(0.0, 0.3).is_err());
        assert!(ElasticParameters::new(1.0, 0.0).validate().is_err());
    }

    #[test]
    fn hooke_law() {
        let p = ElasticParameters::new(2.0, 3.0);
        let mut eps = Tensor2::<2>::zero();
        eps[0][0] = 0.1;
        eps[0][1] = 0.05;
        eps[1][0] = 0.05;
        let s = p.stress(&eps);
        assert!((s[0][0] - (2.0 * 0.1 + 6.0 * 0.1)).abs() < 1e-15);
        assert!((s[1][1] - 0.2).abs() < 1e-15);
        assert!((s[0][1] - 0.3).abs() < 1e-15);
    }
}
