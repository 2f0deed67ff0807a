//! Configuration of one postprocessing pass.
//!
//! Plain serde structs; where they come from (JSON, TOML, command line) is up
//! to the caller.

use serde::{Deserialize, Serialize};

use crate::physics::elasticity::ElasticParameters;
use crate::post_error::PostError;
use crate::postprocess::cod::CodSettings;
use crate::topology::point::BoundaryId;

/// Everything [`Postprocessor::run`](crate::postprocess::Postprocessor::run)
/// evaluates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostprocessConfig {
    pub elastic: ElasticParameters,
    /// Boundary ids to integrate the load on.
    #[serde(default)]
    pub load_boundary_ids: Vec<BoundaryId>,
    /// Crack opening settings; no COD is computed when absent.
    #[serde(default)]
    pub cod: Option<CodSettings>,
    /// Query points for nearest-vertex sampling, `dim` coordinates each.
    #[serde(default)]
    pub sample_points: Vec<Vec<f64>>,
    /// Component sampled at the query points.
    #[serde(default)]
    pub sample_component: usize,
}

impl PostprocessConfig {
    pub fn new(elastic: ElasticParameters) -> Self {
        Self {
            elastic,
            load_boundary_ids: Vec::new(),
            cod: None,
            sample_points: Vec::new(),
            sample_component: 0,
        }
    }

    /// Check the configuration against a `dim`-dimensional system with
    /// `n_components` components.
    pub fn validate(&self, dim: usize, n_components: usize) -> Result<(), PostError> {
        self.elastic.validate()?;
        if let Some(cod) = &self.cod {
            cod.validate(dim)?;
        }
        if !self.sample_points.is_empty() && self.sample_component >= n_components {
            return Err(PostError::InvalidComponent {
                component: self.sample_component,
                n_components,
            });
        }
        for p in &self.sample_points {
            if p.len() != dim {
                return Err(PostError::LengthMismatch {
                    expected: dim,
                    found: p.len(),
                });
            }
            if p.iter().any(|x| !x.is_finite()) {
                return Err(PostError::InvalidConfig(format!(
                    "sample point {p:?} is not finite"
                )));
            }
        }
        Ok(())
    }

    /// Sample points as fixed-size coordinates.
    pub fn sample_points_as<const D: usize>(&self) -> Result<Vec<[f64; D]>, PostError> {
        self.sample_points
            .iter()
            .map(|p| {
                <[f64; D]>::try_from(p.as_slice()).map_err(|_| PostError::LengthMismatch {
                    expected: D,
                    found: p.len(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::cod::{DEFAULT_TOLERANCE, FaceVisitPolicy};

    #[test]
    fn json_defaults() {
        let cfg: PostprocessConfig = serde_json::from_str(
            r#"{
                "elastic": { "lame_constant": 1.0, "shear_modulus": 2.0 },
                "load_boundary_ids": [1, 3],
                "cod": { "direction": 0, "lines": [0.25, 0.5] },
                "sample_points": [[0.5, 0.5]]
            }"#,
        )
        .unwrap();
        let cod = cfg.cod.as_ref().unwrap();
        assert_eq!(cod.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(cod.face_policy, FaceVisitPolicy::BothSides);
        assert_eq!(cfg.sample_component, 0);
        cfg.validate(2, 3).unwrap();
        assert_eq!(cfg.sample_points_as::<2>().unwrap(), vec![[0.5, 0.5]]);

        let back: PostprocessConfig = serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn validation_errors() {
        let mut cfg = PostprocessConfig::new(ElasticParameters::new(1.0, 1.0));
        cfg.sample_points = vec![vec![0.0, 0.0, 0.0]];
        assert!(matches!(cfg.validate(2, 3), Err(PostError::LengthMismatch { .. })));
        cfg.sample_points = vec![vec![0.0, 0.0]];
        cfg.sample_component = 3;
        assert!(matches!(cfg.validate(2, 3), Err(PostError::InvalidComponent { .. })));
        cfg.sample_component = 2;
        cfg.cod = Some(CodSettings::new(2, vec![0.5]));
        assert!(matches!(cfg.validate(2, 3), Err(PostError::InvalidDirection { .. })));
    }
}
