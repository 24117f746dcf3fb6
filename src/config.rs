//! Analysis settings.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::topology::{FiltrationModel, PlainRips, RankBy, WeightedRips};

/// Configuration for one underserved-region run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Multiplier on every filtration value (2.0 = simplex-tree convention)
    pub filtration_scale: f64,
    /// Use site loads; false gives the plain Rips filtration
    pub use_weights: bool,
    /// Drop simplices above this value
    pub max_filtration: Option<f64>,
    /// Keep H1 pairs with persistence strictly above this
    pub min_persistence: f64,
    pub rank_by: RankBy,
    pub max_triangles: Option<usize>,
    /// Allowed |D[i][j] - D[j][i]| and |D[i][i]|
    pub symmetry_tolerance: f64,
    /// Twice-area under which a death triangle counts as collinear
    pub collinear_tolerance: f64,
    /// Use the rayon pool for filtration values and region tests
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            filtration_scale: 1.0,
            use_weights: true,
            max_filtration: None,
            min_persistence: 0.0,
            rank_by: RankBy::Persistence,
            max_triangles: None,
            symmetry_tolerance: 1e-9,
            collinear_tolerance: 1e-12,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.filtration_scale.is_finite() && self.filtration_scale > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "filtration_scale must be positive, got {}",
                self.filtration_scale
            )));
        }
        if let Some(max) = self.max_filtration {
            if !max.is_finite() || max < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "max_filtration must be a non-negative number, got {}",
                    max
                )));
            }
        }
        if !self.min_persistence.is_finite() || self.min_persistence < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_persistence must be non-negative, got {}",
                self.min_persistence
            )));
        }
        if self.max_triangles == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "max_triangles must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("symmetry_tolerance", self.symmetry_tolerance),
            ("collinear_tolerance", self.collinear_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Filtration model selected by this configuration
    pub fn filtration_model(&self) -> Box<dyn FiltrationModel> {
        if self.use_weights {
            Box::new(WeightedRips::with_scale(self.filtration_scale))
        } else {
            Box::new(PlainRips {
                scale: self.filtration_scale,
            })
        }
    }
}
