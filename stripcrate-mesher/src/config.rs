//! Mesher configuration
//!
//! Every tunable of the optimizer lives in [`MesherConfig`], which is passed
//! once per invocation. Nothing is read from global state.

use serde::{Deserialize, Serialize};
use stripcrate_core::{Error, Result};

/// Default weight of the coplanarity term when two loose triangles compete
pub const DEFAULT_COPLANARITY_WEIGHT: f64 = 4.0;

/// Default weight of the normalized shared-edge-length term
pub const DEFAULT_EDGE_LENGTH_WEIGHT: f64 = 1.0;

/// Largest accepted value for `max_fan_angle_degrees`
pub const MAX_FAN_ANGLE_LIMIT: f64 = 720.0;

/// Weights of the loose-triangle mate score.
///
/// The score is `coplanarity * (coplanarity_a - coplanarity_b)
/// - edge_length * (len_a - len_b) / (len_a + len_b)`; a negative score
/// prefers candidate `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MateWeights {
    pub coplanarity: f64,
    pub edge_length: f64,
}

impl Default for MateWeights {
    fn default() -> Self {
        Self {
            coplanarity: DEFAULT_COPLANARITY_WEIGHT,
            edge_length: DEFAULT_EDGE_LENGTH_WEIGHT,
        }
    }
}

/// Configuration for one optimizer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    /// Look for fans around high-degree vertices (ignored when flat shaded)
    pub allow_fan_detection: bool,
    /// Let coplanar triangle pairs from the same source be re-joined into quads
    pub allow_quad_retesselation: bool,
    /// Cut grids of quads into parallel quad strips
    pub allow_sheet_building: bool,
    /// Re-tesselate rejected fan runs into strip-friendly triangles
    pub unroll_fans: bool,
    /// Forbid odd-length strips and all fans
    pub flat_shaded: bool,
    /// Minimum triangle count of an emitted fan; 0 disables fan emission
    pub min_fan_triangle_count: usize,
    /// Upper bound on a fan's summed subtended angle, in degrees
    pub max_fan_angle_degrees: f64,
    /// Largest `1 - cos(angle)` between plane normals still treated as coplanar
    pub coplanarity_threshold: f64,
    /// Weights of the loose-triangle mate score
    pub mate_weights: MateWeights,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            allow_fan_detection: true,
            allow_quad_retesselation: true,
            allow_sheet_building: true,
            unroll_fans: true,
            flat_shaded: false,
            min_fan_triangle_count: 4,
            max_fan_angle_degrees: 360.0,
            coplanarity_threshold: 0.01,
            mate_weights: MateWeights::default(),
        }
    }
}

impl MesherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fan_detection(mut self, allow: bool) -> Self {
        self.allow_fan_detection = allow;
        self
    }

    pub fn with_quad_retesselation(mut self, allow: bool) -> Self {
        self.allow_quad_retesselation = allow;
        self
    }

    pub fn with_sheet_building(mut self, allow: bool) -> Self {
        self.allow_sheet_building = allow;
        self
    }

    pub fn with_fan_unrolling(mut self, unroll: bool) -> Self {
        self.unroll_fans = unroll;
        self
    }

    pub fn with_flat_shading(mut self, flat_shaded: bool) -> Self {
        self.flat_shaded = flat_shaded;
        self
    }

    pub fn with_fan_limits(mut self, min_triangles: usize, max_angle_degrees: f64) -> Self {
        self.min_fan_triangle_count = min_triangles;
        self.max_fan_angle_degrees = max_angle_degrees;
        self
    }

    pub fn with_coplanarity_threshold(mut self, threshold: f64) -> Self {
        self.coplanarity_threshold = threshold;
        self
    }

    pub fn with_mate_weights(mut self, weights: MateWeights) -> Self {
        self.mate_weights = weights;
        self
    }

    /// Whether the fan phase runs at all
    pub fn fans_enabled(&self) -> bool {
        self.allow_fan_detection && !self.flat_shaded
    }

    /// Check that every numeric tunable is usable
    pub fn validate(&self) -> Result<()> {
        if !self.coplanarity_threshold.is_finite() || self.coplanarity_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "coplanarity threshold must be finite and non-negative, got {}",
                self.coplanarity_threshold
            )));
        }
        if !(self.max_fan_angle_degrees > 0.0 && self.max_fan_angle_degrees <= MAX_FAN_ANGLE_LIMIT) {
            return Err(Error::InvalidConfig(format!(
                "max fan angle must lie in (0, {}] degrees, got {}",
                MAX_FAN_ANGLE_LIMIT, self.max_fan_angle_degrees
            )));
        }
        let weights = [self.mate_weights.coplanarity, self.mate_weights.edge_length];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig(format!(
                "mate weights must be finite and non-negative, got {:?}",
                self.mate_weights
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MesherConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.fans_enabled());
        assert_eq!(config.mate_weights.coplanarity, DEFAULT_COPLANARITY_WEIGHT);
        assert_eq!(config.mate_weights.edge_length, DEFAULT_EDGE_LENGTH_WEIGHT);
    }

    #[test]
    fn test_flat_shading_disables_fans() {
        let config = MesherConfig::new().with_flat_shading(true);
        assert!(config.allow_fan_detection);
        assert!(!config.fans_enabled());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_threshold = MesherConfig::new().with_coplanarity_threshold(f64::NAN);
        assert!(matches!(bad_threshold.validate(), Err(Error::InvalidConfig(_))));

        let bad_angle = MesherConfig::new().with_fan_limits(4, 0.0);
        assert!(bad_angle.validate().is_err());

        let too_wide = MesherConfig::new().with_fan_limits(4, 1000.0);
        assert!(too_wide.validate().is_err());

        let bad_weights = MesherConfig::new().with_mate_weights(MateWeights {
            coplanarity: -1.0,
            edge_length: 1.0,
        });
        assert!(bad_weights.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = MesherConfig::new()
            .with_fan_detection(false)
            .with_quad_retesselation(false)
            .with_sheet_building(false)
            .with_fan_unrolling(false)
            .with_fan_limits(6, 270.0);
        assert!(!config.allow_fan_detection);
        assert!(!config.allow_quad_retesselation);
        assert!(!config.allow_sheet_building);
        assert!(!config.unroll_fans);
        assert_eq!(config.min_fan_triangle_count, 6);
        assert_eq!(config.max_fan_angle_degrees, 270.0);
    }
}
