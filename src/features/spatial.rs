//! Spatial-boost decay shapes for the `spatialBoost` feature
//! (SPEC_FULL.md §4.4, §9 Open Questions).

use crate::config::{CandidatesConfig, SpatialDecay};

/// Map a distance in metres to a `[0, maxSpatial]` boost, per the configured
/// decay shape. `None` distance (no coordinates on one or both sides) yields
/// zero boost.
pub fn spatial_boost(distance_metres: Option<f64>, max_spatial: f64, config: &CandidatesConfig) -> f64 {
    let Some(distance) = distance_metres else {
        return 0.0;
    };
    if distance < 0.0 {
        return 0.0;
    }

    match config.spatial_decay {
        SpatialDecay::Linear => {
            let cap = config.spatial_linear_cap_metres;
            if distance >= cap {
                0.0
            } else {
                max_spatial * (1.0 - distance / cap)
            }
        }
        SpatialDecay::Exponential => {
            let scale = config.spatial_exponential_scale_metres;
            if scale <= 0.0 {
                0.0
            } else {
                max_spatial * (-distance / scale).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(decay: SpatialDecay) -> CandidatesConfig {
        let mut c = CandidatesConfig::default();
        c.spatial_decay = decay;
        c
    }

    #[test]
    fn missing_distance_yields_zero_boost() {
        assert_eq!(spatial_boost(None, 0.10, &config(SpatialDecay::Linear)), 0.0);
    }

    #[test]
    fn linear_decay_reaches_zero_at_cap() {
        let cfg = config(SpatialDecay::Linear);
        assert_eq!(spatial_boost(Some(cfg.spatial_linear_cap_metres), 0.10, &cfg), 0.0);
        assert!(spatial_boost(Some(0.0), 0.10, &cfg) - 0.10 < f64::EPSILON);
    }

    #[test]
    fn exponential_decay_is_monotonic() {
        let cfg = config(SpatialDecay::Exponential);
        let near = spatial_boost(Some(10.0), 0.10, &cfg);
        let far = spatial_boost(Some(1000.0), 0.10, &cfg);
        assert!(near > far);
    }
}
