//! Survival and birth probability curves.
//!
//! Both curves share one bell shape centered on a preferred influence:
//!
//! ```text
//! curve(s, c) = clip((alpha * σ(β(s - c)) * (1 - σ(β(s - c))))^gamma + delta, 0, 1)
//! ```
//!
//! The whole product is raised to `gamma` before `delta` is added.

use crate::config::SimParams;

/// Logistic sigmoid
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Clamp to `[min, max]`; NaN maps to `min`
#[inline]
pub fn clip(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Bell curve around `center`, always in `[0, 1]`
pub fn curve(s_total: f64, center: f64, params: &SimParams) -> f64 {
    let sigma = sigmoid(params.beta * (s_total - center));
    let peak = (params.alpha * sigma * (1.0 - sigma)).powf(params.gamma);
    clip(peak + params.delta, 0.0, 1.0)
}

/// `p_live`: curve centered on `mu`
#[inline]
pub fn survival_probability(s_total: f64, params: &SimParams) -> f64 {
    curve(s_total, params.mu, params)
}

/// `p_born`: curve centered on `nu`
#[inline]
pub fn birth_probability(s_total: f64, params: &SimParams) -> f64 {
    curve(s_total, params.nu, params)
}

/// Probabilities under `epsilon` count as zero
#[inline]
pub fn apply_floor(probability: f64, epsilon: f64) -> f64 {
    if probability < epsilon {
        0.0
    } else {
        probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PARAMS;

    #[test]
    fn test_peak_at_center() {
        // σ(0) = 0.5, so the peak is alpha/4 + delta = 1 - 0.07
        let p = survival_probability(DEFAULT_PARAMS.mu, &DEFAULT_PARAMS);
        assert!((p - 0.93).abs() < 1e-12);
        let b = birth_probability(DEFAULT_PARAMS.nu, &DEFAULT_PARAMS);
        assert!((b - 0.93).abs() < 1e-12);
    }

    #[test]
    fn test_decays_away_from_center() {
        let center = survival_probability(20.0, &DEFAULT_PARAMS);
        let near = survival_probability(25.0, &DEFAULT_PARAMS);
        let far = survival_probability(76.0, &DEFAULT_PARAMS);
        assert!(center > near);
        assert!(near > far);
        assert_eq!(far, 0.0);
        assert!((survival_probability(0.0, &DEFAULT_PARAMS) - 0.11070663892364799).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_for_extreme_params() {
        let inputs = [-1e6, -50.0, -1.0, 0.0, 0.5, 20.0, 76.0, 1e9];
        let param_sets = [
            SimParams { alpha: 100.0, delta: 0.5, ..DEFAULT_PARAMS },
            SimParams { alpha: -3.0, gamma: 0.5, ..DEFAULT_PARAMS },
            SimParams { gamma: -2.0, ..DEFAULT_PARAMS },
            SimParams { beta: 40.0, delta: -5.0, ..DEFAULT_PARAMS },
            SimParams { alpha: f64::NAN, ..DEFAULT_PARAMS },
            SimParams { beta: f64::INFINITY, ..DEFAULT_PARAMS },
        ];
        for params in &param_sets {
            for &s in &inputs {
                for p in [survival_probability(s, params), birth_probability(s, params)] {
                    assert!((0.0..=1.0).contains(&p), "{} out of range for s={}", p, s);
                }
            }
        }
    }

    #[test]
    fn test_nan_clips_to_zero() {
        assert_eq!(clip(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clip(f64::INFINITY, 0.0, 1.0), 1.0);
        let params = SimParams { alpha: f64::NAN, ..DEFAULT_PARAMS };
        assert_eq!(survival_probability(20.0, &params), 0.0);
    }

    #[test]
    fn test_exponent_applies_to_whole_product() {
        // (4 * 0.25)^3 = 1, whereas 4 * 0.5 * 0.5^3 = 0.25
        let params = SimParams { gamma: 3.0, delta: 0.0, ..DEFAULT_PARAMS };
        assert!((curve(10.0, 10.0, &params) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_floor() {
        assert_eq!(apply_floor(0.02, 0.03), 0.0);
        assert_eq!(apply_floor(0.03, 0.03), 0.03);
    }
}
