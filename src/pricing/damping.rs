//! Dampening policy and FFT grid derivation.
//!
//! The call price `C(k)` is not square-integrable in log-strike `k`, so the transform
//! works on `exp(alpha k) C(k)`. Its Fourier transform has the denominator
//!
//! ```text
//! D(u) = alpha^2 + alpha - u^2 + i (2 alpha + 1) u
//! ```
//!
//! which vanishes at `u = 0` for `alpha` in `{0, -1}`. Only the call curve is ever
//! transformed (puts come from parity), so `alpha` must be strictly positive.
//!
//! Grid relations for `N = 2^n` points and truncation `B = 2^trunc`:
//! `du = B / N`, `lambda = 2 pi / (N du)`, `b = N lambda / 2`.

use num_complex::Complex64;
use serde::Serialize;
use std::f64::consts::PI;

use crate::error::{ensure_finite, ensure_positive, PricingError, Result};
use crate::pricing::config::{FftConfig, FftTransform, Quadrature};

/// Largest supported transform exponent (`2^24` points).
pub const MAX_N: u32 = 24;
/// Largest supported truncation exponent.
pub const MAX_TRUNC: u32 = 16;

const SINGULAR_EPS: f64 = 1e-12;

/// Derived FFT grid. Immutable once built and reused across solver iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FftGridSpec {
    pub alpha: f64,
    pub trunc: u32,
    pub n: u32,
    /// Number of points `2^n`
    pub size: usize,
    /// Frequency truncation `B = 2^trunc`
    pub upper: f64,
    /// Frequency step `du = B / 2^n`
    pub du: f64,
    /// Log-strike step `lambda = 2 pi / (2^n du)`
    pub lambda: f64,
    /// Log-strike half-width `b` of the window
    pub half_width: f64,
}

/// Denominator of the dampened call transform at real frequency `u`.
pub fn damping_denominator(alpha: f64, u: f64) -> Complex64 {
    Complex64::new(alpha * alpha + alpha - u * u, (2.0 * alpha + 1.0) * u)
}

/// Validates `alpha` and the grid exponents, then derives the grid.
pub fn compute_grid(alpha: f64, trunc: u32, n: u32) -> Result<FftGridSpec> {
    if !alpha.is_finite() {
        return Err(PricingError::InvalidDampening {
            alpha,
            reason: "alpha must be finite".to_string(),
        });
    }
    if !(1..=MAX_N).contains(&n) {
        return Err(PricingError::invalid_input(format!(
            "n must be in 1..={MAX_N}, got {n}"
        )));
    }
    if trunc > MAX_TRUNC {
        return Err(PricingError::invalid_input(format!(
            "trunc must be <= {MAX_TRUNC}, got {trunc}"
        )));
    }

    let size = 1usize << n;
    let upper = (1u64 << trunc) as f64;
    let du = upper / size as f64;
    let lambda = 2.0 * PI / (size as f64 * du);
    let half_width = 0.5 * size as f64 * lambda;

    // Sample the denominator numerically instead of trusting the closed form.
    let samples = [0.0, du, 0.5, 1.0, 0.5 * upper];
    if let Some(u) = samples
        .iter()
        .copied()
        .find(|&u| damping_denominator(alpha, u).norm() < SINGULAR_EPS)
    {
        return Err(PricingError::InvalidDampening {
            alpha,
            reason: format!("dampened transform is singular at u={u}"),
        });
    }
    if alpha <= 0.0 {
        return Err(PricingError::InvalidDampening {
            alpha,
            reason: "call dampening requires alpha > 0 (puts are priced by parity)".to_string(),
        });
    }

    Ok(FftGridSpec {
        alpha,
        trunc,
        n,
        size,
        upper,
        du,
        lambda,
        half_width,
    })
}

/// `compute_grid` driven by a configuration block, plus the checks that depend on
/// the transform and the error controls.
pub fn grid_from_config(config: &FftConfig) -> Result<FftGridSpec> {
    let grid = compute_grid(config.alpha, config.trunc, config.n)?;
    if config.transform == FftTransform::TimeValue && (config.alpha - 1.0).abs() < SINGULAR_EPS {
        return Err(PricingError::InvalidDampening {
            alpha: config.alpha,
            reason: "time value transform is singular at u=0 for alpha = 1".to_string(),
        });
    }
    ensure_positive("truncation_tol", config.truncation_tol)?;
    ensure_finite("atm_eps", config.atm_eps)?;
    Ok(grid)
}

/// Moment orders `phi` must support for a transform: `E[S^(1 + alpha)]` for the
/// dampened call, and `E[S^(1 - alpha)]` as well for the time value.
pub fn required_moments(transform: FftTransform, alpha: f64) -> Vec<f64> {
    match transform {
        FftTransform::DampedCall => vec![1.0 + alpha],
        FftTransform::TimeValue => vec![1.0 + alpha, 1.0 - alpha],
    }
}

impl FftGridSpec {
    /// Frequency node `u_j = j du`.
    pub fn frequency(&self, j: usize) -> f64 {
        j as f64 * self.du
    }

    /// Quadrature weights over the frequency grid, including the step `du`.
    pub fn weights(&self, quadrature: Quadrature) -> Vec<f64> {
        (0..self.size)
            .map(|j| match quadrature {
                Quadrature::Simpson => {
                    let w = if j == 0 {
                        1.0
                    } else if j % 2 == 1 {
                        4.0
                    } else {
                        2.0
                    };
                    w * self.du / 3.0
                }
                Quadrature::Trapezoidal => {
                    if j == 0 {
                        0.5 * self.du
                    } else {
                        self.du
                    }
                }
            })
            .collect()
    }

    /// Whether a log-moneyness `ln(K/S)` falls inside the window centred on spot.
    pub fn covers(&self, log_moneyness: f64) -> bool {
        log_moneyness.abs() <= self.half_width
    }

    /// Strike window `[S e^{-b}, S e^{b}]` for a given spot.
    pub fn strike_window(&self, spot: f64) -> (f64, f64) {
        (
            spot * (-self.half_width).exp(),
            spot * self.half_width.exp(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grid_satisfies_reciprocity() {
        let g = compute_grid(1.25, 7, 10).unwrap();
        assert_eq!(g.size, 1024);
        assert_eq!(g.upper, 128.0);
        assert_relative_eq!(g.du, 0.125);
        assert_relative_eq!(g.du * g.lambda, 2.0 * PI / g.size as f64, max_relative = 1e-14);
        assert_relative_eq!(g.half_width, PI * 1024.0 / 128.0, max_relative = 1e-14);
    }

    #[test]
    fn zero_and_minus_one_are_singular() {
        for alpha in [0.0, -1.0, 1e-14] {
            match compute_grid(alpha, 7, 10) {
                Err(PricingError::InvalidDampening { reason, .. }) => {
                    assert!(reason.contains("singular"), "alpha={alpha}: {reason}")
                }
                other => panic!("alpha={alpha}: expected singular error, got {other:?}"),
            }
        }
    }

    #[test]
    fn negative_alpha_is_wrong_signed() {
        match compute_grid(-0.5, 7, 10) {
            Err(PricingError::InvalidDampening { reason, .. }) => {
                assert!(reason.contains("alpha > 0"))
            }
            other => panic!("expected wrong-sign error, got {other:?}"),
        }
        assert!(compute_grid(f64::NAN, 7, 10).is_err());
    }

    #[test]
    fn time_value_rejects_alpha_one() {
        let config = FftConfig::new(1.0, 7, 10).with_transform(FftTransform::TimeValue);
        match grid_from_config(&config) {
            Err(PricingError::InvalidDampening { reason, .. }) => assert!(reason.contains("time value")),
            other => panic!("expected time value singularity, got {other:?}"),
        }
        assert!(grid_from_config(&FftConfig::new(1.0, 7, 10)).is_ok());
        assert_eq!(required_moments(FftTransform::TimeValue, 1.25), vec![2.25, -0.25]);
    }

    #[test]
    fn error_controls_are_validated() {
        let mut config = FftConfig::default();
        config.truncation_tol = 0.0;
        assert!(matches!(
            grid_from_config(&config),
            Err(PricingError::InvalidInput { .. })
        ));
    }

    #[test]
    fn exponents_are_bounded() {
        assert!(compute_grid(1.0, 7, 0).is_err());
        assert!(compute_grid(1.0, 7, MAX_N + 1).is_err());
        assert!(compute_grid(1.0, MAX_TRUNC + 1, 10).is_err());
    }

    #[test]
    fn simpson_weights_integrate_polynomials() {
        let g = compute_grid(1.0, 3, 6).unwrap();
        let w = g.weights(Quadrature::Simpson);
        assert_eq!(w.len(), 64);
        // Drop the last node so the rule closes on an even panel count: integral of u^2.
        let approx: f64 = (0..63).map(|j| {
            let u = g.frequency(j);
            let wj = if j == 62 { g.du / 3.0 } else { w[j] };
            wj * u * u
        }).sum();
        let end = g.frequency(62);
        assert_relative_eq!(approx, end.powi(3) / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn trapezoid_weights_halve_first_node() {
        let g = compute_grid(1.0, 7, 10).unwrap();
        let w = g.weights(Quadrature::Trapezoidal);
        assert_relative_eq!(w[0], 0.5 * g.du);
        assert_relative_eq!(w[1], g.du);
    }

    #[test]
    fn window_is_symmetric_around_spot() {
        let g = compute_grid(1.25, 7, 10).unwrap();
        let (lo, hi) = g.strike_window(100.0);
        assert_relative_eq!((lo * hi).sqrt(), 100.0, max_relative = 1e-12);
        assert!(g.covers(0.5));
        assert!(!g.covers(g.half_width + 1e-9));
    }
}
