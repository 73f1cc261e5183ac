use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Quadrature rule applied to the Fourier integrand before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quadrature {
    /// Weights `du/3 * {1, 4, 2, 4, ...}`
    #[default]
    Simpson,
    /// Weights `du * {1/2, 1, 1, ...}`
    Trapezoidal,
}

/// Fourier representation used for single-strike FFT pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FftTransform {
    /// Dampened call price `exp(alpha k) C(k)`
    #[default]
    DampedCall,
    /// Out-of-the-money time value weighted by `sinh(alpha x)`, for strikes outside
    /// the at-the-money band; inside it the dampened call is used
    TimeValue,
}

/// FFT grid configuration shared by every pass of one pricing or solving call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FftConfig {
    /// Dampening exponent (> 0, calls are damped by `exp(alpha k)`)
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Integration truncation exponent: the frequency domain is `[0, 2^trunc)`
    #[serde(default = "default_trunc")]
    pub trunc: u32,
    /// Transform size exponent: `2^n` points
    #[serde(default = "default_n")]
    pub n: u32,
    /// Quadrature weights
    #[serde(default)]
    pub quadrature: Quadrature,
    /// Transform used by single-strike pricing
    #[serde(default)]
    pub transform: FftTransform,
    /// Relative band `|S - K| / S` inside which `TimeValue` falls back to `DampedCall`
    #[serde(default = "default_atm_eps")]
    pub atm_eps: f64,
    /// Transform only the residual against a Black-Scholes-Merton reference and add
    /// the closed form back
    #[serde(default = "default_control_variate")]
    pub control_variate: bool,
    /// Largest tolerated truncation error estimate, as a fraction of spot
    #[serde(default = "default_truncation_tol")]
    pub truncation_tol: f64,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self::new(default_alpha(), default_trunc(), default_n())
    }
}

impl FftConfig {
    pub fn new(alpha: f64, trunc: u32, n: u32) -> Self {
        Self {
            alpha,
            trunc,
            n,
            quadrature: Quadrature::default(),
            transform: FftTransform::default(),
            atm_eps: default_atm_eps(),
            control_variate: default_control_variate(),
            truncation_tol: default_truncation_tol(),
        }
    }

    pub fn with_quadrature(mut self, quadrature: Quadrature) -> Self {
        self.quadrature = quadrature;
        self
    }

    pub fn with_transform(mut self, transform: FftTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_control_variate(mut self, enabled: bool) -> Self {
        self.control_variate = enabled;
        self
    }

    /// Bit pattern of every field, for cache keys.
    pub(crate) fn fingerprint(&self) -> Vec<u64> {
        vec![
            self.alpha.to_bits(),
            u64::from(self.trunc),
            u64::from(self.n),
            self.quadrature as u64,
            self.transform as u64,
            self.atm_eps.to_bits(),
            u64::from(self.control_variate),
            self.truncation_tol.to_bits(),
        ]
    }
}

/// Implied-volatility solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Initial volatility guess away from the money
    #[serde(default = "default_seed_vol")]
    pub seed_vol: f64,
    /// Relative offset of the second secant point from the seed
    #[serde(default = "default_seed_bump")]
    pub seed_bump: f64,
    /// Relative distance `|S - K| / S` under which a strike counts as at the money
    #[serde(default = "default_atm_eps")]
    pub atm_eps: f64,
    /// Absolute price tolerance for convergence
    #[serde(default = "default_iv_tol")]
    pub iv_tol: f64,
    /// Iteration cap, doubling as the time budget
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Lowest volatility the solver will try
    #[serde(default = "default_min_vol")]
    pub min_vol: f64,
    /// Highest volatility the solver will try
    #[serde(default = "default_max_vol")]
    pub max_vol: f64,
    /// Price at-the-money quotes on the direct integration route from the start
    #[serde(default)]
    pub prefer_direct_at_money: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed_vol: default_seed_vol(),
            seed_bump: default_seed_bump(),
            atm_eps: default_atm_eps(),
            iv_tol: default_iv_tol(),
            max_iter: default_max_iter(),
            min_vol: default_min_vol(),
            max_vol: default_max_vol(),
            prefer_direct_at_money: false,
        }
    }
}

/// Direct (Gil-Pelaez) integration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Upper integration limit in frequency
    #[serde(default = "default_upper")]
    pub upper: f64,
    /// Number of 5-point Gauss-Legendre panels on `[0, upper]`
    #[serde(default = "default_panels")]
    pub panels: usize,
}

impl SolverConfig {
    pub(crate) fn fingerprint(&self) -> Vec<u64> {
        vec![
            self.seed_vol.to_bits(),
            self.seed_bump.to_bits(),
            self.atm_eps.to_bits(),
            self.iv_tol.to_bits(),
            self.max_iter as u64,
            self.min_vol.to_bits(),
            self.max_vol.to_bits(),
            u64::from(self.prefer_direct_at_money),
        ]
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            upper: default_upper(),
            panels: default_panels(),
        }
    }
}

impl IntegrationConfig {
    pub(crate) fn fingerprint(&self) -> Vec<u64> {
        vec![self.upper.to_bits(), self.panels as u64]
    }
}

/// Main configuration struct grouping every engine setting
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub fft: FftConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub integration: IntegrationConfig,
}

impl PricingConfig {
    /// Parses a TOML document; missing fields fall back to the defaults.
    ///
    /// ```toml
    /// [fft]
    /// alpha = 1.5
    /// n = 12
    ///
    /// [solver]
    /// iv_tol = 1e-8
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Bit pattern of every setting that can change a solved volatility.
    pub(crate) fn fingerprint(&self) -> Vec<u64> {
        let mut bits = self.fft.fingerprint();
        bits.extend(self.solver.fingerprint());
        bits.extend(self.integration.fingerprint());
        bits
    }

    /// Production configuration: finer grid, tight price tolerance
    pub fn production() -> Self {
        Self {
            fft: FftConfig::new(1.25, 8, 12),
            solver: SolverConfig {
                iv_tol: 1e-7,
                max_iter: 100,
                ..SolverConfig::default()
            },
            integration: IntegrationConfig::default(),
        }
    }

    /// Fast configuration: the documented `n = 10, trunc = 7` grid
    pub fn fast() -> Self {
        Self {
            fft: FftConfig::new(1.25, 7, 10),
            solver: SolverConfig {
                iv_tol: 1e-4,
                max_iter: 50,
                ..SolverConfig::default()
            },
            integration: IntegrationConfig::default(),
        }
    }

    /// High-precision configuration for research and reference runs
    pub fn research() -> Self {
        Self {
            fft: FftConfig::new(1.25, 9, 14),
            solver: SolverConfig {
                iv_tol: 1e-10,
                max_iter: 200,
                ..SolverConfig::default()
            },
            integration: IntegrationConfig {
                upper: 400.0,
                panels: 1600,
            },
        }
    }

    /// Minimal configuration for quick validation and debugging
    pub fn minimal() -> Self {
        Self {
            fft: FftConfig::new(1.5, 6, 8),
            solver: SolverConfig {
                iv_tol: 1e-3,
                max_iter: 20,
                ..SolverConfig::default()
            },
            integration: IntegrationConfig {
                upper: 100.0,
                panels: 100,
            },
        }
    }
}

fn default_alpha() -> f64 {
    1.25
}

fn default_trunc() -> u32 {
    7
}

fn default_n() -> u32 {
    10
}

fn default_control_variate() -> bool {
    true
}

fn default_truncation_tol() -> f64 {
    1e-5
}

fn default_seed_vol() -> f64 {
    0.25
}

fn default_seed_bump() -> f64 {
    0.1
}

fn default_atm_eps() -> f64 {
    0.01
}

fn default_iv_tol() -> f64 {
    1e-4
}

fn default_max_iter() -> usize {
    100
}

fn default_min_vol() -> f64 {
    1e-4
}

fn default_max_vol() -> f64 {
    5.0
}

fn default_upper() -> f64 {
    200.0
}

fn default_panels() -> usize {
    400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PricingConfig::from_toml_str(
            r#"
            [fft]
            alpha = 1.5
            quadrature = "trapezoidal"

            [solver]
            max_iter = 30
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fft.alpha, 1.5);
        assert_eq!(cfg.fft.trunc, 7);
        assert_eq!(cfg.fft.n, 10);
        assert_eq!(cfg.fft.quadrature, Quadrature::Trapezoidal);
        assert_eq!(cfg.fft.transform, FftTransform::DampedCall);
        assert!(cfg.fft.control_variate);
        assert_eq!(cfg.solver.max_iter, 30);
        assert_eq!(cfg.solver.iv_tol, 1e-4);
        assert_eq!(cfg.integration, IntegrationConfig::default());
    }

    #[test]
    fn transform_options_parse() {
        let cfg = PricingConfig::from_toml_str(
            r#"
            [fft]
            transform = "time_value"
            control_variate = false
            truncation_tol = 1e-3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fft.transform, FftTransform::TimeValue);
        assert!(!cfg.fft.control_variate);
        assert_eq!(cfg.fft.truncation_tol, 1e-3);
        assert_eq!(cfg.fft.atm_eps, 0.01);
    }

    #[test]
    fn fingerprint_tracks_every_block() {
        let base = PricingConfig::default();
        let mut other = base;
        other.fft.n = 12;
        assert_ne!(base.fingerprint(), other.fingerprint());
        let mut other = base;
        other.solver.iv_tol = 1e-9;
        assert_ne!(base.fingerprint(), other.fingerprint());
        let mut other = base;
        other.integration.panels = 10;
        assert_ne!(base.fingerprint(), other.fingerprint());
        assert_eq!(base.fingerprint(), PricingConfig::default().fingerprint());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(PricingConfig::from_toml_str("").unwrap(), PricingConfig::default());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = PricingConfig::from_toml_str("[fft]\nalpha = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::error::PricingError::Config(_)));
    }

    #[test]
    fn presets_tighten_monotonically() {
        let minimal = PricingConfig::minimal();
        let fast = PricingConfig::fast();
        let research = PricingConfig::research();
        assert!(minimal.solver.iv_tol > fast.solver.iv_tol);
        assert!(fast.solver.iv_tol > research.solver.iv_tol);
        assert!(minimal.fft.n < fast.fft.n && fast.fft.n < research.fft.n);
    }
}
