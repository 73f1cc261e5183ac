//! Pure-jump Lévy characteristic functions: Variance-Gamma, NIG and CGMY.
//!
//! Each is written as `exp(iu (ln S + (r - q + omega) T) + T psi(u))` where `omega`
//! is the convexity correction `-psi(-i)`.

use num_complex::Complex64;
use statrs::function::gamma::gamma;

use crate::model_params::{CgmyParams, NigParams, VarianceGammaParams};
use crate::models::traits::{is_finite_moment, CharacteristicFunction};

const I: Complex64 = Complex64::new(0.0, 1.0);

/// Variance-Gamma (Madan, Carr and Chang 1998).
#[derive(Debug, Clone, Copy)]
pub struct VarianceGammaCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: VarianceGammaParams,
}

impl VarianceGammaCharFn {
    pub fn new(
        spot: f64,
        rate: f64,
        dividend: f64,
        maturity: f64,
        params: VarianceGammaParams,
    ) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
        }
    }
}

impl CharacteristicFunction for VarianceGammaCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let omega = p.martingale_base().ln() / p.nu;
        let drift = self.ln_spot + (self.rate - self.dividend + omega) * self.maturity;
        let base = 1.0 - I * u * (p.theta * p.nu) + 0.5 * p.sigma * p.sigma * p.nu * u * u;
        (I * u * drift - (self.maturity / p.nu) * base.ln()).exp()
    }

    fn moment_exists(&self, order: f64) -> bool {
        let p = &self.params;
        let base = 1.0 - p.theta * p.nu * order - 0.5 * p.sigma * p.sigma * p.nu * order * order;
        base > 0.0 && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}

/// Normal inverse Gaussian.
#[derive(Debug, Clone, Copy)]
pub struct NigCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: NigParams,
}

impl NigCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: NigParams) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
        }
    }

    fn psi(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let a2 = p.alpha * p.alpha;
        let shifted = Complex64::new(p.beta, 0.0) + I * u;
        -p.delta * ((a2 - shifted * shifted).sqrt() - (a2 - p.beta * p.beta).sqrt())
    }
}

impl CharacteristicFunction for NigCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let a2 = p.alpha * p.alpha;
        let omega = p.delta
            * ((a2 - (p.beta + 1.0).powi(2)).sqrt() - (a2 - p.beta * p.beta).sqrt());
        let drift = self.ln_spot + (self.rate - self.dividend + omega) * self.maturity;
        (I * u * drift + self.maturity * self.psi(u)).exp()
    }

    fn moment_exists(&self, order: f64) -> bool {
        let p = &self.params;
        (p.beta + order).abs() < p.alpha
            && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}

/// CGMY tempered stable process (Carr, Geman, Madan and Yor 2002).
#[derive(Debug, Clone, Copy)]
pub struct CgmyCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: CgmyParams,
    gamma_neg_y: f64,
}

impl CgmyCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: CgmyParams) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
            gamma_neg_y: gamma(-params.y),
        }
    }

    fn psi(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let m = Complex64::new(p.m, 0.0);
        let g = Complex64::new(p.g, 0.0);
        p.c * self.gamma_neg_y
            * ((m - I * u).powf(p.y) - p.m.powf(p.y) + (g + I * u).powf(p.y) - p.g.powf(p.y))
    }
}

impl CharacteristicFunction for CgmyCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let omega = -p.c
            * self.gamma_neg_y
            * ((p.m - 1.0).powf(p.y) - p.m.powf(p.y) + (p.g + 1.0).powf(p.y) - p.g.powf(p.y));
        let drift = self.ln_spot + (self.rate - self.dividend + omega) * self.maturity;
        (I * u * drift + self.maturity * self.psi(u)).exp()
    }

    /// Tempered tails: moments exist strictly inside `(-G, M)`.
    fn moment_exists(&self, order: f64) -> bool {
        let p = &self.params;
        order < p.m && order > -p.g && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}
