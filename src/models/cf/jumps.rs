//! Jump-diffusion characteristic functions (Merton, Kou, Bates).
//!
//! Each jump component enters through its compound-Poisson exponent
//! `lambda T (E[e^{iuY}] - 1)` and a drift compensator `-lambda kappa T` with
//! `kappa = E[e^Y] - 1`.

use num_complex::Complex64;

use super::diffusion::HestonCharFn;
use crate::model_params::{BatesParams, KouParams, MertonParams};
use crate::models::traits::{is_finite_moment, CharacteristicFunction};

const I: Complex64 = Complex64::new(0.0, 1.0);

fn lognormal_jump_exponent(u: Complex64, mu_j: f64, sigma_j: f64) -> Complex64 {
    (I * u * mu_j - 0.5 * sigma_j * sigma_j * u * u).exp() - 1.0
}

fn lognormal_compensator(mu_j: f64, sigma_j: f64) -> f64 {
    (mu_j + 0.5 * sigma_j * sigma_j).exp() - 1.0
}

/// Merton lognormal jump-diffusion.
#[derive(Debug, Clone, Copy)]
pub struct MertonCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: MertonParams,
}

impl MertonCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: MertonParams) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
        }
    }
}

impl CharacteristicFunction for MertonCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let var = p.sigma * p.sigma;
        let kappa = lognormal_compensator(p.mu_j, p.sigma_j);
        let drift = self.ln_spot
            + (self.rate - self.dividend - p.lambda * kappa - 0.5 * var) * self.maturity;
        let diffusion = I * u * drift - 0.5 * var * self.maturity * u * u;
        let jumps = p.lambda * self.maturity * lognormal_jump_exponent(u, p.mu_j, p.sigma_j);
        (diffusion + jumps).exp()
    }
}

/// Kou double-exponential jump-diffusion.
#[derive(Debug, Clone, Copy)]
pub struct KouCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: KouParams,
}

impl KouCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: KouParams) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
        }
    }
}

impl CharacteristicFunction for KouCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let var = p.sigma * p.sigma;
        let kappa = p.p_up * p.eta_up / (p.eta_up - 1.0)
            + (1.0 - p.p_up) * p.eta_down / (p.eta_down + 1.0)
            - 1.0;
        let jump_cf = p.p_up * p.eta_up / (p.eta_up - I * u)
            + (1.0 - p.p_up) * p.eta_down / (p.eta_down + I * u);
        let drift = self.ln_spot
            + (self.rate - self.dividend - p.lambda * kappa - 0.5 * var) * self.maturity;
        let exponent = I * u * drift - 0.5 * var * self.maturity * u * u
            + p.lambda * self.maturity * (jump_cf - 1.0);
        exponent.exp()
    }

    /// Exponential jump tails carry moments of order in `(-eta_down, eta_up)` only.
    fn moment_exists(&self, order: f64) -> bool {
        let p = &self.params;
        order < p.eta_up
            && order > -p.eta_down
            && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}

/// Bates: Heston stochastic variance with Merton jumps in the spot.
#[derive(Debug, Clone, Copy)]
pub struct BatesCharFn {
    heston: HestonCharFn,
    lambda: f64,
    mu_j: f64,
    sigma_j: f64,
}

impl BatesCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: BatesParams) -> Self {
        Self {
            heston: HestonCharFn::new(spot, rate, dividend, maturity, params.heston),
            lambda: params.lambda,
            mu_j: params.mu_j,
            sigma_j: params.sigma_j,
        }
    }
}

impl CharacteristicFunction for BatesCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let t = self.heston.maturity;
        let kappa = lognormal_compensator(self.mu_j, self.sigma_j);
        let jumps = self.lambda * t * lognormal_jump_exponent(u, self.mu_j, self.sigma_j)
            - I * u * (self.lambda * kappa * t);
        self.heston.cf(u) * jumps.exp()
    }

    /// Lognormal jumps have every moment; the variance process decides.
    fn moment_exists(&self, order: f64) -> bool {
        self.heston.maturity < self.heston.moment_explosion_time(order)
            && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}
