//! Pure-diffusion characteristic functions.

use num_complex::Complex64;

use crate::model_params::HestonParams;
use crate::models::traits::{is_finite_moment, CharacteristicFunction};

const I: Complex64 = Complex64::new(0.0, 1.0);

/// Black-Scholes-Merton characteristic function for `ln(S_T)`.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholesCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub vol: f64,
}

impl BlackScholesCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, vol: f64) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            vol,
        }
    }
}

impl CharacteristicFunction for BlackScholesCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let var = self.vol * self.vol;
        let drift = self.ln_spot + (self.rate - self.dividend - 0.5 * var) * self.maturity;
        (I * u * drift - 0.5 * var * self.maturity * u * u).exp()
    }
}

/// Heston characteristic function in the "little trap" arrangement of Albrecher et al.
///
/// The principal square root keeps `Re(d) >= 0`, so `|g| <= 1` and the logarithm never
/// crosses its branch cut for long maturities.
#[derive(Debug, Clone, Copy)]
pub struct HestonCharFn {
    pub ln_spot: f64,
    pub rate: f64,
    pub dividend: f64,
    pub maturity: f64,
    pub params: HestonParams,
}

impl HestonCharFn {
    pub fn new(spot: f64, rate: f64, dividend: f64, maturity: f64, params: HestonParams) -> Self {
        Self {
            ln_spot: spot.ln(),
            rate,
            dividend,
            maturity,
            params,
        }
    }

    /// Log of the variance-driven part, `C(u) + D(u) v0` without the drift term.
    fn variance_exponent(&self, u: Complex64) -> Complex64 {
        let p = &self.params;
        let one = Complex64::new(1.0, 0.0);
        let sigma2 = p.sigma_v * p.sigma_v;
        let iu = I * u;
        let xi = Complex64::new(p.kappa, 0.0) - p.rho * p.sigma_v * iu;

        let mut d = (xi * xi + sigma2 * (u * u + iu)).sqrt();
        if d.re < 0.0 {
            d = -d;
        }
        let g = (xi - d) / (xi + d);
        let e = (-d * self.maturity).exp();

        let c = (p.kappa * p.theta / sigma2)
            * ((xi - d) * self.maturity - 2.0 * ((one - g * e) / (one - g)).ln());
        let dv = (xi - d) / sigma2 * ((one - e) / (one - g * e));
        c + dv * p.v0
    }

    /// Maturity beyond which `E[S_T^order]` is infinite (Andersen and Piterbarg).
    ///
    /// Moments of order in `[0, 1]` never explode.
    pub fn moment_explosion_time(&self, order: f64) -> f64 {
        if (0.0..=1.0).contains(&order) {
            return f64::INFINITY;
        }
        let p = &self.params;
        let chi = p.rho * p.sigma_v * order - p.kappa;
        let delta = chi * chi - p.sigma_v * p.sigma_v * (order * order - order);
        if delta >= 0.0 {
            if chi <= 0.0 {
                return f64::INFINITY;
            }
            let root = delta.sqrt();
            if root == 0.0 {
                return 2.0 / chi;
            }
            ((chi + root) / (chi - root)).ln() / root
        } else {
            let root = (-delta).sqrt();
            2.0 * root.atan2(chi) / root
        }
    }
}

impl CharacteristicFunction for HestonCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        let drift = self.ln_spot + (self.rate - self.dividend) * self.maturity;
        (I * u * drift + self.variance_exponent(u)).exp()
    }

    fn moment_exists(&self, order: f64) -> bool {
        self.maturity < self.moment_explosion_time(order)
            && is_finite_moment(self.cf(Complex64::new(0.0, -order)))
    }
}
