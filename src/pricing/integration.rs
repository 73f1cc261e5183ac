//! Direct Gil-Pelaez inversion without the FFT.
//!
//! ```text
//! P2 = 1/2 + 1/pi * int_0^U Im(e^{-iuk} phi(u)) / u du
//! P1 = 1/2 + 1/pi * int_0^U Im(e^{-iuk} phi(u - i) / phi(-i)) / u du
//! C  = S e^{-qT} P1 - K e^{-rT} P2
//! ```
//!
//! Slower than the FFT but free of dampening and of the strike grid, which makes it
//! the fallback route for at-the-money solves and an independent check.

use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

use crate::error::{ensure_positive, PricingError, Result};
use crate::models::traits::CharacteristicFunction;
use crate::pricing::config::IntegrationConfig;
use crate::pricing::fft::MIN_MATURITY;
use crate::pricing::types::{OptionInputs, OptionType};

// 5-point Gauss-Legendre on [-1, 1]
const GL_NODES: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683,
    0.0,
    0.538_469_310_105_683,
    0.906_179_845_938_664,
];
const GL_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189,
    0.478_628_670_499_366,
    0.568_888_888_888_889,
    0.478_628_670_499_366,
    0.236_926_885_056_189,
];

/// Price and spot delta from one inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectPrice {
    pub price: f64,
    pub delta: f64,
}

fn gauss_legendre<F: Fn(f64) -> f64>(f: F, upper: f64, panels: usize) -> f64 {
    let width = upper / panels as f64;
    (0..panels)
        .map(|p| {
            let mid = (p as f64 + 0.5) * width;
            let half = 0.5 * width;
            GL_NODES
                .iter()
                .zip(GL_WEIGHTS.iter())
                .map(|(x, w)| w * f(mid + half * x))
                .sum::<f64>()
                * half
        })
        .sum()
}

/// Prices a European option by Gil-Pelaez inversion of `phi`.
pub fn price_direct<C>(
    phi: &C,
    inputs: &OptionInputs,
    config: &IntegrationConfig,
) -> Result<DirectPrice>
where
    C: CharacteristicFunction + ?Sized,
{
    inputs.validate()?;
    ensure_positive("integration upper limit", config.upper)?;
    if config.panels == 0 {
        return Err(PricingError::invalid_input("integration panels must be >= 1"));
    }

    if inputs.maturity < MIN_MATURITY {
        let itm = match inputs.option_type {
            OptionType::Call => inputs.spot > inputs.strike,
            OptionType::Put => inputs.spot < inputs.strike,
        };
        let delta = match (inputs.option_type, itm) {
            (_, false) => 0.0,
            (OptionType::Call, true) => 1.0,
            (OptionType::Put, true) => -1.0,
        };
        return Ok(DirectPrice {
            price: inputs.intrinsic(),
            delta,
        });
    }

    let k = inputs.strike.ln();
    let minus_i = Complex64::new(0.0, -1.0);
    let forward = phi.cf(minus_i);

    let p2_integrand = |u: f64| {
        let z = Complex64::from_polar(1.0, -u * k) * phi.cf(Complex64::new(u, 0.0));
        z.im / u
    };
    let p1_integrand = |u: f64| {
        let z = Complex64::from_polar(1.0, -u * k) * phi.cf(Complex64::new(u, 0.0) + minus_i)
            / forward;
        z.im / u
    };

    let p1 = 0.5 + gauss_legendre(p1_integrand, config.upper, config.panels) / PI;
    let p2 = 0.5 + gauss_legendre(p2_integrand, config.upper, config.panels) / PI;

    let dividend_discount = (-inputs.dividend * inputs.maturity).exp();
    let spot_leg = inputs.spot * dividend_discount;
    let strike_leg = inputs.strike * inputs.discount_factor();
    let (price, delta) = match inputs.option_type {
        OptionType::Call => (spot_leg * p1 - strike_leg * p2, dividend_discount * p1),
        OptionType::Put => (
            strike_leg * (1.0 - p2) - spot_leg * (1.0 - p1),
            -dividend_discount * (1.0 - p1),
        ),
    };

    if !price.is_finite() || !delta.is_finite() {
        return Err(PricingError::numerical(format!(
            "direct integration produced price={price}, delta={delta}"
        )));
    }
    debug!(strike = inputs.strike, p1, p2, price, "direct inversion");
    Ok(DirectPrice { price, delta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bs::{bs_call_price, bs_put_price};
    use crate::models::cf::BlackScholesCharFn;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gauss_legendre_is_exact_on_low_degree() {
        let got = gauss_legendre(|x| x.powi(9) - 3.0 * x * x, 2.0, 3);
        let expected = 2f64.powi(10) / 10.0 - 8.0;
        assert_abs_diff_eq!(got, expected, epsilon = 1e-10);
    }

    #[test]
    fn matches_closed_form() {
        let cfg = IntegrationConfig::default();
        for strike in [85.0, 100.0, 120.0] {
            let call = OptionInputs::call(100.0, strike, 0.05, 1.0, 0.02).unwrap();
            let phi = BlackScholesCharFn::new(100.0, 0.05, 0.02, 1.0, 0.2);
            let c = price_direct(&phi, &call, &cfg).unwrap();
            assert_abs_diff_eq!(c.price, bs_call_price(100.0, strike, 0.05, 0.02, 1.0, 0.2), epsilon = 1e-6);

            let put = call.with_option_type(OptionType::Put);
            let p = price_direct(&phi, &put, &cfg).unwrap();
            assert_abs_diff_eq!(p.price, bs_put_price(100.0, strike, 0.05, 0.02, 1.0, 0.2), epsilon = 1e-6);
            assert_abs_diff_eq!(c.delta - p.delta, (-0.02f64).exp(), epsilon = 1e-12);
        }
    }

    #[test]
    fn delta_matches_bump() {
        let cfg = IntegrationConfig::default();
        let h = 0.01;
        let call = OptionInputs::call(100.0, 95.0, 0.03, 0.5, 0.0).unwrap();
        let phi = BlackScholesCharFn::new(100.0, 0.03, 0.0, 0.5, 0.25);
        let out = price_direct(&phi, &call, &cfg).unwrap();
        let fd = (bs_call_price(100.0 + h, 95.0, 0.03, 0.0, 0.5, 0.25)
            - bs_call_price(100.0 - h, 95.0, 0.03, 0.0, 0.5, 0.25))
            / (2.0 * h);
        assert_abs_diff_eq!(out.delta, fd, epsilon = 1e-6);
    }

    #[test]
    fn rejects_empty_panels() {
        let call = OptionInputs::call(100.0, 95.0, 0.03, 0.5, 0.0).unwrap();
        let phi = BlackScholesCharFn::new(100.0, 0.03, 0.0, 0.5, 0.25);
        let cfg = IntegrationConfig {
            upper: 100.0,
            panels: 0,
        };
        assert!(price_direct(&phi, &call, &cfg).is_err());
    }
}
