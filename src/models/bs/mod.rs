// Closed-form Black-Scholes-Merton helpers. The FFT pricer adds these back on top of
// its control-variate residual; tests use them as the reference oracle and as the
// bracketing reference solver for implied volatility.

use roots::find_root_brent;

use crate::error::{PricingError, Result};
use crate::pricing::types::OptionType;

#[allow(non_snake_case)]
fn norm_cdf(x: f64) -> f64 {
    // erfc keeps relative precision in the lower tail
    0.5 * libm::erfc(-x / (2.0_f64).sqrt())
}

fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

#[allow(non_snake_case)]
fn d1_d2(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> (f64, f64) {
    let sqrt_t = T.sqrt();
    let d1 = ((S / K).ln() + (r - q + 0.5 * sigma.powi(2)) * T) / (sigma * sqrt_t);
    (d1, d1 - sigma * sqrt_t)
}

/// Price of a European call option under Black-Scholes-Merton assumptions.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (S * (-q * T).exp() - K * (-r * T).exp()).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    S * (-q * T).exp() * norm_cdf(d1) - K * (-r * T).exp() * norm_cdf(d2)
}

/// Price of a European put option under Black-Scholes-Merton assumptions.
#[allow(non_snake_case)]
pub fn bs_put_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (K * (-r * T).exp() - S * (-q * T).exp()).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    K * (-r * T).exp() * norm_cdf(-d2) - S * (-q * T).exp() * norm_cdf(-d1)
}

/// Price dispatch on option type.
#[allow(non_snake_case)]
pub fn bs_price(option_type: OptionType, S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    match option_type {
        OptionType::Call => bs_call_price(S, K, r, q, T, sigma),
        OptionType::Put => bs_put_price(S, K, r, q, T, sigma),
    }
}

/// Vega (same for calls and puts), per unit of volatility.
#[allow(non_snake_case)]
pub fn bs_vega(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return 0.0;
    }
    let (d1, _) = d1_d2(S, K, r, q, T, sigma);
    S * (-q * T).exp() * norm_pdf(d1) * T.sqrt()
}

/// Brent-bracketed implied volatility on `[1e-6, 5]`.
///
/// Used as a reference when checking the FFT-backed solver.
#[allow(non_snake_case, clippy::too_many_arguments)]
pub fn bs_implied_vol(
    option_type: OptionType,
    price: f64,
    S: f64,
    K: f64,
    r: f64,
    q: f64,
    T: f64,
    tol: f64,
) -> Result<f64> {
    let objective = |sigma: f64| bs_price(option_type, S, K, r, q, T, sigma) - price;
    let mut convergency = tol;
    find_root_brent(1e-6, 5.0, &objective, &mut convergency).map_err(|e| {
        PricingError::numerical(format!("closed-form implied vol search failed: {e:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn textbook_call_value() {
        // S=100, K=100, r=5%, q=2%, T=1, vol=20%
        let c = bs_call_price(100.0, 100.0, 0.05, 0.02, 1.0, 0.2);
        assert_abs_diff_eq!(c, 9.2270, epsilon = 5e-4);
    }

    #[test]
    fn parity_holds() {
        let (s, k, r, q, t, v) = (100.0, 90.0, 0.03, 0.01, 0.5, 0.3);
        let lhs = bs_call_price(s, k, r, q, t, v) - bs_put_price(s, k, r, q, t, v);
        let rhs = s * (-q * t).exp() - k * (-r * t).exp();
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-10);
    }

    #[test]
    fn vega_matches_bump() {
        let (s, k, r, q, t, v) = (100.0, 105.0, 0.02, 0.0, 0.75, 0.25);
        let h = 1e-5;
        let fd = (bs_call_price(s, k, r, q, t, v + h) - bs_call_price(s, k, r, q, t, v - h)) / (2.0 * h);
        assert_abs_diff_eq!(bs_vega(s, k, r, q, t, v), fd, epsilon = 1e-6);
    }

    #[test]
    fn brent_recovers_vol() {
        let p = bs_put_price(100.0, 95.0, 0.01, 0.0, 0.5, 0.35);
        let iv = bs_implied_vol(OptionType::Put, p, 100.0, 95.0, 0.01, 0.0, 0.5, 1e-12).unwrap();
        assert_abs_diff_eq!(iv, 0.35, epsilon = 1e-8);
    }
}
