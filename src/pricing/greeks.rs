//! Finite-difference Greeks on the FFT price.
//!
//! Every bump rebuilds the characteristic function from the model and reprices with
//! the same pricer, so the grid and the transform plan are shared by all bumps.

use serde::Serialize;

use crate::error::{PricingError, Result};
use crate::model_params::Model;
use crate::pricing::fft::FftPricer;
use crate::pricing::types::OptionInputs;

const SPOT_BUMP: f64 = 1e-3;
const VOL_BUMP: f64 = 1e-4;
const TIME_BUMP: f64 = 1e-4;
const RATE_BUMP: f64 = 1e-4;

/// Sensitivities of one option price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    /// `None` for models without a volatility parameter
    pub vega: Option<f64>,
    /// `-dV/dT`, per year
    pub theta: f64,
    pub rho: f64,
}

fn reprice(pricer: &FftPricer, model: &Model, inputs: &OptionInputs) -> Result<f64> {
    let phi = model.characteristic_function_for(inputs)?;
    Ok(pricer.price(&phi, inputs)?.price)
}

/// Central differences in spot, volatility and rate; theta falls back to a forward
/// difference when the maturity is too short to bump down.
pub fn fft_greeks(pricer: &FftPricer, model: &Model, inputs: &OptionInputs) -> Result<Greeks> {
    let base = reprice(pricer, model, inputs)?;

    let bumped = |change: OptionInputs| reprice(pricer, model, &change);

    let h = SPOT_BUMP * inputs.spot;
    let up = bumped(OptionInputs {
        spot: inputs.spot + h,
        ..*inputs
    })?;
    let down = bumped(OptionInputs {
        spot: inputs.spot - h,
        ..*inputs
    })?;
    let delta = (up - down) / (2.0 * h);
    let gamma = (up - 2.0 * base + down) / (h * h);

    let vega = match model.volatility() {
        Some(sigma) => {
            let bumped_up = model.with_volatility(sigma + VOL_BUMP)?;
            let vol_down = (sigma - VOL_BUMP).max(0.5 * sigma);
            let bumped_down = model.with_volatility(vol_down)?;
            let v_up = reprice(pricer, &bumped_up, inputs)?;
            let v_down = reprice(pricer, &bumped_down, inputs)?;
            Some((v_up - v_down) / (sigma + VOL_BUMP - vol_down))
        }
        None => None,
    };

    let later = bumped(OptionInputs {
        maturity: inputs.maturity + TIME_BUMP,
        ..*inputs
    })?;
    let theta = if inputs.maturity > 2.0 * TIME_BUMP {
        let sooner = bumped(OptionInputs {
            maturity: inputs.maturity - TIME_BUMP,
            ..*inputs
        })?;
        -(later - sooner) / (2.0 * TIME_BUMP)
    } else {
        -(later - base) / TIME_BUMP
    };

    let r_up = bumped(OptionInputs {
        rate: inputs.rate + RATE_BUMP,
        ..*inputs
    })?;
    let r_down = bumped(OptionInputs {
        rate: inputs.rate - RATE_BUMP,
        ..*inputs
    })?;
    let rho = (r_up - r_down) / (2.0 * RATE_BUMP);

    let greeks = Greeks {
        delta,
        gamma,
        vega,
        theta,
        rho,
    };
    if [delta, gamma, theta, rho].iter().any(|g| !g.is_finite()) {
        return Err(PricingError::numerical(format!("non-finite greeks {greeks:?}")));
    }
    Ok(greeks)
}
