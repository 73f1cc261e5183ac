//! Carr-Madan FFT pricer.
//!
//! One forward FFT of length `2^n` turns the dampened call transform
//!
//! ```text
//! psi(u) = e^{-rT} phi(u - i(alpha + 1)) / (alpha^2 + alpha - u^2 + i (2 alpha + 1) u)
//! ```
//!
//! into call prices on a uniform log-strike grid `k_m = k_0 + m lambda`:
//!
//! ```text
//! C(k_m) = e^{-alpha k_m} / pi * Re( sum_j e^{-i u_j k_0} psi(u_j) w_j e^{-2 pi i j m / N} )
//! ```
//!
//! The window is anchored on `ln S` and shifted by less than half a step so that the
//! requested strike sits exactly on a node. Puts come from put/call parity.
//!
//! With the control variate on, only `phi - phi_ref` is transformed, where `phi_ref` is
//! a Black-Scholes-Merton characteristic function matched to the decay of `|phi|`, and
//! the closed-form reference price is added back on every node. The residual decays
//! much faster than `phi` itself at short maturities, which is where a plain transform
//! truncated at `B = 2^trunc` breaks down.
//!
//! Away from the money [`FftTransform::TimeValue`] prices the out-of-the-money time value
//! `z(x)`, `x = ln(K / S)`, through the transform of `sinh(alpha x) z(x)`:
//!
//! ```text
//! zeta(w)  = 1 / (1 + iw) - e^{(r-q)T} / (iw) - phi_x(w - i) / (w^2 - iw)
//! gamma(v) = e^{-rT} (zeta(v - i alpha) - zeta(v + i alpha)) / 2
//! ```

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{PricingError, Result};
use crate::implied::moneyness::is_atm;
use crate::models::bs::{bs_call_price, bs_price};
use crate::models::cf::BlackScholesCharFn;
use crate::models::traits::CharacteristicFunction;
use crate::models::utils::log_moneyness;
use crate::pricing::config::{FftConfig, FftTransform};
use crate::pricing::damping::{
    damping_denominator, grid_from_config, required_moments, FftGridSpec,
};
use crate::pricing::types::{FftPrice, OptionInputs, OptionType, PriceCurve};

/// Maturities below this many years are priced at intrinsic value.
pub const MIN_MATURITY: f64 = 1e-8;

const I: Complex64 = Complex64::new(0.0, 1.0);

/// FFT pricer bound to one grid.
///
/// Building the pricer validates the dampening factor, derives the grid, computes the
/// quadrature weights and plans the transform. All of that is reused by every call,
/// so a solver builds one pricer and prices many volatilities with it.
#[derive(Clone)]
pub struct FftPricer {
    config: FftConfig,
    grid: FftGridSpec,
    weights: Vec<f64>,
    plan: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for FftPricer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftPricer")
            .field("config", &self.config)
            .field("grid", &self.grid)
            .finish()
    }
}

impl FftPricer {
    pub fn new(config: &FftConfig) -> Result<Self> {
        let grid = grid_from_config(config)?;
        let weights = grid.weights(config.quadrature);
        let plan = FftPlanner::new().plan_fft_forward(grid.size);
        Ok(Self {
            config: *config,
            grid,
            weights,
            plan,
        })
    }

    pub fn grid(&self) -> &FftGridSpec {
        &self.grid
    }

    pub fn config(&self) -> &FftConfig {
        &self.config
    }

    /// Prices one option; the strike lands exactly on a grid node.
    ///
    /// The returned curve holds prices of the same right for every node of the pass.
    pub fn price<C>(&self, phi: &C, inputs: &OptionInputs) -> Result<FftPrice>
    where
        C: CharacteristicFunction + ?Sized,
    {
        inputs.validate()?;
        let half = self.grid.size / 2;
        let ln_strike = inputs.strike.ln();

        if inputs.maturity < MIN_MATURITY {
            let k0 = ln_strike - half as f64 * self.grid.lambda;
            return Ok(FftPrice {
                price: inputs.intrinsic(),
                curve: self.intrinsic_curve(inputs, k0),
                strike_index: half,
            });
        }

        let moneyness = log_moneyness(inputs.strike, inputs.spot);
        let offset = (moneyness / self.grid.lambda).round();
        let index = half as f64 + offset;
        if !self.grid.covers(moneyness) || index < 0.0 || index >= self.grid.size as f64 {
            let (lower, upper) = self.grid.strike_window(inputs.spot);
            return Err(PricingError::StrikeOutOfRange {
                strike: inputs.strike,
                lower,
                upper,
            });
        }
        let strike_index = index as usize;
        let k0 = ln_strike - strike_index as f64 * self.grid.lambda;

        let transform = match self.config.transform {
            FftTransform::TimeValue if !is_atm(inputs.spot, inputs.strike, self.config.atm_eps) => {
                FftTransform::TimeValue
            }
            _ => FftTransform::DampedCall,
        };
        self.check_moments(phi, transform)?;
        let reference = self.reference(phi, inputs);

        let curve = match transform {
            FftTransform::DampedCall => {
                self.call_curve(phi, reference.as_ref(), inputs, k0, strike_index)?
            }
            FftTransform::TimeValue => {
                let x0 = k0 - inputs.spot.ln();
                self.time_value_curve(phi, reference.as_ref(), inputs, x0, strike_index)?
            }
        };
        let price = curve.points[strike_index].1;
        if !price.is_finite() {
            return Err(PricingError::InvalidDampening {
                alpha: self.grid.alpha,
                reason: format!("priced value {price} is not finite"),
            });
        }

        debug!(
            strike = inputs.strike,
            maturity = inputs.maturity,
            option_type = %inputs.option_type,
            transform = ?transform,
            control_variate = reference.is_some(),
            strike_index,
            price,
            "fft pass"
        );
        Ok(FftPrice {
            price,
            curve,
            strike_index,
        })
    }

    /// Full curve of one pass with the window centred on `ln S`.
    ///
    /// Always uses the dampened call transform, which is defined at the money.
    pub fn price_curve<C>(&self, phi: &C, inputs: &OptionInputs) -> Result<PriceCurve>
    where
        C: CharacteristicFunction + ?Sized,
    {
        inputs.validate()?;
        let k0 = inputs.spot.ln() - self.grid.half_width;
        if inputs.maturity < MIN_MATURITY {
            return Ok(self.intrinsic_curve(inputs, k0));
        }
        self.check_moments(phi, FftTransform::DampedCall)?;
        let reference = self.reference(phi, inputs);
        self.call_curve(phi, reference.as_ref(), inputs, k0, self.grid.size / 2)
    }

    /// Prices many strikes from a single pass centred on spot.
    ///
    /// The strike in `inputs` is ignored. Off-node strikes are interpolated with
    /// 4-point Lagrange interpolation in log-strike, so accuracy depends on `lambda`:
    /// use a finer grid than for single-strike pricing.
    pub fn price_strikes<C>(
        &self,
        phi: &C,
        inputs: &OptionInputs,
        strikes: &[f64],
    ) -> Result<Vec<(f64, f64)>>
    where
        C: CharacteristicFunction + ?Sized,
    {
        let curve = self.price_curve(phi, inputs)?;
        let (lower, upper) = self.grid.strike_window(inputs.spot);
        strikes
            .iter()
            .map(|&strike| {
                inputs.with_strike(strike).validate()?;
                if inputs.maturity < MIN_MATURITY {
                    return Ok((strike, inputs.with_strike(strike).intrinsic()));
                }
                let price = curve
                    .interpolate(strike)
                    .ok_or(PricingError::StrikeOutOfRange {
                        strike,
                        lower,
                        upper,
                    })?;
                Ok((strike, price))
            })
            .collect()
    }

    /// The transform needs `E[S_T^p]` finite at every shifted contour it evaluates.
    fn check_moments<C>(&self, phi: &C, transform: FftTransform) -> Result<()>
    where
        C: CharacteristicFunction + ?Sized,
    {
        let alpha = self.grid.alpha;
        match required_moments(transform, alpha)
            .into_iter()
            .find(|&order| !phi.moment_exists(order))
        {
            Some(order) => Err(PricingError::InvalidDampening {
                alpha,
                reason: format!("moment E[S_T^{order}] is infinite; lower alpha"),
            }),
            None => Ok(()),
        }
    }

    /// Black-Scholes-Merton control variate, or `None` when disabled or when `|phi|`
    /// yields no usable variance.
    ///
    /// The reference variance solves `|phi(h)| = exp(-sigma^2 T h^2 / 2)` at
    /// `h = max(1, 1 / sqrt(T))`, so it reproduces `phi` exactly for a lognormal model.
    fn reference<C>(&self, phi: &C, inputs: &OptionInputs) -> Option<BlackScholesCharFn>
    where
        C: CharacteristicFunction + ?Sized,
    {
        if !self.config.control_variate {
            return None;
        }
        let t = inputs.maturity;
        let h = t.sqrt().recip().max(1.0);
        let variance = -2.0 * phi.cf(Complex64::new(h, 0.0)).norm().ln() / (h * h * t);
        (variance.is_finite() && variance > 0.0).then(|| {
            BlackScholesCharFn::new(
                inputs.spot,
                inputs.rate,
                inputs.dividend,
                t,
                variance.sqrt(),
            )
        })
    }

    /// Samples `kernel` on the frequency grid, applies the quadrature weights and the
    /// `e^{-i u x0}` twiddle, and runs the FFT in place.
    ///
    /// Also returns `|kernel(u_max)| u_max`, the size of the discarded tail when the
    /// kernel decays like `1 / u^2`.
    fn transform<K>(&self, kernel: K, x0: f64) -> Result<(Vec<Complex64>, f64)>
    where
        K: Fn(f64) -> Complex64,
    {
        let values: Vec<Complex64> = (0..self.grid.size)
            .map(|j| kernel(self.grid.frequency(j)))
            .collect();
        if let Some(j) = values.iter().position(|z| !z.re.is_finite() || !z.im.is_finite()) {
            return Err(PricingError::InvalidDampening {
                alpha: self.grid.alpha,
                reason: format!(
                    "dampened transform is not finite at u={}",
                    self.grid.frequency(j)
                ),
            });
        }
        let last = self.grid.size - 1;
        let tail = values[last].norm() * self.grid.frequency(last);

        let mut buffer: Vec<Complex64> = values
            .iter()
            .zip(&self.weights)
            .enumerate()
            .map(|(j, (value, &w))| {
                Complex64::from_polar(1.0, -self.grid.frequency(j) * x0) * value * w
            })
            .collect();
        self.plan.process(&mut buffer);
        Ok((buffer, tail))
    }

    fn ensure_truncation(&self, estimate: f64, spot: f64) -> Result<()> {
        let tolerance = self.config.truncation_tol * spot;
        if estimate > tolerance {
            return Err(PricingError::TruncationExceeded {
                estimate,
                tolerance,
            });
        }
        Ok(())
    }

    /// Dampened call pass on the log-strike window starting at `k0`.
    ///
    /// The truncation estimate is taken at node `check_index`.
    fn call_curve<C>(
        &self,
        phi: &C,
        reference: Option<&BlackScholesCharFn>,
        inputs: &OptionInputs,
        k0: f64,
        check_index: usize,
    ) -> Result<PriceCurve>
    where
        C: CharacteristicFunction + ?Sized,
    {
        let alpha = self.grid.alpha;
        let discount = inputs.discount_factor();
        let kernel = |u: f64| {
            let z = Complex64::new(u, -(alpha + 1.0));
            let mut value = phi.cf(z);
            if let Some(bs) = reference {
                value -= bs.cf(z);
            }
            discount * value / damping_denominator(alpha, u)
        };
        let (buffer, tail) = self.transform(kernel, k0)?;

        let k_check = k0 + check_index as f64 * self.grid.lambda;
        self.ensure_truncation((-alpha * k_check).exp() / PI * tail, inputs.spot)?;

        let forward_leg = inputs.spot * (-inputs.dividend * inputs.maturity).exp();
        let points = buffer
            .iter()
            .enumerate()
            .map(|(m, z)| {
                let k = k0 + m as f64 * self.grid.lambda;
                let mut call = (-alpha * k).exp() / PI * z.re;
                if let Some(bs) = reference {
                    call += bs_call_price(
                        inputs.spot,
                        k.exp(),
                        inputs.rate,
                        inputs.dividend,
                        inputs.maturity,
                        bs.vol,
                    );
                }
                let price = if inputs.option_type.is_call() {
                    call
                } else {
                    call - forward_leg + k.exp() * discount
                };
                (k, price)
            })
            .collect();
        Ok(PriceCurve { points })
    }

    /// Time-value pass on the log-moneyness window starting at `x0`.
    fn time_value_curve<C>(
        &self,
        phi: &C,
        reference: Option<&BlackScholesCharFn>,
        inputs: &OptionInputs,
        x0: f64,
        check_index: usize,
    ) -> Result<PriceCurve>
    where
        C: CharacteristicFunction + ?Sized,
    {
        let alpha = self.grid.alpha;
        let ln_spot = inputs.spot.ln();
        let discount = inputs.discount_factor();
        let growth = inputs.forward() / inputs.spot;
        let kernel = |v: f64| {
            let mut value = time_value_kernel(phi, v, alpha, ln_spot, growth);
            if let Some(bs) = reference {
                value -= time_value_kernel(bs, v, alpha, ln_spot, growth);
            }
            discount * value
        };
        let (buffer, tail) = self.transform(kernel, x0)?;

        let x_check = x0 + check_index as f64 * self.grid.lambda;
        let estimate = inputs.spot * tail / (PI * (alpha * x_check).sinh().abs());
        self.ensure_truncation(estimate, inputs.spot)?;

        let forward_leg = inputs.spot * (-inputs.dividend * inputs.maturity).exp();
        let mut points: Vec<(f64, f64)> = buffer
            .iter()
            .enumerate()
            .map(|(m, z)| {
                let x = x0 + m as f64 * self.grid.lambda;
                let strike = inputs.spot * x.exp();
                let otm_right = if x > 0.0 {
                    OptionType::Call
                } else {
                    OptionType::Put
                };
                let mut otm = inputs.spot * z.re / (PI * (alpha * x).sinh());
                if let Some(bs) = reference {
                    otm += bs_price(
                        otm_right,
                        inputs.spot,
                        strike,
                        inputs.rate,
                        inputs.dividend,
                        inputs.maturity,
                        bs.vol,
                    );
                }
                let gap = forward_leg - strike * discount;
                let price = match (otm_right, inputs.option_type) {
                    (OptionType::Call, OptionType::Put) => otm - gap,
                    (OptionType::Put, OptionType::Call) => otm + gap,
                    _ => otm,
                };
                (ln_spot + x, price)
            })
            .collect();

        // x = 0 only lands on a node when ln(K/S) is an exact multiple of lambda.
        for m in 1..points.len().saturating_sub(1) {
            if !points[m].1.is_finite() {
                points[m].1 = 0.5 * (points[m - 1].1 + points[m + 1].1);
            }
        }
        Ok(PriceCurve { points })
    }

    fn intrinsic_curve(&self, inputs: &OptionInputs, k0: f64) -> PriceCurve {
        let points = (0..self.grid.size)
            .map(|m| {
                let k = k0 + m as f64 * self.grid.lambda;
                (k, inputs.with_strike(k.exp()).intrinsic())
            })
            .collect();
        PriceCurve { points }
    }
}

/// Undiscounted `(zeta(v - i alpha) - zeta(v + i alpha)) / 2`; `growth` is `e^{(r-q)T}`.
fn time_value_kernel<C>(phi: &C, v: f64, alpha: f64, ln_spot: f64, growth: f64) -> Complex64
where
    C: CharacteristicFunction + ?Sized,
{
    let zeta = |w: Complex64| {
        let iw = I * w;
        let shifted = w - I;
        // phi of ln(S_T / S) from phi of ln(S_T)
        let phi_x = phi.cf(shifted) * (-I * shifted * ln_spot).exp();
        1.0 / (1.0 + iw) - growth / iw - phi_x / (w * w - iw)
    };
    0.5 * (zeta(Complex64::new(v, -alpha)) - zeta(Complex64::new(v, alpha)))
}

/// Single-shot pricing: builds the grid and plan, then prices one option.
pub fn price_fft<C>(phi: &C, inputs: &OptionInputs, config: &FftConfig) -> Result<FftPrice>
where
    C: CharacteristicFunction + ?Sized,
{
    FftPricer::new(config)?.price(phi, inputs)
}
