//! Secant implied-volatility solver on top of the FFT pricer.
//!
//! The solve is a bounded state machine:
//!
//! - **Seeding**: the first volatility is `seed_vol`, or a Corrado-Miller estimate for
//!   at-the-money quotes. The second secant point sits `seed_bump` above it.
//! - **Iterating**: each step rebuilds `phi` from the model at the current volatility,
//!   reprices on the fixed grid and applies a guarded secant update.
//! - **Converged** when `|observed - model| <= iv_tol`.
//! - **Failed** on a hard error, or with `converged = false` once `max_iter` pricings
//!   have been spent.

use rayon::prelude::*;
use serde::Serialize;
use std::f64::consts::PI;
use tracing::{debug, info, warn};

use crate::error::{PricingError, Result};
use crate::implied::cache::{IvCache, IvCacheKey};
use crate::implied::moneyness::Moneyness;
use crate::model_params::Model;
use crate::pricing::config::{PricingConfig, SolverConfig};
use crate::pricing::fft::FftPricer;
use crate::pricing::integration::price_direct;
use crate::pricing::types::{MarketQuote, OptionInputs, OptionType};

/// Pricing route used for the final iterations of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingRoute {
    Fft,
    /// Gil-Pelaez inversion, used at the money when the FFT route misbehaves
    Direct,
}

/// Last secant pair of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IvIterationState {
    pub current_vol: f64,
    pub previous_vol: f64,
    pub current_error: f64,
    pub previous_error: f64,
    pub iteration: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IvSolution {
    /// Converged volatility, or the best estimate seen when `converged` is false
    pub volatility: f64,
    pub converged: bool,
    /// Number of pricings spent
    pub iterations: usize,
    /// `observed - model` at `volatility`
    pub price_error: f64,
    pub route: PricingRoute,
    pub state: IvIterationState,
}

impl IvSolution {
    /// Turns a non-converged solution into `MaxIterationsExceeded`.
    pub fn into_result(self) -> Result<f64> {
        if self.converged {
            Ok(self.volatility)
        } else {
            Err(PricingError::MaxIterationsExceeded {
                best_estimate: self.volatility,
                price_error: self.price_error,
                iterations: self.iterations,
            })
        }
    }
}

/// Corrado-Miller seed; equals Brenner-Subrahmanyam when the forward is at the money.
pub fn atm_seed(inputs: &OptionInputs, observed_price: f64) -> f64 {
    let s = inputs.spot * (-inputs.dividend * inputs.maturity).exp();
    let k = inputs.strike * inputs.discount_factor();
    let call = match inputs.option_type {
        OptionType::Call => observed_price,
        OptionType::Put => observed_price + s - k,
    };
    let a = call - 0.5 * (s - k);
    let disc = (a * a - (s - k).powi(2) / PI).max(0.0);
    (2.0 * PI / inputs.maturity).sqrt() / (s + k) * (a + disc.sqrt())
}

/// Volatilities known to sit below (`error > 0`) and above (`error < 0`) the root.
#[derive(Debug, Default)]
struct Bracket {
    below: Option<f64>,
    above: Option<f64>,
}

impl Bracket {
    fn record(&mut self, vol: f64, error: f64) {
        if error > 0.0 {
            self.below = Some(self.below.map_or(vol, |b| b.max(vol)));
        } else if error < 0.0 {
            self.above = Some(self.above.map_or(vol, |a| a.min(vol)));
        }
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        match (self.below, self.above) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            _ => None,
        }
    }
}

/// One secant solve against a pricing closure `price(vol, route)`.
///
/// The run owns the route, the bracket and the best point so far. Moving to the
/// direct route resets both, since errors priced on different routes do not compare.
struct SolveRun<'a, F> {
    cfg: &'a SolverConfig,
    price: F,
    observed: f64,
    atm: bool,
    route: PricingRoute,
    bracket: Bracket,
    best: (f64, f64),
    iterations: usize,
}

impl<'a, F> SolveRun<'a, F>
where
    F: FnMut(f64, PricingRoute) -> Result<f64>,
{
    fn new(
        cfg: &'a SolverConfig,
        observed: f64,
        atm: bool,
        route: PricingRoute,
        price: F,
    ) -> Self {
        Self {
            cfg,
            price,
            observed,
            atm,
            route,
            bracket: Bracket::default(),
            best: (f64::NAN, f64::INFINITY),
            iterations: 0,
        }
    }

    fn track(&mut self, vol: f64, error: f64) {
        self.iterations += 1;
        self.bracket.record(vol, error);
        if error.abs() < self.best.1.abs() {
            self.best = (vol, error);
        }
    }

    fn switch_to_direct(&mut self, vol: f64) {
        self.route = PricingRoute::Direct;
        self.bracket = Bracket::default();
        self.best = (vol, f64::INFINITY);
    }

    /// `observed - model price` at `vol`, on the current route.
    ///
    /// At the money an unstable or unresolved FFT pass moves the run onto the direct route.
    fn error_at(&mut self, vol: f64) -> Result<f64> {
        match (self.price)(vol, self.route) {
            Err(
                err @ (PricingError::InvalidDampening { .. }
                | PricingError::TruncationExceeded { .. }),
            ) if self.atm && self.route == PricingRoute::Fft => {
                warn!(
                    vol,
                    error = %err,
                    "fft route failed at the money, switching to direct integration"
                );
                self.switch_to_direct(vol);
                let price = (self.price)(vol, self.route)?;
                Ok(self.observed - price)
            }
            other => other.map(|price| self.observed - price),
        }
    }

    fn run(mut self, seed: f64) -> Result<IvSolution> {
        let cfg = self.cfg;
        self.best = (seed, f64::INFINITY);

        let mut prev_vol = seed;
        let mut prev_err = self.error_at(seed)?;
        self.track(prev_vol, prev_err);
        if prev_err.abs() <= cfg.iv_tol || self.iterations >= cfg.max_iter {
            let state = IvIterationState {
                current_vol: prev_vol,
                previous_vol: prev_vol,
                current_error: prev_err,
                previous_error: prev_err,
                iteration: self.iterations,
            };
            return Ok(self.finish(state));
        }

        let mut cur_vol = (seed * (1.0 + cfg.seed_bump)).min(cfg.max_vol);
        if cur_vol == prev_vol {
            cur_vol = seed / (1.0 + cfg.seed_bump);
        }
        let route_before = self.route;
        let mut cur_err = self.error_at(cur_vol)?;
        self.track(cur_vol, cur_err);
        if self.route != route_before {
            prev_err = self.error_at(prev_vol)?;
            self.track(prev_vol, prev_err);
        }

        // Overshoot is only meaningful once the current point came from a secant step.
        let mut stepped = false;
        loop {
            let state = IvIterationState {
                current_vol: cur_vol,
                previous_vol: prev_vol,
                current_error: cur_err,
                previous_error: prev_err,
                iteration: self.iterations,
            };
            if cur_err.abs() <= cfg.iv_tol || self.iterations >= cfg.max_iter {
                return Ok(self.finish(state));
            }

            let overshoot = stepped
                && cur_err.signum() != prev_err.signum()
                && cur_err.abs() > prev_err.abs();
            if self.atm && self.route == PricingRoute::Fft && overshoot {
                warn!(
                    vol = cur_vol,
                    "secant overshoot at the money, switching to direct integration"
                );
                self.switch_to_direct(cur_vol);
                prev_err = self.error_at(prev_vol)?;
                self.track(prev_vol, prev_err);
                cur_err = self.error_at(cur_vol)?;
                self.track(cur_vol, cur_err);
                stepped = false;
                continue;
            }

            let denom = cur_err - prev_err;
            if denom == 0.0 {
                warn!(vol = cur_vol, iterations = self.iterations, "implied vol solver stalled");
                return Err(PricingError::StalledSolver {
                    last_estimate: cur_vol,
                    iterations: self.iterations,
                });
            }

            let mut next = cur_vol - cur_err * (cur_vol - prev_vol) / denom;
            if !next.is_finite() || next <= 0.0 {
                next = 0.5 * cur_vol;
            }
            next = next.min(2.0 * cur_vol).min(cfg.max_vol).max(cfg.min_vol);
            if let Some((lo, hi)) = self.bracket.bounds() {
                if next <= lo || next >= hi {
                    next = 0.5 * (lo + hi);
                }
            }

            let route_before = self.route;
            let next_err = self.error_at(next)?;
            self.track(next, next_err);
            stepped = true;
            debug!(
                iteration = self.iterations,
                vol = next,
                error = next_err,
                route = ?self.route,
                "implied vol iteration"
            );

            prev_vol = cur_vol;
            prev_err = cur_err;
            cur_vol = next;
            cur_err = next_err;
            if self.route != route_before {
                prev_err = self.error_at(prev_vol)?;
                self.track(prev_vol, prev_err);
            }
        }
    }

    fn finish(self, state: IvIterationState) -> IvSolution {
        let converged = state.current_error.abs() <= self.cfg.iv_tol;
        let (volatility, price_error) = if converged {
            (state.current_vol, state.current_error)
        } else {
            self.best
        };
        if converged {
            info!(vol = volatility, iterations = self.iterations, "implied vol converged");
        } else {
            warn!(
                best = volatility,
                error = price_error,
                iterations = self.iterations,
                "implied vol hit iteration cap"
            );
        }
        IvSolution {
            volatility,
            converged,
            iterations: self.iterations,
            price_error,
            route: self.route,
            state,
        }
    }
}

/// Implied-volatility solver bound to one configuration.
///
/// The FFT grid and transform plan are built once here and reused by every pricing
/// of every solve, so only the characteristic function changes between iterations.
#[derive(Debug, Clone)]
pub struct ImpliedVolSolver {
    config: PricingConfig,
    pricer: FftPricer,
}

impl ImpliedVolSolver {
    pub fn new(config: PricingConfig) -> Result<Self> {
        validate_solver_config(&config.solver)?;
        let pricer = FftPricer::new(&config.fft)?;
        Ok(Self { config, pricer })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn pricer(&self) -> &FftPricer {
        &self.pricer
    }

    /// Solves for the volatility of `model` that reproduces `quote.observed_price`.
    ///
    /// `model` is a template: its volatility is replaced on every iteration and its
    /// other parameters are held fixed.
    pub fn solve(
        &self,
        quote: &MarketQuote,
        model: &Model,
        cache: Option<&mut IvCache>,
    ) -> Result<IvSolution> {
        let Some(cache) = cache else {
            return self.solve_uncached(quote, model);
        };
        let key = IvCacheKey::new(quote, model, &self.config);
        if let Some(hit) = cache.get(&key) {
            debug!(strike = quote.inputs.strike, vol = hit.volatility, "implied vol cache hit");
            return Ok(hit);
        }
        let solution = self.solve_uncached(quote, model)?;
        cache.insert(key, solution);
        Ok(solution)
    }

    /// Solves independent quotes in parallel, one result per quote in input order.
    pub fn solve_batch(&self, quotes: &[MarketQuote], model: &Model) -> Vec<Result<IvSolution>> {
        quotes
            .par_iter()
            .map(|quote| self.solve_uncached(quote, model))
            .collect()
    }

    fn solve_uncached(&self, quote: &MarketQuote, model: &Model) -> Result<IvSolution> {
        let cfg = &self.config.solver;
        let inputs = &quote.inputs;
        inputs.validate()?;
        model.validate()?;
        if model.volatility().is_none() {
            return Err(PricingError::UnsupportedModel {
                model: model.name(),
                operation: "implied volatility",
            });
        }

        let observed = quote.observed_price;
        let (lower, upper) = inputs.price_bounds();
        if !observed.is_finite() || observed <= lower || observed >= upper {
            return Err(PricingError::ArbitrageViolation {
                observed,
                lower,
                upper,
            });
        }

        // Seeding
        let moneyness =
            Moneyness::classify(inputs.option_type, inputs.spot, inputs.strike, cfg.atm_eps);
        let atm = moneyness.is_atm();
        let seed = if atm {
            atm_seed(inputs, observed)
        } else {
            cfg.seed_vol
        };
        let seed = seed.clamp(cfg.min_vol, cfg.max_vol);
        let route = if atm && cfg.prefer_direct_at_money {
            PricingRoute::Direct
        } else {
            PricingRoute::Fft
        };
        debug!(strike = inputs.strike, ?moneyness, seed, route = ?route, "implied vol seeding");

        let price = |vol: f64, route: PricingRoute| self.price_at(model, inputs, vol, route);
        SolveRun::new(cfg, observed, atm, route, price).run(seed)
    }

    fn price_at(
        &self,
        model: &Model,
        inputs: &OptionInputs,
        vol: f64,
        route: PricingRoute,
    ) -> Result<f64> {
        let phi = model.with_volatility(vol)?.characteristic_function_for(inputs)?;
        match route {
            PricingRoute::Fft => Ok(self.pricer.price(&phi, inputs)?.price),
            PricingRoute::Direct => Ok(price_direct(&phi, inputs, &self.config.integration)?.price),
        }
    }
}

fn validate_solver_config(cfg: &SolverConfig) -> Result<()> {
    let positive = [
        ("seed_vol", cfg.seed_vol),
        ("seed_bump", cfg.seed_bump),
        ("iv_tol", cfg.iv_tol),
        ("min_vol", cfg.min_vol),
        ("max_vol", cfg.max_vol),
    ];
    for (name, value) in positive {
        crate::error::ensure_positive(name, value)?;
    }
    crate::error::ensure_finite("atm_eps", cfg.atm_eps)?;
    if cfg.min_vol >= cfg.max_vol {
        return Err(PricingError::invalid_input(format!(
            "min_vol {} must be below max_vol {}",
            cfg.min_vol, cfg.max_vol
        )));
    }
    if cfg.max_iter == 0 {
        return Err(PricingError::invalid_input("max_iter must be >= 1"));
    }
    Ok(())
}

/// One-shot solve with a freshly built solver.
pub fn solve(
    quote: &MarketQuote,
    model: &Model,
    config: &PricingConfig,
    cache: Option<&mut IvCache>,
) -> Result<IvSolution> {
    ImpliedVolSolver::new(*config)?.solve(quote, model, cache)
}
