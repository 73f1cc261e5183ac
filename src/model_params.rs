//! Model parameter containers and the closed set of model variants.
//!
//! Every variant exposes the same capability: build a characteristic function of
//! `ln(S_T)` for given market scalars. Dispatch is a plain `match` over [`Model`], so
//! pricing code never needs to know which model it is inverting. Volatility changes
//! go through [`Model::with_volatility`], which returns a new value; characteristic
//! functions are rebuilt from it rather than mutated.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, PricingError, Result};
use crate::models::bs::bs_price;
use crate::models::cf::{
    BatesCharFn, BlackScholesCharFn, CgmyCharFn, HestonCharFn, KouCharFn, MertonCharFn,
    ModelCharFn, NigCharFn, VarianceGammaCharFn,
};
use crate::pricing::types::OptionInputs;

/// Black-Scholes-Merton: constant volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BsmParams {
    pub sigma: f64,
}

impl BsmParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("sigma", self.sigma)
    }
}

/// Heston stochastic volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HestonParams {
    /// Initial variance
    pub v0: f64,
    /// Mean-reversion speed
    pub kappa: f64,
    /// Long-run variance
    pub theta: f64,
    /// Volatility of variance
    pub sigma_v: f64,
    /// Spot/variance correlation in [-1, 1]
    pub rho: f64,
}

impl HestonParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("v0", self.v0)?;
        ensure_positive("kappa", self.kappa)?;
        ensure_positive("theta", self.theta)?;
        ensure_positive("sigma_v", self.sigma_v)?;
        ensure_finite("rho", self.rho)?;
        if self.rho.abs() > 1.0 {
            return Err(PricingError::invalid_input(format!(
                "rho must be in [-1, 1], got {}",
                self.rho
            )));
        }
        Ok(())
    }
}

/// Merton lognormal jump-diffusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MertonParams {
    /// Diffusive volatility
    pub sigma: f64,
    /// Jump intensity per year
    pub lambda: f64,
    /// Mean log jump size
    pub mu_j: f64,
    /// Log jump size volatility
    pub sigma_j: f64,
}

impl MertonParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("sigma", self.sigma)?;
        validate_jumps(self.lambda, self.mu_j, self.sigma_j)
    }
}

fn validate_jumps(lambda: f64, mu_j: f64, sigma_j: f64) -> Result<()> {
    ensure_finite("lambda", lambda)?;
    ensure_finite("mu_j", mu_j)?;
    ensure_finite("sigma_j", sigma_j)?;
    if lambda < 0.0 || sigma_j < 0.0 {
        return Err(PricingError::invalid_input(format!(
            "jump intensity and jump volatility must be >= 0, got lambda={lambda}, sigma_j={sigma_j}"
        )));
    }
    Ok(())
}

/// Kou double-exponential jump-diffusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KouParams {
    pub sigma: f64,
    pub lambda: f64,
    /// Probability of an upward jump
    pub p_up: f64,
    /// Rate of upward jumps (> 1 so that E[S_T] exists)
    pub eta_up: f64,
    /// Rate of downward jumps (> 0)
    pub eta_down: f64,
}

impl KouParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("sigma", self.sigma)?;
        ensure_finite("lambda", self.lambda)?;
        if self.lambda < 0.0 {
            return Err(PricingError::invalid_input("lambda must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.p_up) {
            return Err(PricingError::invalid_input(format!(
                "p_up must be in [0, 1], got {}",
                self.p_up
            )));
        }
        ensure_positive("eta_down", self.eta_down)?;
        if !self.eta_up.is_finite() || self.eta_up <= 1.0 {
            return Err(PricingError::invalid_input(format!(
                "eta_up must be > 1, got {}",
                self.eta_up
            )));
        }
        Ok(())
    }
}

/// Bates: Heston with Merton jumps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatesParams {
    pub heston: HestonParams,
    pub lambda: f64,
    pub mu_j: f64,
    pub sigma_j: f64,
}

impl BatesParams {
    pub fn validate(&self) -> Result<()> {
        self.heston.validate()?;
        validate_jumps(self.lambda, self.mu_j, self.sigma_j)
    }
}

/// Variance-Gamma (Madan-Carr-Chang).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceGammaParams {
    pub sigma: f64,
    /// Drift of the subordinated Brownian motion (skew)
    pub theta: f64,
    /// Variance rate of the gamma clock (kurtosis)
    pub nu: f64,
}

impl VarianceGammaParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("sigma", self.sigma)?;
        ensure_positive("nu", self.nu)?;
        ensure_finite("theta", self.theta)?;
        if self.martingale_base() <= 0.0 {
            return Err(PricingError::invalid_input(
                "variance-gamma requires 1 - theta*nu - 0.5*sigma^2*nu > 0",
            ));
        }
        Ok(())
    }

    pub(crate) fn martingale_base(&self) -> f64 {
        1.0 - self.theta * self.nu - 0.5 * self.sigma * self.sigma * self.nu
    }
}

/// Normal inverse Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NigParams {
    /// Tail heaviness
    pub alpha: f64,
    /// Asymmetry
    pub beta: f64,
    /// Scale
    pub delta: f64,
}

impl NigParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("alpha", self.alpha)?;
        ensure_positive("delta", self.delta)?;
        ensure_finite("beta", self.beta)?;
        if (self.beta + 1.0).abs() >= self.alpha || self.beta.abs() >= self.alpha {
            return Err(PricingError::invalid_input(format!(
                "NIG requires |beta| < alpha and |beta + 1| < alpha, got alpha={}, beta={}",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }
}

/// CGMY tempered stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CgmyParams {
    pub c: f64,
    pub g: f64,
    pub m: f64,
    pub y: f64,
}

impl CgmyParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("c", self.c)?;
        ensure_positive("g", self.g)?;
        ensure_finite("y", self.y)?;
        if !self.m.is_finite() || self.m <= 1.0 {
            return Err(PricingError::invalid_input(format!(
                "CGMY requires m > 1, got {}",
                self.m
            )));
        }
        if self.y >= 2.0 || self.y == 0.0 || self.y == 1.0 {
            return Err(PricingError::invalid_input(format!(
                "CGMY requires y < 2 and y not in {{0, 1}}, got {}",
                self.y
            )));
        }
        Ok(())
    }
}

/// Closed set of characteristic-function-bearing models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Model {
    Bsm(BsmParams),
    Heston(HestonParams),
    Merton(MertonParams),
    Kou(KouParams),
    Bates(BatesParams),
    VarianceGamma(VarianceGammaParams),
    Nig(NigParams),
    Cgmy(CgmyParams),
}

impl Model {
    pub fn bsm(sigma: f64) -> Self {
        Model::Bsm(BsmParams { sigma })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Model::Bsm(_) => "bsm",
            Model::Heston(_) => "heston",
            Model::Merton(_) => "merton",
            Model::Kou(_) => "kou",
            Model::Bates(_) => "bates",
            Model::VarianceGamma(_) => "variance_gamma",
            Model::Nig(_) => "nig",
            Model::Cgmy(_) => "cgmy",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Model::Bsm(p) => p.validate(),
            Model::Heston(p) => p.validate(),
            Model::Merton(p) => p.validate(),
            Model::Kou(p) => p.validate(),
            Model::Bates(p) => p.validate(),
            Model::VarianceGamma(p) => p.validate(),
            Model::Nig(p) => p.validate(),
            Model::Cgmy(p) => p.validate(),
        }
    }

    /// The diffusive volatility the implied-volatility solver varies, if any.
    ///
    /// Heston and Bates report `sqrt(v0)`.
    pub fn volatility(&self) -> Option<f64> {
        match self {
            Model::Bsm(p) => Some(p.sigma),
            Model::Heston(p) => Some(p.v0.sqrt()),
            Model::Merton(p) => Some(p.sigma),
            Model::Kou(p) => Some(p.sigma),
            Model::Bates(p) => Some(p.heston.v0.sqrt()),
            Model::VarianceGamma(p) => Some(p.sigma),
            Model::Nig(_) | Model::Cgmy(_) => None,
        }
    }

    /// A copy of this model with a new volatility.
    ///
    /// Heston and Bates set both `v0` and `theta` to `sigma^2`, so the variance
    /// starts and stays at the requested level in expectation.
    pub fn with_volatility(&self, sigma: f64) -> Result<Model> {
        ensure_positive("volatility", sigma)?;
        let var = sigma * sigma;
        let model = match *self {
            Model::Bsm(_) => Model::Bsm(BsmParams { sigma }),
            Model::Heston(p) => Model::Heston(HestonParams {
                v0: var,
                theta: var,
                ..p
            }),
            Model::Merton(p) => Model::Merton(MertonParams { sigma, ..p }),
            Model::Kou(p) => Model::Kou(KouParams { sigma, ..p }),
            Model::Bates(p) => Model::Bates(BatesParams {
                heston: HestonParams {
                    v0: var,
                    theta: var,
                    ..p.heston
                },
                ..p
            }),
            Model::VarianceGamma(p) => Model::VarianceGamma(VarianceGammaParams { sigma, ..p }),
            Model::Nig(_) | Model::Cgmy(_) => {
                return Err(PricingError::UnsupportedModel {
                    model: self.name(),
                    operation: "with_volatility",
                })
            }
        };
        Ok(model)
    }

    /// Builds `phi(u)` for `ln(S_T)` closed over the market scalars.
    pub fn characteristic_function(
        &self,
        spot: f64,
        rate: f64,
        maturity: f64,
        dividend: f64,
    ) -> Result<ModelCharFn> {
        self.validate()?;
        ensure_positive("spot", spot)?;
        ensure_finite("rate", rate)?;
        ensure_finite("dividend", dividend)?;
        ensure_finite("maturity", maturity)?;
        if maturity < 0.0 {
            return Err(PricingError::invalid_input("maturity must be >= 0"));
        }
        let cf = match *self {
            Model::Bsm(p) => {
                ModelCharFn::Bsm(BlackScholesCharFn::new(spot, rate, dividend, maturity, p.sigma))
            }
            Model::Heston(p) => {
                ModelCharFn::Heston(HestonCharFn::new(spot, rate, dividend, maturity, p))
            }
            Model::Merton(p) => {
                ModelCharFn::Merton(MertonCharFn::new(spot, rate, dividend, maturity, p))
            }
            Model::Kou(p) => ModelCharFn::Kou(KouCharFn::new(spot, rate, dividend, maturity, p)),
            Model::Bates(p) => {
                ModelCharFn::Bates(BatesCharFn::new(spot, rate, dividend, maturity, p))
            }
            Model::VarianceGamma(p) => ModelCharFn::VarianceGamma(VarianceGammaCharFn::new(
                spot, rate, dividend, maturity, p,
            )),
            Model::Nig(p) => ModelCharFn::Nig(NigCharFn::new(spot, rate, dividend, maturity, p)),
            Model::Cgmy(p) => {
                ModelCharFn::Cgmy(CgmyCharFn::new(spot, rate, dividend, maturity, p))
            }
        };
        Ok(cf)
    }

    /// Convenience wrapper over [`Model::characteristic_function`].
    pub fn characteristic_function_for(&self, inputs: &OptionInputs) -> Result<ModelCharFn> {
        self.characteristic_function(inputs.spot, inputs.rate, inputs.maturity, inputs.dividend)
    }

    /// Analytic price when the model has one (BSM only).
    pub fn closed_form_price(&self, inputs: &OptionInputs) -> Option<f64> {
        match self {
            Model::Bsm(p) => Some(bs_price(
                inputs.option_type,
                inputs.spot,
                inputs.strike,
                inputs.rate,
                inputs.dividend,
                inputs.maturity,
                p.sigma,
            )),
            _ => None,
        }
    }

    /// Bit patterns of every parameter, used to key caches.
    pub(crate) fn param_bits(&self) -> Vec<u64> {
        let values: Vec<f64> = match *self {
            Model::Bsm(p) => vec![p.sigma],
            Model::Heston(p) => vec![p.v0, p.kappa, p.theta, p.sigma_v, p.rho],
            Model::Merton(p) => vec![p.sigma, p.lambda, p.mu_j, p.sigma_j],
            Model::Kou(p) => vec![p.sigma, p.lambda, p.p_up, p.eta_up, p.eta_down],
            Model::Bates(p) => vec![
                p.heston.v0,
                p.heston.kappa,
                p.heston.theta,
                p.heston.sigma_v,
                p.heston.rho,
                p.lambda,
                p.mu_j,
                p.sigma_j,
            ],
            Model::VarianceGamma(p) => vec![p.sigma, p.theta, p.nu],
            Model::Nig(p) => vec![p.alpha, p.beta, p.delta],
            Model::Cgmy(p) => vec![p.c, p.g, p.m, p.y],
        };
        values.into_iter().map(f64::to_bits).collect()
    }
}
