use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ensure_finite, ensure_positive, PricingError, Result};
use crate::models::utils::{discount, intrinsic, price_bounds};

/// Option right. Puts are priced from the call curve through put/call parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn is_call(self) -> bool {
        matches!(self, OptionType::Call)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(PricingError::invalid_input(format!(
                "invalid option type: {other}"
            ))),
        }
    }
}

/// Scalar market parameters of one European option pricing request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionInputs {
    /// Spot price of the underlying (> 0)
    pub spot: f64,
    /// Strike price (> 0)
    pub strike: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Time to expiration in years (> 0)
    pub maturity: f64,
    /// Continuous dividend yield (>= 0)
    pub dividend: f64,
    /// Call or put
    pub option_type: OptionType,
}

impl OptionInputs {
    /// Creates validated inputs.
    pub fn new(
        spot: f64,
        strike: f64,
        rate: f64,
        maturity: f64,
        dividend: f64,
        option_type: OptionType,
    ) -> Result<Self> {
        let inputs = Self {
            spot,
            strike,
            rate,
            maturity,
            dividend,
            option_type,
        };
        inputs.validate()?;
        Ok(inputs)
    }

    pub fn call(spot: f64, strike: f64, rate: f64, maturity: f64, dividend: f64) -> Result<Self> {
        Self::new(spot, strike, rate, maturity, dividend, OptionType::Call)
    }

    pub fn put(spot: f64, strike: f64, rate: f64, maturity: f64, dividend: f64) -> Result<Self> {
        Self::new(spot, strike, rate, maturity, dividend, OptionType::Put)
    }

    /// Checks the boundary invariants: spot, strike and maturity strictly positive,
    /// rate finite, dividend non-negative.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("spot", self.spot)?;
        ensure_positive("strike", self.strike)?;
        ensure_positive("maturity", self.maturity)?;
        ensure_finite("rate", self.rate)?;
        ensure_finite("dividend", self.dividend)?;
        if self.dividend < 0.0 {
            return Err(PricingError::invalid_input(format!(
                "dividend must be >= 0, got {}",
                self.dividend
            )));
        }
        Ok(())
    }

    /// Same contract with a different strike.
    pub fn with_strike(&self, strike: f64) -> Self {
        Self { strike, ..*self }
    }

    /// Same contract with the other right.
    pub fn with_option_type(&self, option_type: OptionType) -> Self {
        Self {
            option_type,
            ..*self
        }
    }

    /// Attaches an observed market price, producing a quote for the solver.
    pub fn with_observed_price(self, observed_price: f64) -> MarketQuote {
        MarketQuote {
            inputs: self,
            observed_price,
        }
    }

    /// Forward price `S exp((r - q) T)`.
    pub fn forward(&self) -> f64 {
        self.spot * ((self.rate - self.dividend) * self.maturity).exp()
    }

    pub fn discount_factor(&self) -> f64 {
        discount(self.rate, self.maturity)
    }

    /// Undiscounted payoff if exercised now.
    pub fn intrinsic(&self) -> f64 {
        intrinsic(self.option_type, self.spot, self.strike)
    }

    /// Model-free `(lower, upper)` price bounds.
    pub fn price_bounds(&self) -> (f64, f64) {
        price_bounds(
            self.option_type,
            self.spot,
            self.strike,
            self.rate,
            self.dividend,
            self.maturity,
        )
    }

    /// `S exp(-qT) - K exp(-rT)`, the parity gap `call - put`.
    pub fn parity_gap(&self) -> f64 {
        self.spot * discount(self.dividend, self.maturity) - self.strike * self.discount_factor()
    }
}

/// An observed option price together with its contract terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub inputs: OptionInputs,
    /// Observed premium to invert
    pub observed_price: f64,
}

/// Ordered `(log_strike, price)` pairs produced by one FFT pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCurve {
    pub points: Vec<(f64, f64)>,
}

impl PriceCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Strike grid `exp(k_m)`.
    pub fn strikes(&self) -> Vec<f64> {
        self.points.iter().map(|(k, _)| k.exp()).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|(_, p)| *p).collect()
    }

    /// First and last log-strike of the window.
    pub fn log_strike_range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }

    /// 4-point Lagrange interpolation in log-strike, linear on the outermost cells.
    ///
    /// Returns `None` outside the window.
    pub fn interpolate(&self, strike: f64) -> Option<f64> {
        let n = self.points.len();
        let x = strike.ln();
        let (lo, hi) = self.log_strike_range()?;
        if !(lo..=hi).contains(&x) {
            return None;
        }
        if n == 1 {
            return Some(self.points[0].1);
        }
        let step = self.points[1].0 - lo;
        let cell = (((x - lo) / step).floor() as usize).min(n - 2);

        if cell == 0 || cell + 2 >= n {
            let (x0, y0) = self.points[cell];
            let (x1, y1) = self.points[cell + 1];
            let w = (x - x0) / (x1 - x0);
            return Some(y0 + w * (y1 - y0));
        }

        let nodes = &self.points[cell - 1..=cell + 2];
        let mut value = 0.0;
        for (i, &(xi, yi)) in nodes.iter().enumerate() {
            let mut basis = 1.0;
            for (j, &(xj, _)) in nodes.iter().enumerate() {
                if i != j {
                    basis *= (x - xj) / (xi - xj);
                }
            }
            value += yi * basis;
        }
        Some(value)
    }
}

/// Output of a single-strike FFT pricing call.
#[derive(Debug, Clone, PartialEq)]
pub struct FftPrice {
    /// Price at the requested strike
    pub price: f64,
    /// Full curve from the same pass, kept for diagnostics and reuse
    pub curve: PriceCurve,
    /// Grid index holding the requested strike
    pub strike_index: usize,
}
