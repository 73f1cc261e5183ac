//! # Fourier-Lib: FFT Option Pricing and Implied Volatility
//!
//! `fourier-lib` prices European options from the characteristic function of the log
//! spot price and inverts observed premiums into implied volatilities. Any model that
//! can produce `phi(u) = E[exp(i u ln S_T)]` can be priced; the engines never look at
//! model internals.
//!
//! ## Core Features
//!
//! - **Carr-Madan FFT pricer**: one transform prices a whole log-strike grid, with the
//!   requested strike placed exactly on a node. A Black-Scholes-Merton control variate
//!   keeps short maturities accurate, a truncation estimate rejects grids that cannot
//!   resolve the transform, and out-of-the-money strikes can use the `sinh`-damped
//!   time-value transform
//! - **Direct inversion**: Gil-Pelaez quadrature as an FFT-free route and cross-check
//! - **Implied volatility**: bounded secant state machine with bracketing, an
//!   at-the-money fallback route, optional caller-owned caching and parallel batches
//! - **Models**: Black-Scholes-Merton, Heston, Merton, Kou, Bates, Variance-Gamma,
//!   NIG and CGMY
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fourier_lib::{default_configs, implied_volatility, price_option, Model, OptionInputs};
//!
//! let config = default_configs::fast();
//! let inputs = OptionInputs::call(100.0, 100.0, 0.05, 1.0, 0.02)?;
//!
//! // Price under Black-Scholes-Merton through the FFT
//! let priced = price_option(&Model::bsm(0.2), &inputs, &config.fft)?;
//!
//! // Invert the price back into a volatility
//! let quote = inputs.with_observed_price(priced.price);
//! let solution = implied_volatility(&quote, &config)?;
//! assert!(solution.converged);
//! # Ok::<(), fourier_lib::PricingError>(())
//! ```
//!
//! ## Configuration Presets
//!
//! - `production()`: finer grid and tight tolerance for live use
//! - `fast()`: the `n = 10, trunc = 7` grid for development
//! - `research()`: high-precision settings for reference runs
//! - `minimal()`: quick validation settings

// ================================================================================================
// MODULES
// ================================================================================================

pub mod error;
pub mod implied;
pub mod model_params;
pub mod models;
pub mod pricing;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::Context;
use std::cmp::Ordering;
use std::path::Path;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Errors
pub use error::{PricingError, Result};

// Pricing inputs, outputs and configuration
pub use pricing::{
    compute_grid, fft_greeks, price_direct, price_fft, DirectPrice, FftConfig, FftGridSpec,
    FftPrice, FftPricer, FftTransform, Greeks, IntegrationConfig, MarketQuote, OptionInputs, OptionType,
    PriceCurve, PricingConfig, Quadrature, SolverConfig,
};

// Implied volatility
pub use implied::{
    is_atm, ImpliedVolSolver, IvCache, IvIterationState, IvSolution, Moneyness, PricingRoute,
};

// Models
pub use model_params::{
    BatesParams, BsmParams, CgmyParams, HestonParams, KouParams, MertonParams, Model, NigParams,
    VarianceGammaParams,
};
pub use models::traits::CharacteristicFunction;

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured engine settings for common use cases.
///
/// # Available Configurations
///
/// - [`production()`]: Production-grade settings
/// - [`fast()`]: Development-optimized settings
/// - [`research()`]: High-precision settings for research
/// - [`minimal()`]: Quick validation settings
pub mod default_configs {
    use crate::pricing::config::PricingConfig;

    /// Production-grade configuration.
    ///
    /// **Characteristics:**
    /// - Grid: `alpha = 1.25`, `trunc = 8`, `n = 12`
    /// - Price tolerance: 1e-7
    /// - Maximum iterations: 100
    ///
    /// # Example
    ///
    /// ```rust
    /// use fourier_lib::default_configs;
    ///
    /// let config = default_configs::production();
    /// assert_eq!(config.fft.n, 12);
    /// ```
    pub fn production() -> PricingConfig {
        PricingConfig::production()
    }

    /// Fast configuration for development and testing.
    ///
    /// **Characteristics:**
    /// - Grid: `alpha = 1.25`, `trunc = 7`, `n = 10`
    /// - Price tolerance: 1e-4
    /// - Maximum iterations: 50
    pub fn fast() -> PricingConfig {
        PricingConfig::fast()
    }

    /// High-precision configuration for research and reference values.
    ///
    /// **Characteristics:**
    /// - Grid: `alpha = 1.25`, `trunc = 9`, `n = 14`
    /// - Price tolerance: 1e-10
    /// - Maximum iterations: 200
    /// - Direct integration on `[0, 400]` with 1600 panels
    pub fn research() -> PricingConfig {
        PricingConfig::research()
    }

    /// Minimal configuration for quick validation and debugging.
    ///
    /// **Characteristics:**
    /// - Grid: `alpha = 1.5`, `trunc = 6`, `n = 8`
    /// - Price tolerance: 1e-3
    /// - Maximum iterations: 20
    pub fn minimal() -> PricingConfig {
        PricingConfig::minimal()
    }
}

/// Loads a [`PricingConfig`] from a TOML file. Missing keys take their defaults.
///
/// # Errors
///
/// * `anyhow::Error` if the file cannot be read
/// * `anyhow::Error` wrapping [`PricingError::Config`] if the TOML is malformed
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<PricingConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = PricingConfig::from_toml_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Prices one European option under `model` with the FFT.
///
/// Builds the characteristic function from the model and the market scalars in
/// `inputs`, then runs a single transform with the strike on a grid node.
///
/// # Errors
///
/// * [`PricingError::InvalidInput`] for malformed market or model parameters
/// * [`PricingError::InvalidDampening`] if `config.alpha` is singular, unstable or needs
///   a moment of `S_T` the model does not have
/// * [`PricingError::StrikeOutOfRange`] if the strike is outside the log-strike window
/// * [`PricingError::TruncationExceeded`] if the grid cannot resolve the transform
pub fn price_option(model: &Model, inputs: &OptionInputs, config: &FftConfig) -> Result<FftPrice> {
    let phi = model.characteristic_function_for(inputs)?;
    price_fft(&phi, inputs, config)
}

/// Prices a strip of strikes under `model` from one FFT pass.
///
/// The strike in `inputs` is ignored. Results are sorted by strike.
pub fn price_strikes(
    model: &Model,
    inputs: &OptionInputs,
    strikes: &[f64],
    config: &FftConfig,
) -> Result<Vec<(f64, f64)>> {
    let phi = model.characteristic_function_for(inputs)?;
    let pricer = FftPricer::new(config)?;
    let mut priced = pricer.price_strikes(&phi, inputs, strikes)?;
    priced.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    Ok(priced)
}

/// Black-Scholes-Merton implied volatility of one quote, solved on the FFT pricer.
///
/// Convenience over [`ImpliedVolSolver`] for the common case; reaching `max_iter`
/// returns `converged = false` rather than an error.
///
/// # Example
///
/// ```rust
/// use fourier_lib::{default_configs, implied_volatility, OptionInputs};
///
/// let quote = OptionInputs::call(100.0, 100.0, 0.05, 1.0, 0.02)?
///     .with_observed_price(9.227005508154036);
/// let solution = implied_volatility(&quote, &default_configs::fast())?;
/// assert!((solution.volatility - 0.2).abs() < 1e-4);
/// # Ok::<(), fourier_lib::PricingError>(())
/// ```
pub fn implied_volatility(quote: &MarketQuote, config: &PricingConfig) -> Result<IvSolution> {
    let template = Model::bsm(config.solver.seed_vol);
    implied::solve(quote, &template, config, None)
}
