//! Error types for fourier-lib.
//!
//! Every pricing or solving call returns `Result<T, PricingError>`. Errors are local to
//! the call that raised them: no state is shared between requests, so a caller can
//! retry with adjusted parameters without side effects.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Errors raised by the FFT pricer, the direct integration route and the
/// implied-volatility solver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PricingError {
    /// Market or model inputs are malformed (non-positive spot, NaN rate, ...).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The dampening factor makes the transform singular or numerically unstable.
    /// Not retried: the caller must supply a different `alpha`.
    #[error("invalid dampening alpha={alpha}: {reason}")]
    InvalidDampening { alpha: f64, reason: String },

    /// The frequency cut-off `B = 2^trunc` drops more of the transform than the
    /// configured tolerance allows, typically at very short maturities.
    #[error("fft truncation error estimate {estimate:e} exceeds tolerance {tolerance:e}; raise trunc")]
    TruncationExceeded { estimate: f64, tolerance: f64 },

    /// The requested strike falls outside the log-strike window of the FFT grid.
    #[error("strike {strike} outside FFT window [{lower:.6}, {upper:.6}]; raise n or lower trunc")]
    StrikeOutOfRange { strike: f64, lower: f64, upper: f64 },

    /// The observed price lies outside the model-free no-arbitrage bounds, so no
    /// positive volatility can reproduce it.
    #[error("observed price {observed} outside no-arbitrage bounds ({lower:.8}, {upper:.8})")]
    ArbitrageViolation { observed: f64, lower: f64, upper: f64 },

    /// Two consecutive solver iterations produced the same pricing error.
    #[error("implied volatility solver stalled after {iterations} iterations at vol={last_estimate}")]
    StalledSolver { last_estimate: f64, iterations: usize },

    /// The solver hit its iteration cap. Only produced by `IvSolution::into_result`;
    /// `solve` itself reports the cap as a non-converged solution.
    #[error("implied volatility did not converge in {iterations} iterations (best vol={best_estimate}, error={price_error:e})")]
    MaxIterationsExceeded {
        best_estimate: f64,
        price_error: f64,
        iterations: usize,
    },

    /// The model variant has no capability for the requested operation.
    #[error("model {model} does not support {operation}")]
    UnsupportedModel {
        model: &'static str,
        operation: &'static str,
    },

    /// A computation produced a non-finite value.
    #[error("numerical error: {message}")]
    Numerical { message: String },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl PricingError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// Whether retrying with the same parameters can never succeed.
    ///
    /// Only the iteration cap is soft: the caller may accept the best estimate or
    /// retry with a larger budget.
    pub fn is_hard(&self) -> bool {
        !matches!(self, Self::MaxIterationsExceeded { .. })
    }
}

/// Fails with `InvalidInput` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::invalid_input(format!(
            "{name} must be > 0 and finite, got {value}"
        )));
    }
    Ok(())
}

/// Fails with `InvalidInput` unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PricingError::invalid_input(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(())
}
