//! Fourier pricing engines.
//!
//! - [`damping`]: validation of the dampening factor and grid derivation
//! - [`fft`]: Carr-Madan FFT pricer
//! - [`integration`]: direct Gil-Pelaez inversion
//! - [`greeks`]: finite-difference sensitivities

pub mod config;
pub mod damping;
pub mod fft;
pub mod greeks;
pub mod integration;
pub mod types;

pub use config::{
    FftConfig, FftTransform, IntegrationConfig, PricingConfig, Quadrature, SolverConfig,
};
pub use damping::{compute_grid, FftGridSpec};
pub use fft::{price_fft, FftPricer};
pub use greeks::{fft_greeks, Greeks};
pub use integration::{price_direct, DirectPrice};
pub use types::{FftPrice, MarketQuote, OptionInputs, OptionType, PriceCurve};
