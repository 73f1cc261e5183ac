//! Implied volatility by secant iteration on a Fourier pricer.
//!
//! - [`moneyness`]: at-the-money detection driving the seed and the fallback route
//! - [`solver`]: the bounded secant state machine and batch solving
//! - [`cache`]: optional caller-owned memo of solved volatilities

pub mod cache;
pub mod moneyness;
pub mod solver;

pub use cache::{IvCache, IvCacheKey};
pub use moneyness::{is_atm, Moneyness};
pub use solver::{atm_seed, solve, ImpliedVolSolver, IvIterationState, IvSolution, PricingRoute};
