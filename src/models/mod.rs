pub mod bs;
pub mod cf;

/// Common traits shared by every pricing route
pub mod traits {
    use num_complex::Complex64;

    /// Provider of the characteristic function of `ln(S_T)`.
    ///
    /// The pricing engines only rely on this contract and never on a concrete model.
    /// Any closure `Fn(Complex64) -> Complex64` is a provider, which lets callers plug in
    /// models that live outside this crate.
    pub trait CharacteristicFunction {
        /// Returns `phi(u) = E[exp(i u ln S_T)]`.
        fn cf(&self, u: Complex64) -> Complex64;

        /// Whether `E[S_T^order]` is finite.
        ///
        /// The default reads the moment off `phi(-i order)`. Models with a closed-form
        /// moment condition override it, because `phi` can stay finite and real past
        /// the point where the moment has exploded.
        fn moment_exists(&self, order: f64) -> bool {
            is_finite_moment(self.cf(Complex64::new(0.0, -order)))
        }
    }

    /// Relative size of the imaginary part tolerated in `phi(-i p)`.
    const MOMENT_IMAG_TOL: f64 = 1e-8;

    /// A moment `phi(-i p)` must be a finite, positive real number.
    pub fn is_finite_moment(value: Complex64) -> bool {
        value.re.is_finite()
            && value.im.is_finite()
            && value.re > 0.0
            && value.im.abs() <= MOMENT_IMAG_TOL * value.re
    }

    impl<F> CharacteristicFunction for F
    where
        F: Fn(Complex64) -> Complex64,
    {
        fn cf(&self, u: Complex64) -> Complex64 {
            self(u)
        }
    }
}

/// Utility functions for payoff and discounting calculations
pub mod utils {
    use crate::pricing::types::OptionType;

    /// Calculate log-moneyness: ln(K/S)
    pub fn log_moneyness(strike: f64, spot: f64) -> f64 {
        (strike / spot).ln()
    }

    /// Continuously compounded discount factor `exp(-r t)`.
    pub fn discount(rate: f64, t: f64) -> f64 {
        (-rate * t).exp()
    }

    /// Undiscounted payoff at expiry.
    pub fn intrinsic(option_type: OptionType, spot: f64, strike: f64) -> f64 {
        match option_type {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Model-free no-arbitrage bounds `(lower, upper)` for a European option price.
    pub fn price_bounds(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        dividend: f64,
        t: f64,
    ) -> (f64, f64) {
        let pv_spot = spot * discount(dividend, t);
        let pv_strike = strike * discount(rate, t);
        match option_type {
            OptionType::Call => ((pv_spot - pv_strike).max(0.0), pv_spot),
            OptionType::Put => ((pv_strike - pv_spot).max(0.0), pv_strike),
        }
    }

}
