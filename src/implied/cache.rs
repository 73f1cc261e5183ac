//! Caller-owned memo of solved implied volatilities.
//!
//! Nothing in the crate holds one implicitly: a caller that wants memoisation creates
//! an [`IvCache`] and passes it to each solve. Keys compare floats by bit pattern, so
//! only exact repeats hit.

use std::collections::HashMap;

use crate::implied::solver::IvSolution;
use crate::model_params::Model;
use crate::pricing::config::PricingConfig;
use crate::pricing::types::{MarketQuote, OptionType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IvCacheKey {
    spot: u64,
    strike: u64,
    maturity: u64,
    rate: u64,
    dividend: u64,
    observed_price: u64,
    option_type: OptionType,
    model: &'static str,
    shape: Vec<u64>,
    config: Vec<u64>,
}

impl IvCacheKey {
    /// The volatility carried by `model` is not part of the key: the solver
    /// overwrites it on every iteration. Every setting of `config` is.
    pub fn new(quote: &MarketQuote, model: &Model, config: &PricingConfig) -> Self {
        let normalized = model.with_volatility(1.0).unwrap_or(*model);
        let i = &quote.inputs;
        Self {
            spot: i.spot.to_bits(),
            strike: i.strike.to_bits(),
            maturity: i.maturity.to_bits(),
            rate: i.rate.to_bits(),
            dividend: i.dividend.to_bits(),
            observed_price: quote.observed_price.to_bits(),
            option_type: i.option_type,
            model: model.name(),
            shape: normalized.param_bits(),
            config: config.fingerprint(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IvCache {
    entries: HashMap<IvCacheKey, IvSolution>,
    hits: usize,
    misses: usize,
}

impl IvCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &IvCacheKey) -> Option<IvSolution> {
        match self.entries.get(key) {
            Some(solution) => {
                self.hits += 1;
                Some(*solution)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores converged solutions only.
    pub fn insert(&mut self, key: IvCacheKey, solution: IvSolution) {
        if solution.converged {
            self.entries.insert(key, solution);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// `(hits, misses)` since creation or the last `clear`.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
