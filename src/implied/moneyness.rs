//! Moneyness classification.

use serde::{Deserialize, Serialize};

use crate::pricing::types::OptionType;

/// True when `|S - K| / S <= eps`.
pub fn is_atm(spot: f64, strike: f64, eps: f64) -> bool {
    (spot - strike).abs() / spot <= eps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moneyness {
    InTheMoney,
    AtTheMoney,
    OutOfTheMoney,
}

impl Moneyness {
    /// Spot moneyness of an option, with `eps` as the at-the-money band.
    pub fn classify(option_type: OptionType, spot: f64, strike: f64, eps: f64) -> Self {
        if is_atm(spot, strike, eps) {
            return Moneyness::AtTheMoney;
        }
        let call_itm = spot > strike;
        match (option_type, call_itm) {
            (OptionType::Call, true) | (OptionType::Put, false) => Moneyness::InTheMoney,
            _ => Moneyness::OutOfTheMoney,
        }
    }

    pub fn is_atm(self) -> bool {
        matches!(self, Moneyness::AtTheMoney)
    }
}
