//! Decimal money representation.
//!
//! Every amount in the engine is a [`Decimal`] in the currency's standard unit
//! (taka, not poisha). Intermediate sums are never rounded; only the final
//! order total goes through [`round_money`].

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places carried by a rounded amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to two places using round-half-up.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A price with currency information, used for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn taka(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            round_money(self.amount)
        )
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BDT,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::BDT => "৳",
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(Decimal::new(12_345, 3)), Decimal::new(1_235, 2));
        assert_eq!(round_money(Decimal::new(12_344, 3)), Decimal::new(1_234, 2));
        assert_eq!(round_money(Decimal::new(5, 3)), Decimal::new(1, 2));
    }

    #[test]
    fn test_round_money_keeps_whole_amounts() {
        assert_eq!(round_money(Decimal::from(1850)), Decimal::from(1850));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::taka(Decimal::from(985)).to_string(), "৳985.00");
        assert_eq!(
            Price::new(Decimal::new(1999, 2), CurrencyCode::USD).to_string(),
            "$19.99"
        );
    }
}
