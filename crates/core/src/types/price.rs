//! Decimal money helpers.
//!
//! Menu prices and order totals are carried as [`Decimal`] and rounded to two
//! places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes the storefront can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    PKR,
    AED,
    GBP,
    USD,
}

impl CurrencyCode {
    /// Symbol printed next to prices on the menu.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::PKR => "Rs.",
            Self::AED => "AED",
            Self::GBP => "£",
            Self::USD => "$",
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PKR => "PKR",
            Self::AED => "AED",
            Self::GBP => "GBP",
            Self::USD => "USD",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PKR" => Ok(Self::PKR),
            "AED" => Ok(Self::AED),
            "GBP" => Ok(Self::GBP),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency code: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(-12_345, 3)), Decimal::new(-1235, 2));
        assert_eq!(round_money(Decimal::new(900, 0)), Decimal::new(900, 0));
    }

    #[test]
    fn test_currency_parse_and_symbol() {
        let code: CurrencyCode = " pkr ".parse().unwrap();
        assert_eq!(code, CurrencyCode::PKR);
        assert_eq!(code.symbol(), "Rs.");
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
