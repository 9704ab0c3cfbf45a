//! Currency conversion and display formatting
//!
//! Catalog prices are denominated in the base currency. Conversion keeps full
//! precision; [`CurrencyTable::format`] is the only place amounts are rounded
//! to a currency's minor unit.

use crewbill_common::{PricingError, BASE_CURRENCY};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display and conversion data for one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code
    pub code: String,
    /// Prefix used when rendering amounts
    pub symbol: String,
    /// Digits after the decimal separator
    pub minor_units: u32,
    /// Units of this currency per unit of the base currency
    pub rate_from_base: Decimal,
}

impl Currency {
    pub fn new(
        code: impl Into<String>,
        symbol: impl Into<String>,
        minor_units: u32,
        rate_from_base: Decimal,
    ) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            minor_units,
            rate_from_base,
        }
    }
}

/// Exchange-rate table keyed by currency code
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    currencies: HashMap<String, Currency>,
}

impl CurrencyTable {
    /// Table containing only the base currency
    pub fn base_only() -> Self {
        let mut table = Self {
            currencies: HashMap::new(),
        };
        table.insert(Currency::new(BASE_CURRENCY, "$", 2, Decimal::ONE));
        table
    }

    /// Add or replace a currency
    pub fn insert(&mut self, currency: Currency) {
        self.currencies
            .insert(currency.code.to_ascii_uppercase(), currency);
    }

    /// Override the exchange rate of a known currency
    pub fn set_rate(&mut self, code: &str, rate_from_base: Decimal) -> Result<(), PricingError> {
        let currency = self
            .currencies
            .get_mut(&code.to_ascii_uppercase())
            .ok_or_else(|| unsupported(code))?;
        currency.rate_from_base = rate_from_base;
        Ok(())
    }

    pub fn get(&self, code: &str) -> Result<&Currency, PricingError> {
        self.currencies
            .get(&code.to_ascii_uppercase())
            .ok_or_else(|| unsupported(code))
    }

    /// Supported codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.currencies.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Convert a base-currency amount, keeping full precision
    pub fn convert(&self, amount: Decimal, code: &str) -> Result<Decimal, PricingError> {
        amount
            .checked_mul(self.get(code)?.rate_from_base)
            .ok_or_else(|| PricingError::overflow(format!("amount in {}", code)))
    }

    /// Convert and round to the currency's minor unit
    pub fn round(&self, amount: Decimal, code: &str) -> Result<Decimal, PricingError> {
        let minor_units = self.get(code)?.minor_units;
        Ok(self
            .convert(amount, code)?
            .round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Render a base-currency amount for display, e.g. `$1,680.00`
    pub fn format(&self, amount: Decimal, code: &str) -> Result<String, PricingError> {
        let currency = self.get(code)?;
        let mut rounded = self.round(amount, code)?;
        rounded.rescale(currency.minor_units);

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = rounded.abs().to_string();
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut out = format!("{}{}{}", sign, currency.symbol, group_thousands(whole));
        if let Some(fraction) = fraction {
            out.push('.');
            out.push_str(fraction);
        }
        Ok(out)
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let mut table = Self::base_only();
        table.insert(Currency::new("EUR", "€", 2, dec!(0.92)));
        table.insert(Currency::new("GBP", "£", 2, dec!(0.79)));
        table.insert(Currency::new("INR", "₹", 2, dec!(83.20)));
        table.insert(Currency::new("JPY", "¥", 0, dec!(151.50)));
        table
    }
}

fn unsupported(code: &str) -> PricingError {
    PricingError::UnsupportedCurrency {
        code: code.to_string(),
    }
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_base_currency() {
        let table = CurrencyTable::default();
        assert_eq!(table.format(dec!(1680), "USD").unwrap(), "$1,680.00");
        assert_eq!(table.format(dec!(175), "usd").unwrap(), "$175.00");
        assert_eq!(table.format(dec!(0), "USD").unwrap(), "$0.00");
        assert_eq!(table.format(dec!(1234567.891), "USD").unwrap(), "$1,234,567.89");
    }

    #[test]
    fn test_rounding_only_at_display() {
        let table = CurrencyTable::default();
        // 9.5904 stays exact until formatted
        assert_eq!(table.convert(dec!(9.5904), "USD").unwrap(), dec!(9.5904));
        assert_eq!(table.format(dec!(9.5904), "USD").unwrap(), "$9.59");
        assert_eq!(table.round(dec!(0.125), "USD").unwrap(), dec!(0.13));
    }

    #[test]
    fn test_format_matches_round() {
        let table = CurrencyTable::default();
        for code in ["USD", "EUR", "JPY", "INR"] {
            let rounded = table.round(dec!(1234.5678), code).unwrap();
            let formatted = table.format(dec!(1234.5678), code).unwrap();
            let digits: String = formatted
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            assert_eq!(digits.parse::<Decimal>().unwrap(), rounded);
        }
    }

    #[test]
    fn test_conversion_overflow_is_an_error() {
        let table = CurrencyTable::default();
        assert!(matches!(
            table.format(Decimal::MAX, "JPY"),
            Err(PricingError::AmountOverflow(_))
        ));
        assert_eq!(table.round(Decimal::MAX, "USD").unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_zero_minor_units() {
        let table = CurrencyTable::default();
        // 175 × 151.50 = 26512.5 → rounds away from zero
        assert_eq!(table.format(dec!(175), "JPY").unwrap(), "¥26,513");
    }

    #[test]
    fn test_negative_amounts() {
        let table = CurrencyTable::default();
        assert_eq!(table.format(dec!(-20), "USD").unwrap(), "-$20.00");
    }

    #[test]
    fn test_set_rate_and_unknown_code() {
        let mut table = CurrencyTable::default();
        table.set_rate("EUR", dec!(0.5)).unwrap();
        assert_eq!(table.convert(dec!(100), "EUR").unwrap(), dec!(50));
        assert_eq!(table.format(dec!(100), "EUR").unwrap(), "€50.00");

        assert_eq!(
            table.format(dec!(1), "XYZ").unwrap_err(),
            PricingError::UnsupportedCurrency { code: "XYZ".into() }
        );
        assert!(table.set_rate("XYZ", dec!(1)).is_err());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("100"), "100");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("123456"), "123,456");
    }

    #[test]
    fn test_codes_sorted() {
        assert_eq!(
            CurrencyTable::default().codes(),
            vec!["EUR", "GBP", "INR", "JPY", "USD"]
        );
    }
}
