//! Team-size tiers and billing periods

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PricingError;
use crate::{MONTHS_PER_YEAR, YEARLY_DISCOUNT_RATE};

/// A team-size band with a flat per-user price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTier {
    /// Display label (e.g. "Team")
    #[serde(default)]
    pub name: String,

    /// First user count in the band (inclusive)
    pub range_start: u32,

    /// Last user count in the band (inclusive), `None` for the top band
    #[serde(default)]
    pub range_end: Option<u32>,

    /// Monthly price per user
    pub per_user_price: Decimal,
}

impl UserTier {
    pub fn new(
        name: impl Into<String>,
        range_start: u32,
        range_end: Option<u32>,
        per_user_price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            range_start,
            range_end,
            per_user_price,
        }
    }

    /// Whether `user_count` falls inside this band
    pub fn contains(&self, user_count: u32) -> bool {
        user_count >= self.range_start && self.range_end.map_or(true, |end| user_count <= end)
    }

    pub fn is_unbounded(&self) -> bool {
        self.range_end.is_none()
    }

    /// Monthly cost of the band for `user_count` seats
    pub fn base_cost(&self, user_count: u32) -> Result<Decimal, PricingError> {
        self.per_user_price
            .checked_mul(Decimal::from(user_count))
            .ok_or_else(|| PricingError::overflow(format!("base cost of tier '{}'", self.name)))
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range_end {
            Some(end) => write!(f, "{} ({}-{} users)", self.name, self.range_start, end),
            None => write!(f, "{} ({}+ users)", self.name, self.range_start),
        }
    }
}

/// How often the organization is invoiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// Discount applied to the period total
    pub fn discount_rate(&self) -> Decimal {
        match self {
            BillingPeriod::Monthly => Decimal::ZERO,
            BillingPeriod::Yearly => YEARLY_DISCOUNT_RATE,
        }
    }

    /// Months covered by one invoice
    pub fn months(&self) -> u32 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Yearly => MONTHS_PER_YEAR,
        }
    }

    /// Turn a monthly amount into the amount invoiced for this period
    pub fn annualize(&self, monthly: Decimal) -> Result<Decimal, PricingError> {
        match self {
            BillingPeriod::Monthly => Ok(monthly),
            BillingPeriod::Yearly => monthly
                .checked_mul(Decimal::from(MONTHS_PER_YEAR))
                .and_then(|year| year.checked_mul(Decimal::ONE - self.discount_rate()))
                .ok_or_else(|| PricingError::overflow("yearly total")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }
}

impl Default for BillingPeriod {
    fn default() -> Self {
        BillingPeriod::Monthly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bounded_tier_contains() {
        let tier = UserTier::new("Team", 11, Some(50), dec!(2));
        assert!(!tier.contains(10));
        assert!(tier.contains(11));
        assert!(tier.contains(50));
        assert!(!tier.contains(51));
    }

    #[test]
    fn test_unbounded_tier_contains() {
        let tier = UserTier::new("Enterprise", 201, None, dec!(6));
        assert!(!tier.contains(200));
        assert!(tier.contains(201));
        assert!(tier.contains(u32::MAX));
    }

    #[test]
    fn test_billing_period_discounts() {
        assert_eq!(BillingPeriod::Monthly.discount_rate(), Decimal::ZERO);
        assert_eq!(BillingPeriod::Yearly.discount_rate(), dec!(0.20));
        assert_eq!(BillingPeriod::Yearly.months(), 12);
    }

    #[test]
    fn test_annualize() {
        assert_eq!(BillingPeriod::Monthly.annualize(dec!(175)).unwrap(), dec!(175));
        assert_eq!(BillingPeriod::Yearly.annualize(dec!(175)).unwrap(), dec!(1680));
    }

    #[test]
    fn test_money_overflow_is_an_error() {
        let tier = UserTier::new("Huge", 1, None, Decimal::MAX / Decimal::from(10));
        assert!(matches!(tier.base_cost(100), Err(PricingError::AmountOverflow(_))));
        assert_eq!(tier.base_cost(1).unwrap(), Decimal::MAX / Decimal::from(10));

        let monthly = Decimal::MAX / Decimal::from(2);
        assert_eq!(BillingPeriod::Monthly.annualize(monthly).unwrap(), monthly);
        assert!(matches!(
            BillingPeriod::Yearly.annualize(monthly),
            Err(PricingError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(
            UserTier::new("Team", 11, Some(50), dec!(2)).to_string(),
            "Team (11-50 users)"
        );
        assert_eq!(
            UserTier::new("Enterprise", 201, None, dec!(6)).to_string(),
            "Enterprise (201+ users)"
        );
    }
}
