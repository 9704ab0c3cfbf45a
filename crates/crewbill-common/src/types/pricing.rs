//! Selection and price breakdown types
//!
//! A [`SelectionState`] is the input an organization edits; a [`PriceBreakdown`]
//! is what the engine hands back. Breakdowns are never persisted here: they are
//! recomputed on every input change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::feature::FeatureId;
use super::tier::{BillingPeriod, UserTier};
use crate::error::PricingError;

/// What an organization has picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Explicitly selected feature ids
    #[serde(default)]
    pub selected_feature_ids: BTreeSet<FeatureId>,

    /// Seats on the plan (at least 1)
    pub user_count: u32,

    /// Invoice cadence
    #[serde(default)]
    pub billing_period: BillingPeriod,
}

impl SelectionState {
    /// Create an empty selection for `user_count` users
    pub fn new(user_count: u32, billing_period: BillingPeriod) -> Self {
        Self {
            selected_feature_ids: BTreeSet::new(),
            user_count,
            billing_period,
        }
    }

    /// Add feature ids to the raw selection
    pub fn with_features<I, F>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        self.selected_feature_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Change the seat count
    pub fn with_user_count(mut self, user_count: u32) -> Result<Self, PricingError> {
        if user_count == 0 {
            return Err(PricingError::InvalidUserCount);
        }
        self.user_count = user_count;
        Ok(self)
    }

    /// Change the billing period
    pub fn with_billing_period(mut self, billing_period: BillingPeriod) -> Self {
        self.billing_period = billing_period;
        self
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_feature_ids.contains(id)
    }
}

/// Itemized result of a price calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Tier the user count resolved to
    pub tier: UserTier,

    /// Seats priced
    pub user_count: u32,

    /// Invoice cadence
    pub billing_period: BillingPeriod,

    /// Tier price × user count
    pub base_user_cost: Decimal,

    /// Monthly cost of every effective feature (free features at zero)
    pub per_feature_costs: BTreeMap<FeatureId, Decimal>,

    /// Base cost plus all feature costs, per month
    pub subtotal_monthly: Decimal,

    /// Discount applied to the period total (0.20 for yearly)
    pub yearly_discount_rate: Decimal,

    /// Amount invoiced for the billing period
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Ids of every feature in the effective selection
    pub fn effective_features(&self) -> impl Iterator<Item = &FeatureId> {
        self.per_feature_costs.keys()
    }

    /// Period total before any discount
    pub fn undiscounted_total(&self) -> Decimal {
        self.subtotal_monthly
            .saturating_mul(Decimal::from(self.billing_period.months()))
    }

    /// Amount saved by the billing period discount
    pub fn savings(&self) -> Decimal {
        self.undiscounted_total() - self.total
    }

    /// Period total spread over its months
    pub fn monthly_equivalent(&self) -> Decimal {
        self.total / Decimal::from(self.billing_period.months())
    }

    /// Cost of a single feature line, if it is part of the effective selection
    pub fn feature_cost(&self, id: &str) -> Option<Decimal> {
        self.per_feature_costs.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn yearly_breakdown() -> PriceBreakdown {
        let mut per_feature_costs = BTreeMap::new();
        per_feature_costs.insert(FeatureId::from("gps_tracking"), dec!(75));
        per_feature_costs.insert(FeatureId::from("api_access"), dec!(50));
        per_feature_costs.insert(FeatureId::from("attendance"), Decimal::ZERO);

        PriceBreakdown {
            tier: UserTier::new("Team", 11, Some(50), dec!(2)),
            user_count: 25,
            billing_period: BillingPeriod::Yearly,
            base_user_cost: dec!(50),
            per_feature_costs,
            subtotal_monthly: dec!(175),
            yearly_discount_rate: dec!(0.20),
            total: dec!(1680),
        }
    }

    #[test]
    fn test_breakdown_helpers() {
        let breakdown = yearly_breakdown();
        assert_eq!(breakdown.undiscounted_total(), dec!(2100));
        assert_eq!(breakdown.savings(), dec!(420));
        assert_eq!(breakdown.monthly_equivalent(), dec!(140));
        assert_eq!(breakdown.feature_cost("attendance"), Some(Decimal::ZERO));
        assert_eq!(breakdown.feature_cost("payroll_integration"), None);
        assert_eq!(breakdown.effective_features().count(), 3);
    }

    #[test]
    fn test_with_user_count_rejects_zero() {
        let state = SelectionState::new(5, BillingPeriod::Monthly);
        assert_eq!(
            state.clone().with_user_count(0),
            Err(PricingError::InvalidUserCount)
        );
        assert_eq!(state.with_user_count(12).unwrap().user_count, 12);
    }

    #[test]
    fn test_selection_json_defaults() {
        let state: SelectionState = serde_json::from_str(r#"{"user_count": 3}"#).unwrap();
        assert!(state.selected_feature_ids.is_empty());
        assert_eq!(state.billing_period, BillingPeriod::Monthly);
    }

    #[test]
    fn test_with_features() {
        let state = SelectionState::new(5, BillingPeriod::Monthly)
            .with_features(["gps_tracking", "forms_builder", "gps_tracking"]);
        assert_eq!(state.selected_feature_ids.len(), 2);
        assert!(state.is_selected("forms_builder"));
    }
}
