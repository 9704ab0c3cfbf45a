//! Price calculation
//!
//! ```text
//! base      = tier(users).per_user_price × users
//! feature   = unit_price × users   (per_user)
//!           = unit_price           (per_organization)
//!           = 0                    (free)
//! subtotal  = base + Σ feature
//! total     = subtotal                       (monthly)
//!           = subtotal × 12 × (1 - 0.20)     (yearly)
//! ```
//!
//! Everything stays in `Decimal` at full precision. Rounding to a currency's
//! minor unit only happens when formatting for display.

use crewbill_common::{FeatureId, PriceBreakdown, PricingError, SelectionState, UserTier};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::catalog::FeatureCatalog;
use super::normalize::normalize;
use super::tier::resolve_tier;

/// Price a selection against a catalog and tier table
#[instrument(
    level = "debug",
    skip(catalog, tiers, selection),
    fields(
        users = selection.user_count,
        period = selection.billing_period.as_str(),
        requested = selection.selected_feature_ids.len()
    )
)]
pub fn calculate(
    catalog: &FeatureCatalog,
    tiers: &[UserTier],
    selection: &SelectionState,
) -> Result<PriceBreakdown, PricingError> {
    let user_count = selection.user_count;
    let tier = resolve_tier(tiers, user_count)?;
    let base_user_cost = tier.base_cost(user_count)?;

    let effective = normalize(catalog, &selection.selected_feature_ids)?;

    let mut per_feature_costs: BTreeMap<FeatureId, Decimal> = BTreeMap::new();
    for id in effective {
        let cost = catalog.require(id.as_str())?.monthly_cost(user_count)?;
        per_feature_costs.insert(id, cost);
    }

    let subtotal_monthly = per_feature_costs
        .values()
        .try_fold(base_user_cost, |acc, cost| acc.checked_add(*cost))
        .ok_or_else(|| PricingError::overflow("monthly subtotal"))?;
    let billing_period = selection.billing_period;
    let total = billing_period.annualize(subtotal_monthly)?;

    debug!(
        tier = %tier.name,
        %subtotal_monthly,
        %total,
        "Calculated price"
    );

    Ok(PriceBreakdown {
        tier: tier.clone(),
        user_count,
        billing_period,
        base_user_cost,
        per_feature_costs,
        subtotal_monthly,
        yearly_discount_rate: billing_period.discount_rate(),
        total,
    })
}
