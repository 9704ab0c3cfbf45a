//! Tier upgrade deltas
//!
//! The delta is what an upgrade card shows ("+$50/mo"). It is display-only:
//! totals for an upgraded plan always come from a fresh [`calculate`] run so the
//! two numbers cannot drift apart.

use crewbill_common::{BillingPeriod, PriceBreakdown, PricingError, SelectionState, UserTier};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use super::calculator::calculate;
use super::catalog::FeatureCatalog;
use super::tier::TierTable;

/// Price difference of moving `user_count` seats between two per-user prices
pub fn upgrade_delta(
    current_tier_price: Decimal,
    target_tier_price: Decimal,
    user_count: u32,
    billing_period: BillingPeriod,
) -> Result<Decimal, PricingError> {
    let monthly = (target_tier_price - current_tier_price)
        .checked_mul(Decimal::from(user_count))
        .ok_or_else(|| PricingError::overflow("upgrade delta"))?;
    billing_period.annualize(monthly)
}

/// One upgrade card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOption {
    /// Tier being offered
    pub tier: UserTier,
    /// Display-only price difference at the current seat count
    pub delta: Decimal,
    /// Seats the offered plan is priced for
    pub user_count: u32,
    /// Full recalculation for the offered plan
    pub quote: PriceBreakdown,
}

/// Upgrade options above the selection's current tier
///
/// Each option carries a display delta at the current seat count and an
/// authoritative quote recomputed with the seat count raised to the start of
/// the offered band.
#[instrument(level = "debug", skip_all, fields(users = selection.user_count))]
pub fn upgrade_options(
    catalog: &FeatureCatalog,
    tiers: &TierTable,
    selection: &SelectionState,
) -> Result<Vec<UpgradeOption>, PricingError> {
    let current = tiers.resolve(selection.user_count)?;

    let options = tiers
        .next_tiers(current)
        .map(|target| -> Result<UpgradeOption, PricingError> {
            let user_count = selection.user_count.max(target.range_start);
            let upgraded = selection.clone().with_user_count(user_count)?;
            let quote = calculate(catalog, tiers.tiers(), &upgraded)?;
            Ok(UpgradeOption {
                tier: target.clone(),
                delta: upgrade_delta(
                    current.per_user_price,
                    target.per_user_price,
                    selection.user_count,
                    selection.billing_period,
                )?,
                user_count,
                quote,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(options = options.len(), current = %current.name, "Built upgrade options");
    Ok(options)
}
