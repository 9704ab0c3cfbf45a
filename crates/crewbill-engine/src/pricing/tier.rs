//! Tier resolution
//!
//! Maps a user count onto exactly one team-size band. A tier table must
//! partition the positive integers starting at 1; anything else is a
//! configuration defect and is reported rather than papered over.

use crewbill_common::{PricingError, UserTier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, instrument};

/// Select the unique tier whose range contains `user_count`
///
/// Fails if zero or several tiers match. Never falls back to a "closest" tier.
#[instrument(level = "debug", skip(tiers), fields(tiers = tiers.len()))]
pub fn resolve_tier(tiers: &[UserTier], user_count: u32) -> Result<&UserTier, PricingError> {
    if user_count == 0 {
        return Err(PricingError::InvalidUserCount);
    }

    let mut matches = tiers.iter().filter(|tier| tier.contains(user_count));
    let Some(tier) = matches.next() else {
        return Err(PricingError::NoMatchingTier { user_count });
    };

    let extra = matches.count();
    if extra > 0 {
        return Err(PricingError::AmbiguousTier {
            user_count,
            matches: extra + 1,
        });
    }

    debug!(tier = %tier.name, "Resolved tier");
    Ok(tier)
}

/// A tier table that has been checked to partition `1..`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierTable {
    tiers: Vec<UserTier>,
}

impl TierTable {
    /// Validate and sort a tier table
    pub fn new(mut tiers: Vec<UserTier>) -> Result<Self, PricingError> {
        tiers.sort_by_key(|tier| tier.range_start);

        let Some(first) = tiers.first() else {
            return Err(PricingError::InvalidTierTable("table is empty".into()));
        };
        if first.range_start != 1 {
            return Err(PricingError::InvalidTierTable(format!(
                "first tier starts at {}, expected 1",
                first.range_start
            )));
        }

        for (i, tier) in tiers.iter().enumerate() {
            if tier.per_user_price < Decimal::ZERO {
                return Err(PricingError::InvalidTierTable(format!(
                    "tier '{}' has a negative price",
                    tier.name
                )));
            }

            let is_last = i + 1 == tiers.len();
            match (tier.range_end, is_last) {
                (Some(end), _) if end < tier.range_start => {
                    return Err(PricingError::InvalidTierTable(format!(
                        "tier '{}' ends before it starts",
                        tier.name
                    )));
                }
                (None, false) => {
                    return Err(PricingError::InvalidTierTable(format!(
                        "unbounded tier '{}' is not the last tier",
                        tier.name
                    )));
                }
                (Some(end), true) => {
                    return Err(PricingError::InvalidTierTable(format!(
                        "top tier '{}' ends at {}, expected no upper bound",
                        tier.name, end
                    )));
                }
                (Some(end), false) => {
                    let next = &tiers[i + 1];
                    let expected = end.checked_add(1).ok_or_else(|| {
                        PricingError::InvalidTierTable(format!(
                            "tier '{}' ends at the largest user count",
                            tier.name
                        ))
                    })?;
                    if next.range_start < expected {
                        return Err(PricingError::InvalidTierTable(format!(
                            "tiers '{}' and '{}' overlap",
                            tier.name, next.name
                        )));
                    }
                    if next.range_start > expected {
                        return Err(PricingError::InvalidTierTable(format!(
                            "gap between '{}' and '{}' ({}..{})",
                            tier.name,
                            next.name,
                            expected,
                            next.range_start - 1
                        )));
                    }
                }
                (None, true) => {}
            }
        }

        Ok(Self { tiers })
    }

    /// Resolve the tier for `user_count`
    pub fn resolve(&self, user_count: u32) -> Result<&UserTier, PricingError> {
        resolve_tier(&self.tiers, user_count)
    }

    /// Tiers strictly above `current`, lowest first
    pub fn next_tiers(&self, current: &UserTier) -> impl Iterator<Item = &UserTier> {
        let start = current.range_start;
        self.tiers.iter().filter(move |tier| tier.range_start > start)
    }

    pub fn tiers(&self) -> &[UserTier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl AsRef<[UserTier]> for TierTable {
    fn as_ref(&self) -> &[UserTier] {
        &self.tiers
    }
}

/// Reference team-size bands
pub fn default_tiers() -> Vec<UserTier> {
    vec![
        UserTier::new("Starter", 1, Some(10), dec!(0)),
        UserTier::new("Team", 11, Some(50), dec!(2)),
        UserTier::new("Business", 51, Some(200), dec!(4)),
        UserTier::new("Enterprise", 201, None, dec!(6)),
    ]
}
