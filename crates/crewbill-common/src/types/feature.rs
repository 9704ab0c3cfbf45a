//! Feature catalog entries
//!
//! A feature is a priced capability an organization can switch on. Features are
//! reference data: they are maintained by an external catalog and only read
//! during a calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::PricingError;

/// Stable string key of a catalog feature
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for FeatureId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FeatureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Catalog grouping used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Core,
    Productivity,
    Analytics,
    Location,
    Integration,
    Support,
}

impl FeatureCategory {
    pub fn all() -> [FeatureCategory; 6] {
        [
            FeatureCategory::Core,
            FeatureCategory::Productivity,
            FeatureCategory::Analytics,
            FeatureCategory::Location,
            FeatureCategory::Integration,
            FeatureCategory::Support,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureCategory::Core => "core",
            FeatureCategory::Productivity => "productivity",
            FeatureCategory::Analytics => "analytics",
            FeatureCategory::Location => "location",
            FeatureCategory::Integration => "integration",
            FeatureCategory::Support => "support",
        }
    }
}

/// How a feature's unit price scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingUnit {
    /// Unit price × user count
    PerUser,
    /// Unit price charged once per organization
    PerOrganization,
}

/// A priced capability from the feature catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Unique, stable key
    pub id: FeatureId,

    /// Display name
    pub name: String,

    /// Short marketing description
    #[serde(default)]
    pub description: String,

    /// Catalog grouping
    pub category: FeatureCategory,

    /// Monthly price per billing unit (non-negative)
    pub unit_price: Decimal,

    /// Whether the price scales with user count
    pub billing_unit: BillingUnit,

    /// Free features are always part of the effective selection
    #[serde(default)]
    pub is_free: bool,

    /// Features that must be selected whenever this one is
    #[serde(default)]
    pub dependencies: BTreeSet<FeatureId>,

    /// Display hint only, no pricing effect
    #[serde(default)]
    pub popular: bool,
}

impl Feature {
    /// Create a paid feature with no dependencies
    pub fn new(
        id: impl Into<FeatureId>,
        name: impl Into<String>,
        category: FeatureCategory,
        unit_price: Decimal,
        billing_unit: BillingUnit,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            unit_price,
            billing_unit,
            is_free: false,
            dependencies: BTreeSet::new(),
            popular: false,
        }
    }

    /// Create a free feature (always included, never charged)
    pub fn free(id: impl Into<FeatureId>, name: impl Into<String>, category: FeatureCategory) -> Self {
        Self {
            is_free: true,
            ..Self::new(id, name, category, Decimal::ZERO, BillingUnit::PerOrganization)
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a required feature
    pub fn depends_on(mut self, id: impl Into<FeatureId>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// Mark as popular
    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    /// Monthly cost of this feature for `user_count` users
    pub fn monthly_cost(&self, user_count: u32) -> Result<Decimal, PricingError> {
        if self.is_free {
            return Ok(Decimal::ZERO);
        }
        match self.billing_unit {
            BillingUnit::PerUser => self
                .unit_price
                .checked_mul(Decimal::from(user_count))
                .ok_or_else(|| PricingError::overflow(format!("cost of feature '{}'", self.id))),
            BillingUnit::PerOrganization => Ok(self.unit_price),
        }
    }
}
