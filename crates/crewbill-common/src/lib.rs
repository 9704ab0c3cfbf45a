//! # Crewbill Common
//!
//! Shared data model and error types for the Crewbill subscription pricing engine.
//!
//! ## Core Types
//!
//! - [`Feature`]: A priced capability from the feature catalog
//! - [`UserTier`]: A team-size band with a flat per-user price
//! - [`SelectionState`]: What an organization has picked (features, seats, period)
//! - [`PriceBreakdown`]: The itemized result of a price calculation
//!
//! ## Pricing Formula
//!
//! ```text
//! Subtotal = Tier(users) × users + Σ feature costs
//! Total    = Subtotal                     (monthly)
//!          = Subtotal × 12 × (1 - 0.20)   (yearly)
//! ```

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{CrewbillError, ErrorKind, PricingError, Result};
pub use types::{
    feature::{BillingUnit, Feature, FeatureCategory, FeatureId},
    pricing::{PriceBreakdown, SelectionState},
    tier::{BillingPeriod, UserTier},
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Crewbill version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Discount applied to yearly billing (20%)
pub const YEARLY_DISCOUNT_RATE: Decimal = dec!(0.20);

/// Months billed up front on a yearly plan
pub const MONTHS_PER_YEAR: u32 = 12;

/// Currency all catalog prices are denominated in
pub const BASE_CURRENCY: &str = "USD";
