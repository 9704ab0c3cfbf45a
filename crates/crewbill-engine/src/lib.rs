//! # Crewbill Engine
//!
//! Tiered, feature-based subscription pricing for the Crewbill workforce suite.
//!
//! ## Pricing Formula
//!
//! ```text
//! Price = Seats + Features, discounted for yearly billing
//! ```
//!
//! Where:
//! - Seats: team-size tier price × user count
//! - Features: per-user features × user count, per-organization features flat
//! - Yearly: 12 months at 20% off
//!
//! The pricing functions are pure; [`PricingEngine`] only binds them to
//! immutable, validated reference data loaded from a [`PricingSource`].

pub mod currency;
pub mod pricing;
pub mod source;

pub use currency::{Currency, CurrencyTable};
pub use pricing::{
    calculate, normalize, resolve_tier, upgrade_delta, FeatureCatalog, PricingEngine,
    QuoteCache, TierTable, UpgradeOption,
};
pub use source::{BuiltinSource, FileSource, PricingDocument, PricingSource};
