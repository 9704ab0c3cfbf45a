//! Pricing module
//!
//! Provides tier/feature based subscription pricing:
//! - Tier resolution over team-size bands
//! - Feature selection normalization (free features + dependency closure)
//! - Decimal price calculation with yearly discount
//! - Display-only upgrade deltas backed by recomputed quotes
//! - Select/deselect transitions with dependency cascades
//! - In-memory quote caching

pub mod cache;
pub mod calculator;
pub mod catalog;
pub mod delta;
pub mod engine;
pub mod normalize;
pub mod selection;
pub mod tier;

pub use cache::{CacheStats, QuoteCache};
pub use calculator::calculate;
pub use catalog::{default_catalog, FeatureCatalog};
pub use delta::{upgrade_delta, upgrade_options, UpgradeOption};
pub use engine::PricingEngine;
pub use normalize::normalize;
pub use selection::{dependents_of, deselect_feature, select_feature, toggle_feature};
pub use tier::{default_tiers, resolve_tier, TierTable};
