//! Pricing engine facade
//!
//! Holds validated, immutable copies of the catalog and tier table and runs
//! the pure pricing functions against them. Safe to share behind an `Arc`.

use crewbill_common::{Feature, FeatureId, PriceBreakdown, PricingError, SelectionState, UserTier};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::cache::QuoteCache;
use super::calculator::calculate;
use super::catalog::{default_catalog, FeatureCatalog};
use super::delta::{upgrade_options, UpgradeOption};
use super::normalize::normalize;
use super::selection::{deselect_feature, select_feature, toggle_feature};
use super::tier::{default_tiers, TierTable};
use crate::source::PricingSource;

/// Pricing engine bound to one catalog and tier table
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<FeatureCatalog>,
    tiers: Arc<TierTable>,
    /// Fingerprint of the reference data, used to key cached quotes
    version: u64,
}

impl PricingEngine {
    /// Validate reference data and build an engine
    pub fn new(features: Vec<Feature>, tiers: Vec<UserTier>) -> Result<Self, PricingError> {
        let catalog = FeatureCatalog::new(features)?;
        catalog.check_acyclic()?;
        let tiers = TierTable::new(tiers)?;
        let version = fingerprint(&catalog, &tiers);

        debug!(
            features = catalog.len(),
            tiers = tiers.len(),
            version = %format!("{:016x}", version),
            "Built pricing engine"
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            tiers: Arc::new(tiers),
            version,
        })
    }

    /// Engine over the built-in catalog and reference tiers
    pub fn builtin() -> Result<Self, PricingError> {
        Self::new(default_catalog(), default_tiers())
    }

    /// Load reference data from a source and build an engine
    #[instrument(skip(source), fields(origin = %source.describe()))]
    pub async fn from_source(source: &dyn PricingSource) -> crewbill_common::Result<Self> {
        let document = source.load().await?;
        let engine = Self::new(document.features, document.tiers)?;

        info!(
            features = engine.catalog.len(),
            tiers = engine.tiers.len(),
            "Loaded pricing reference data"
        );
        Ok(engine)
    }

    /// Authoritative price for a selection
    pub fn quote(&self, selection: &SelectionState) -> Result<PriceBreakdown, PricingError> {
        calculate(&self.catalog, self.tiers.tiers(), selection)
    }

    /// Quote through a cache; the flag is true on a cache hit
    pub fn quote_cached(
        &self,
        cache: &QuoteCache,
        selection: &SelectionState,
    ) -> Result<(PriceBreakdown, bool), PricingError> {
        if let Some(breakdown) = cache.get(self.version, selection) {
            return Ok((breakdown, true));
        }
        let breakdown = self.quote(selection)?;
        cache.set(self.version, selection, &breakdown);
        Ok((breakdown, false))
    }

    /// Effective feature set for a selection
    pub fn effective_selection(
        &self,
        selection: &SelectionState,
    ) -> Result<BTreeSet<FeatureId>, PricingError> {
        normalize(&self.catalog, &selection.selected_feature_ids)
    }

    /// Upgrade cards above the selection's tier
    pub fn upgrade_options(
        &self,
        selection: &SelectionState,
    ) -> Result<Vec<UpgradeOption>, PricingError> {
        upgrade_options(&self.catalog, &self.tiers, selection)
    }

    pub fn select(&self, selection: &SelectionState, id: &str) -> Result<SelectionState, PricingError> {
        select_feature(&self.catalog, selection, id)
    }

    pub fn deselect(&self, selection: &SelectionState, id: &str) -> Result<SelectionState, PricingError> {
        deselect_feature(&self.catalog, selection, id)
    }

    pub fn toggle(&self, selection: &SelectionState, id: &str) -> Result<SelectionState, PricingError> {
        toggle_feature(&self.catalog, selection, id)
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Stable hash of everything that affects a price
fn fingerprint(catalog: &FeatureCatalog, tiers: &TierTable) -> u64 {
    let mut hasher = blake3::Hasher::new();

    let mut features: Vec<&Feature> = catalog.iter().collect();
    features.sort_by(|a, b| a.id.cmp(&b.id));
    for feature in features {
        hasher.update(feature.id.as_str().as_bytes());
        hasher.update(feature.unit_price.normalize().to_string().as_bytes());
        hasher.update(format!("{:?}", feature.billing_unit).as_bytes());
        hasher.update(&[u8::from(feature.is_free)]);
        for dep in &feature.dependencies {
            hasher.update(dep.as_str().as_bytes());
        }
        hasher.update(b";");
    }

    for tier in tiers.tiers() {
        hasher.update(&tier.range_start.to_le_bytes());
        hasher.update(&tier.range_end.unwrap_or(0).to_le_bytes());
        hasher.update(tier.per_user_price.normalize().to_string().as_bytes());
        hasher.update(b";");
    }

    let mut version = [0u8; 8];
    version.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
    u64::from_le_bytes(version)
}
