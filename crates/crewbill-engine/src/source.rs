//! Pricing reference data sources
//!
//! The feature catalog and tier table are owned by external collaborators.
//! A [`PricingSource`] loads both together as one [`PricingDocument`] so the
//! engine never pairs features and tiers from different versions.

use async_trait::async_trait;
use crewbill_common::{CrewbillError, Feature, Result, UserTier};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::pricing::catalog::default_catalog;
use crate::pricing::tier::default_tiers;

/// Trait for pricing reference data providers
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Load the catalog and tier table in one read
    async fn load(&self) -> Result<PricingDocument>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

/// Built-in workforce catalog and reference tiers
#[derive(Debug, Clone, Default)]
pub struct BuiltinSource;

#[async_trait]
impl PricingSource for BuiltinSource {
    async fn load(&self) -> Result<PricingDocument> {
        Ok(PricingDocument {
            features: default_catalog(),
            tiers: default_tiers(),
        })
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// On-disk pricing document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingDocument {
    pub features: Vec<Feature>,
    pub tiers: Vec<UserTier>,
}

/// JSON file holding a [`PricingDocument`]
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read_document(&self) -> Result<PricingDocument> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CrewbillError::Config(format!(
                "Failed to read pricing file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let document: PricingDocument = serde_json::from_str(&content).map_err(|e| {
            CrewbillError::Serialization(format!("Failed to parse pricing file: {}", e))
        })?;

        debug!(
            features = document.features.len(),
            tiers = document.tiers.len(),
            "Loaded pricing document"
        );
        Ok(document)
    }
}

#[async_trait]
impl PricingSource for FileSource {
    async fn load(&self) -> Result<PricingDocument> {
        self.read_document().await
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
