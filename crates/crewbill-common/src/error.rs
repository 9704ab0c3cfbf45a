//! Error types for Crewbill
//!
//! Provides a unified error type and the pricing-specific error variants

use serde::Serialize;
use thiserror::Error;

use crate::types::feature::FeatureId;

/// Result type alias using CrewbillError
pub type Result<T> = std::result::Result<T, CrewbillError>;

/// Unified error type for Crewbill operations
#[derive(Debug, Error)]
pub enum CrewbillError {
    // Pricing errors
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrewbillError {
    /// Pricing error behind this error, if any
    pub fn as_pricing(&self) -> Option<&PricingError> {
        match self {
            CrewbillError::Pricing(err) => Some(err),
            _ => None,
        }
    }
}

/// Broad classification of pricing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Tier table or catalog data is malformed
    Configuration,
    /// Feature dependencies loop back on themselves
    CyclicDependency,
    /// Caller supplied an unusable selection
    InvalidInput,
}

/// Pricing calculation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("User count must be at least 1")]
    InvalidUserCount,

    #[error("No tier covers {user_count} users")]
    NoMatchingTier { user_count: u32 },

    #[error("{matches} tiers cover {user_count} users, expected exactly one")]
    AmbiguousTier { user_count: u32, matches: usize },

    #[error("Invalid tier table: {0}")]
    InvalidTierTable(String),

    #[error("Cyclic feature dependency: {}", format_path(.path))]
    CyclicDependency { path: Vec<FeatureId> },

    #[error("Unknown feature: {feature_id}")]
    UnknownFeature { feature_id: FeatureId },

    #[error("Invalid feature catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unsupported currency: {code}")]
    UnsupportedCurrency { code: String },

    #[error("Amount overflow computing {0}")]
    AmountOverflow(String),
}

impl PricingError {
    /// Classify the error for callers that only care about the broad cause
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::NoMatchingTier { .. }
            | PricingError::AmbiguousTier { .. }
            | PricingError::InvalidTierTable(_)
            | PricingError::InvalidCatalog(_)
            | PricingError::AmountOverflow(_) => ErrorKind::Configuration,
            PricingError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            PricingError::InvalidUserCount
            | PricingError::UnknownFeature { .. }
            | PricingError::UnsupportedCurrency { .. } => ErrorKind::InvalidInput,
        }
    }
}

impl PricingError {
    /// Overflow while computing `what`
    pub fn overflow(what: impl Into<String>) -> Self {
        PricingError::AmountOverflow(what.into())
    }
}

fn format_path(path: &[FeatureId]) -> String {
    path.iter()
        .map(FeatureId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// Implement From for common external error types
impl From<serde_json::Error> for CrewbillError {
    fn from(err: serde_json::Error) -> Self {
        CrewbillError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CrewbillError {
    fn from(err: std::io::Error) -> Self {
        CrewbillError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for CrewbillError {
    fn from(err: anyhow::Error) -> Self {
        CrewbillError::Internal(err.to_string())
    }
}
