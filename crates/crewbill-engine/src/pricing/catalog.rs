//! Feature catalog
//!
//! Indexes catalog features by id and checks the reference data before any
//! price is computed from it.

use crewbill_common::{BillingUnit, Feature, FeatureCategory, FeatureId, PricingError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Immutable, indexed view over the feature catalog
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCatalog {
    /// Features in catalog order
    features: Vec<Feature>,
    /// Position of each feature by id
    #[serde(skip)]
    index: HashMap<FeatureId, usize>,
}

impl FeatureCatalog {
    /// Build a catalog, rejecting duplicate ids, negative prices and
    /// dependencies on features that do not exist
    pub fn new(features: Vec<Feature>) -> Result<Self, PricingError> {
        let mut index = HashMap::with_capacity(features.len());
        for (position, feature) in features.iter().enumerate() {
            if feature.unit_price < Decimal::ZERO {
                return Err(PricingError::InvalidCatalog(format!(
                    "feature '{}' has a negative price",
                    feature.id
                )));
            }
            if index.insert(feature.id.clone(), position).is_some() {
                return Err(PricingError::InvalidCatalog(format!(
                    "duplicate feature id '{}'",
                    feature.id
                )));
            }
        }

        for feature in &features {
            if let Some(missing) = feature
                .dependencies
                .iter()
                .find(|dep| !index.contains_key(dep.as_str()))
            {
                return Err(PricingError::InvalidCatalog(format!(
                    "feature '{}' depends on unknown feature '{}'",
                    feature.id, missing
                )));
            }
        }

        Ok(Self { features, index })
    }

    /// Fail with the first dependency cycle found anywhere in the catalog
    pub fn check_acyclic(&self) -> Result<(), PricingError> {
        let all: BTreeSet<FeatureId> = self.index.keys().cloned().collect();
        super::normalize::dependency_closure(self, all.iter()).map(|_| ())
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.index.get(id).map(|&position| &self.features[position])
    }

    /// Look up a feature, failing on unknown ids
    pub fn require(&self, id: &str) -> Result<&Feature, PricingError> {
        self.get(id).ok_or_else(|| PricingError::UnknownFeature {
            feature_id: FeatureId::from(id),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Features in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Features that are always included
    pub fn free_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|feature| feature.is_free)
    }

    pub fn by_category(&self, category: FeatureCategory) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(move |feature| feature.category == category)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Workforce-management feature set shipped with the service
pub fn default_catalog() -> Vec<Feature> {
    vec![
        Feature::free("attendance", "Attendance", FeatureCategory::Core)
            .with_description("Clock-in/clock-out, shifts and timesheets"),
        Feature::free("employee_profiles", "Employee Profiles", FeatureCategory::Core)
            .with_description("Staff directory with roles and documents"),
        Feature::new(
            "task_management",
            "Task Management",
            FeatureCategory::Productivity,
            dec!(2),
            BillingUnit::PerUser,
        )
        .with_description("Assign, track and review field tasks")
        .popular(),
        Feature::new(
            "project_tracking",
            "Project Tracking",
            FeatureCategory::Productivity,
            dec!(3),
            BillingUnit::PerUser,
        )
        .with_description("Milestones and progress across task groups")
        .depends_on("task_management"),
        Feature::new(
            "forms_builder",
            "Forms Builder",
            FeatureCategory::Productivity,
            dec!(25),
            BillingUnit::PerOrganization,
        )
        .with_description("Custom inspection and incident forms"),
        Feature::new(
            "advanced_analytics",
            "Advanced Analytics",
            FeatureCategory::Analytics,
            dec!(49),
            BillingUnit::PerOrganization,
        )
        .with_description("Attendance, productivity and patrol dashboards"),
        Feature::new(
            "custom_reports",
            "Custom Reports",
            FeatureCategory::Analytics,
            dec!(29),
            BillingUnit::PerOrganization,
        )
        .with_description("Scheduled exports and report designer")
        .depends_on("advanced_analytics"),
        Feature::new(
            "gps_tracking",
            "GPS Tracking",
            FeatureCategory::Location,
            dec!(3),
            BillingUnit::PerUser,
        )
        .with_description("Live location of field staff")
        .popular(),
        Feature::new(
            "geofencing",
            "Geofencing",
            FeatureCategory::Location,
            dec!(1.50),
            BillingUnit::PerUser,
        )
        .with_description("Site boundaries for location-verified attendance")
        .depends_on("gps_tracking"),
        Feature::new(
            "route_optimization",
            "Route Optimization",
            FeatureCategory::Location,
            dec!(2),
            BillingUnit::PerUser,
        )
        .with_description("Shortest visiting order for field routes")
        .depends_on("gps_tracking"),
        Feature::new(
            "security_patrol",
            "Security Patrol",
            FeatureCategory::Location,
            dec!(4),
            BillingUnit::PerUser,
        )
        .with_description("Patrol routes with checkpoint scanning")
        .depends_on("gps_tracking"),
        Feature::new(
            "api_access",
            "API Access",
            FeatureCategory::Integration,
            dec!(50),
            BillingUnit::PerOrganization,
        )
        .with_description("REST API and webhooks"),
        Feature::new(
            "payroll_integration",
            "Payroll Integration",
            FeatureCategory::Integration,
            dec!(39),
            BillingUnit::PerOrganization,
        )
        .with_description("Push approved timesheets to payroll")
        .depends_on("attendance"),
        Feature::new(
            "priority_support",
            "Priority Support",
            FeatureCategory::Support,
            dec!(99),
            BillingUnit::PerOrganization,
        )
        .with_description("Four-hour response and a named contact"),
    ]
}
