//! Selection transitions
//!
//! Selecting a feature adds it together with everything it depends on.
//! Deselecting a feature removes it together with everything that depends on
//! it. Free features are always effective, so deselecting one is a no-op.
//!
//! Each transition takes the previous state and returns a new one; the input is
//! never mutated.

use crewbill_common::{FeatureId, PricingError, SelectionState};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use super::catalog::FeatureCatalog;
use super::normalize::{dependency_closure, normalize};

/// Add `id` and its transitive dependencies to the selection
#[instrument(level = "debug", skip(catalog, state))]
pub fn select_feature(
    catalog: &FeatureCatalog,
    state: &SelectionState,
    id: &str,
) -> Result<SelectionState, PricingError> {
    let feature = catalog.require(id)?;
    let added = dependency_closure(catalog, std::iter::once(&feature.id))?;

    let mut next = state.clone();
    next.selected_feature_ids.extend(added);
    next.selected_feature_ids = normalize(catalog, &next.selected_feature_ids)?;

    debug!(selected = next.selected_feature_ids.len(), "Selected feature");
    Ok(next)
}

/// Remove `id` and every feature that transitively depends on it
#[instrument(level = "debug", skip(catalog, state))]
pub fn deselect_feature(
    catalog: &FeatureCatalog,
    state: &SelectionState,
    id: &str,
) -> Result<SelectionState, PricingError> {
    let feature = catalog.require(id)?;
    if feature.is_free {
        debug!("Free features cannot be deselected");
        return Ok(state.clone());
    }

    let mut removed = dependents_of(catalog, id)?;
    removed.insert(feature.id.clone());

    let mut next = state.clone();
    next.selected_feature_ids
        .retain(|selected| !removed.contains(selected));

    debug!(
        removed = removed.len(),
        selected = next.selected_feature_ids.len(),
        "Deselected feature"
    );
    Ok(next)
}

/// Select `id` if it is not in the effective selection, deselect it otherwise
pub fn toggle_feature(
    catalog: &FeatureCatalog,
    state: &SelectionState,
    id: &str,
) -> Result<SelectionState, PricingError> {
    let effective = normalize(catalog, &state.selected_feature_ids)?;
    if effective.contains(id) {
        deselect_feature(catalog, state, id)
    } else {
        select_feature(catalog, state, id)
    }
}

/// Every feature that depends on `id`, directly or transitively
pub fn dependents_of(catalog: &FeatureCatalog, id: &str) -> Result<BTreeSet<FeatureId>, PricingError> {
    catalog.require(id)?;

    let mut dependents: BTreeSet<FeatureId> = BTreeSet::new();
    let mut frontier: Vec<&str> = vec![id];
    while let Some(current) = frontier.pop() {
        for feature in catalog.iter() {
            if feature.dependencies.contains(current) && dependents.insert(feature.id.clone()) {
                frontier.push(feature.id.as_str());
            }
        }
    }

    // A cycle through `id` would make it its own dependent
    dependents.remove(id);
    Ok(dependents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::catalog::default_catalog;
    use crewbill_common::BillingPeriod;

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new(default_catalog()).unwrap()
    }

    fn ids(list: &[&str]) -> BTreeSet<FeatureId> {
        list.iter().map(|id| FeatureId::from(*id)).collect()
    }

    #[test]
    fn test_select_adds_dependencies() {
        let state = SelectionState::new(20, BillingPeriod::Monthly);
        let next = select_feature(&catalog(), &state, "route_optimization").unwrap();

        assert!(next.is_selected("route_optimization"));
        assert!(next.is_selected("gps_tracking"));
        assert!(next.is_selected("attendance"));
        // Input is left untouched
        assert!(state.selected_feature_ids.is_empty());
    }

    #[test]
    fn test_deselect_cascades_to_dependents() {
        let catalog = catalog();
        let state = SelectionState::new(20, BillingPeriod::Monthly).with_features([
            "gps_tracking",
            "geofencing",
            "route_optimization",
            "security_patrol",
            "forms_builder",
        ]);

        let next = deselect_feature(&catalog, &state, "gps_tracking").unwrap();
        assert_eq!(next.selected_feature_ids, ids(&["forms_builder"]));
    }

    #[test]
    fn test_deselect_leaf_keeps_dependency() {
        let catalog = catalog();
        let state = select_feature(
            &catalog,
            &SelectionState::new(20, BillingPeriod::Monthly),
            "route_optimization",
        )
        .unwrap();

        let next = deselect_feature(&catalog, &state, "route_optimization").unwrap();
        assert!(!next.is_selected("route_optimization"));
        assert!(next.is_selected("gps_tracking"));
    }

    #[test]
    fn test_deselect_free_feature_is_noop() {
        let catalog = catalog();
        let state = SelectionState::new(5, BillingPeriod::Monthly)
            .with_features(["attendance", "payroll_integration"]);

        let next = deselect_feature(&catalog, &state, "attendance").unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_toggle_round_trip() {
        let catalog = catalog();
        let state = SelectionState::new(5, BillingPeriod::Monthly);

        let on = toggle_feature(&catalog, &state, "custom_reports").unwrap();
        assert!(on.is_selected("custom_reports"));
        assert!(on.is_selected("advanced_analytics"));

        let off = toggle_feature(&catalog, &on, "advanced_analytics").unwrap();
        assert!(!off.is_selected("custom_reports"));
        assert!(!off.is_selected("advanced_analytics"));
    }

    #[test]
    fn test_toggle_implicit_dependency_deselects() {
        let catalog = catalog();
        // gps_tracking is effective only through route_optimization's dependency
        let state =
            SelectionState::new(5, BillingPeriod::Monthly).with_features(["route_optimization"]);
        let next = toggle_feature(&catalog, &state, "gps_tracking").unwrap();
        assert!(!next.is_selected("route_optimization"));
    }

    #[test]
    fn test_dependents_of() {
        let catalog = catalog();
        assert_eq!(
            dependents_of(&catalog, "gps_tracking").unwrap(),
            ids(&["geofencing", "route_optimization", "security_patrol"])
        );
        assert_eq!(
            dependents_of(&catalog, "attendance").unwrap(),
            ids(&["payroll_integration"])
        );
        assert!(dependents_of(&catalog, "priority_support")
            .unwrap()
            .is_empty());
        assert!(dependents_of(&catalog, "teleportation").is_err());
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let state = SelectionState::new(5, BillingPeriod::Monthly);
        assert_eq!(
            select_feature(&catalog(), &state, "teleportation").unwrap_err(),
            PricingError::UnknownFeature {
                feature_id: "teleportation".into()
            }
        );
    }
}
