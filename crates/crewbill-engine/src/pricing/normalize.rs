//! Feature selection normalization
//!
//! Turns a requested selection into the effective one: every free feature is
//! added, then every dependency is pulled in transitively. Normalization only
//! ever grows a selection; removing dependents when a feature is dropped is a
//! state transition and lives in [`super::selection`].

use crewbill_common::{FeatureId, PricingError};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use super::catalog::FeatureCatalog;

/// Compute the effective selection for `selected`
///
/// Fails with `UnknownFeature` for ids missing from the catalog and with
/// `CyclicDependency` if resolution runs into a dependency loop.
#[instrument(level = "debug", skip_all, fields(requested = selected.len()))]
pub fn normalize(
    catalog: &FeatureCatalog,
    selected: &BTreeSet<FeatureId>,
) -> Result<BTreeSet<FeatureId>, PricingError> {
    let roots = catalog
        .free_features()
        .map(|feature| &feature.id)
        .chain(selected.iter());

    let effective = dependency_closure(catalog, roots)?;
    debug!(effective = effective.len(), "Normalized selection");
    Ok(effective)
}

/// Transitive dependency closure of `roots`, roots included
pub(crate) fn dependency_closure<'a, I>(
    catalog: &FeatureCatalog,
    roots: I,
) -> Result<BTreeSet<FeatureId>, PricingError>
where
    I: IntoIterator<Item = &'a FeatureId>,
{
    let mut resolved = BTreeSet::new();
    for root in roots {
        resolve_from(catalog, root, &mut resolved)?;
    }
    Ok(resolved)
}

/// Depth-first walk from `root`, tracking the current resolution path.
/// Ids are added to `resolved` once all of their dependencies are.
fn resolve_from(
    catalog: &FeatureCatalog,
    root: &FeatureId,
    resolved: &mut BTreeSet<FeatureId>,
) -> Result<(), PricingError> {
    if resolved.contains(root) {
        return Ok(());
    }

    let feature = catalog.require(root.as_str())?;
    let mut path = vec![&feature.id];
    let mut pending = vec![feature.dependencies.iter()];

    while let Some(deps) = pending.last_mut() {
        match deps.next() {
            Some(dep) => {
                if resolved.contains(dep) {
                    continue;
                }
                if let Some(start) = path.iter().position(|id| *id == dep) {
                    let mut cycle: Vec<FeatureId> =
                        path[start..].iter().map(|id| (*id).clone()).collect();
                    cycle.push(dep.clone());
                    return Err(PricingError::CyclicDependency { path: cycle });
                }

                let next = catalog.require(dep.as_str())?;
                path.push(&next.id);
                pending.push(next.dependencies.iter());
            }
            None => {
                pending.pop();
                if let Some(done) = path.pop() {
                    resolved.insert(done.clone());
                }
            }
        }
    }

    Ok(())
}
