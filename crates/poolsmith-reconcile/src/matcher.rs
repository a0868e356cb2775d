//! Pool catalog matching.
//!
//! Lists the catalog once and looks for a pool carrying a taint for the
//! demand. The first hit wins; catalog order is not significant. Entries
//! that cannot be decoded are logged and skipped.

use tracing::{debug, info, warn};

use poolsmith_state::PoolObject;

use crate::config::MatchPolicy;
use crate::convert::{ObservedTaint, decode_taints};
use crate::error::{ReconcileError, ReconcileResult};
use crate::store::ResourceStore;

/// Does this taint satisfy the demand under the given policy?
///
/// Under `KeyAndValue`, a taint without a key never matches.
pub fn taint_matches(
    taint: &ObservedTaint,
    policy: MatchPolicy,
    demand_key: &str,
    demand: &str,
) -> bool {
    match policy {
        MatchPolicy::ValueOnly => taint.value == demand,
        MatchPolicy::KeyAndValue => {
            taint.value == demand && taint.key.as_deref() == Some(demand_key)
        }
    }
}

/// Scan a catalog snapshot for a pool satisfying the demand.
///
/// Returns the name of the first matching pool.
pub fn match_catalog(
    catalog: &[PoolObject],
    policy: MatchPolicy,
    demand_key: &str,
    demand: &str,
) -> Option<String> {
    for object in catalog {
        let taints = match decode_taints(object) {
            Ok(taints) => taints,
            Err(e) => {
                warn!(pool = %object.name, error = %e, "skipping malformed pool");
                continue;
            }
        };

        for taint in taints {
            let taint = match taint {
                Ok(t) => t,
                Err(e) => {
                    warn!(pool = %object.name, error = %e, "skipping malformed taint");
                    continue;
                }
            };

            if policy == MatchPolicy::KeyAndValue && taint.key.is_none() {
                warn!(pool = %object.name, "skipping taint without key");
                continue;
            }

            if taint_matches(&taint, policy, demand_key, demand) {
                return Some(object.name.clone());
            }
        }
    }
    None
}

/// List the catalog and look for a pool satisfying the demand.
///
/// A list failure aborts the pass. No creation may follow it.
pub async fn find_matching_pool<S: ResourceStore>(
    store: &S,
    policy: MatchPolicy,
    demand_key: &str,
    demand: &str,
) -> ReconcileResult<Option<String>> {
    let catalog = store.list_pools().await.map_err(|e| {
        warn!(error = %e, "failed to list pools");
        ReconcileError::CatalogUnavailable(e)
    })?;
    debug!(pools = catalog.len(), %demand, "pool catalog listed");

    let matched = match_catalog(&catalog, policy, demand_key, demand);
    match &matched {
        Some(pool) => info!(%pool, %demand, "matching pool found"),
        None => info!(%demand, "no matching pool found"),
    }
    Ok(matched)
}
