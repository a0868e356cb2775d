//! Demand extraction from a workload's scheduling constraints.

use std::collections::BTreeMap;

use tracing::debug;

/// Return the demand identifier bound to `demand_key`, if any.
///
/// A missing key or an empty value both mean "no demand". Never fails.
pub fn extract_demand(selector: &BTreeMap<String, String>, demand_key: &str) -> Option<String> {
    match selector.get(demand_key) {
        Some(value) if !value.is_empty() => {
            debug!(key = %demand_key, demand = %value, "demand label found");
            Some(value.clone())
        }
        Some(_) => {
            debug!(key = %demand_key, "demand label is empty");
            None
        }
        None => {
            debug!(key = %demand_key, "demand label not present");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_selector_has_no_demand() {
        assert_eq!(extract_demand(&selector(&[]), "provision-for-team"), None);
    }

    #[test]
    fn finds_value_under_demand_key() {
        let s = selector(&[("zone", "a"), ("provision-for-team", "payments")]);
        assert_eq!(
            extract_demand(&s, "provision-for-team"),
            Some("payments".to_string())
        );
    }

    #[test]
    fn other_keys_are_ignored() {
        let s = selector(&[("team", "payments")]);
        assert_eq!(extract_demand(&s, "provision-for-team"), None);
    }

    #[test]
    fn empty_value_is_no_demand() {
        let s = selector(&[("provision-for-team", "")]);
        assert_eq!(extract_demand(&s, "provision-for-team"), None);
    }
}
