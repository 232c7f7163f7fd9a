//! Declared category proxies for EMISIA.
//!
//! When an activity has no reference records at all, the resolver may retry
//! against a coarser declared category (an unseen refrigerant gas falls back
//! to the generic refrigerant-leak category). The mapping is data, declared
//! up front and never inferred at query time, so proxy behavior stays
//! auditable and deterministic.

use std::collections::BTreeMap;

use emisia_core::normalize::normalize_activity_key;

/// Activity-to-category proxy map. Keys and values are folded activity keys.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    map: BTreeMap<String, String>,
}

impl CategoryMap {
    /// An empty map: the proxy layer never fires.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in proxy families. Callers extend with `assign`.
    pub fn with_defaults() -> Self {
        let mut m = Self::default();

        for gas in [
            "r22", "r32", "r134a", "r290", "r404a", "r407c", "r410a", "r507a", "hfc_134a",
            "hfc_32",
        ] {
            m = m.assign(gas, "refrigerant_leak_generic");
        }

        for truck in [
            "freight_truck_rigid",
            "freight_truck_articulated",
            "freight_truck_light",
            "freight_truck_medium",
        ] {
            m = m.assign(truck, "freight_truck_generic");
        }

        m
    }

    /// Declare a proxy. Both sides are folded to their index form.
    pub fn assign(mut self, activity: impl AsRef<str>, category: impl AsRef<str>) -> Self {
        self.map.insert(
            normalize_activity_key(activity.as_ref()),
            normalize_activity_key(category.as_ref()),
        );
        self
    }

    /// The declared category for an activity key, if any.
    pub fn proxy_for(&self, activity_key: &str) -> Option<&str> {
        self.map
            .get(&normalize_activity_key(activity_key))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
