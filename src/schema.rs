//! Schema probe — discovers the real field name behind the analytical
//! placeholder, with a process-wide idempotent cache.
//!
//! Field names are not stable across datasets (`BuildingLevels`,
//! `NumFloors`, `LEVELS_`), so an analytical predicate is built against a
//! placeholder and the concrete name is discovered by sampling one row from
//! the backend. The discovered name is cached per layer for the lifetime of
//! the process; rediscovering the same name is harmless, so writes need no
//! coordination beyond the map lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::AttributeMap;

/// Process-wide layer → level-field cache. Written at most once per layer,
/// read many times; never invalidated.
#[derive(Debug, Default)]
pub struct FieldCache {
    fields: RwLock<HashMap<String, String>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer_id: &str) -> Option<String> {
        self.fields.read().get(layer_id).cloned()
    }

    pub fn put(&self, layer_id: &str, field: &str) {
        self.fields.write().insert(layer_id.to_owned(), field.to_owned());
    }
}

/// Search a sampled row for the level-count field.
///
/// Fuzzy match, most specific first: a name containing both "building" and
/// "level", then anything containing "level", then "floor", then
/// "storey"/"stories". Returns `None` when nothing matches; callers proceed
/// with the literal placeholder in that case.
pub fn discover_level_field(attributes: &AttributeMap) -> Option<String> {
    let names: Vec<(&String, String)> =
        attributes.keys().map(|k| (k, k.to_lowercase())).collect();

    // Ties within a pass are broken alphabetically so probing is
    // deterministic regardless of map iteration order.
    let best = |pass: fn(&str) -> bool| -> Option<String> {
        names
            .iter()
            .filter(|(_, lower)| pass(lower))
            .map(|(orig, _)| (*orig).clone())
            .min()
    };

    best(|n| n.contains("building") && n.contains("level"))
        .or_else(|| best(|n| n.contains("level")))
        .or_else(|| best(|n| n.contains("floor")))
        .or_else(|| best(|n| n.contains("storey") || n.contains("stories")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn row(keys: &[&str]) -> AttributeMap {
        keys.iter().map(|k| (k.to_string(), Value::Int(1))).collect()
    }

    #[test]
    fn test_building_level_preferred() {
        let attrs = row(&["Name", "Levels", "BuildingLevels"]);
        assert_eq!(discover_level_field(&attrs).as_deref(), Some("BuildingLevels"));
    }

    #[test]
    fn test_generic_fallbacks() {
        assert_eq!(discover_level_field(&row(&["Name", "LevelCount"])).as_deref(), Some("LevelCount"));
        assert_eq!(discover_level_field(&row(&["Name", "NumFloors"])).as_deref(), Some("NumFloors"));
        assert_eq!(discover_level_field(&row(&["Name", "Storeys"])).as_deref(), Some("Storeys"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(discover_level_field(&row(&["Name", "Height"])), None);
    }

    #[test]
    fn test_cache_idempotent_put() {
        let cache = FieldCache::new();
        assert_eq!(cache.get("layer"), None);
        cache.put("layer", "BuildingLevels");
        cache.put("layer", "BuildingLevels");
        assert_eq!(cache.get("layer").as_deref(), Some("BuildingLevels"));
    }
}
