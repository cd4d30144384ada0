//! AttributeMap — the key-value store on raw features.

use std::collections::HashMap;

use super::Value;

/// A map of attribute names to values.
///
/// Lookups must tolerate missing keys; backends disagree on which fields a
/// row carries, and the pipeline treats absence the same as `Value::Null`.
pub type AttributeMap = HashMap<String, Value>;

/// Case-insensitive attribute lookup.
///
/// Field casing is not stable across backends (`NAME`, `Name`, `name`), so
/// every display-field read goes through here rather than `HashMap::get`.
pub fn get_ci<'a>(attrs: &'a AttributeMap, key: &str) -> Option<&'a Value> {
    if let Some(v) = attrs.get(key) {
        return Some(v);
    }
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// First non-null value among several candidate field names.
pub fn first_of<'a>(attrs: &'a AttributeMap, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| get_ci(attrs, k))
        .find(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut attrs = AttributeMap::new();
        attrs.insert("StopName".into(), Value::from("Corniche"));
        assert_eq!(get_ci(&attrs, "stopname"), Some(&Value::from("Corniche")));
        assert_eq!(get_ci(&attrs, "STOPNAME"), Some(&Value::from("Corniche")));
        assert_eq!(get_ci(&attrs, "missing"), None);
    }

    #[test]
    fn test_first_of_skips_nulls() {
        let mut attrs = AttributeMap::new();
        attrs.insert("Name".into(), Value::Null);
        attrs.insert("StationName".into(), Value::from("Central"));
        let v = first_of(&attrs, &["Name", "StationName"]);
        assert_eq!(v, Some(&Value::from("Central")));
    }
}
