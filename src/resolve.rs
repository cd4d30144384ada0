//! Layer resolver — maps free text to a logical dataset handle.
//!
//! Resolution is an ordered list of `{regex, layer}` rules walked once;
//! the first matching rule wins. There is no scoring or re-ranking: rule
//! order IS the contract, which is why the rules live in a `Vec` and not
//! a map. Unmatched input always falls back to the default layer, so
//! resolution can never fail.

use regex::Regex;
use tracing::debug;

use crate::catalog::{self, SourceKind, DEFAULT_LAYER};

/// The dataset a query text resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub layer_id: String,
    pub source: SourceKind,
}

struct LayerRule {
    pattern: Regex,
    layer_id: &'static str,
}

/// Resolves query text to a layer via first-match-wins pattern rules.
pub struct LayerResolver {
    rules: Vec<LayerRule>,
}

impl LayerResolver {
    pub fn new() -> Self {
        // Order matters: more specific vocabularies sit above the broader
        // ones they overlap with ("bus stop" above generic transport words,
        // "university" above "school").
        let table: &[(&str, &str)] = &[
            (r"\bbus\s*stops?\b|\bbus(es)?\b", "transport_bus_stops"),
            (r"\bbuildings?\b|\btowers?\b|\bskyscrapers?\b", "infrastructure_buildings"),
            (r"\buniversit\w*\b|\bcolleges?\b|\bcampus(es)?\b", "education_universities"),
            (r"\bschools?\b|\beducation(al)?\b|\bkindergartens?\b", "education_schools"),
            (
                r"\bpolice\b|\bfire\s*stations?\b|\blaw enforcement\b|\bcivil defence\b",
                "public_safety_stations",
            ),
            (r"\bhospitals?\b|\bclinics?\b|\bmedical\b|\bhealthcare\b", "health_hospitals"),
            (r"\bfarms?\b|\bcrops?\b|\bagricultur\w*\b", "agriculture_farms"),
            (r"\bwater\b|\bpipelines?\b|\bwater mains?\b", "water_network"),
            (r"\bstreet\s*lights?\b|\blamp\s*posts?\b", "lamesa_street_lights"),
        ];

        let rules = table
            .iter()
            .map(|&(pat, layer_id)| LayerRule {
                // Patterns are static and known-valid; a bad one is a
                // programming error caught by the constructor test below.
                pattern: Regex::new(&format!("(?i){pat}")).expect("invalid layer rule pattern"),
                layer_id,
            })
            .collect();

        Self { rules }
    }

    /// Resolve text to a layer. Never fails; unmatched text yields the
    /// default layer.
    pub fn resolve(&self, text: &str) -> ResolvedLayer {
        let normalized = normalize_text(text);

        let layer_id = self
            .rules
            .iter()
            .find(|rule| rule.pattern.is_match(&normalized))
            .map(|rule| rule.layer_id)
            .unwrap_or(DEFAULT_LAYER);

        // Every rule targets a registered layer, so the lookup only falls
        // through for the default.
        let source = catalog::get(layer_id)
            .map(|d| d.source)
            .unwrap_or(SourceKind::MockDemo);

        debug!(layer = layer_id, "resolved query text to layer");
        ResolvedLayer { layer_id: layer_id.to_owned(), source }
    }
}

impl Default for LayerResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize query text before any pattern matching: lowercase, collapse
/// runs of whitespace, and canonicalize common phrasing variations.
pub fn normalize_text(text: &str) -> String {
    let mut out = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    for (old, new) in [("show me", "show"), ("find all", "find"), ("list all", "list")] {
        out = out.replace(old, new);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_stop_resolution() {
        let r = LayerResolver::new();
        let layer = r.resolve("Show all bus stops in Abu Dhabi");
        assert_eq!(layer.layer_id, "transport_bus_stops");
    }

    #[test]
    fn test_buildings_resolution() {
        let r = LayerResolver::new();
        let layer = r.resolve("buildings with more than 16 levels");
        assert_eq!(layer.layer_id, "infrastructure_buildings");
        assert_eq!(layer.source, SourceKind::MockGeodatabase);
    }

    #[test]
    fn test_university_wins_over_school_default() {
        let r = LayerResolver::new();
        assert_eq!(r.resolve("universities near me").layer_id, "education_universities");
    }

    #[test]
    fn test_default_fallback() {
        let r = LayerResolver::new();
        let layer = r.resolve("qwerty nothing matches here");
        assert_eq!(layer.layer_id, DEFAULT_LAYER);
    }

    #[test]
    fn test_deterministic() {
        let r = LayerResolver::new();
        let a = r.resolve("fire stations in al ain");
        let b = r.resolve("fire stations in al ain");
        assert_eq!(a, b);
        assert_eq!(a.layer_id, "public_safety_stations");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Show   me ALL  schools "), "show all schools");
        assert_eq!(normalize_text("Find all farms"), "find farms");
    }
}
