//! Predicate builder — derives a backend filter expression from query text.
//!
//! The output is a textual WHERE fragment, not an AST: the supported
//! backends all consume SQL-ish text directly and the recognized language
//! is narrow enough that pattern substitution is the whole job.
//!
//! Priority order, checked top to bottom:
//! 1. numeric threshold over the building-levels attribute family
//! 2. location preposition ("in X", "near X", "around X")
//! 3. known type qualifier (primary/secondary/public/...)
//! 4. pass-all

use regex::Regex;
use tracing::debug;

use crate::catalog::DatasetConfig;
use crate::resolve::normalize_text;

/// Pass-all filter understood by every backend.
pub const PASS_ALL: &str = "1=1";

/// Placeholder substituted with the real level-count field name once the
/// schema probe has run. Field names are not stable across datasets, so the
/// builder cannot commit to one here.
pub const LEVEL_FIELD_PLACEHOLDER: &str = "{LEVELS}";

/// A filter fragment ready for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub expression: String,
    /// True when the expression still contains [`LEVEL_FIELD_PLACEHOLDER`]
    /// and needs a schema probe before execution.
    pub is_analytical: bool,
}

impl Predicate {
    pub fn pass_all() -> Self {
        Self { expression: PASS_ALL.to_owned(), is_analytical: false }
    }
}

struct ThresholdRule {
    pattern: Regex,
    operator: &'static str,
}

/// Builds predicates from normalized query text.
pub struct PredicateBuilder {
    thresholds: Vec<ThresholdRule>,
    location: Regex,
    type_qualifiers: &'static [&'static str],
}

// The countable attribute family the threshold language recognizes. Only
// building levels for now; extending to other numeric attributes is a
// deliberate enhancement, not assumed.
const LEVEL_WORDS: &str = r"(?:levels?|floors?|stor(?:ies|eys?))";

impl PredicateBuilder {
    pub fn new() -> Self {
        let table: &[(&str, &str)] = &[
            (r"\b(?:more than|greater than|over|above)\s+(?P<n>\d+)\s+LW\b", ">"),
            (r"\b(?:at least|no fewer than|minimum of)\s+(?P<n>\d+)\s+LW\b", ">="),
            (r"\b(?P<n>\d+)\s*\+\s*LW\b", ">="),
            (r"\b(?:less than|fewer than|under|below)\s+(?P<n>\d+)\s+LW\b", "<"),
            (r"\b(?:exactly)\s+(?P<n>\d+)\s+LW\b", "="),
        ];

        let thresholds = table
            .iter()
            .map(|&(pat, operator)| ThresholdRule {
                pattern: Regex::new(&format!("(?i){}", pat.replace("LW", LEVEL_WORDS)))
                    .expect("invalid threshold pattern"),
                operator,
            })
            .collect();

        let location = Regex::new(r"\b(?:in|near|around)\s+(?P<loc>[a-z][a-z' ]{1,40})")
            .expect("invalid location pattern");

        Self {
            thresholds,
            location,
            type_qualifiers: &["primary", "secondary", "public", "private", "general", "specialized"],
        }
    }

    /// Build the filter for `text` against `dataset`.
    pub fn build(&self, text: &str, dataset: Option<&DatasetConfig>) -> Predicate {
        let normalized = normalize_text(text);

        // 1. Analytical numeric threshold
        for rule in &self.thresholds {
            if let Some(caps) = rule.pattern.captures(&normalized) {
                // The pattern only matches when the group is all digits;
                // parse can still overflow on absurd input, which is not a
                // threshold worth honoring.
                if let Ok(operand) = caps["n"].parse::<i64>() {
                    let expression =
                        format!("{LEVEL_FIELD_PLACEHOLDER} {} {operand}", rule.operator);
                    debug!(%expression, "built analytical predicate");
                    return Predicate { expression, is_analytical: true };
                }
            }
        }

        // 2. Location preposition
        if let Some(caps) = self.location.captures(&normalized) {
            let loc = trim_location(caps["loc"].trim());
            let loc = loc.as_str();
            if !loc.is_empty() {
                if is_redundant_region(loc, dataset) {
                    // The layer is already scoped to this region; filtering
                    // on it again would double-filter to nothing useful.
                    debug!(location = loc, "location matches dataset region, using pass-all");
                    return Predicate::pass_all();
                }
                let expression = format!("District LIKE '%{loc}%'");
                debug!(%expression, "built location predicate");
                return Predicate { expression, is_analytical: false };
            }
        }

        // 3. Type qualifier
        for qualifier in self.type_qualifiers {
            if normalized.contains(qualifier) {
                let expression = format!("Type LIKE '%{qualifier}%'");
                debug!(%expression, "built type predicate");
                return Predicate { expression, is_analytical: false };
            }
        }

        // 4. Pass-all
        Predicate::pass_all()
    }
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The capture is greedy, so "in al ain area" grabs "al ain area" and a
/// substring match on District would then hit nothing. Cut the phrase at
/// the first connective word, then drop generic trailing qualifiers. Words
/// that appear inside real district names ("city", "region") stay.
fn trim_location(raw: &str) -> String {
    const CONNECTIVES: &[&str] = &["with", "that", "which", "having", "and", "or"];
    const TRAILING: &[&str] = &["area", "zone", "vicinity", "please"];

    let mut words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !CONNECTIVES.contains(w))
        .collect();
    while let Some(last) = words.last() {
        if TRAILING.contains(last) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

/// A detected location is redundant when it names the region the dataset is
/// already scoped to ("bus stops in Abu Dhabi" against an Abu Dhabi layer).
fn is_redundant_region(location: &str, dataset: Option<&DatasetConfig>) -> bool {
    match dataset.and_then(|d| d.region) {
        Some(region) => {
            let loc = location.trim();
            loc == region || loc.starts_with(region) || region.starts_with(loc)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn buildings() -> Option<&'static DatasetConfig> {
        catalog::get("infrastructure_buildings")
    }

    #[test]
    fn test_more_than_levels() {
        let b = PredicateBuilder::new();
        let p = b.build("buildings with more than 16 levels", buildings());
        assert!(p.is_analytical);
        assert_eq!(p.expression, "{LEVELS} > 16");
    }

    #[test]
    fn test_threshold_variants() {
        let b = PredicateBuilder::new();
        assert_eq!(b.build("at least 5 floors", None).expression, "{LEVELS} >= 5");
        assert_eq!(b.build("towers with 20+ stories", None).expression, "{LEVELS} >= 20");
        assert_eq!(b.build("less than 3 storeys", None).expression, "{LEVELS} < 3");
        assert_eq!(b.build("exactly 10 levels", None).expression, "{LEVELS} = 10");
    }

    #[test]
    fn test_threshold_needs_level_word() {
        let b = PredicateBuilder::new();
        let p = b.build("more than 16 students", None);
        assert!(!p.is_analytical);
    }

    #[test]
    fn test_redundant_region_falls_back_to_pass_all() {
        let b = PredicateBuilder::new();
        let p = b.build("Show all bus stops in Abu Dhabi", catalog::get("transport_bus_stops"));
        assert_eq!(p, Predicate::pass_all());
    }

    #[test]
    fn test_location_filter() {
        let b = PredicateBuilder::new();
        let p = b.build("schools in al ain", catalog::get("education_schools"));
        assert_eq!(p.expression, "District LIKE '%al ain%'");
        assert!(!p.is_analytical);
    }

    #[test]
    fn test_location_trailing_qualifier_trimmed() {
        let b = PredicateBuilder::new();
        // "area" is not part of the district name; keeping it would make
        // the substring filter match nothing.
        let p = b.build("schools in al ain area", catalog::get("education_schools"));
        assert_eq!(p.expression, "District LIKE '%al ain%'");
    }

    #[test]
    fn test_location_cut_at_connective() {
        let b = PredicateBuilder::new();
        let p = b.build("schools in al ain with good ratings", catalog::get("education_schools"));
        assert_eq!(p.expression, "District LIKE '%al ain%'");
    }

    #[test]
    fn test_location_keeps_words_inside_district_names() {
        let b = PredicateBuilder::new();
        let p = b.build("bus stops in khalifa city", catalog::get("transport_bus_stops"));
        assert_eq!(p.expression, "District LIKE '%khalifa city%'");
    }

    #[test]
    fn test_trimmed_location_still_redundant_with_region() {
        let b = PredicateBuilder::new();
        let p = b.build("bus stops in abu dhabi area", catalog::get("transport_bus_stops"));
        assert_eq!(p, Predicate::pass_all());
    }

    #[test]
    fn test_type_qualifier() {
        let b = PredicateBuilder::new();
        let p = b.build("private schools", catalog::get("education_schools"));
        assert_eq!(p.expression, "Type LIKE '%private%'");
    }

    #[test]
    fn test_pass_all_default() {
        let b = PredicateBuilder::new();
        assert_eq!(b.build("show everything", None), Predicate::pass_all());
    }

    #[test]
    fn test_threshold_beats_location() {
        let b = PredicateBuilder::new();
        let p = b.build("buildings with more than 16 levels in al ain", buildings());
        assert!(p.is_analytical);
    }
}
