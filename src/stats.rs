//! Statistics aggregator — total-vs-matched counts and per-attribute
//! breakdowns for one executed query.

use std::collections::HashMap;

use tracing::debug;

use crate::backend::QueryBackend;
use crate::catalog::DatasetConfig;
use crate::model::{get_ci, QueryStatistics, RawFeature};
use crate::predicate::PASS_ALL;

/// Distinct values surfaced per breakdown attribute.
const BREAKDOWN_CAP: usize = 10;

/// Compute statistics for the matched rows of one query.
///
/// The layer-wide total comes from the hint when the backend supplied a
/// nonzero one, else a secondary count request; if that fails too, the
/// matched length stands in (the query is assumed to have returned
/// everything). Count failures never propagate.
pub async fn aggregate<B: QueryBackend>(
    backend: &B,
    dataset: &DatasetConfig,
    matched: &[RawFeature],
    total_count_hint: Option<u64>,
) -> QueryStatistics {
    let matched_count = matched.len() as u64;

    let total_count = match total_count_hint {
        Some(hint) if hint > 0 => hint,
        _ => match backend.count_only(dataset.layer_id, PASS_ALL).await {
            Ok(n) => n,
            Err(e) => {
                debug!(layer = dataset.layer_id, error = %e, "count query failed, using matched length");
                matched_count
            }
        },
    };
    // A hint can be stale; never report matched > total.
    let total_count = total_count.max(matched_count);

    let percentage = if total_count == 0 {
        100.0
    } else {
        round1(matched_count as f64 / total_count as f64 * 100.0)
    };

    QueryStatistics {
        total_count,
        matched_count,
        percentage,
        attribute_breakdown: breakdown(dataset, matched),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Tally occurrence counts for the dataset's interesting attributes,
/// keeping only the most frequent values per attribute.
fn breakdown(
    dataset: &DatasetConfig,
    matched: &[RawFeature],
) -> HashMap<String, HashMap<String, u64>> {
    let mut out = HashMap::new();

    for field in dataset.breakdown_fields {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for row in matched {
            if let Some(value) = get_ci(&row.attributes, field) {
                let text = value.display_string();
                if !text.is_empty() {
                    *counts.entry(text).or_insert(0) += 1;
                }
            }
        }
        if counts.is_empty() {
            continue;
        }

        if counts.len() > BREAKDOWN_CAP {
            let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
            // Most frequent first; name order breaks ties so output is stable.
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(BREAKDOWN_CAP);
            counts = ranked.into_iter().collect();
        }

        out.insert((*field).to_owned(), counts);
    }
    out
}
