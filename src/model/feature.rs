//! Feature DTOs crossing the pipeline's stage boundaries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{AttributeMap, Geometry};

/// A row exactly as a backend returned it: tagged geometry (possibly
/// absent) plus a loosely typed attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    pub geometry: Option<Geometry>,
    pub attributes: AttributeMap,
}

/// A feature after coordinate and geometry normalization, ready for the
/// rendering consumer.
///
/// Invariant: `latitude` is within [-90, 90] and `longitude` within
/// [-180, 180]. The normalizer drops any feature that would violate this
/// before it is ever constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFeature {
    pub id: String,
    pub display_name: String,
    pub address: String,
    pub type_label: String,
    pub dataset_tag: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical Web-Mercator easting, always recomputed from `longitude`.
    pub projected_x: f64,
    /// Canonical Web-Mercator northing, always recomputed from `latitude`.
    pub projected_y: f64,
    /// The full original shape, untouched by normalization.
    pub preserved_geometry: Geometry,
}

/// Result statistics for one executed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStatistics {
    pub total_count: u64,
    pub matched_count: u64,
    /// `matched / total * 100`, rounded to one decimal place. 100.0 when
    /// the layer is empty.
    pub percentage: f64,
    /// attribute name -> (distinct value -> occurrence count)
    pub attribute_breakdown: HashMap<String, HashMap<String, u64>>,
}

/// Emitted to the consumer once per released batch. Observational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub total_batches: usize,
    pub items_in_batch: usize,
}
