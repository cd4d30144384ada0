//! # Query backend contract
//!
//! This is THE contract between the pipeline and any data source.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `DemoBackend` | `demo` | Static in-process mock tables |
//! | `GeodatabaseBackend` | `geodatabase` | Lazily generated, cached mock |
//! | `RoutedBackend` | `router` | Delegates per layer source kind |
//! | `ArcGisBackend` | `arcgis` (`live` feature) | Live ArcGIS REST service |

pub mod demo;
pub mod filter;
pub mod geodatabase;
pub mod router;
#[cfg(feature = "live")]
pub mod arcgis;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::model::{AttributeMap, RawFeature};
use crate::normalize::SourceCrs;
use crate::predicate::{Predicate, LEVEL_FIELD_PLACEHOLDER};
use crate::resolve::ResolvedLayer;
use crate::schema::{discover_level_field, FieldCache};
use crate::Result;

pub use demo::DemoBackend;
pub use geodatabase::GeodatabaseBackend;
pub use router::RoutedBackend;
#[cfg(feature = "live")]
pub use arcgis::ArcGisBackend;

/// Rows returned by one backend query.
#[derive(Debug, Clone, Default)]
pub struct QueryRows {
    pub rows: Vec<RawFeature>,
    /// Layer-wide feature count, when the backend knows it cheaply.
    pub total_count_hint: Option<u64>,
    /// Coordinate system the backend declared for these rows, if any.
    pub crs: Option<SourceCrs>,
}

/// The universal backend contract.
///
/// Implementations should return `Error::Backend` for transport failures
/// and `Error::UnknownLayer` for layers they do not serve. A filter that
/// matches nothing is an empty row set, not an error.
#[async_trait]
pub trait QueryBackend: Send + Sync + 'static {
    /// Execute a filtered query against one layer.
    async fn execute(&self, layer_id: &str, where_expr: &str) -> Result<QueryRows>;

    /// Count features matching a filter, without fetching rows.
    async fn count_only(&self, layer_id: &str, where_expr: &str) -> Result<u64>;

    /// Fetch one sample row with all fields, for schema probing.
    /// `None` when the layer is empty.
    async fn sample_one_row(&self, layer_id: &str) -> Result<Option<AttributeMap>>;
}

/// Execute a resolved query, running the schema probe first when the
/// predicate is analytical.
///
/// The probe samples one row, searches its field names for the level-count
/// attribute, and substitutes it for the placeholder. When no field
/// matches, the query still runs with the literal placeholder: that yields
/// an empty result rather than an error. Surprising, but deliberate; it
/// keeps a mistyped analytical question degraded instead of fatal.
///
/// Returns the rows plus the where-expression actually sent.
pub async fn run_query<B: QueryBackend>(
    backend: &B,
    cache: &FieldCache,
    layer: &ResolvedLayer,
    predicate: &Predicate,
) -> Result<(QueryRows, String)> {
    let mut where_expr = predicate.expression.clone();

    if predicate.is_analytical {
        let field = match cache.get(&layer.layer_id) {
            Some(field) => Some(field),
            None => {
                let sample = backend.sample_one_row(&layer.layer_id).await?;
                let found = sample.as_ref().and_then(discover_level_field);
                if let Some(field) = &found {
                    cache.put(&layer.layer_id, field);
                }
                found
            }
        };

        match field {
            Some(field) => {
                where_expr = where_expr.replace(LEVEL_FIELD_PLACEHOLDER, &field);
                debug!(layer = %layer.layer_id, field, "schema probe resolved level field");
            }
            None => {
                warn!(
                    layer = %layer.layer_id,
                    "schema probe found no level field; executing with literal placeholder"
                );
            }
        }
    }

    let rows = backend.execute(&layer.layer_id, &where_expr).await?;
    debug!(layer = %layer.layer_id, %where_expr, matched = rows.rows.len(), "backend query executed");
    Ok((rows, where_expr))
}
