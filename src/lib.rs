//! # geopipe — natural-language geospatial query pipeline
//!
//! Turns a free-text request ("show all bus stops", "buildings with more
//! than 16 levels") into a normalized, statistically summarized feature
//! set suitable for display.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `QueryBackend` is the contract between the pipeline
//!    and any data source
//! 2. **Clean DTOs**: `RawFeature`, `NormalizedFeature`, `Value` cross all
//!    boundaries
//! 3. **Ordered heuristics are the contract**: resolution rules and
//!    coordinate classification are explicit ordered lists, first match
//!    wins, never re-ranked
//! 4. **Drop, don't lie**: a feature whose coordinates cannot be trusted
//!    is counted and dropped, never emitted with wrong values
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geopipe::{Pipeline, FeatureConsumer, NormalizedFeature, BatchProgress};
//!
//! struct Printer;
//! impl FeatureConsumer for Printer {
//!     fn feature(&mut self, f: &NormalizedFeature) {
//!         println!("{} @ {},{}", f.display_name, f.latitude, f.longitude);
//!     }
//!     fn progress(&mut self, p: BatchProgress) {
//!         println!("batch {}/{}", p.batch_index, p.total_batches);
//!     }
//! }
//!
//! # async fn example() -> geopipe::Result<()> {
//! let pipeline = Pipeline::open();
//! let outcome = pipeline
//!     .run("Show all bus stops in Abu Dhabi", None, &mut Printer)
//!     .await?;
//! println!("{} of {}", outcome.statistics.matched_count, outcome.statistics.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Routed | (default) | Delegates per layer source kind |
//! | Demo | (default) | Static in-process mock tables |
//! | Geodatabase | (default) | Lazily generated, cached mock |
//! | ArcGIS | `live` | Live ArcGIS REST feature service |
//!
//! `Pipeline::open()` uses the routed backend, so any layer the resolver
//! can name is servable. `open_demo()` / `open_geodatabase()` pin a single
//! adapter and answer only for that adapter's layers.

// ============================================================================
// Modules
// ============================================================================

pub mod backend;
pub mod catalog;
pub mod dispatch;
pub mod model;
pub mod normalize;
pub mod predicate;
pub mod resolve;
pub mod schema;
pub mod stats;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::{QueryBackend, QueryRows, RoutedBackend};
pub use catalog::{BoundingBox, DatasetConfig, SourceKind};
pub use dispatch::{FeatureConsumer, BATCH_DELAY, BATCH_SIZE, LARGE_THRESHOLD};
pub use model::{
    AttributeMap, BatchProgress, Geometry, NormalizedFeature, QueryStatistics, RawFeature, Value,
};
pub use normalize::{SkipCounters, SourceCrs};
pub use predicate::{Predicate, PredicateBuilder};
pub use resolve::{LayerResolver, ResolvedLayer};
pub use schema::FieldCache;

use std::sync::Arc;

use tracing::info;

// ============================================================================
// Top-level Pipeline handle
// ============================================================================

/// The primary entry point. A `Pipeline` wraps a query backend and drives
/// one query through every stage in order: resolve, build predicate,
/// execute (with schema probe), normalize, aggregate, dispatch.
pub struct Pipeline<B: QueryBackend> {
    backend: B,
    resolver: LayerResolver,
    predicates: PredicateBuilder,
    field_cache: Arc<FieldCache>,
}

/// Everything a caller learns from one completed query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub layer: ResolvedLayer,
    /// The predicate as built from the text, placeholder intact.
    pub predicate: Predicate,
    /// The where-expression actually sent after any schema probe.
    pub effective_where: String,
    pub statistics: QueryStatistics,
    /// Features delivered to the consumer.
    pub emitted: usize,
    pub skipped: SkipCounters,
}

impl<B: QueryBackend> Pipeline<B> {
    /// Create a pipeline over the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            resolver: LayerResolver::new(),
            predicates: PredicateBuilder::new(),
            field_cache: Arc::new(FieldCache::new()),
        }
    }

    /// Share a schema-field cache across pipelines over the same backend.
    pub fn with_field_cache(mut self, cache: Arc<FieldCache>) -> Self {
        self.field_cache = cache;
        self
    }

    /// Run one query end to end, streaming normalized features to the
    /// consumer.
    ///
    /// `dataset_hint` short-circuits text resolution when it names a
    /// registered layer; anything else falls back to resolution.
    ///
    /// Stages run strictly in sequence; nothing is streamed between them.
    /// The only hard error is a failed backend call — empty results,
    /// dropped features, and failed count queries all degrade quietly.
    pub async fn run<C: FeatureConsumer>(
        &self,
        text: &str,
        dataset_hint: Option<&str>,
        consumer: &mut C,
    ) -> Result<QueryOutcome> {
        // Phase 1: Resolve layer
        let layer = match dataset_hint.and_then(catalog::get) {
            Some(d) => ResolvedLayer { layer_id: d.layer_id.to_owned(), source: d.source },
            None => self.resolver.resolve(text),
        };
        let dataset = catalog::get(&layer.layer_id)
            .ok_or_else(|| Error::UnknownLayer(layer.layer_id.clone()))?;

        // Phase 2: Build predicate
        let predicate = self.predicates.build(text, Some(dataset));

        // Phase 3: Execute (schema probe happens inside for analytical
        // predicates)
        let (result, effective_where) =
            backend::run_query(&self.backend, &self.field_cache, &layer, &predicate).await?;

        // Phase 4: Normalize coordinates and shapes
        let normalized = normalize::normalize_features(dataset, &result.rows, result.crs);

        // Phase 5: Aggregate statistics over the raw matched rows
        let statistics =
            stats::aggregate(&self.backend, dataset, &result.rows, result.total_count_hint).await;

        // Phase 6: Dispatch to the consumer in paced batches
        dispatch::dispatch(&normalized.features, consumer).await;

        info!(
            layer = %layer.layer_id,
            matched = statistics.matched_count,
            total = statistics.total_count,
            emitted = normalized.features.len(),
            skipped = normalized.skipped.total(),
            "query completed"
        );

        Ok(QueryOutcome {
            layer,
            predicate,
            effective_where,
            statistics,
            emitted: normalized.features.len(),
            skipped: normalized.skipped,
        })
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Pipeline over the routed backend: every registered layer is served by
/// the adapter matching its source kind. The default way in.
impl Pipeline<backend::RoutedBackend> {
    pub fn open() -> Self {
        Self::with_backend(backend::RoutedBackend::new())
    }
}

/// Pipeline over the static demo tables only.
impl Pipeline<backend::DemoBackend> {
    pub fn open_demo() -> Self {
        Self::with_backend(backend::DemoBackend::new())
    }
}

/// Pipeline over the cached geodatabase mock.
impl Pipeline<backend::GeodatabaseBackend> {
    pub fn open_geodatabase() -> Self {
        Self::with_backend(backend::GeodatabaseBackend::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backend call failed (unreachable service, transport error). The
    /// only error surfaced to callers as hard failure.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("layer not registered: {0}")]
    UnknownLayer(String),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
