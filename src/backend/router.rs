//! Routing backend — one `QueryBackend` over all source kinds.
//!
//! The catalog spans three source families, but each concrete adapter
//! serves only its own. The router looks up the requested layer's source
//! kind and delegates to the matching adapter, so a single pipeline can
//! answer for the whole catalog the way one service process would.

use async_trait::async_trait;

use crate::catalog::{self, SourceKind};
use crate::model::AttributeMap;
use crate::{Error, Result};

use super::{DemoBackend, GeodatabaseBackend, QueryBackend, QueryRows};

/// Composes the demo and geodatabase mocks, plus an optional live
/// adapter, behind one backend.
pub struct RoutedBackend {
    demo: DemoBackend,
    geodatabase: GeodatabaseBackend,
    live: Option<Box<dyn QueryBackend>>,
}

impl RoutedBackend {
    pub fn new() -> Self {
        Self {
            demo: DemoBackend::new(),
            geodatabase: GeodatabaseBackend::new(),
            live: None,
        }
    }

    /// Attach an adapter for layers whose source kind is `Live`. Without
    /// one, queries against live layers fail as backend-unavailable.
    pub fn with_live(mut self, live: Box<dyn QueryBackend>) -> Self {
        self.live = Some(live);
        self
    }

    fn route(&self, layer_id: &str) -> Result<&dyn QueryBackend> {
        let dataset = catalog::get(layer_id)
            .ok_or_else(|| Error::UnknownLayer(layer_id.to_owned()))?;
        match dataset.source {
            SourceKind::MockDemo => Ok(&self.demo),
            SourceKind::MockGeodatabase => Ok(&self.geodatabase),
            SourceKind::Live => self.live.as_deref().ok_or_else(|| {
                Error::Backend(format!("no live backend configured for layer {layer_id}"))
            }),
        }
    }
}

impl Default for RoutedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryBackend for RoutedBackend {
    async fn execute(&self, layer_id: &str, where_expr: &str) -> Result<QueryRows> {
        self.route(layer_id)?.execute(layer_id, where_expr).await
    }

    async fn count_only(&self, layer_id: &str, where_expr: &str) -> Result<u64> {
        self.route(layer_id)?.count_only(layer_id, where_expr).await
    }

    async fn sample_one_row(&self, layer_id: &str) -> Result<Option<AttributeMap>> {
        self.route(layer_id)?.sample_one_row(layer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_by_source_kind() {
        let b = RoutedBackend::new();
        // Demo family and geodatabase family answer through one backend.
        let stops = b.execute("transport_bus_stops", "1=1").await.unwrap();
        assert_eq!(stops.rows.len(), 6);
        let farms = b.execute("agriculture_farms", "1=1").await.unwrap();
        assert_eq!(farms.rows.len(), 60);
    }

    #[tokio::test]
    async fn test_unregistered_layer_is_unknown() {
        let b = RoutedBackend::new();
        let err = b.execute("no_such_layer", "1=1").await.unwrap_err();
        assert!(matches!(err, Error::UnknownLayer(_)));
    }

    #[tokio::test]
    async fn test_live_layer_without_adapter_is_backend_error() {
        let b = RoutedBackend::new();
        let err = b.execute("lamesa_street_lights", "1=1").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[tokio::test]
    async fn test_attached_live_adapter_is_used() {
        // Any QueryBackend can stand in for the live service.
        struct Canned;
        #[async_trait]
        impl QueryBackend for Canned {
            async fn execute(&self, _: &str, _: &str) -> Result<QueryRows> {
                Ok(QueryRows::default())
            }
            async fn count_only(&self, _: &str, _: &str) -> Result<u64> {
                Ok(0)
            }
            async fn sample_one_row(&self, _: &str) -> Result<Option<AttributeMap>> {
                Ok(None)
            }
        }

        let b = RoutedBackend::new().with_live(Box::new(Canned));
        assert!(b.execute("lamesa_street_lights", "1=1").await.is_ok());
    }
}
