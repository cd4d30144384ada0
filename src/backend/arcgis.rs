//! Live ArcGIS REST backend adapter (`live` feature).
//!
//! Talks to a hosted feature service using the standard `/query` endpoint:
//! `where`, `outFields=*`, `f=json`, and `returnCountOnly` for counts. The
//! response's declared spatial reference becomes the normalizer's CRS hint.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::model::{AttributeMap, Geometry, RawFeature, Value};
use crate::normalize::SourceCrs;
use crate::{Error, Result};

use super::{QueryBackend, QueryRows};

/// Adapter over one ArcGIS feature service root.
pub struct ArcGisBackend {
    client: reqwest::Client,
    /// Service root, e.g. `https://host/arcgis/rest/services/Foo/FeatureServer`.
    base_url: String,
    /// layer id -> remote layer index
    layer_indices: Vec<(String, u32)>,
}

impl ArcGisBackend {
    pub fn new(base_url: impl Into<String>, layer_indices: Vec<(String, u32)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            layer_indices,
        }
    }

    fn layer_index(&self, layer_id: &str) -> Result<u32> {
        self.layer_indices
            .iter()
            .find(|(id, _)| id == layer_id)
            .map(|(_, idx)| *idx)
            .ok_or_else(|| Error::UnknownLayer(layer_id.to_owned()))
    }

    async fn query_raw(&self, layer_id: &str, params: &[(&str, &str)]) -> Result<ArcGisResponse> {
        let index = self.layer_index(layer_id)?;
        let url = format!("{}/{}/query", self.base_url, index);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("arcgis request failed: {e}")))?;

        let body: ArcGisResponse = response
            .json()
            .await
            .map_err(|e| Error::Malformed(format!("arcgis response: {e}")))?;

        if let Some(err) = body.error {
            return Err(Error::Backend(format!(
                "arcgis service error {}: {}",
                err.code, err.message
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl QueryBackend for ArcGisBackend {
    async fn execute(&self, layer_id: &str, where_expr: &str) -> Result<QueryRows> {
        let body = self
            .query_raw(
                layer_id,
                &[("where", where_expr), ("outFields", "*"), ("f", "json")],
            )
            .await?;

        let crs = body.spatial_reference.as_ref().and_then(SpatialReference::as_hint);
        let rows = body
            .features
            .unwrap_or_default()
            .into_iter()
            .map(ArcGisFeature::into_raw)
            .collect::<Vec<_>>();

        debug!(layer = layer_id, matched = rows.len(), "arcgis query returned");
        Ok(QueryRows { rows, total_count_hint: None, crs })
    }

    async fn count_only(&self, layer_id: &str, where_expr: &str) -> Result<u64> {
        let body = self
            .query_raw(
                layer_id,
                &[("where", where_expr), ("returnCountOnly", "true"), ("f", "json")],
            )
            .await?;
        body.count
            .ok_or_else(|| Error::Malformed("count query returned no count".into()))
    }

    async fn sample_one_row(&self, layer_id: &str) -> Result<Option<AttributeMap>> {
        let body = self
            .query_raw(
                layer_id,
                &[
                    ("where", "1=1"),
                    ("outFields", "*"),
                    ("resultRecordCount", "1"),
                    ("f", "json"),
                ],
            )
            .await?;
        Ok(body
            .features
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|f| f.into_raw().attributes))
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArcGisResponse {
    features: Option<Vec<ArcGisFeature>>,
    count: Option<u64>,
    #[serde(rename = "spatialReference")]
    spatial_reference: Option<SpatialReference>,
    error: Option<ArcGisError>,
}

#[derive(Debug, Deserialize)]
struct ArcGisError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SpatialReference {
    wkid: Option<u32>,
}

impl SpatialReference {
    fn as_hint(&self) -> Option<SourceCrs> {
        match self.wkid {
            Some(4326) => Some(SourceCrs::Geographic),
            Some(3857) | Some(102_100) => Some(SourceCrs::WebMercator),
            Some(2230) | Some(2229) => Some(SourceCrs::StatePlane),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArcGisFeature {
    attributes: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Option<ArcGisGeometry>,
}

/// ArcGIS geometry JSON is shape-tagged by which key is present.
#[derive(Debug, Deserialize)]
struct ArcGisGeometry {
    x: Option<f64>,
    y: Option<f64>,
    rings: Option<Vec<Vec<[f64; 2]>>>,
    paths: Option<Vec<Vec<[f64; 2]>>>,
}

impl ArcGisFeature {
    fn into_raw(self) -> RawFeature {
        let attributes: AttributeMap = self
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();

        let geometry = self.geometry.and_then(|g| match (g.x, g.y, g.rings, g.paths) {
            (Some(x), Some(y), _, _) => Some(Geometry::Point { x, y }),
            (_, _, Some(rings), _) => Some(Geometry::Polygon { rings }),
            (_, _, _, Some(paths)) => Some(Geometry::Polyline { paths }),
            _ => None,
        });

        RawFeature { geometry, attributes }
    }
}
