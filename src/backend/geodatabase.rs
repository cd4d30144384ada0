//! Cached geodatabase mock backend.
//!
//! Feature tables are generated deterministically the first time a layer
//! is requested and cached process-wide after that, mimicking a local
//! geodatabase extract. Unlike the demo tables these layers carry the
//! awkward coordinate regimes the normalizer has to handle: buildings
//! arrive as Web-Mercator polygons, the water network as state-plane
//! polylines.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::model::{AttributeMap, Geometry, RawFeature, Value};
use crate::normalize::SourceCrs;
use crate::{Error, Result};

use super::{filter, QueryBackend, QueryRows};

/// Lazily generated, cached mock layers.
pub struct GeodatabaseBackend {
    cache: RwLock<HashMap<String, Arc<Vec<RawFeature>>>>,
}

impl GeodatabaseBackend {
    pub fn new() -> Self {
        Self { cache: RwLock::new(HashMap::new()) }
    }

    fn layer(&self, layer_id: &str) -> Result<Arc<Vec<RawFeature>>> {
        if let Some(rows) = self.cache.read().get(layer_id) {
            return Ok(Arc::clone(rows));
        }

        let rows = Arc::new(generate_layer(layer_id)?);
        debug!(layer = layer_id, count = rows.len(), "generated geodatabase layer");
        // Generation is deterministic, so a racing second writer inserts
        // the identical table.
        self.cache
            .write()
            .entry(layer_id.to_owned())
            .or_insert_with(|| Arc::clone(&rows));
        Ok(rows)
    }

    fn crs_for(layer_id: &str) -> Option<SourceCrs> {
        match layer_id {
            "water_network" => Some(SourceCrs::StatePlane),
            "infrastructure_buildings" => Some(SourceCrs::WebMercator),
            _ => None,
        }
    }
}

impl Default for GeodatabaseBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryBackend for GeodatabaseBackend {
    async fn execute(&self, layer_id: &str, where_expr: &str) -> Result<QueryRows> {
        let table = self.layer(layer_id)?;
        let f = filter::parse(where_expr);
        let rows: Vec<RawFeature> = table
            .iter()
            .filter(|row| filter::matches(&f, &row.attributes))
            .cloned()
            .collect();
        Ok(QueryRows {
            rows,
            total_count_hint: Some(table.len() as u64),
            crs: Self::crs_for(layer_id),
        })
    }

    async fn count_only(&self, layer_id: &str, where_expr: &str) -> Result<u64> {
        let table = self.layer(layer_id)?;
        let f = filter::parse(where_expr);
        Ok(table.iter().filter(|row| filter::matches(&f, &row.attributes)).count() as u64)
    }

    async fn sample_one_row(&self, layer_id: &str) -> Result<Option<AttributeMap>> {
        Ok(self.layer(layer_id)?.first().map(|row| row.attributes.clone()))
    }
}

// ============================================================================
// Deterministic generation
// ============================================================================

/// Small multiplicative congruential generator; no randomness crate needed
/// because stability across runs is the whole point.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    fn next_f64(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }
}

fn generate_layer(layer_id: &str) -> Result<Vec<RawFeature>> {
    match layer_id {
        "infrastructure_buildings" => Ok(generate_buildings()),
        "agriculture_farms" => Ok(generate_farms()),
        "water_network" => Ok(generate_water_network()),
        other => Err(Error::UnknownLayer(other.to_owned())),
    }
}

/// 240 building footprints as Web-Mercator polygons around central
/// Abu Dhabi, with level counts spread from low-rise to high-rise.
fn generate_buildings() -> Vec<RawFeature> {
    let mut rng = Lcg::new(0x_b01d_face);
    let usage_types = ["Residential", "Commercial", "Mixed Use", "Government"];
    let districts = ["Central Abu Dhabi", "Al Reem", "Mussafah", "Khalifa City"];

    (0..240)
        .map(|i| {
            let cx = rng.next_f64(6_020_000.0, 6_080_000.0);
            let cy = rng.next_f64(2_790_000.0, 2_830_000.0);
            let half = rng.next_f64(15.0, 60.0);
            let levels = 1 + (rng.next_u64() % 45) as i64;

            let mut attributes = AttributeMap::new();
            attributes.insert("OBJECTID".into(), Value::Int(i + 1));
            attributes.insert("BuildingName".into(), Value::from(format!("Building {}", i + 1)));
            attributes.insert("Address".into(), Value::from(format!("Plot {}", 100 + i)));
            attributes.insert("BuildingLevels".into(), Value::Int(levels));
            attributes.insert("UsageType".into(), Value::from(rng.pick(&usage_types)));
            attributes.insert("Type".into(), Value::from(rng.pick(&usage_types)));
            attributes.insert("District".into(), Value::from(rng.pick(&districts)));

            RawFeature {
                geometry: Some(Geometry::Polygon {
                    rings: vec![vec![
                        [cx - half, cy - half],
                        [cx + half, cy - half],
                        [cx + half, cy + half],
                        [cx - half, cy + half],
                        [cx - half, cy - half],
                    ]],
                }),
                attributes,
            }
        })
        .collect()
}

/// Farm plots as geographic polygons in the Al Ain and Al Dhafra belts.
fn generate_farms() -> Vec<RawFeature> {
    let mut rng = Lcg::new(0x_fa21_5eed);
    let crop_types = ["Date Palm", "Fodder", "Vegetables", "Citrus"];
    let districts = ["Al Ain", "Al Dhafra", "Eastern Region"];

    (0..60)
        .map(|i| {
            let cx = rng.next_f64(52.6, 55.8);
            let cy = rng.next_f64(23.3, 24.3);
            let half = rng.next_f64(0.001, 0.004);

            let mut attributes = AttributeMap::new();
            attributes.insert("OBJECTID".into(), Value::Int(i + 1));
            attributes.insert("FarmName".into(), Value::from(format!("Farm {}", i + 1)));
            attributes.insert("Address".into(), Value::from(format!("Sector {}", 1 + i % 9)));
            attributes.insert("CropType".into(), Value::from(rng.pick(&crop_types)));
            attributes.insert("Type".into(), Value::from(rng.pick(&crop_types)));
            attributes.insert("District".into(), Value::from(rng.pick(&districts)));

            RawFeature {
                geometry: Some(Geometry::Polygon {
                    rings: vec![vec![
                        [cx - half, cy - half],
                        [cx + half, cy - half],
                        [cx + half, cy + half],
                        [cx - half, cy + half],
                        [cx - half, cy - half],
                    ]],
                }),
                attributes,
            }
        })
        .collect()
}

/// Water mains as state-plane (US survey feet) polylines around La Mesa.
fn generate_water_network() -> Vec<RawFeature> {
    let mut rng = Lcg::new(0x_aa75_eed1);
    let line_types = ["Transmission", "Distribution", "Service"];
    let materials = ["PVC", "Ductile Iron", "Steel"];

    (0..40)
        .map(|i| {
            let x0 = rng.next_f64(6_300_000.0, 6_340_000.0);
            let y0 = rng.next_f64(1_840_000.0, 1_870_000.0);
            let dx = rng.next_f64(-800.0, 800.0);
            let dy = rng.next_f64(-800.0, 800.0);

            let mut attributes = AttributeMap::new();
            attributes.insert("OBJECTID".into(), Value::Int(i + 1));
            attributes.insert("AssetName".into(), Value::from(format!("Main {}", i + 1)));
            attributes.insert("Street".into(), Value::from(format!("Segment {}", i + 1)));
            attributes.insert("LineType".into(), Value::from(rng.pick(&line_types)));
            attributes.insert("Type".into(), Value::from(rng.pick(&line_types)));
            attributes.insert("Material".into(), Value::from(rng.pick(&materials)));

            RawFeature {
                geometry: Some(Geometry::Polyline {
                    paths: vec![vec![
                        [x0, y0],
                        [x0 + dx, y0 + dy],
                        [x0 + 2.0 * dx, y0 + 2.0 * dy],
                    ]],
                }),
                attributes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generation_is_deterministic_and_cached() {
        let b = GeodatabaseBackend::new();
        let first = b.execute("infrastructure_buildings", "1=1").await.unwrap();
        let second = b.execute("infrastructure_buildings", "1=1").await.unwrap();
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.rows.len(), 240);
    }

    #[tokio::test]
    async fn test_level_threshold_filter() {
        let b = GeodatabaseBackend::new();
        let all = b.count_only("infrastructure_buildings", "1=1").await.unwrap();
        let tall = b.execute("infrastructure_buildings", "BuildingLevels > 16").await.unwrap();
        assert!(!tall.rows.is_empty());
        assert!((tall.rows.len() as u64) < all);
        for row in &tall.rows {
            let levels = row.attributes.get("BuildingLevels").and_then(|v| v.as_int()).unwrap();
            assert!(levels > 16);
        }
    }

    #[tokio::test]
    async fn test_water_network_declares_state_plane() {
        let b = GeodatabaseBackend::new();
        let out = b.execute("water_network", "1=1").await.unwrap();
        assert_eq!(out.crs, Some(SourceCrs::StatePlane));
        assert!(matches!(out.rows[0].geometry, Some(Geometry::Polyline { .. })));
    }

    #[tokio::test]
    async fn test_unknown_layer_errors() {
        let b = GeodatabaseBackend::new();
        assert!(b.sample_one_row("nope").await.is_err());
    }
}
