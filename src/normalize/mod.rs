//! Feature normalization — raw backend rows to render-ready features.
//!
//! Combines shape extraction ([`shape`]) and coordinate conversion
//! ([`coords`]) and enforces the output invariant: every emitted feature
//! has latitude in [-90, 90] and longitude in [-180, 180]. A feature that
//! cannot satisfy it is dropped and counted, never forwarded.

pub mod coords;
pub mod shape;

use tracing::{debug, info};

use crate::catalog::DatasetConfig;
use crate::model::{first_of, get_ci, NormalizedFeature, RawFeature};

pub use coords::{CanonicalCoords, SourceCrs};

/// Running drop diagnostics for one query. Exposed to the caller but never
/// aborts anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounters {
    /// Feature had no geometry, or a shape with no usable vertex.
    pub missing_geometry: u64,
    /// Coordinate conversion failed or landed out of range.
    pub bad_coordinates: u64,
}

impl SkipCounters {
    pub fn total(&self) -> u64 {
        self.missing_geometry + self.bad_coordinates
    }
}

/// Result of normalizing one row set.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub features: Vec<NormalizedFeature>,
    pub skipped: SkipCounters,
}

/// Normalize every raw row for `dataset`, dropping the unusable ones.
pub fn normalize_features(
    dataset: &DatasetConfig,
    rows: &[RawFeature],
    crs: Option<SourceCrs>,
) -> NormalizeOutcome {
    let mut features = Vec::with_capacity(rows.len());
    let mut skipped = SkipCounters::default();

    for (index, row) in rows.iter().enumerate() {
        // Missing geometry is terminal for the row.
        let Some(geometry) = &row.geometry else {
            skipped.missing_geometry += 1;
            continue;
        };

        let Some((x, y)) = shape::representative_point(geometry) else {
            skipped.missing_geometry += 1;
            continue;
        };

        let Some(c) = coords::normalize(x, y, crs, dataset.bounds.as_ref()) else {
            skipped.bad_coordinates += 1;
            debug!(layer = dataset.layer_id, x, y, "dropped feature with unconvertible coordinates");
            continue;
        };

        let attrs = &row.attributes;
        let id = first_of(attrs, &["OBJECTID", "FID", "Id"])
            .map(|v| v.display_string())
            .unwrap_or_else(|| index.to_string());

        features.push(NormalizedFeature {
            id,
            display_name: field_text(attrs, dataset.name_fields),
            address: field_text(attrs, dataset.address_fields),
            type_label: field_text(attrs, dataset.type_fields),
            dataset_tag: dataset.layer_id.to_owned(),
            latitude: c.lat,
            longitude: c.lon,
            projected_x: c.projected_x,
            projected_y: c.projected_y,
            preserved_geometry: geometry.clone(),
        });
    }

    if skipped.total() > 0 {
        info!(
            layer = dataset.layer_id,
            emitted = features.len(),
            missing_geometry = skipped.missing_geometry,
            bad_coordinates = skipped.bad_coordinates,
            "normalization dropped features"
        );
    }

    NormalizeOutcome { features, skipped }
}

fn field_text(attrs: &crate::model::AttributeMap, candidates: &[&str]) -> String {
    candidates
        .iter()
        .filter_map(|k| get_ci(attrs, k))
        .map(|v| v.display_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::model::{AttributeMap, Geometry, Value};

    fn stop(name: &str, lon: f64, lat: f64) -> RawFeature {
        let mut attributes = AttributeMap::new();
        attributes.insert("OBJECTID".into(), Value::Int(7));
        attributes.insert("StopName".into(), Value::from(name));
        attributes.insert("StopType".into(), Value::from("Local"));
        RawFeature { geometry: Some(Geometry::Point { x: lon, y: lat }), attributes }
    }

    #[test]
    fn test_normalizes_in_region_point() {
        let ds = catalog::get("transport_bus_stops").unwrap();
        let out = normalize_features(ds, &[stop("Corniche", 54.37, 24.49)], None);
        assert_eq!(out.features.len(), 1);
        assert_eq!(out.skipped.total(), 0);
        let f = &out.features[0];
        assert_eq!(f.id, "7");
        assert_eq!(f.display_name, "Corniche");
        assert_eq!(f.type_label, "Local");
        assert_eq!(f.dataset_tag, "transport_bus_stops");
        assert!(matches!(f.preserved_geometry, Geometry::Point { .. }));
    }

    #[test]
    fn test_missing_geometry_skipped() {
        let ds = catalog::get("transport_bus_stops").unwrap();
        let row = RawFeature { geometry: None, attributes: AttributeMap::new() };
        let out = normalize_features(ds, &[row], None);
        assert!(out.features.is_empty());
        assert_eq!(out.skipped.missing_geometry, 1);
    }

    #[test]
    fn test_out_of_region_skipped() {
        let ds = catalog::get("transport_bus_stops").unwrap();
        // Paris is a fine point but not an Abu Dhabi bus stop.
        let out = normalize_features(ds, &[stop("Louvre", 2.35, 48.85)], None);
        assert!(out.features.is_empty());
        assert_eq!(out.skipped.bad_coordinates, 1);
    }

    #[test]
    fn test_emitted_features_in_geographic_bounds() {
        let ds = catalog::get("infrastructure_buildings").unwrap();
        // Mercator polygon around central Abu Dhabi.
        let row = RawFeature {
            geometry: Some(Geometry::Polygon {
                rings: vec![vec![
                    [6_052_000.0, 2_808_000.0],
                    [6_052_100.0, 2_808_000.0],
                    [6_052_100.0, 2_808_100.0],
                    [6_052_000.0, 2_808_100.0],
                ]],
            }),
            attributes: AttributeMap::new(),
        };
        let out = normalize_features(ds, &[row], None);
        assert_eq!(out.features.len(), 1);
        let f = &out.features[0];
        assert!((-90.0..=90.0).contains(&f.latitude));
        assert!((-180.0..=180.0).contains(&f.longitude));
    }
}
