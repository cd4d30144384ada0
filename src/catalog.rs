//! Dataset catalog — the registry of logical layers the pipeline can query.
//!
//! Each entry carries everything stage code needs to know about a layer:
//! which backend family serves it, the region it is already scoped to, the
//! bounding box that sanity-checks coordinate conversions, and the field
//! names used for display and statistics breakdowns.

use serde::Serialize;

/// Which backend family serves a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    /// Live remote feature service.
    Live,
    /// Static in-process demo table.
    MockDemo,
    /// Lazily generated, cached geodatabase mock.
    MockGeodatabase,
}

/// Geographic bounding box in WGS84 degrees, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Abu Dhabi emirate envelope; all UAE layers are scoped inside it.
pub const ABU_DHABI_BOUNDS: BoundingBox = BoundingBox::new(22.5, 25.5, 51.0, 56.5);

/// San Diego county envelope covering the La Mesa utility layers.
pub const LA_MESA_BOUNDS: BoundingBox = BoundingBox::new(32.0, 34.0, -118.0, -115.0);

/// Static configuration for one logical layer.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub layer_id: &'static str,
    pub source: SourceKind,
    /// Region name the whole layer is already filtered to, lowercase.
    /// A location filter naming this region is redundant and dropped.
    pub region: Option<&'static str>,
    /// Expected coordinate envelope; conversions landing outside are rejected.
    pub bounds: Option<BoundingBox>,
    pub name_fields: &'static [&'static str],
    pub address_fields: &'static [&'static str],
    pub type_fields: &'static [&'static str],
    /// Attributes tallied into the statistics breakdown.
    pub breakdown_fields: &'static [&'static str],
}

/// Layer every unmatched query falls back to.
pub const DEFAULT_LAYER: &str = "education_schools";

static DATASETS: &[DatasetConfig] = &[
    DatasetConfig {
        layer_id: "transport_bus_stops",
        source: SourceKind::MockDemo,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["StopName", "Name"],
        address_fields: &["Address", "Road"],
        type_fields: &["StopType", "Type"],
        breakdown_fields: &["StopType", "District", "Route"],
    },
    DatasetConfig {
        layer_id: "infrastructure_buildings",
        source: SourceKind::MockGeodatabase,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["BuildingName", "Name"],
        address_fields: &["Address"],
        type_fields: &["UsageType", "Type"],
        breakdown_fields: &["UsageType", "District"],
    },
    DatasetConfig {
        layer_id: "education_schools",
        source: SourceKind::MockDemo,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["SchoolName", "Name"],
        address_fields: &["Address"],
        type_fields: &["SchoolType", "Type"],
        breakdown_fields: &["SchoolType", "District"],
    },
    DatasetConfig {
        layer_id: "education_universities",
        source: SourceKind::MockDemo,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["Name"],
        address_fields: &["Address"],
        type_fields: &["Type"],
        breakdown_fields: &["Type", "District"],
    },
    DatasetConfig {
        layer_id: "public_safety_stations",
        source: SourceKind::MockDemo,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["StationName", "Name"],
        address_fields: &["Address"],
        type_fields: &["StationType", "Type"],
        breakdown_fields: &["StationType", "District"],
    },
    DatasetConfig {
        layer_id: "health_hospitals",
        source: SourceKind::MockDemo,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["Name"],
        address_fields: &["Address"],
        type_fields: &["Type"],
        breakdown_fields: &["Type", "District"],
    },
    DatasetConfig {
        layer_id: "agriculture_farms",
        source: SourceKind::MockGeodatabase,
        region: Some("abu dhabi"),
        bounds: Some(ABU_DHABI_BOUNDS),
        name_fields: &["FarmName", "Name"],
        address_fields: &["Address"],
        type_fields: &["CropType", "Type"],
        breakdown_fields: &["CropType", "District"],
    },
    DatasetConfig {
        layer_id: "water_network",
        source: SourceKind::MockGeodatabase,
        region: Some("la mesa"),
        bounds: Some(LA_MESA_BOUNDS),
        name_fields: &["AssetName", "Name"],
        address_fields: &["Street"],
        type_fields: &["LineType", "Type"],
        breakdown_fields: &["LineType", "Material"],
    },
    DatasetConfig {
        layer_id: "lamesa_street_lights",
        source: SourceKind::Live,
        region: Some("la mesa"),
        bounds: Some(LA_MESA_BOUNDS),
        name_fields: &["PoleId", "Name"],
        address_fields: &["Street"],
        type_fields: &["FixtureType", "Type"],
        breakdown_fields: &["FixtureType"],
    },
];

/// Look up a layer's configuration.
pub fn get(layer_id: &str) -> Option<&'static DatasetConfig> {
    DATASETS.iter().find(|d| d.layer_id == layer_id)
}

/// All registered layers, in catalog order.
pub fn all() -> &'static [DatasetConfig] {
    DATASETS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layer_registered() {
        assert!(get(DEFAULT_LAYER).is_some());
    }

    #[test]
    fn test_unknown_layer() {
        assert!(get("no_such_layer").is_none());
    }

    #[test]
    fn test_bounds_contains() {
        assert!(ABU_DHABI_BOUNDS.contains(24.45, 54.37));
        assert!(!ABU_DHABI_BOUNDS.contains(41.0, 54.37));
        assert!(LA_MESA_BOUNDS.contains(32.77, -117.02));
    }
}
