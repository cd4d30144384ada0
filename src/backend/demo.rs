//! Static in-process mock backend.
//!
//! Serves a fixed table per demo layer, with geographic (WGS84) point
//! geometries. This is the reference backend: it exists to exercise the
//! whole pipeline without any network, and its rows are stable enough to
//! assert against in tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{AttributeMap, Geometry, RawFeature, Value};
use crate::normalize::SourceCrs;
use crate::{Error, Result};

use super::{filter, QueryBackend, QueryRows};

/// In-memory demo tables keyed by layer id.
pub struct DemoBackend {
    layers: HashMap<&'static str, Vec<RawFeature>>,
}

fn point(lon: f64, lat: f64) -> Option<Geometry> {
    Some(Geometry::Point { x: lon, y: lat })
}

fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn feature(lon: f64, lat: f64, pairs: &[(&str, Value)]) -> RawFeature {
    RawFeature { geometry: point(lon, lat), attributes: attrs(pairs) }
}

impl DemoBackend {
    pub fn new() -> Self {
        let mut layers: HashMap<&'static str, Vec<RawFeature>> = HashMap::new();

        layers.insert(
            "transport_bus_stops",
            vec![
                feature(54.3568, 24.4912, &[
                    ("OBJECTID", Value::Int(1)),
                    ("StopName", Value::from("Corniche St / Nation Towers")),
                    ("Address", Value::from("Corniche Road West")),
                    ("StopType", Value::from("Local")),
                    ("Type", Value::from("Local")),
                    ("District", Value::from("Central Abu Dhabi")),
                    ("Route", Value::from("34")),
                ]),
                feature(54.3773, 24.4821, &[
                    ("OBJECTID", Value::Int(2)),
                    ("StopName", Value::from("Hamdan St / Liwa Centre")),
                    ("Address", Value::from("Hamdan Bin Mohammed Street")),
                    ("StopType", Value::from("Local")),
                    ("Type", Value::from("Local")),
                    ("District", Value::from("Central Abu Dhabi")),
                    ("Route", Value::from("5")),
                ]),
                feature(54.3995, 24.4667, &[
                    ("OBJECTID", Value::Int(3)),
                    ("StopName", Value::from("Al Wahda Mall")),
                    ("Address", Value::from("Hazza Bin Zayed Street")),
                    ("StopType", Value::from("Express")),
                    ("Type", Value::from("Express")),
                    ("District", Value::from("Central Abu Dhabi")),
                    ("Route", Value::from("X88")),
                ]),
                feature(55.7447, 24.2075, &[
                    ("OBJECTID", Value::Int(4)),
                    ("StopName", Value::from("Al Ain Central Station")),
                    ("Address", Value::from("Zayed Bin Sultan Street")),
                    ("StopType", Value::from("Terminal")),
                    ("Type", Value::from("Terminal")),
                    ("District", Value::from("Al Ain")),
                    ("Route", Value::from("900")),
                ]),
                feature(52.7300, 23.6500, &[
                    ("OBJECTID", Value::Int(5)),
                    ("StopName", Value::from("Madinat Zayed Stop")),
                    ("Address", Value::from("Main Street")),
                    ("StopType", Value::from("Local")),
                    ("Type", Value::from("Local")),
                    ("District", Value::from("Al Dhafra")),
                    ("Route", Value::from("210")),
                ]),
                feature(54.6092, 24.4539, &[
                    ("OBJECTID", Value::Int(6)),
                    ("StopName", Value::from("Khalifa City A Market")),
                    ("Address", Value::from("Street 12")),
                    ("StopType", Value::from("Local")),
                    ("Type", Value::from("Local")),
                    ("District", Value::from("Khalifa City")),
                    ("Route", Value::from("218")),
                ]),
            ],
        );

        layers.insert(
            "education_schools",
            vec![
                feature(54.3692, 24.4785, &[
                    ("OBJECTID", Value::Int(1)),
                    ("SchoolName", Value::from("Al Nahda National School")),
                    ("Address", Value::from("Muroor Road")),
                    ("SchoolType", Value::from("Private Primary")),
                    ("Type", Value::from("Private Primary")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(54.4234, 24.4410, &[
                    ("OBJECTID", Value::Int(2)),
                    ("SchoolName", Value::from("Zayed Public School")),
                    ("Address", Value::from("Al Karamah Street")),
                    ("SchoolType", Value::from("Public Secondary")),
                    ("Type", Value::from("Public Secondary")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(55.7601, 24.2215, &[
                    ("OBJECTID", Value::Int(3)),
                    ("SchoolName", Value::from("Al Ain Model School")),
                    ("Address", Value::from("Al Jimi")),
                    ("SchoolType", Value::from("Public Primary")),
                    ("Type", Value::from("Public Primary")),
                    ("District", Value::from("Al Ain")),
                ]),
                feature(54.5510, 24.3475, &[
                    ("OBJECTID", Value::Int(4)),
                    ("SchoolName", Value::from("Mussafah Community School")),
                    ("Address", Value::from("Mussafah M-9")),
                    ("SchoolType", Value::from("Private Secondary")),
                    ("Type", Value::from("Private Secondary")),
                    ("District", Value::from("Mussafah")),
                ]),
            ],
        );

        layers.insert(
            "education_universities",
            vec![
                feature(54.6139, 24.5254, &[
                    ("OBJECTID", Value::Int(1)),
                    ("Name", Value::from("Khalifa University")),
                    ("Address", Value::from("Sas Al Nakhl")),
                    ("Type", Value::from("Public")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(54.4355, 24.5243, &[
                    ("OBJECTID", Value::Int(2)),
                    ("Name", Value::from("NYU Abu Dhabi")),
                    ("Address", Value::from("Saadiyat Island")),
                    ("Type", Value::from("Private")),
                    ("District", Value::from("Saadiyat")),
                ]),
                feature(55.6830, 24.1949, &[
                    ("OBJECTID", Value::Int(3)),
                    ("Name", Value::from("UAE University")),
                    ("Address", Value::from("Sheikh Khalifa Bin Zayed Street")),
                    ("Type", Value::from("Public")),
                    ("District", Value::from("Al Ain")),
                ]),
            ],
        );

        layers.insert(
            "public_safety_stations",
            vec![
                feature(54.3660, 24.4730, &[
                    ("OBJECTID", Value::Int(1)),
                    ("StationName", Value::from("Al Khalidiya Police Station")),
                    ("Address", Value::from("Zayed The First Street")),
                    ("StationType", Value::from("Police")),
                    ("Type", Value::from("Police")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(54.4120, 24.4525, &[
                    ("OBJECTID", Value::Int(2)),
                    ("StationName", Value::from("Madinat Zayed Fire Station")),
                    ("Address", Value::from("Sultan Bin Zayed Street")),
                    ("StationType", Value::from("Fire")),
                    ("Type", Value::from("Fire")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(55.7512, 24.2301, &[
                    ("OBJECTID", Value::Int(3)),
                    ("StationName", Value::from("Al Ain Police Station")),
                    ("Address", Value::from("Khalifa Street")),
                    ("StationType", Value::from("Police")),
                    ("Type", Value::from("Police")),
                    ("District", Value::from("Al Ain")),
                ]),
            ],
        );

        layers.insert(
            "health_hospitals",
            vec![
                feature(54.3925, 24.4660, &[
                    ("OBJECTID", Value::Int(1)),
                    ("Name", Value::from("Sheikh Khalifa Medical City")),
                    ("Address", Value::from("Al Karamah Street")),
                    ("Type", Value::from("General")),
                    ("District", Value::from("Central Abu Dhabi")),
                ]),
                feature(54.4930, 24.4250, &[
                    ("OBJECTID", Value::Int(2)),
                    ("Name", Value::from("Cleveland Clinic Abu Dhabi")),
                    ("Address", Value::from("Al Maryah Island")),
                    ("Type", Value::from("Specialized")),
                    ("District", Value::from("Al Maryah")),
                ]),
                feature(55.7390, 24.2240, &[
                    ("OBJECTID", Value::Int(3)),
                    ("Name", Value::from("Tawam Hospital")),
                    ("Address", Value::from("Al Maqam")),
                    ("Type", Value::from("General")),
                    ("District", Value::from("Al Ain")),
                ]),
            ],
        );

        Self { layers }
    }

    fn table(&self, layer_id: &str) -> Result<&Vec<RawFeature>> {
        self.layers
            .get(layer_id)
            .ok_or_else(|| Error::UnknownLayer(layer_id.to_owned()))
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryBackend for DemoBackend {
    async fn execute(&self, layer_id: &str, where_expr: &str) -> Result<QueryRows> {
        let table = self.table(layer_id)?;
        let f = filter::parse(where_expr);
        let rows: Vec<RawFeature> = table
            .iter()
            .filter(|row| filter::matches(&f, &row.attributes))
            .cloned()
            .collect();
        Ok(QueryRows {
            rows,
            total_count_hint: Some(table.len() as u64),
            crs: Some(SourceCrs::Geographic),
        })
    }

    async fn count_only(&self, layer_id: &str, where_expr: &str) -> Result<u64> {
        let table = self.table(layer_id)?;
        let f = filter::parse(where_expr);
        Ok(table.iter().filter(|row| filter::matches(&f, &row.attributes)).count() as u64)
    }

    async fn sample_one_row(&self, layer_id: &str) -> Result<Option<AttributeMap>> {
        Ok(self.table(layer_id)?.first().map(|row| row.attributes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pass_all_returns_whole_table() {
        let b = DemoBackend::new();
        let out = b.execute("transport_bus_stops", "1=1").await.unwrap();
        assert_eq!(out.rows.len(), 6);
        assert_eq!(out.total_count_hint, Some(6));
    }

    #[tokio::test]
    async fn test_district_filter() {
        let b = DemoBackend::new();
        let out = b.execute("education_schools", "District LIKE '%al ain%'").await.unwrap();
        assert_eq!(out.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_layer_errors() {
        let b = DemoBackend::new();
        assert!(b.execute("no_such_layer", "1=1").await.is_err());
    }

    #[tokio::test]
    async fn test_sample_one_row() {
        let b = DemoBackend::new();
        let sample = b.sample_one_row("health_hospitals").await.unwrap().unwrap();
        assert!(sample.contains_key("Name"));
    }
}
