//! Geometry variants carried on raw features.

use serde::{Deserialize, Serialize};

/// A raw geometry as returned by a backend, before normalization.
///
/// Only three shapes exist in the supported services. The variant tag is
/// authoritative; downstream code never sniffs coordinate arrays to guess
/// the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    /// A single coordinate pair.
    Point { x: f64, y: f64 },
    /// One or more closed rings of `[x, y]` vertices. The first ring is the
    /// outer boundary.
    Polygon { rings: Vec<Vec<[f64; 2]>> },
    /// One or more paths of `[x, y]` vertices.
    Polyline { paths: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "point",
            Geometry::Polygon { .. } => "polygon",
            Geometry::Polyline { .. } => "polyline",
        }
    }
}
