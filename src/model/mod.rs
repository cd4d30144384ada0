//! Data model: the DTOs that cross every stage boundary.

mod attributes;
mod feature;
mod geometry;
mod value;

pub use attributes::{first_of, get_ci, AttributeMap};
pub use feature::{BatchProgress, NormalizedFeature, QueryStatistics, RawFeature};
pub use geometry::Geometry;
pub use value::Value;
