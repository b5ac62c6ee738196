mod hierarchy;
mod join;
mod load;
mod polygon;

pub use hierarchy::GeoHierarchy;
pub use join::{JoinedLevel, JoinedRecord};
pub(crate) use join::{join, normalize_geo_id};
pub(crate) use load::*;
pub use polygon::BoundaryRecord;
