//! Ranked-geography export pipeline.
//!
//! Takes model rankings for census geographies (tract, county, MSA), joins
//! them with boundary polygons, dissolves tracts into MSA outlines, and
//! writes the result in tabular (CSV, Excel) and spatial (GeoJSON, KML, KMZ)
//! formats plus JSON sidecars for the map UI. Every run ends with a manifest
//! describing what was written.

mod common;
mod config;
mod export;
mod geom;
mod level;
mod rankings;
mod spatial;

#[doc(inline)]
pub use config::{ExportConfig, Format, SimplifyConfig};
#[doc(inline)]
pub use export::{ExportInputs, FailureEntry, FileEntry, RunStatus, RunSummary, load_inputs, run_exports, run_exports_with_inputs};
pub use geom::Geom;
#[doc(inline)]
pub use level::GeoLevel;
pub use rankings::{RankedLevel, RankedRecord};
pub use spatial::{BoundaryRecord, GeoHierarchy, JoinedLevel, JoinedRecord};
