mod color;
mod csv;
mod excel;
mod frontend;
mod geojson;
mod kml;
mod kmz;
mod manifest;
mod run;

pub(crate) use color::*;
pub(crate) use csv::*;
pub(crate) use excel::*;
pub(crate) use frontend::*;
pub(crate) use geojson::*;
pub(crate) use kml::*;
pub(crate) use kmz::*;
pub use manifest::{FailureEntry, FileEntry, RunStatus, RunSummary};
pub use run::{ExportInputs, load_inputs, run_exports, run_exports_with_inputs};
