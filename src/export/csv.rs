use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::spatial::JoinedLevel;

/// Write the ranked table for one level as CSV. Returns the row count.
///
/// Rows without geometry are included; this is the tabular view of the
/// rankings and needs no polygons.
pub(crate) fn write_csv(joined: &JoinedLevel, path: &Path) -> Result<usize> {
    let mut df = to_dataframe(joined)?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file))
        .with_float_precision(Some(6))
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV: {}", path.display()))?;

    Ok(joined.records.len())
}

pub(crate) fn to_dataframe(joined: &JoinedLevel) -> Result<DataFrame> {
    let records = &joined.records;
    Ok(DataFrame::new(vec![
        Column::new("geo_id".into(), records.iter().map(|r| r.geo_id.as_str()).collect::<Vec<_>>()),
        Column::new("Rank".into(), records.iter().map(|r| r.rank).collect::<Vec<_>>()),
        Column::new("P".into(), records.iter().map(|r| finite(r.probability)).collect::<Vec<_>>()),
        Column::new("Prediction-01".into(), records.iter().map(|r| r.prediction as u32).collect::<Vec<_>>()),
        Column::new("1-P".into(), records.iter().map(|r| finite(r.complement)).collect::<Vec<_>>()),
        Column::new("y_true".into(), records.iter().map(|r| r.actual).collect::<Vec<_>>()),
        Column::new("NAME".into(), records.iter().map(|r| r.name.as_deref()).collect::<Vec<_>>()),
        Column::new("NAMELSAD".into(), records.iter().map(|r| r.name_long.as_deref()).collect::<Vec<_>>()),
    ])?)
}

/// NaN becomes a null cell rather than the literal string "NaN".
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
