use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::spatial::JoinedLevel;

const HEADERS: [&str; 8] = ["geo_id", "Rank", "P", "Prediction-01", "1-P", "y_true", "NAME", "NAMELSAD"];

/// Write the ranked table for one level as an xlsx workbook with a single
/// sheet named after the level. Returns the row count.
pub(crate) fn write_excel(joined: &JoinedLevel, path: &Path) -> Result<usize> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(joined.level.sheet_name().to_uppercase())?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, record) in joined.records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &record.geo_id)?;
        sheet.write_number(row, 1, record.rank as f64)?;
        if record.probability.is_finite() {
            sheet.write_number(row, 2, record.probability)?;
        }
        sheet.write_number(row, 3, record.prediction as f64)?;
        if record.complement.is_finite() {
            sheet.write_number(row, 4, record.complement)?;
        }
        if let Some(actual) = record.actual {
            sheet.write_number(row, 5, actual)?;
        }
        sheet.write_string(row, 6, record.name.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 7, record.name_long.as_deref().unwrap_or(""))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write Excel file: {}", path.display()))?;
    Ok(joined.records.len())
}
