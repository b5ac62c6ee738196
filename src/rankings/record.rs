use crate::level::GeoLevel;

/// One row of the ranked table at a single geographic level.
#[derive(Debug, Clone)]
pub struct RankedRecord {
    pub geo_id: String,
    /// Model probability in [0, 1]; NaN when the source cell is empty.
    pub probability: f64,
    pub prediction: u8,
    /// 1 - probability, carried redundantly for display columns.
    pub complement: f64,
    /// Ground-truth label, where known.
    pub actual: Option<f64>,
    pub name: Option<String>,
    pub name_long: Option<String>,
}

/// All ranked rows for one geographic level, in workbook order.
#[derive(Debug, Clone)]
pub struct RankedLevel {
    pub level: GeoLevel,
    pub records: Vec<RankedRecord>,
}

impl RankedLevel {
    pub fn new(level: GeoLevel, records: Vec<RankedRecord>) -> Self {
        Self { level, records }
    }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
