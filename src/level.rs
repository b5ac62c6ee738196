use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    Msa,        // Coarsest level, geometry synthesized by dissolving tracts
    County,     // County -> Msa
    Tract,      // Finest level, Tract -> County
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 3] = [GeoLevel::Msa, GeoLevel::County, GeoLevel::Tract];

    pub fn to_str(&self) -> &'static str {
        match self {
            GeoLevel::Msa => "msa",
            GeoLevel::County => "county",
            GeoLevel::Tract => "tract",
        }
    }

    /// Sheet name used for this level in the ranked workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            GeoLevel::Msa => "MSA",
            GeoLevel::County => "County",
            GeoLevel::Tract => "Tract",
        }
    }

    /// Expected digit count of a FIPS-style geo_id at this level.
    /// MSA codes (CBSA) have no fixed width and are never zero-padded.
    pub fn geoid_width(&self) -> Option<usize> {
        match self {
            GeoLevel::Msa => None,
            GeoLevel::County => Some(5),
            GeoLevel::Tract => Some(11),
        }
    }

    pub fn from_str(s: &str) -> Option<GeoLevel> {
        match s.to_ascii_lowercase().as_str() {
            "msa" => Some(GeoLevel::Msa),
            "county" => Some(GeoLevel::County),
            "tract" => Some(GeoLevel::Tract),
            _ => None,
        }
    }
}

impl std::fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}
