use std::panic::{AssertUnwindSafe, catch_unwind};

use ahash::AHashMap;
use geo::{Area, BooleanOps, MultiPolygon};
use log::{info, warn};

use crate::level::GeoLevel;
use crate::spatial::{BoundaryRecord, GeoHierarchy, normalize_geo_id};

/// Dissolve tract polygons into one boundary per MSA.
///
/// Tracts with no MSA assignment are left out. Degenerate members (empty or
/// zero-area) are filtered before the union. A union failure poisons only
/// its own group; the group is skipped and counted, and the run carries on.
///
/// Returns dissolved boundaries sorted by MSA code plus the skipped-group
/// count.
pub(crate) fn dissolve_tracts_to_msa(
    tracts: &[BoundaryRecord],
    hierarchy: &GeoHierarchy,
) -> (Vec<BoundaryRecord>, usize) {
    let width = GeoLevel::Tract.geoid_width();

    let mut groups: AHashMap<String, Vec<&MultiPolygon<f64>>> = AHashMap::new();
    for tract in tracts {
        let tract_id = normalize_geo_id(&tract.geo_id, width);
        let Some(msa) = hierarchy.msa_of_tract(&tract_id) else {
            continue;
        };
        if tract.geometry.0.is_empty() || tract.geometry.unsigned_area() == 0.0 {
            warn!("  dissolve: skipping degenerate tract {}", tract_id);
            continue;
        }
        groups.entry(msa.to_string()).or_default().push(&tract.geometry);
    }

    let mut dissolved = Vec::with_capacity(groups.len());
    let mut skipped = 0;
    for (msa, members) in groups {
        let count = members.len();
        let unioned = catch_unwind(AssertUnwindSafe(|| {
            members.into_iter().cloned().reduce(|a, b| a.union(&b))
        }));
        match unioned {
            Ok(Some(geometry)) if !geometry.0.is_empty() => {
                dissolved.push(BoundaryRecord {
                    geo_id: msa.clone(),
                    name: hierarchy.msa_name(&msa).map(String::from),
                    name_long: None,
                    geometry,
                });
            }
            _ => {
                warn!("  dissolve: union failed for MSA {} ({} tracts); skipping group", msa, count);
                skipped += 1;
            }
        }
    }

    dissolved.sort_by(|a, b| a.geo_id.cmp(&b.geo_id));
    info!("  dissolved {} tracts into {} MSA boundaries ({} groups skipped)", tracts.len(), dissolved.len(), skipped);
    (dissolved, skipped)
}
