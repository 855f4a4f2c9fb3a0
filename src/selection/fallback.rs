use crate::catalog::TimeWindow;
use crate::config::types::StationInventoryEntry;
use std::cmp::Ordering;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone)]
pub struct RankedStation<'a> {
    pub entry: &'a StationInventoryEntry,
    pub distance_km: f64,
}

/// Orders usable stations for a fallback: nearest to the epicenter first, then
/// most complete data, then network/station code so ties are deterministic.
///
/// `eligible` decides which inventory entries may be used at all (network
/// inclusion, excluding the primary); availability for `window` is checked here.
pub fn rank_fallbacks<'a, F>(
    inventory: &'a [StationInventoryEntry],
    epicenter: (f64, f64),
    window: &TimeWindow,
    eligible: F,
) -> Vec<RankedStation<'a>>
where
    F: Fn(&StationInventoryEntry) -> bool,
{
    let mut ranked: Vec<RankedStation<'a>> = inventory
        .iter()
        .filter(|entry| eligible(*entry))
        .filter(|entry| entry.covers(window.start, window.end))
        .map(|entry| RankedStation {
            entry,
            distance_km: haversine_km(epicenter.0, epicenter.1, entry.latitude, entry.longitude),
        })
        .collect();

    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedStation<'_>, b: &RankedStation<'_>) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.entry.completeness.total_cmp(&a.entry.completeness))
        .then_with(|| a.entry.network.cmp(&b.entry.network))
        .then_with(|| a.entry.station.cmp(&b.entry.station))
}
