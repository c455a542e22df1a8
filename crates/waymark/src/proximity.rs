//! Radius search around a resolved anchor.

use itertools::Itertools;

use crate::distance::distance_miles;
use crate::geocode::GeocodedLocation;

/// A candidate within range of the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlace {
    pub name: String,
    pub miles: f64,
}

/// Candidates within `radius_miles` of `anchor` (inclusive), nearest first, ties by name.
///
/// The anchor itself is returned at distance zero when it appears among the candidates.
pub fn nearby<'a>(
    anchor: &GeocodedLocation,
    candidates: impl IntoIterator<Item = &'a GeocodedLocation>,
    radius_miles: f64,
) -> Vec<NearbyPlace> {
    candidates
        .into_iter()
        .map(|candidate| NearbyPlace {
            name: candidate.name.clone(),
            miles: distance_miles(anchor.coordinates, candidate.coordinates),
        })
        .filter(|place| place.miles <= radius_miles)
        .sorted_by(|a, b| a.miles.total_cmp(&b.miles).then_with(|| a.name.cmp(&b.name)))
        .collect()
}
