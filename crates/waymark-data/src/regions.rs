//! Static catalog of first-order administrative regions.
//!
//! The geocode resolver uses this to decide whether a free-text query names a
//! region (and should be searched with a region-only place-type restriction) or
//! an arbitrary place.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;

/// A state, province or territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub abbreviation: &'static str,
    /// ISO 3166-1 alpha-2, lower-case.
    pub country: &'static str,
}

const REGIONS: [Region; 64] = [
    region("Alabama", "AL", "us"),
    region("Alaska", "AK", "us"),
    region("Arizona", "AZ", "us"),
    region("Arkansas", "AR", "us"),
    region("California", "CA", "us"),
    region("Colorado", "CO", "us"),
    region("Connecticut", "CT", "us"),
    region("Delaware", "DE", "us"),
    region("District of Columbia", "DC", "us"),
    region("Florida", "FL", "us"),
    region("Georgia", "GA", "us"),
    region("Hawaii", "HI", "us"),
    region("Idaho", "ID", "us"),
    region("Illinois", "IL", "us"),
    region("Indiana", "IN", "us"),
    region("Iowa", "IA", "us"),
    region("Kansas", "KS", "us"),
    region("Kentucky", "KY", "us"),
    region("Louisiana", "LA", "us"),
    region("Maine", "ME", "us"),
    region("Maryland", "MD", "us"),
    region("Massachusetts", "MA", "us"),
    region("Michigan", "MI", "us"),
    region("Minnesota", "MN", "us"),
    region("Mississippi", "MS", "us"),
    region("Missouri", "MO", "us"),
    region("Montana", "MT", "us"),
    region("Nebraska", "NE", "us"),
    region("Nevada", "NV", "us"),
    region("New Hampshire", "NH", "us"),
    region("New Jersey", "NJ", "us"),
    region("New Mexico", "NM", "us"),
    region("New York", "NY", "us"),
    region("North Carolina", "NC", "us"),
    region("North Dakota", "ND", "us"),
    region("Ohio", "OH", "us"),
    region("Oklahoma", "OK", "us"),
    region("Oregon", "OR", "us"),
    region("Pennsylvania", "PA", "us"),
    region("Rhode Island", "RI", "us"),
    region("South Carolina", "SC", "us"),
    region("South Dakota", "SD", "us"),
    region("Tennessee", "TN", "us"),
    region("Texas", "TX", "us"),
    region("Utah", "UT", "us"),
    region("Vermont", "VT", "us"),
    region("Virginia", "VA", "us"),
    region("Washington", "WA", "us"),
    region("West Virginia", "WV", "us"),
    region("Wisconsin", "WI", "us"),
    region("Wyoming", "WY", "us"),
    region("Alberta", "AB", "ca"),
    region("British Columbia", "BC", "ca"),
    region("Manitoba", "MB", "ca"),
    region("New Brunswick", "NB", "ca"),
    region("Newfoundland and Labrador", "NL", "ca"),
    region("Nova Scotia", "NS", "ca"),
    region("Ontario", "ON", "ca"),
    region("Prince Edward Island", "PE", "ca"),
    region("Quebec", "QC", "ca"),
    region("Saskatchewan", "SK", "ca"),
    region("Northwest Territories", "NT", "ca"),
    region("Nunavut", "NU", "ca"),
    region("Yukon", "YT", "ca"),
];

const fn region(name: &'static str, abbreviation: &'static str, country: &'static str) -> Region {
    Region {
        name,
        abbreviation,
        country,
    }
}

/// Lower-cased names and abbreviations -> region.
static REGION_LOOKUP: Lazy<HashMap<String, Region>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(REGIONS.len() * 2);
    for region in REGIONS {
        map.insert(region.name.to_lowercase(), region);
        map.insert(region.abbreviation.to_lowercase(), region);
    }
    map
});

/// Exact, case-insensitive lookup by full name or abbreviation.
pub fn lookup_region(text: &str) -> Option<Region> {
    REGION_LOOKUP.get(&text.trim().to_lowercase()).copied()
}

pub fn is_region(text: &str) -> bool {
    lookup_region(text).is_some()
}

/// All catalogued regions, in catalog order.
pub fn all_regions() -> &'static [Region] {
    &REGIONS
}
