//! The geocoding provider boundary.
//!
//! A provider answers one place search at a time with zero or one best match.
//! Wire formats stay behind this trait; the resolver only sees [`PlaceQuery`] in
//! and [`ProviderMatch`] out.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use waymark_data::Coordinates;

/// Place-type restriction sent with a search.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceType {
    Region,
    Place,
    Locality,
}

impl PlaceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Place => "place",
            Self::Locality => "locality",
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound place search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery {
    pub text: String,
    pub types: Vec<PlaceType>,
    /// Lower-case ISO country codes; `None` searches worldwide.
    pub countries: Option<Vec<String>>,
}

/// The provider's single best match.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMatch {
    /// Canonical place name as the provider spells it.
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned status {0}")]
    Status(u16),
    #[error("Malformed provider response: {0}")]
    Decode(String),
    #[error("Provider request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &PlaceQuery) -> Result<Option<ProviderMatch>, ProviderError>;
}

/// A named place known to a [`StaticGazetteer`].
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerEntry {
    pub name: String,
    pub kind: PlaceType,
    /// Lower-case ISO country code.
    pub country: String,
    pub coordinates: Coordinates,
}

impl GazetteerEntry {
    pub fn new(name: &str, kind: PlaceType, country: &str, longitude: f64, latitude: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            country: country.to_lowercase(),
            coordinates: Coordinates::new(longitude, latitude),
        }
    }
}

/// Offline provider over a fixed table of places.
///
/// Honors type and country restrictions the same way a remote provider would,
/// and records every query it receives.
#[derive(Debug, Default)]
pub struct StaticGazetteer {
    entries: Vec<GazetteerEntry>,
    calls: AtomicUsize,
    seen: Mutex<Vec<PlaceQuery>>,
}

impl StaticGazetteer {
    pub fn new(entries: impl IntoIterator<Item = GazetteerEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Number of searches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every query received, oldest first.
    pub fn queries(&self) -> Vec<PlaceQuery> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn find(&self, query: &PlaceQuery) -> Option<&GazetteerEntry> {
        let text = query.text.trim().to_lowercase();
        self.entries.iter().find(|entry| {
            let name = entry.name.to_lowercase();
            let name_matches = text == name
                || text
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with(','));
            let type_allowed = query.types.is_empty() || query.types.contains(&entry.kind);
            let country_allowed = query
                .countries
                .as_ref()
                .is_none_or(|allowed| allowed.iter().any(|c| c.eq_ignore_ascii_case(&entry.country)));
            name_matches && type_allowed && country_allowed
        })
    }
}

#[async_trait]
impl GeocodingProvider for StaticGazetteer {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(&self, query: &PlaceQuery) -> Result<Option<ProviderMatch>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(query.clone());
        Ok(self.find(query).map(|entry| ProviderMatch {
            name: entry.name.clone(),
            coordinates: entry.coordinates,
        }))
    }
}
