//! Place-name resolution with scope widening and caching.
//!
//! [`GeocodeResolver::resolve`] turns a city, state or free-text query into
//! coordinates. It tries, in order:
//!
//! 1. the resolver's cache (hits by name, misses by name + scope),
//! 2. places already known from geocoded contacts (only for [`Scope::Local`]),
//! 3. the provider restricted to the configured country allow-list,
//! 4. the provider with no country restriction, at most once.
//!
//! Provider failures are reported as [`GeocodeError::ResolutionFailed`] and never
//! cached, so a transient outage does not poison later lookups.

mod cache;
mod mapbox;
mod provider;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use ahash::AHashMap as HashMap;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use waymark_data::{Contact, Coordinates, is_region};

use crate::config::ResolverConfig;
use cache::GeocodeCache;
pub use mapbox::{MAPBOX_GEOCODING_URL, MAPBOX_TOKEN_ENV, MapboxProvider};
pub use provider::{
    GazetteerEntry, GeocodingProvider, PlaceQuery, PlaceType, ProviderError, ProviderMatch,
    StaticGazetteer,
};

/// How broadly a query may be searched.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Places known from contact data first, then as [`Scope::RegionRestricted`].
    Local,
    /// Provider search limited to the country allow-list, widening once to global.
    RegionRestricted,
    /// Provider search with no country restriction.
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::RegionRestricted => "region-restricted",
            Self::Global => "global",
        })
    }
}

/// A successfully resolved place. Immutable once created.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    /// Resolved place name, case preserved.
    pub name: String,
    pub coordinates: Coordinates,
    /// Tier that produced the result.
    pub resolved_in: Scope,
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("No place found for '{query}' ({scope} scope)")]
    NotFound { query: String, scope: Scope },
    #[error("Geocoding failed: {0}")]
    ResolutionFailed(#[from] ProviderError),
}

impl GeocodeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Resolves place names through cache, local contact data and a provider.
///
/// The cache is owned by the resolver instance; share the resolver (behind an
/// `Arc`) to share the cache.
pub struct GeocodeResolver {
    provider: Arc<dyn GeocodingProvider>,
    config: ResolverConfig,
    cache: Mutex<GeocodeCache>,
    local: RwLock<HashMap<String, GeocodedLocation>>,
}

impl fmt::Debug for GeocodeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeResolver")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}

impl GeocodeResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, config: ResolverConfig) -> Self {
        let cache = GeocodeCache::new(config.cache_ttl);
        Self {
            provider,
            config,
            cache: Mutex::new(cache),
            local: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Rebuild the local tier from geocoded contacts.
    ///
    /// Each contact contributes its city and "city, state"; the first contact seen
    /// for a name wins. Ungeocoded contacts are skipped.
    pub fn index_contacts(&self, contacts: &[Contact]) {
        let mut places = HashMap::new();
        for contact in contacts {
            let (Some(city), Some(coordinates)) = (contact.city.as_deref(), contact.coordinates())
            else {
                continue;
            };
            let mut names = vec![city.to_string()];
            if let Some(state) = contact.state.as_deref() {
                names.push(format!("{city}, {state}"));
            }
            for name in names {
                places
                    .entry(normalize(&name))
                    .or_insert_with(|| GeocodedLocation {
                        name,
                        coordinates,
                        resolved_in: Scope::Local,
                    });
            }
        }
        debug!(places = places.len(), "Indexed local places from contacts");
        *self.local.write().unwrap_or_else(PoisonError::into_inner) = places;
    }

    /// Cached resolution for `query`, if any, without touching the provider.
    pub fn cached(&self, query: &str) -> Option<GeocodedLocation> {
        self.lock_cache().hit(&normalize(query), Instant::now())
    }

    pub fn cached_count(&self) -> usize {
        self.lock_cache().len()
    }

    /// Resolve a place name to coordinates.
    #[instrument(name = "Resolve place", skip(self), level = "debug")]
    pub async fn resolve(&self, query: &str, scope: Scope) -> Result<GeocodedLocation> {
        let text = query.trim();
        let not_found = || GeocodeError::NotFound {
            query: text.to_string(),
            scope,
        };
        if text.is_empty() {
            return Err(not_found());
        }
        let key = normalize(text);

        if let Some(hit) = self.cached(&key) {
            debug!(name = %hit.name, "Geocode cache hit");
            return Ok(hit);
        }

        if scope == Scope::Local {
            let local = self
                .local
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .cloned();
            if let Some(found) = local {
                debug!(name = %found.name, "Resolved from contact data");
                return Ok(found);
            }
        }

        let attempts: &[Scope] = match scope {
            Scope::Local | Scope::RegionRestricted => &[Scope::RegionRestricted, Scope::Global],
            Scope::Global => &[Scope::Global],
        };
        // Misses are recorded per attempted scope; only a miss in every one of
        // them answers the request without the provider.
        let all_missed = {
            let cache = self.lock_cache();
            let now = Instant::now();
            attempts.iter().all(|&attempt| cache.is_miss(&key, attempt, now))
        };
        if all_missed {
            debug!("Geocode cache hit (no result)");
            return Err(not_found());
        }

        let types = if is_region(text) {
            vec![PlaceType::Region]
        } else {
            vec![PlaceType::Locality, PlaceType::Place, PlaceType::Region]
        };

        for &attempt in attempts {
            if self.lock_cache().is_miss(&key, attempt, Instant::now()) {
                debug!(%attempt, "Skipping scope with cached miss");
                continue;
            }
            let place_query = PlaceQuery {
                text: text.to_string(),
                types: types.clone(),
                countries: (attempt == Scope::RegionRestricted).then(|| self.config.countries.clone()),
            };

            match self.search(&place_query).await? {
                Some(found) => {
                    let location = GeocodedLocation {
                        name: found.name,
                        coordinates: found.coordinates,
                        resolved_in: attempt,
                    };
                    info!(name = %location.name, %attempt, "Resolved place");
                    self.lock_cache()
                        .insert_hit(key, location.clone(), Instant::now());
                    return Ok(location);
                }
                None => {
                    debug!(%attempt, "No result in scope");
                    self.lock_cache().insert_miss(key.clone(), attempt, Instant::now());
                }
            }
        }

        Err(not_found())
    }

    async fn search(&self, query: &PlaceQuery) -> Result<Option<ProviderMatch>> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.provider.search(query)).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "Geocoding provider error");
                Err(e.into())
            }
            Err(_) => {
                warn!(provider = self.provider.name(), ?timeout, "Geocoding provider timed out");
                Err(ProviderError::Timeout(timeout).into())
            }
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, GeocodeCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache key for a place name: trimmed, case-folded, inner whitespace collapsed.
pub fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
