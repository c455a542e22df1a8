use std::time::Duration;

use crate::error::WaymarkError;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_RADIUS_MILES: f64 = 60.0;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest allowed cap for each result section.
pub const MAX_CONTACT_RESULTS: usize = 10;
pub const MAX_CITY_RESULTS: usize = 6;
pub const MAX_STATE_RESULTS: usize = 3;

/// Maximum length of each section in a search result.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultCaps {
    pub contacts: usize,
    pub cities: usize,
    pub states: usize,
}

impl Default for ResultCaps {
    fn default() -> Self {
        Self {
            contacts: 8,
            cities: 5,
            states: 3,
        }
    }
}

impl ResultCaps {
    /// Caps that keep every section within the documented ceilings.
    pub fn new(contacts: usize, cities: usize, states: usize) -> Result<Self, WaymarkError> {
        for (section, cap, max) in [
            ("contacts", contacts, MAX_CONTACT_RESULTS),
            ("cities", cities, MAX_CITY_RESULTS),
            ("states", states, MAX_STATE_RESULTS),
        ] {
            if cap == 0 || cap > max {
                return Err(WaymarkError::ConfigError(format!(
                    "{section} cap must be between 1 and {max}, got {cap}"
                )));
            }
        }
        Ok(Self {
            contacts,
            cities,
            states,
        })
    }
}

/// Tuning for the interactive search session.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Quiet period after the last keystroke before a query is evaluated.
    pub debounce: Duration,
    pub caps: ResultCaps,
    /// Radius for "near X" city suggestions around a resolved place.
    pub proximity_radius_miles: f64,
    /// Queries shorter than this never reach the geocoder.
    pub min_geocode_query_len: usize,
    /// Fewer local matches than this counts as scarce and triggers geocoding.
    pub scarce_threshold: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            caps: ResultCaps::default(),
            proximity_radius_miles: DEFAULT_RADIUS_MILES,
            min_geocode_query_len: 3,
            scarce_threshold: 3,
        }
    }
}

/// Settings for [`crate::GeocodeResolver`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Country allow-list for region-restricted searches (lower-case ISO codes).
    pub countries: Vec<String>,
    pub request_timeout: Duration,
    /// How long cache entries stay valid; `None` keeps them for the resolver's lifetime.
    pub cache_ttl: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            countries: vec!["us".to_string(), "ca".to_string()],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: None,
        }
    }
}

impl ResolverConfig {
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.countries = countries
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// Top-level configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaymarkConfig {
    pub session: SessionConfig,
    pub resolver: ResolverConfig,
}

/// Builder for creating session configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Small result panel (5 contacts, 3 cities, 3 states)
    pub fn compact() -> Self {
        let mut builder = Self::new();
        builder.config.caps = ResultCaps {
            contacts: 5,
            cities: 3,
            states: 3,
        };
        builder
    }

    /// Largest result panel (10 contacts, 6 cities, 3 states)
    pub fn expanded() -> Self {
        let mut builder = Self::new();
        builder.config.caps = ResultCaps {
            contacts: MAX_CONTACT_RESULTS,
            cities: MAX_CITY_RESULTS,
            states: MAX_STATE_RESULTS,
        };
        builder
    }

    /// Set the debounce interval between the last keystroke and evaluation
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    /// Set the "near X" radius in miles
    pub fn proximity_radius(mut self, miles: f64) -> Self {
        self.config.proximity_radius_miles = miles.max(0.0);
        self
    }

    /// Set the shortest query that may be sent to the geocoder
    pub fn min_geocode_query_len(mut self, len: usize) -> Self {
        self.config.min_geocode_query_len = len;
        self
    }

    /// Set how few local matches count as scarce
    pub fn scarce_threshold(mut self, threshold: usize) -> Self {
        self.config.scarce_threshold = threshold;
        self
    }

    /// Set custom section caps (each between 1 and its ceiling)
    pub fn custom_caps(
        mut self,
        contacts: usize,
        cities: usize,
        states: usize,
    ) -> Result<Self, WaymarkError> {
        self.config.caps = ResultCaps::new(contacts, cities, states)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
