//! Waymark - location resolution and viewport reconciliation for a map-centric
//! contact manager.
//!
//! Waymark turns free-text city, state and contact queries into map coordinates
//! and keeps a contact list in step with the markers visible on a panning,
//! zooming map.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use waymark::data::{TestDataConfig, sample_contacts};
//! use waymark::{
//!     GazetteerEntry, GeocodeResolver, PlaceType, ResolverConfig, Scope, SearchSession,
//!     SessionConfigBuilder, StaticGazetteer,
//! };
//!
//! # tokio::runtime::Runtime::new()?.block_on(async {
//! let provider = StaticGazetteer::new([GazetteerEntry::new(
//!     "Reno", PlaceType::Place, "us", -119.8138, 39.5296,
//! )]);
//! let resolver = Arc::new(GeocodeResolver::new(Arc::new(provider), ResolverConfig::default()));
//!
//! // Resolve a place directly
//! let reno = resolver.resolve("reno", Scope::RegionRestricted).await?;
//! println!("{} at {:?}", reno.name, reno.coordinates);
//!
//! // Or search interactively
//! let mut session = SearchSession::new(
//!     SessionConfigBuilder::compact().build(),
//!     resolver,
//!     sample_contacts(&TestDataConfig::sample()),
//! );
//! session.open();
//! if let Some(results) = session.search("austn").await {
//!     for city in &results.cities {
//!         println!("City: {city}");
//!     }
//! }
//! # Ok::<(), waymark::error::WaymarkError>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Components
//!
//! - **Geocode resolution**: cache, contact-derived places, then a provider with
//!   a country allow-list, widening once to a worldwide search
//! - **Proximity**: "near X" suggestions around a resolved place
//! - **Fuzzy matching**: substring-or-subsequence matching that tolerates typos
//! - **Search session**: debounced query-as-you-type with sectioned results and
//!   keyboard navigation
//! - **Viewport reconciliation**: visible-first contact ordering driven by the
//!   map's settled bounds
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
pub mod distance;
pub mod error;
mod events;
pub mod fuzzy;
mod geocode;
pub mod map;
mod proximity;
mod selection;
pub mod session;
mod viewport;

pub use config::{
    DEFAULT_DEBOUNCE, DEFAULT_RADIUS_MILES, DEFAULT_REQUEST_TIMEOUT, MAX_CITY_RESULTS,
    MAX_CONTACT_RESULTS, MAX_STATE_RESULTS, ResolverConfig, ResultCaps, SessionConfig,
    SessionConfigBuilder, WaymarkConfig,
};
pub use distance::distance_miles;
pub use events::UiEvent;
pub use fuzzy::matches;
pub use geocode::{
    GazetteerEntry, GeocodeError, GeocodeResolver, GeocodedLocation, GeocodingProvider,
    MAPBOX_GEOCODING_URL, MAPBOX_TOKEN_ENV, MapboxProvider, PlaceQuery, PlaceType, ProviderError,
    ProviderMatch, Scope, StaticGazetteer, normalize,
};
pub use map::{MapController, MapSurface, MarkerHandle};
pub use proximity::{NearbyPlace, nearby};
pub use selection::{Highlight, SelectionState};
pub use session::{
    Key, Phase, PlaceHit, PlaceKind, SearchResult, SearchSession, SessionInput, run_session,
};
pub use viewport::{ListedContact, ViewportBounds, ViewportReconciler, ordered_contact_list};
pub use waymark_data as data;
pub use waymark_data::{Contact, ContactId, Coordinates};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Waymark library.
///
/// Installs a `tracing` fmt subscriber once per process. `RUST_LOG` takes
/// precedence over `level` when set.
///
/// # Examples
///
/// ```rust
/// use waymark::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), waymark::error::WaymarkError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::WaymarkError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?)
            .add_directive("polars=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}
