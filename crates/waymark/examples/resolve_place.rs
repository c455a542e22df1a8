//! Resolving place names to coordinates
//!
//! This example demonstrates:
//! - Using Mapbox when `MAPBOX_ACCESS_TOKEN` is set, or an offline gazetteer otherwise
//! - Region-restricted search widening to a global search
//! - Cached repeat lookups
//!
//! Run with: `cargo run --example resolve_place -- Reno Texas Atlantis`

use std::sync::Arc;

use waymark::{
    GazetteerEntry, GeocodeResolver, GeocodingProvider, MapboxProvider, PlaceType, ResolverConfig,
    Scope, StaticGazetteer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    waymark::init_logging(tracing::Level::INFO)?;

    let config = ResolverConfig::default();
    let provider: Arc<dyn GeocodingProvider> = match MapboxProvider::from_env(config.request_timeout) {
        Ok(mapbox) => Arc::new(mapbox),
        Err(e) => {
            println!("{e}; using the offline gazetteer");
            Arc::new(offline_gazetteer())
        }
    };
    let resolver = GeocodeResolver::new(provider, config);

    let mut queries: Vec<String> = std::env::args().skip(1).collect();
    if queries.is_empty() {
        queries = vec!["Reno".into(), "Texas".into(), "Paris".into(), "Atlantis".into()];
    }

    for query in &queries {
        match resolver.resolve(query, Scope::RegionRestricted).await {
            Ok(place) => println!(
                "{query:>10} -> {} ({:.4}, {:.4}) via {} search",
                place.name, place.coordinates.latitude, place.coordinates.longitude, place.resolved_in
            ),
            Err(e) if e.is_not_found() => println!("{query:>10} -> no such place"),
            Err(e) => println!("{query:>10} -> try again later ({e})"),
        }
    }

    // Second pass is served from the resolver's cache
    for query in &queries {
        if let Some(place) = resolver.cached(query) {
            println!("cached: {query} -> {}", place.name);
        }
    }
    println!("{} places cached", resolver.cached_count());

    Ok(())
}

fn offline_gazetteer() -> StaticGazetteer {
    StaticGazetteer::new([
        GazetteerEntry::new("Reno", PlaceType::Place, "us", -119.8138, 39.5296),
        GazetteerEntry::new("Texas", PlaceType::Region, "us", -99.9018, 31.9686),
        GazetteerEntry::new("Paris", PlaceType::Place, "fr", 2.3522, 48.8566),
        GazetteerEntry::new("Toronto", PlaceType::Place, "ca", -79.3832, 43.6532),
    ])
}
