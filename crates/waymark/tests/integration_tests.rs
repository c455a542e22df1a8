//! Integration tests for Waymark location resolution and search
//!
//! These run against the public API with an offline gazetteer standing in for the
//! geocoding provider, so they need no network access or tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use waymark::data::{TestDataConfig, create_test_contacts_csv, import_contacts_csv, sample_contacts};
use waymark::{
    Contact, Coordinates, GazetteerEntry, GeocodeResolver, PlaceKind, PlaceType, ResolverConfig,
    Scope, SearchSession, SessionConfig, SessionInput, StaticGazetteer, UiEvent, ViewportBounds,
    ordered_contact_list, run_session,
};

fn setup_test_env() {
    let _ = waymark::init_logging(tracing::Level::WARN);
}

fn gazetteer() -> Arc<StaticGazetteer> {
    Arc::new(StaticGazetteer::new([
        GazetteerEntry::new("Austin", PlaceType::Place, "us", -97.7431, 30.2672),
        GazetteerEntry::new("Reno", PlaceType::Place, "us", -119.8138, 39.5296),
        GazetteerEntry::new("Nevada", PlaceType::Region, "us", -116.4194, 38.8026),
        GazetteerEntry::new("Vancouver", PlaceType::Place, "ca", -123.1207, 49.2827),
    ]))
}

/// A deployment whose region-restricted searches only cover Canada.
fn canada_first(provider: Arc<StaticGazetteer>) -> Arc<GeocodeResolver> {
    Arc::new(GeocodeResolver::new(
        provider,
        ResolverConfig::default().with_countries(["ca"]),
    ))
}

#[tokio::test]
async fn test_typo_surfaces_contact_city() {
    setup_test_env();

    let austin = Contact::new("a-1")
        .with_name("Ada", "Lovelace")
        .with_city("Austin", "TX")
        .with_location(-97.7431, 30.2672);
    let resolver = Arc::new(GeocodeResolver::new(gazetteer(), ResolverConfig::default()));
    let mut session = SearchSession::new(SessionConfig::default(), resolver, vec![austin]);

    session.open();
    let results = session.search("austn").await.expect("current query is applied");

    assert_eq!(results.contacts.len(), 1);
    assert_eq!(results.contacts[0].id.as_str(), "a-1");
    assert_eq!(results.cities[0].name, "Austin");
    assert_eq!(results.cities[0].kind, PlaceKind::Match);
}

#[tokio::test]
async fn test_unknown_place_widens_to_global_with_no_neighbours() {
    setup_test_env();

    let provider = gazetteer();
    let resolver = canada_first(provider.clone());
    let mut session = SearchSession::new(
        SessionConfig::default(),
        resolver.clone(),
        sample_contacts(&TestDataConfig::sample()),
    );

    session.open();
    let results = session.search("Reno").await.expect("current query is applied");

    let queries = provider.queries();
    assert_eq!(queries.len(), 2, "restricted attempt, then one global attempt");
    assert_eq!(queries[0].countries.as_deref(), Some(&["ca".to_string()][..]));
    assert!(queries[1].countries.is_none());

    let anchor = results.anchor.as_ref().expect("Reno resolved");
    assert_eq!(anchor.resolved_in, Scope::Global);
    assert_eq!(anchor.coordinates, Coordinates::new(-119.8138, 39.5296));
    assert_eq!(results.cities.len(), 1);
    assert_eq!(results.cities[0].name, "Reno");
    assert_eq!(results.cities[0].kind, PlaceKind::Resolved);
    assert!(
        results
            .cities
            .iter()
            .all(|c| !matches!(c.kind, PlaceKind::Near { .. }))
    );
}

#[tokio::test]
async fn test_cache_idempotence() {
    setup_test_env();

    let provider = gazetteer();
    let resolver = GeocodeResolver::new(provider.clone(), ResolverConfig::default());

    let first = resolver.resolve("Vancouver", Scope::RegionRestricted).await.unwrap();
    let second = resolver.resolve("vancouver", Scope::RegionRestricted).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_widening_idempotence() {
    setup_test_env();

    let provider = gazetteer();
    let resolver = canada_first(provider.clone());

    let widened = resolver.resolve("Reno", Scope::RegionRestricted).await.unwrap();
    assert_eq!(widened.resolved_in, Scope::Global);
    assert_eq!(provider.calls(), 2);

    let again = resolver.resolve("Reno", Scope::RegionRestricted).await.unwrap();
    assert_eq!(again, widened);
    assert_eq!(provider.calls(), 2, "served from cache, no restricted retry");
}

#[test]
fn test_empty_viewport_falls_back_to_active_place() {
    setup_test_env();

    let contacts = vec![
        Contact::new("1").with_city("Houston", "TX"),
        Contact::new("2").with_city("North Austin", "TX"),
        Contact::new("3").with_city("Austin", "TX"),
        Contact::new("4").with_city("Boulder", "CO"),
        Contact::new("5").with_city("Austin", "TX"),
    ];
    let mut reconciler = waymark::ViewportReconciler::new();
    reconciler.set_contacts(contacts.clone());
    // Somewhere in the Atlantic.
    reconciler.on_bounds_changed(ViewportBounds::new(
        Coordinates::new(-40.0, 20.0),
        Coordinates::new(-30.0, 30.0),
    ));
    assert!(reconciler.visible_contacts().is_empty());

    let list = ordered_contact_list(&contacts, reconciler.visible_contacts(), Some("Austin"));
    let ids: Vec<_> = list.iter().map(|l| l.contact.id.as_str()).collect();
    assert_eq!(ids, ["3", "5", "2", "4", "1"]);
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_within_debounce_evaluate_once() {
    setup_test_env();

    let provider = gazetteer();
    let resolver = Arc::new(GeocodeResolver::new(provider.clone(), ResolverConfig::default()));
    let session = SearchSession::new(
        SessionConfig::default(),
        resolver,
        sample_contacts(&TestDataConfig::sample()),
    );
    let (tx, rx) = mpsc::channel(8);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(run_session(session, rx, events_tx));

    tx.send(SessionInput::Open).await.unwrap();
    tx.send(SessionInput::Text("Ren".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    tx.send(SessionInput::Text("Reno".to_string())).await.unwrap();
    drop(tx);

    let session = driver.await.unwrap();
    assert_eq!(session.evaluations(), 1);
    assert_eq!(session.query(), "Reno");
    assert_eq!(session.results().cities[0].name, "Reno");
    assert!(provider.queries().iter().all(|q| q.text == "Reno"));
}

#[tokio::test(start_paused = true)]
async fn test_place_activation_reaches_ui() {
    setup_test_env();

    let resolver = Arc::new(GeocodeResolver::new(gazetteer(), ResolverConfig::default()));
    let session = SearchSession::new(
        SessionConfig::default(),
        resolver,
        sample_contacts(&TestDataConfig::sample()),
    );
    let (tx, rx) = mpsc::channel(8);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(run_session(session, rx, events_tx));

    tx.send(SessionInput::Open).await.unwrap();
    tx.send(SessionInput::Text("Nevada".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    tx.send(SessionInput::Key(waymark::Key::Enter)).await.unwrap();
    drop(tx);
    driver.await.unwrap();

    assert_eq!(
        events_rx.recv().await,
        Some(UiEvent::PlaceSelected("Nevada".to_string()))
    );
}

#[tokio::test]
async fn test_imported_contacts_feed_the_session() {
    setup_test_env();

    let file = create_test_contacts_csv(&TestDataConfig::sample()).unwrap();
    let report = import_contacts_csv(file.path()).unwrap();
    assert_eq!(report.contacts.len(), 12);
    assert_eq!(report.geocoded_count(), 10);

    let provider = gazetteer();
    let resolver = Arc::new(GeocodeResolver::new(provider.clone(), ResolverConfig::default()));
    let mut session = SearchSession::new(SessionConfig::default(), resolver.clone(), report.contacts);
    session.open();

    let results = session.search("Tacoma").await.unwrap();
    assert_eq!(results.cities[0].name, "Tacoma");
    assert_eq!(provider.calls(), 0, "known city never reaches the provider");

    // Contact-derived places answer local-scope lookups without the network.
    let tacoma = resolver.resolve("Tacoma, WA", Scope::Local).await.unwrap();
    assert_eq!(tacoma.resolved_in, Scope::Local);
    assert_eq!(provider.calls(), 0);
}
