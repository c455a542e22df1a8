//! Driving an interactive search session
//!
//! This example demonstrates:
//! - Importing contacts from CSV into a contact store
//! - Feeding keystrokes through the debounced session driver
//! - Receiving the activated item as a UI event
//! - Ordering the contact list around the map viewport

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use waymark::data::{
    ContactStore, InMemoryContactStore, TestDataConfig, create_test_contacts_csv,
    import_contacts_csv,
};
use waymark::{
    Coordinates, GazetteerEntry, GeocodeResolver, Key, PlaceType, ResolverConfig, SearchSession,
    SessionConfigBuilder, SessionInput, StaticGazetteer, ViewportBounds, ViewportReconciler,
    ordered_contact_list, run_session,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    waymark::init_logging(tracing::Level::INFO)?;

    let csv = create_test_contacts_csv(&TestDataConfig::sample())?;
    let report = import_contacts_csv(csv.path())?;
    println!(
        "Imported {} contacts ({} geocoded, {} warnings)",
        report.contacts.len(),
        report.geocoded_count(),
        report.warnings.len()
    );
    let store: InMemoryContactStore = report.contacts.into_iter().collect();
    let matching = store.contacts(Some("a"))?;
    println!("{} contacts live in a city containing 'a'", matching.len());
    let contacts = store.contacts(None)?;

    let provider = StaticGazetteer::new([GazetteerEntry::new(
        "Pflugerville",
        PlaceType::Place,
        "us",
        -97.6200,
        30.4394,
    )]);
    let resolver = Arc::new(GeocodeResolver::new(Arc::new(provider), ResolverConfig::default()));
    let config = SessionConfigBuilder::compact()
        .debounce(Duration::from_millis(200))
        .build();
    let session = SearchSession::new(config, resolver, contacts.clone());

    let (tx, rx) = mpsc::channel(16);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(run_session(session, rx, events_tx));

    // Type "pflugerville" one key at a time, faster than the debounce
    tx.send(SessionInput::Open).await?;
    let query = "pflugerville";
    for end in 1..=query.len() {
        tx.send(SessionInput::Text(query[..end].to_string())).await?;
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;
    tx.send(SessionInput::Key(Key::Enter)).await?;
    drop(tx);

    let session = driver.await?;
    println!("Evaluations run: {}", session.evaluations());
    while let Some(event) = events_rx.recv().await {
        println!("UI event: {event:?}");
    }

    // Pan the map over Puget Sound and list contacts visible-first
    let mut reconciler = ViewportReconciler::new();
    reconciler.set_contacts(contacts.clone());
    reconciler.on_bounds_changed(ViewportBounds::new(
        Coordinates::new(-123.0, 47.0),
        Coordinates::new(-122.0, 48.0),
    ));
    for listed in ordered_contact_list(&contacts, reconciler.visible_contacts(), None).iter().take(4) {
        let marker = if listed.in_viewport { "*" } else { " " };
        println!(
            "{marker} {} ({})",
            listed.contact.display_name(),
            listed.contact.city.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
