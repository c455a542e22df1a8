//! Query-as-you-type search session.
//!
//! The session is a plain state machine (`Closed -> Open -> (Typing ->
//! ResultsReady)* -> Closed`). Every keystroke bumps a generation counter and
//! yields a [`Ticket`]; once the debounce has passed, the ticket is exchanged for
//! an [`EvaluationJob`] that can run off the event loop. Its outcome is only
//! applied if its generation is still current, so a slow geocode for an old
//! query can never overwrite newer results.
//!
//! [`run_session`] drives all of this from channels with a tokio event loop.

mod cursor;
mod driver;
mod evaluate;

use std::sync::Arc;

use tracing::{debug, instrument};
use waymark_data::Contact;

use crate::config::SessionConfig;
use crate::events::UiEvent;
use crate::geocode::GeocodeResolver;
pub use cursor::{Cursor, Section};
pub use driver::{SessionInput, run_session};
pub use evaluate::{KnownCity, KnownPlaces, PlaceHit, PlaceKind, SearchResult, evaluate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Open,
    Typing,
    ResultsReady,
}

/// Keys the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
    /// A click outside the search panel.
    OutsideClick,
}

/// Handle for one keystroke's query; stale once another keystroke arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    query: String,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Everything needed to evaluate one query, detached from the session.
#[derive(Debug)]
pub struct EvaluationJob {
    generation: u64,
    query: String,
    contacts: Arc<[Contact]>,
    known: Arc<KnownPlaces>,
    resolver: Arc<GeocodeResolver>,
    config: SessionConfig,
}

impl EvaluationJob {
    pub async fn run(self) -> EvaluationOutcome {
        let result = evaluate(
            &self.query,
            &self.contacts,
            &self.known,
            &self.resolver,
            &self.config,
        )
        .await;
        EvaluationOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    generation: u64,
    result: SearchResult,
}

/// The item under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selected<'a> {
    Contact(&'a Contact),
    Place(Section, &'a PlaceHit),
}

#[derive(Debug)]
pub struct SearchSession {
    config: SessionConfig,
    resolver: Arc<GeocodeResolver>,
    contacts: Arc<[Contact]>,
    known: Arc<KnownPlaces>,
    phase: Phase,
    query: String,
    generation: u64,
    results: SearchResult,
    cursor: Cursor,
    evaluations: usize,
}

impl SearchSession {
    pub fn new(
        config: SessionConfig,
        resolver: Arc<GeocodeResolver>,
        contacts: impl Into<Arc<[Contact]>>,
    ) -> Self {
        let mut session = Self {
            config,
            resolver,
            contacts: Arc::from(Vec::new()),
            known: Arc::default(),
            phase: Phase::Closed,
            query: String::new(),
            generation: 0,
            results: SearchResult::default(),
            cursor: Cursor::default(),
            evaluations: 0,
        };
        session.set_contacts(contacts);
        session
    }

    /// Replace the contact collection. Also refreshes the resolver's local tier.
    pub fn set_contacts(&mut self, contacts: impl Into<Arc<[Contact]>>) {
        let contacts = contacts.into();
        self.known = Arc::new(KnownPlaces::from_contacts(&contacts));
        self.resolver.index_contacts(&contacts);
        debug!(contacts = contacts.len(), "Session contacts updated");
        self.contacts = contacts;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &SearchResult {
        &self.results
    }

    /// Evaluations started since the session was created.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Open (or reopen) the session with an empty query.
    pub fn open(&mut self) {
        self.reset();
        self.phase = Phase::Open;
        debug!("Search session opened");
    }

    /// Close without activating anything; in-flight evaluations become stale.
    pub fn close(&mut self) {
        self.reset();
        self.phase = Phase::Closed;
        debug!("Search session closed");
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.query.clear();
        self.results = SearchResult::default();
        self.cursor = Cursor::default();
    }

    /// Record a keystroke. Returns `None` when the session is closed.
    pub fn input(&mut self, text: impl Into<String>) -> Option<Ticket> {
        if !self.is_open() {
            return None;
        }
        self.generation += 1;
        self.query = text.into();
        self.phase = Phase::Typing;
        Some(Ticket {
            generation: self.generation,
            query: self.query.clone(),
        })
    }

    /// Exchange a ticket for an evaluation job, unless a newer keystroke superseded it.
    pub fn begin_evaluation(&mut self, ticket: &Ticket) -> Option<EvaluationJob> {
        if !self.is_open() || ticket.generation != self.generation {
            debug!(generation = ticket.generation, "Skipping superseded query");
            return None;
        }
        self.evaluations += 1;
        Some(EvaluationJob {
            generation: ticket.generation,
            query: ticket.query.clone(),
            contacts: Arc::clone(&self.contacts),
            known: Arc::clone(&self.known),
            resolver: Arc::clone(&self.resolver),
            config: self.config.clone(),
        })
    }

    /// Apply an evaluation outcome. Returns `false` (and changes nothing) if it is stale.
    #[instrument(skip_all, fields(generation = outcome.generation), level = "debug")]
    pub fn apply(&mut self, outcome: EvaluationOutcome) -> bool {
        if !self.is_open() || outcome.generation != self.generation {
            debug!(current = self.generation, "Discarding stale results");
            return false;
        }
        self.cursor = Cursor::for_result(&outcome.result);
        self.results = outcome.result;
        self.phase = Phase::ResultsReady;
        true
    }

    /// Debounce-free convenience: record `text` and evaluate it immediately.
    pub async fn search(&mut self, text: impl Into<String>) -> Option<&SearchResult> {
        let ticket = self.input(text)?;
        let job = self.begin_evaluation(&ticket)?;
        let outcome = job.run().await;
        self.apply(outcome).then_some(&self.results)
    }

    pub fn selected(&self) -> Option<Selected<'_>> {
        if self.phase != Phase::ResultsReady {
            return None;
        }
        let (section, idx) = self.cursor.location()?;
        match section {
            Section::Contacts => self.results.contacts.get(idx).map(Selected::Contact),
            Section::Cities => self.results.cities.get(idx).map(|p| Selected::Place(section, p)),
            Section::States => self.results.states.get(idx).map(|p| Selected::Place(section, p)),
        }
    }

    /// Handle a navigation key. Enter returns the event for the activated item.
    pub fn key(&mut self, key: Key) -> Option<UiEvent> {
        if !self.is_open() {
            return None;
        }
        match key {
            Key::Up if self.phase == Phase::ResultsReady => self.cursor.up(),
            Key::Down if self.phase == Phase::ResultsReady => self.cursor.down(),
            Key::Up | Key::Down => {}
            Key::Enter => {
                let event = match self.selected()? {
                    Selected::Contact(contact) => UiEvent::ContactSelected(contact.clone()),
                    Selected::Place(_, place) => UiEvent::PlaceSelected(place.name.clone()),
                };
                self.close();
                return Some(event);
            }
            Key::Escape | Key::OutsideClick => self.close(),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::geocode::StaticGazetteer;
    use waymark_data::{TestDataConfig, sample_contacts};

    fn session() -> SearchSession {
        let resolver = Arc::new(GeocodeResolver::new(
            Arc::new(StaticGazetteer::default()),
            ResolverConfig::default(),
        ));
        SearchSession::new(
            SessionConfig::default(),
            resolver,
            sample_contacts(&TestDataConfig::sample()),
        )
    }

    #[test]
    fn test_closed_session_ignores_input() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Closed);
        assert!(s.input("aus").is_none());
        assert!(s.key(Key::Enter).is_none());
    }

    #[test]
    fn test_newer_keystroke_supersedes_ticket() {
        let mut s = session();
        s.open();
        let first = s.input("aus").unwrap();
        let second = s.input("austin").unwrap();
        assert_eq!(s.phase(), Phase::Typing);
        assert!(s.begin_evaluation(&first).is_none());
        assert!(s.begin_evaluation(&second).is_some());
        assert_eq!(s.evaluations(), 1);
    }

    #[tokio::test]
    async fn test_stale_outcome_is_discarded() {
        let mut s = session();
        s.open();
        let ticket = s.input("seattle").unwrap();
        let job = s.begin_evaluation(&ticket).unwrap();
        s.input("tacoma");
        let outcome = job.run().await;
        assert!(!s.apply(outcome));
        assert!(s.results().is_empty());
        assert_eq!(s.phase(), Phase::Typing);
    }

    #[tokio::test]
    async fn test_close_invalidates_in_flight_job() {
        let mut s = session();
        s.open();
        let ticket = s.input("seattle").unwrap();
        let job = s.begin_evaluation(&ticket).unwrap();
        s.close();
        assert!(!s.apply(job.run().await));
        assert!(s.begin_evaluation(&ticket).is_none());
    }

    #[tokio::test]
    async fn test_enter_activates_and_closes() {
        let mut s = session();
        s.open();
        let result = s.search("Seattle").await.unwrap();
        assert_eq!(result.contacts[0].city.as_deref(), Some("Seattle"));

        // Contacts section first, then the city.
        s.key(Key::Down);
        let event = s.key(Key::Enter).unwrap();
        assert_eq!(event, UiEvent::PlaceSelected("Seattle".to_string()));
        assert_eq!(s.phase(), Phase::Closed);
        assert!(s.results().is_empty());
    }

    #[tokio::test]
    async fn test_enter_on_contact() {
        let mut s = session();
        s.open();
        s.search("Lovelace").await.unwrap();
        match s.key(Key::Enter) {
            Some(UiEvent::ContactSelected(contact)) => assert_eq!(contact.id.as_str(), "c-1"),
            other => panic!("expected a contact selection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_escape_closes_without_event() {
        let mut s = session();
        s.open();
        s.search("Seattle").await.unwrap();
        assert!(s.key(Key::Escape).is_none());
        assert!(!s.is_open());

        s.open();
        s.search("Seattle").await.unwrap();
        assert!(s.key(Key::OutsideClick).is_none());
        assert!(!s.is_open());
    }

    #[tokio::test]
    async fn test_open_clears_previous_state() {
        let mut s = session();
        s.open();
        s.search("Seattle").await.unwrap();
        s.open();
        assert_eq!(s.phase(), Phase::Open);
        assert_eq!(s.query(), "");
        assert!(s.selected().is_none());
    }
}
