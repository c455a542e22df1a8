//! Event loop that feeds a [`SearchSession`] from a channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};
use waymark_data::Contact;

use super::{EvaluationOutcome, Key, SearchSession, Ticket};
use crate::events::UiEvent;

/// Input from the UI layer.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// The global search hotkey.
    Open,
    /// The full text of the search box after a keystroke.
    Text(String),
    Key(Key),
    Close,
    ContactsChanged(Arc<[Contact]>),
}

/// Run `session` until `inputs` is closed and no evaluation is pending.
///
/// Keystrokes are debounced by the session's configured interval; only the last
/// query in a burst is evaluated. Evaluations run on a spawned task so input
/// keeps flowing while a geocode is in flight; a superseded task is aborted.
/// Activations are sent on `events`. Returns the session for inspection.
pub async fn run_session(
    mut session: SearchSession,
    mut inputs: mpsc::Receiver<SessionInput>,
    events: mpsc::UnboundedSender<UiEvent>,
) -> SearchSession {
    let debounce = session.config().debounce;
    let mut pending: Option<(Ticket, Instant)> = None;
    let mut in_flight: Option<JoinHandle<EvaluationOutcome>> = None;
    let mut inputs_open = true;

    loop {
        if !inputs_open && pending.is_none() && in_flight.is_none() {
            break;
        }
        let deadline = pending.as_ref().map_or_else(Instant::now, |(_, at)| *at);

        tokio::select! {
            input = inputs.recv(), if inputs_open => {
                let Some(input) = input else {
                    debug!("Session input closed");
                    inputs_open = false;
                    continue;
                };
                match input {
                    SessionInput::Open => {
                        session.open();
                        pending = None;
                        abort(&mut in_flight);
                    }
                    SessionInput::Text(text) => {
                        if let Some(ticket) = session.input(text) {
                            pending = Some((ticket, Instant::now() + debounce));
                            abort(&mut in_flight);
                        }
                    }
                    SessionInput::Key(key) => {
                        if let Some(event) = session.key(key)
                            && events.send(event).is_err()
                        {
                            debug!("UI event receiver dropped");
                        }
                        if !session.is_open() {
                            pending = None;
                            abort(&mut in_flight);
                        }
                    }
                    SessionInput::Close => {
                        session.close();
                        pending = None;
                        abort(&mut in_flight);
                    }
                    SessionInput::ContactsChanged(contacts) => session.set_contacts(contacts),
                }
            }
            () = sleep_until(deadline), if pending.is_some() => {
                if let Some((ticket, _)) = pending.take()
                    && let Some(job) = session.begin_evaluation(&ticket)
                {
                    debug!(query = ticket.query(), "Debounce elapsed, evaluating");
                    abort(&mut in_flight);
                    in_flight = Some(tokio::spawn(job.run()));
                }
            }
            outcome = join(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                match outcome {
                    Ok(outcome) => {
                        session.apply(outcome);
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(error = %e, "Evaluation task failed"),
                }
            }
        }
    }
    session
}

fn abort(in_flight: &mut Option<JoinHandle<EvaluationOutcome>>) {
    if let Some(handle) = in_flight.take() {
        handle.abort();
    }
}

async fn join(
    in_flight: &mut Option<JoinHandle<EvaluationOutcome>>,
) -> Result<EvaluationOutcome, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolverConfig, SessionConfig};
    use crate::geocode::{GazetteerEntry, GeocodeResolver, PlaceType, StaticGazetteer};
    use std::time::Duration;
    use waymark_data::{TestDataConfig, sample_contacts};

    fn start(
        gazetteer: Arc<StaticGazetteer>,
    ) -> (
        mpsc::Sender<SessionInput>,
        mpsc::UnboundedReceiver<UiEvent>,
        JoinHandle<SearchSession>,
    ) {
        let resolver = Arc::new(GeocodeResolver::new(gazetteer, ResolverConfig::default()));
        let session = SearchSession::new(
            SessionConfig::default(),
            resolver,
            sample_contacts(&TestDataConfig::sample()),
        );
        let (input_tx, input_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_session(session, input_rx, event_tx));
        (input_tx, event_rx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_evaluated_once() {
        let gazetteer = Arc::new(StaticGazetteer::default());
        let (tx, _events, handle) = start(gazetteer.clone());

        tx.send(SessionInput::Open).await.unwrap();
        for text in ["p", "pf", "pfl", "pflu"] {
            tx.send(SessionInput::Text(text.to_string())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        drop(tx);

        let session = handle.await.unwrap();
        assert_eq!(session.evaluations(), 1);
        let queried: Vec<_> = gazetteer.queries().into_iter().map(|q| q.text).collect();
        assert!(queried.iter().all(|q| q == "pflu"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_emits_event_after_results() {
        let gazetteer = Arc::new(StaticGazetteer::new([GazetteerEntry::new(
            "Tacoma",
            PlaceType::Place,
            "us",
            -122.4443,
            47.2529,
        )]));
        let (tx, mut events, handle) = start(gazetteer);

        tx.send(SessionInput::Open).await.unwrap();
        tx.send(SessionInput::Text("Perlman".to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        tx.send(SessionInput::Key(Key::Enter)).await.unwrap();
        drop(tx);

        let session = handle.await.unwrap();
        assert!(!session.is_open());
        match events.recv().await {
            Some(UiEvent::ContactSelected(contact)) => {
                assert_eq!(contact.last_name.as_deref(), Some("Perlman"));
            }
            other => panic!("expected a contact selection, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_drops_pending_query() {
        let gazetteer = Arc::new(StaticGazetteer::default());
        let (tx, _events, handle) = start(gazetteer.clone());

        tx.send(SessionInput::Open).await.unwrap();
        tx.send(SessionInput::Text("Atlantis".to_string())).await.unwrap();
        tx.send(SessionInput::Close).await.unwrap();
        drop(tx);

        let session = handle.await.unwrap();
        assert_eq!(session.evaluations(), 0);
        assert_eq!(gazetteer.calls(), 0);
    }
}
