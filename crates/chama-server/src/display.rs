//! Display sessions: one per connected television.
//!
//! A session follows the call feed, splits each snapshot into the current
//! call and its history, and runs every newly current call through its own
//! [`DedupGate`]. Admitted calls are announced one at a time, in the order
//! they were admitted, on a separate worker so a slow announcement never
//! holds back feed updates.
//!
//! Closing the handle (or dropping it, which is what happens when the SSE
//! client disconnects) stops the feed and the worker. Announcements still
//! in flight at that point are discarded.

use chama_announce::{Announcement, Announcer, DedupGate};
use chama_calls::{select_calls, CallSelection, CallStore, FeedProjector, FeedState, FeedSubscription};
use chama_types::CallRecord;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events buffered for a slow display before the session waits on it.
const DISPLAY_EVENT_BUFFER: usize = 32;

/// What a display receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// The current call and history, replacing whatever was shown.
    Feed(CallSelection),
    /// The feed is unavailable; show the idle screen.
    NoData,
    /// Speak or play this announcement.
    Announcement(Announcement),
    /// An announcement failed. The call is not retried.
    #[serde(rename_all = "camelCase")]
    Notice { call_id: String, message: String },
}

impl From<FeedState> for DisplayEvent {
    fn from(state: FeedState) -> Self {
        match state {
            FeedState::Snapshot(snapshot) => DisplayEvent::Feed(select_calls(snapshot)),
            FeedState::NoData => DisplayEvent::NoData,
        }
    }
}

/// Starts display sessions.
pub struct DisplaySession;

impl DisplaySession {
    /// Subscribes to the latest `limit` calls and starts announcing.
    pub fn start(store: Option<&CallStore>, announcer: Arc<Announcer>, limit: u32) -> DisplayHandle {
        let (events_tx, events_rx) = mpsc::channel(DISPLAY_EVENT_BUFFER);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        let feed = FeedProjector::subscribe(store, limit);
        let worker = tokio::spawn(announce_worker(announcer, queue_rx, events_tx.clone()));
        let driver = tokio::spawn(drive(feed, queue_tx, events_tx));

        tracing::debug!(limit, "display session started");
        DisplayHandle {
            events: events_rx,
            driver: Some(driver),
            worker: Some(worker),
        }
    }
}

async fn drive(
    mut feed: FeedSubscription,
    queue: mpsc::UnboundedSender<CallRecord>,
    events: mpsc::Sender<DisplayEvent>,
) {
    let mut gate = DedupGate::new();

    while let Some(state) = feed.next().await {
        let event = DisplayEvent::from(state);

        // The gate is consulted before anything is sent, so the ID is
        // marked before its announcement can start.
        let admitted = match &event {
            DisplayEvent::Feed(selection) if gate.admit(selection.current.as_ref()) => {
                selection.current.clone()
            }
            _ => None,
        };

        if events.send(event).await.is_err() {
            break;
        }

        if let Some(call) = admitted {
            if queue.send(call).is_err() {
                break;
            }
        }
    }

    tracing::debug!("display feed ended");
}

async fn announce_worker(
    announcer: Arc<Announcer>,
    mut queue: mpsc::UnboundedReceiver<CallRecord>,
    events: mpsc::Sender<DisplayEvent>,
) {
    while let Some(call) = queue.recv().await {
        let event = match announcer.announce(&call).await {
            Ok(announcement) => DisplayEvent::Announcement(announcement),
            Err(e) => {
                tracing::warn!(call_id = %call.id, error = %e, "announcement failed");
                DisplayEvent::Notice {
                    call_id: call.id.clone(),
                    message: e.notice().to_string(),
                }
            }
        };

        if events.send(event).await.is_err() {
            break;
        }
    }
}

/// A running display session.
#[derive(Debug)]
pub struct DisplayHandle {
    events: mpsc::Receiver<DisplayEvent>,
    driver: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl DisplayHandle {
    /// Waits for the next event. Returns `None` after [`close`](Self::close),
    /// or once the feed has ended and every queued announcement has finished.
    pub async fn next(&mut self) -> Option<DisplayEvent> {
        if self.driver.is_none() {
            return None;
        }
        self.events.recv().await
    }

    /// Stops the session. Safe to call more than once.
    pub fn close(&mut self) {
        let driver = self.driver.take();
        let worker = self.worker.take();
        if driver.is_none() && worker.is_none() {
            return;
        }
        if let Some(driver) = driver {
            driver.abort();
        }
        if let Some(worker) = worker {
            worker.abort();
        }
        self.events.close();
        tracing::debug!("display session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.driver.is_none()
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        self.close();
    }
}
