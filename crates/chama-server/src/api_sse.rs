//! SSE feed and display stream handlers.

use crate::display::{DisplayEvent, DisplaySession};
use crate::AppState;
use axum::{
    extract::Extension,
    response::{sse::Event, Sse},
};
use chama_calls::FeedProjector;
use futures_util::{stream, Stream};
use std::{convert::Infallible, sync::Arc};
use tokio_stream::StreamExt;

fn to_sse(event: &DisplayEvent) -> Option<Result<Event, Infallible>> {
    match serde_json::to_string(event) {
        Ok(data) => Some(Ok(Event::default().data(data))),
        Err(e) => {
            tracing::error!("failed to serialize display event: {}", e);
            None
        }
    }
}

/// Handler for `GET /events/feed`.
///
/// Streams the panel's recent calls as whole snapshots. Nothing is
/// announced on this stream.
pub async fn feed_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let feed = FeedProjector::subscribe(Some(&state.store), state.panel_limit);

    // The subscription lives inside the stream; dropping the stream on
    // disconnect releases it.
    let events = stream::unfold(feed, |mut feed| async move {
        let feed_state = feed.next().await?;
        Some((DisplayEvent::from(feed_state), feed))
    })
    .filter_map(|event| to_sse(&event));

    Sse::new(events).keep_alive(axum::response::sse::KeepAlive::default())
}

/// Handler for `GET /events/display`.
///
/// Starts a display session for this connection, with its own dedup
/// memory.
pub async fn display_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = DisplaySession::start(
        Some(&state.store),
        state.announcer.clone(),
        state.display_limit,
    );
    tracing::info!("display connected");

    let events = stream::unfold(session, |mut session| async move {
        let event = session.next().await?;
        Some((event, session))
    })
    .filter_map(|event| to_sse(&event));

    Sse::new(events).keep_alive(axum::response::sse::KeepAlive::default())
}
