use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::warn;

use super::AppState;
use super::auth::CurrentUser;

/// GET /events
/// Change notifications for the caller. Testers only see collections they
/// can read.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus().subscribe();
    let is_admin = ctx.is_admin();

    let stream = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !is_admin && !event.visible_to_testers() {
                        continue;
                    }
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().data(json)), rx));
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Client lagged by {} messages", count);

                    return Some((
                        Ok(Event::default().event("warning").data("Missed some events")),
                        rx,
                    ));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
