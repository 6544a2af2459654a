use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::OrderEvent;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EventsQuery {
    pub token: Option<String>,
    /// Replays this many recent orders before live events.
    pub recent: Option<i64>,
}

fn to_event(event: &OrderEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().data(data).event("order_event")
}

// GET /api/orders/events
pub async fn order_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource cannot set headers, so the token rides in the query.
    if query.token.as_deref() != Some(state.config.admin_token.as_str()) {
        return Err(AppError::Unauthorized);
    }

    let mut recent = match query.recent.filter(|n| *n > 0) {
        Some(n) => {
            let db = state.db.lock().unwrap();
            queries::list_completed_orders(&db, n).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load recent orders for replay");
                Vec::new()
            })
        }
        None => Vec::new(),
    };
    recent.reverse();

    let rx = state.order_tx.subscribe();

    let replay = tokio_stream::iter(recent.into_iter().map(|order| {
        Ok::<_, Infallible>(to_event(&OrderEvent::Completed { order }))
    }));

    let live = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(to_event(&event))),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "order event subscriber lagged");
            None
        }
    });

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Ok(Sse::new(replay.chain(live).merge(keepalive)))
}
