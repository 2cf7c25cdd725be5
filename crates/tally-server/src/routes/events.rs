use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    response::sse::{Event as SseEvent, Sse},
};
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant},
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::state::AppState;

/// `GET /api/events`: live event stream.
///
/// Sends `: ping` on connect, `: heartbeat` on every heartbeat interval and
/// one `data:` frame per published event. A spawned task owns the broker
/// subscription; it ends when the client goes away or a frame cannot be
/// written, and dropping the subscription unregisters it.
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<ReceiverStream<Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(16);
    let mut subscription = state.broker.subscribe();
    let heartbeat = state.config.heartbeat_interval();
    debug!(subscriber = subscription.id(), "Event stream connected");

    tokio::spawn(async move {
        if tx.send(Ok(SseEvent::default().comment("ping"))).await.is_err() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        loop {
            let frame = tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => SseEvent::default().comment("heartbeat"),
                received = subscription.recv() => match received {
                    Some(event) => match SseEvent::default().json_data(event.as_ref()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "Failed to serialize event");
                            continue;
                        }
                    },
                    None => break,
                },
            };
            if tx.send(Ok(frame)).await.is_err() {
                break;
            }
        }
        debug!(subscriber = subscription.id(), "Event stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx))
}
