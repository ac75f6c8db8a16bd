//! routes/theater.rs: shared playback socket
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::{
    error::AppErr,
    playback::Snapshot,
    state::{OutboxSize, Stage},
};

pub fn router() -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/theater", get(current_state))
}

async fn current_state(Extension(stage): Extension<Stage>) -> Json<Snapshot> {
    Json(stage.snapshot().await)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(stage): Extension<Stage>,
    Extension(OutboxSize(size)): Extension<OutboxSize>,
) -> impl IntoResponse {
    ws.on_upgrade(move |sock| session_ws(sock, stage, size))
}

async fn session_ws(sock: WebSocket, stage: Stage, outbox_size: usize) {
    let (sink, stream) = sock.split();
    session(sink, stream, stage, outbox_size).await;
}

async fn session<S, R, E>(mut sink: S, mut stream: R, stage: Stage, outbox_size: usize)
where
    S: Sink<Message> + Send + Unpin + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    let (outbox, mut pending) = mpsc::channel::<String>(outbox_size);
    let id = stage.connect(outbox).await;

    // Ends once the coordinator drops our outbox or the socket refuses a write.
    let writer = tokio::spawn(async move {
        while let Some(frame) = pending.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(raw) => {
                if let Err(e) = stage.dispatch(&id, &raw).await {
                    log_dropped(&id, &e);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    stage.disconnect(&id).await;
    let _ = writer.await;
}

fn log_dropped(id: &str, err: &AppErr) {
    match err {
        AppErr::Unauthorized(_) => tracing::warn!(session = %id, error = %err, "leader-only frame refused"),
        AppErr::MalformedPayload(_) | AppErr::UnknownKind(_) => {
            tracing::warn!(session = %id, error = %err, "unreadable frame dropped")
        }
        _ => tracing::warn!(session = %id, error = %err, "frame dropped"),
    }
}
