//! routes/ws.rs: chat socket for one room
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path, Query,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;

use crate::{
    chatroom::{Event, Room, Subscription},
    error::AppResult,
    state::Rooms,
};

#[derive(Deserialize)]
struct SocketQuery {
    user: Option<String>,
}

pub fn router() -> Router {
    Router::new().route("/:name/socket", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    Query(q): Query<SocketQuery>,
    Extension(rooms): Extension<Rooms>,
) -> AppResult<impl IntoResponse> {
    let room = rooms.get(&name).await?;
    let user = display_name(q.user);
    Ok(ws.on_upgrade(move |sock| user_ws(sock, room, user)))
}

/* ---------------- per user ---------------- */
async fn user_ws(sock: WebSocket, room: Room, user: String) {
    let (sink, stream) = sock.split();
    chat(sink, stream, room, user).await;
}

/// Subscribe, announce the user, pump until either side goes away, then
/// announce the departure and let go of the subscription.
async fn chat<S, R, E>(mut sink: S, mut stream: R, room: Room, user: String)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    let Ok(mut sub) = room.subscribe().await else { return };
    if room.join(&user).await.is_ok() {
        tracing::info!(room = %room.name(), user = %user, "joined");
        pump(&mut sink, &mut stream, &room, &user, &mut sub).await;
        let _ = room.leave(&user).await;
        tracing::info!(room = %room.name(), user = %user, "left");
    }
    sub.cancel().await;
    let _ = sink.close().await;
}

/// Archive first, then live events out and typed lines in.
async fn pump<S, R, E>(sink: &mut S, stream: &mut R, room: &Room, user: &str, sub: &mut Subscription)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    for event in sub.archive() {
        if !send_event(sink, event).await {
            return;
        }
    }

    loop {
        tokio::select! {
            event = sub.recv() => match event {
                Some(event) => {
                    if !send_event(sink, &event).await {
                        return;
                    }
                }
                // Room deleted, or we fell too far behind.
                None => return,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = publish_line(room, user, &text).await {
                        tracing::warn!(room = %room.name(), error = %e, "publish failed");
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// `/skip` becomes a `command` event with text `skip`; anything else is a
/// plain message.
async fn publish_line(room: &Room, user: &str, line: &str) -> AppResult<()> {
    match line.strip_prefix('/') {
        Some(command) => room.command(user, command).await,
        None => room.say(user, line).await,
    }
}

/// False once the socket stops taking frames.
async fn send_event<S: Sink<Message> + Unpin>(sink: &mut S, event: &Event) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => sink.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "event skipped");
            true
        }
    }
}

fn display_name(user: Option<String>) -> String {
    user.map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "anonymous".into())
}
