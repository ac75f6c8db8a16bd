//! In-memory stand-in for an upgraded websocket, so the socket loops can be
//! driven without a listener.

use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{sink, stream, Sink, Stream};
use serde_json::Value;
use tokio::{sync::mpsc, time::timeout};

/// The browser end of a [`socket`].
pub struct Client {
    typed: Option<mpsc::Sender<Message>>,
    seen: mpsc::Receiver<Message>,
}

/// Returns the client end plus the sink/stream pair a handler would get from
/// `WebSocket::split`.
pub fn socket() -> (
    Client,
    impl Sink<Message> + Send + Unpin + 'static,
    impl Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
) {
    let (typed_tx, typed_rx) = mpsc::channel::<Message>(16);
    let (seen_tx, seen_rx) = mpsc::channel::<Message>(64);

    let sink = Box::pin(sink::unfold(seen_tx, |tx, msg: Message| async move {
        tx.send(msg).await?;
        Ok::<_, mpsc::error::SendError<Message>>(tx)
    }));
    let stream = Box::pin(stream::unfold(typed_rx, |mut rx| async move {
        rx.recv().await.map(|msg| (Ok::<_, axum::Error>(msg), rx))
    }));

    (Client { typed: Some(typed_tx), seen: seen_rx }, sink, stream)
}

impl Client {
    pub async fn type_text(&self, text: &str) {
        let typed = self.typed.as_ref().expect("already hung up");
        typed.send(Message::Text(text.to_owned())).await.expect("handler gone");
    }

    pub async fn send_close(&self) {
        let typed = self.typed.as_ref().expect("already hung up");
        typed.send(Message::Close(None)).await.expect("handler gone");
    }

    /// Ends the inbound stream, like a browser closing the tab.
    pub fn hang_up(&mut self) {
        self.typed = None;
    }

    /// Next text frame as JSON, or `None` once the handler dropped its end.
    pub async fn next_json(&mut self) -> Option<Value> {
        loop {
            let msg = timeout(Duration::from_secs(1), self.seen.recv()).await.expect("no frame")?;
            if let Message::Text(text) = msg {
                return Some(serde_json::from_str(&text).unwrap());
            }
        }
    }
}
