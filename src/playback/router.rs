use tokio::sync::Mutex;

use super::{
    broadcast::{Audience, Outbox},
    message::{Departure, Message, Pong, SetRuler, SERVER_ORIGIN},
    theater::{SessionId, Snapshot, Theater},
};
use crate::{
    error::{not_found, AppErr, AppResult},
    utils::clock,
};

/// Serialises every session, ruler and playback change behind one lock and
/// decides who hears about each of them.
#[derive(Default)]
pub struct Coordinator {
    theater: Mutex<Theater>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and tell everyone, the newcomer included, about it.
    pub async fn connect(&self, outbox: Outbox) -> SessionId {
        let mut theater = self.theater.lock().await;
        let id = theater.connect(outbox);

        let hello = Message::Connect(theater.connect_info(&id));
        theater.announce(Audience::Everyone, SERVER_ORIGIN, &hello);

        tracing::info!(session = %id, ruler = ?theater.ruler(), "session connected");
        id
    }

    /// Drop a session, announce it, and announce the new ruler if it left
    /// while ruling.
    pub async fn disconnect(&self, id: &str) {
        let mut theater = self.theater.lock().await;
        let Some(ruler_changed) = theater.disconnect(id) else {
            return;
        };

        let bye = Message::Disconnect(Departure { id: id.to_owned() });
        theater.announce(Audience::AllBut(id), SERVER_ORIGIN, &bye);

        if ruler_changed {
            if let Some(ruler) = theater.ruler() {
                let crowned = Message::SetRuler(SetRuler { new_ruler_id: ruler.to_owned() });
                theater.announce(Audience::AllBut(id), SERVER_ORIGIN, &crowned);
            }
        }
        tracing::info!(session = %id, ruler = ?theater.ruler(), ruler_changed, "session disconnected");
    }

    /// Apply one raw client frame from `sender`.
    ///
    /// Errors mean the frame was dropped; the caller logs them and keeps the
    /// socket open. Nothing is ever sent back for a rejected frame.
    pub async fn dispatch(&self, sender: &str, raw: &str) -> AppResult<()> {
        let received_at = clock::now_millis();
        let message = Message::decode(raw)?;

        let mut theater = self.theater.lock().await;
        if !theater.contains(sender) {
            return Err(not_found(format!("session {sender}")));
        }

        match &message {
            Message::SetRuler(hand) => {
                theater.hand_off(sender, &hand.new_ruler_id)?;
                tracing::info!(from = %sender, to = %hand.new_ruler_id, "ruler handed off");
            }
            Message::SetMedia(media) => theater.set_media(sender, &media.url)?,
            Message::Status(status) => {
                if let Some(name) = status.name.as_deref().filter(|n| !n.is_empty()) {
                    theater.set_name(sender, name);
                }
            }
            Message::PlaybackStatus(report) => {
                theater.report_playback(sender, report.playing, report.current_media_timestamp)?
            }
            Message::Ping(ping) => {
                let pong = Message::Pong(Pong { received_at, timestamp: ping.timestamp });
                theater.announce(Audience::Only(sender), SERVER_ORIGIN, &pong);
                return Ok(());
            }
            Message::Play => theater.play(),
            Message::Pause => theater.pause(),
            Message::Seek(seek) => theater.seek(seek.media_timestamp),
            Message::Pong(_) | Message::Connect(_) | Message::Disconnect(_) => {
                return Err(AppErr::UnknownKind(message.kind().to_owned()));
            }
        }

        let relayed = theater.announce(Audience::AllBut(sender), sender, &message);
        tracing::debug!(session = %sender, kind = message.kind(), relayed, "relayed");
        Ok(())
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.theater.lock().await.snapshot()
    }
}
