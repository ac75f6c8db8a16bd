//! The shared-playback record: who is connected, who rules, what is playing.
//!
//! The three pieces live in one struct behind the single lock in
//! [`Coordinator`](super::Coordinator). Every method here runs with that lock
//! held, so a ruler check and the mutation it guards see the same ruler.

use std::collections::HashMap;

use rand::seq::IteratorRandom;
use serde::Serialize;
use uuid::Uuid;

use super::{
    broadcast::{deliver, Audience, Outbox},
    message::{ConnectInfo, Frame, Message, SessionInfo},
};
use crate::error::{not_found, AppErr, AppResult};

pub type SessionId = String;

struct Session {
    name: Option<String>,
    outbox: Outbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    #[serde(rename = "mediaURL")]
    pub media_url: String,
    pub paused: bool,
    /// Milliseconds into the media.
    pub timestamp: i64,
}

impl Default for Playback {
    fn default() -> Self {
        Self { media_url: String::new(), paused: true, timestamp: 0 }
    }
}

/// Point-in-time copy of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub ruler: Option<SessionId>,
    pub playback: Playback,
    /// Sorted by id.
    pub sessions: Vec<SessionInfo>,
}

#[derive(Default)]
pub struct Theater {
    sessions: HashMap<SessionId, Session>,
    ruler: Option<SessionId>,
    playback: Playback,
}

impl Theater {
    /// Register a session. The first one in while nobody rules takes over.
    pub fn connect(&mut self, outbox: Outbox) -> SessionId {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), Session { name: None, outbox });
        if self.ruler.is_none() {
            self.ruler = Some(id.clone());
        }
        id
    }

    /// Remove a session. Returns `None` if it was unknown, otherwise whether
    /// the ruler changed. A departing ruler is replaced by any remaining
    /// session, or by nobody if the room is empty.
    pub fn disconnect(&mut self, id: &str) -> Option<bool> {
        self.sessions.remove(id)?;
        if self.ruler.as_deref() != Some(id) {
            return Some(false);
        }
        self.ruler = self.sessions.keys().choose(&mut rand::thread_rng()).cloned();
        Some(true)
    }

    pub fn set_name(&mut self, id: &str, name: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.name = Some(name.to_owned());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn ruler(&self) -> Option<&str> {
        self.ruler.as_deref()
    }

    /// Fails unless `id` rules right now.
    pub fn authorize(&self, id: &str) -> AppResult<()> {
        if self.ruler.as_deref() == Some(id) {
            Ok(())
        } else {
            Err(AppErr::Unauthorized(format!("session {id} is not the ruler")))
        }
    }

    pub fn hand_off(&mut self, from: &str, to: &str) -> AppResult<()> {
        self.authorize(from)?;
        if !self.contains(to) {
            return Err(not_found(format!("session {to}")));
        }
        self.ruler = Some(to.to_owned());
        Ok(())
    }

    pub fn set_media(&mut self, from: &str, url: &str) -> AppResult<()> {
        self.authorize(from)?;
        self.playback.media_url = url.to_owned();
        Ok(())
    }

    /// The ruler's authoritative report of where playback is.
    pub fn report_playback(&mut self, from: &str, playing: bool, timestamp: i64) -> AppResult<()> {
        self.authorize(from)?;
        self.playback.paused = !playing;
        self.playback.timestamp = timestamp;
        Ok(())
    }

    pub fn play(&mut self) {
        self.playback.paused = false;
    }

    pub fn pause(&mut self) {
        self.playback.paused = true;
    }

    pub fn seek(&mut self, timestamp: i64) {
        self.playback.paused = true;
        self.playback.timestamp = timestamp;
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|(id, s)| SessionInfo { id: id.clone(), name: s.name.clone() })
            .collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));

        Snapshot { ruler: self.ruler.clone(), playback: self.playback.clone(), sessions }
    }

    pub fn connect_info(&self, id: &str) -> ConnectInfo {
        let Snapshot { ruler, playback, sessions } = self.snapshot();
        ConnectInfo {
            id: id.to_owned(),
            current_ruler_id: ruler,
            current_media_url: playback.media_url,
            current_media_timestamp: playback.timestamp,
            current_media_paused: playback.paused,
            current_sessions: sessions,
        }
    }

    /// Encode once, then hand the frame to every session in `audience`.
    pub fn announce(&self, audience: Audience<'_>, origin: &str, message: &Message) -> usize {
        let frame = match (Frame { id: origin, message }).encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, kind = message.kind(), "could not encode frame");
                return 0;
            }
        };
        let outboxes = self.sessions.iter().map(|(id, s)| (id.as_str(), &s.outbox));
        deliver(outboxes, audience, &frame)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn outbox() -> Outbox {
        mpsc::channel(8).0
    }

    #[test]
    fn first_connect_rules_and_later_ones_do_not() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        let b = theater.connect(outbox());

        assert_eq!(theater.ruler(), Some(a.as_str()));
        assert_ne!(a, b);
    }

    #[test]
    fn ruler_leaving_promotes_a_remaining_session() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        let b = theater.connect(outbox());
        let c = theater.connect(outbox());

        assert_eq!(theater.disconnect(&a), Some(true));
        let ruler = theater.ruler().unwrap().to_owned();
        assert!(ruler == b || ruler == c);
        assert!(theater.contains(&ruler));
    }

    #[test]
    fn non_ruler_leaving_changes_nothing() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        let b = theater.connect(outbox());

        assert_eq!(theater.disconnect(&b), Some(false));
        assert_eq!(theater.ruler(), Some(a.as_str()));
        assert_eq!(theater.disconnect(&b), None);
    }

    #[test]
    fn last_one_out_clears_the_ruler_and_next_one_in_claims_it() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        assert_eq!(theater.disconnect(&a), Some(true));
        assert_eq!(theater.ruler(), None);

        let b = theater.connect(outbox());
        assert_eq!(theater.ruler(), Some(b.as_str()));
    }

    #[test]
    fn only_the_ruler_mutates_guarded_state() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        let b = theater.connect(outbox());

        assert!(matches!(theater.set_media(&b, "http://x/evil.mp4"), Err(AppErr::Unauthorized(_))));
        assert!(matches!(theater.report_playback(&b, true, 99), Err(AppErr::Unauthorized(_))));
        assert!(matches!(theater.hand_off(&b, &b), Err(AppErr::Unauthorized(_))));
        assert_eq!(theater.snapshot().playback, Playback::default());
        assert_eq!(theater.ruler(), Some(a.as_str()));

        theater.set_media(&a, "http://x/movie.mp4").unwrap();
        theater.report_playback(&a, true, 1500).unwrap();
        assert_eq!(
            theater.snapshot().playback,
            Playback { media_url: "http://x/movie.mp4".into(), paused: false, timestamp: 1500 }
        );

        theater.hand_off(&a, &b).unwrap();
        assert_eq!(theater.ruler(), Some(b.as_str()));
        assert!(theater.set_media(&a, "http://x/late.mp4").is_err());
    }

    #[test]
    fn hand_off_to_unknown_session_is_refused() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());

        assert!(matches!(theater.hand_off(&a, "ghost"), Err(AppErr::NotFound(_))));
        assert_eq!(theater.ruler(), Some(a.as_str()));
    }

    #[test]
    fn transport_controls_are_open_to_everyone() {
        let mut theater = Theater::default();
        theater.play();
        assert!(!theater.snapshot().playback.paused);
        theater.seek(4200);
        let Playback { paused, timestamp, .. } = theater.snapshot().playback;
        assert!(paused);
        assert_eq!(timestamp, 4200);
        theater.play();
        theater.pause();
        assert!(theater.snapshot().playback.paused);
    }

    #[test]
    fn names_are_set_only_for_known_sessions() {
        let mut theater = Theater::default();
        let a = theater.connect(outbox());
        theater.set_name(&a, "ann");
        theater.set_name("ghost", "boo");

        let snap = theater.snapshot();
        assert_eq!(snap.sessions, vec![SessionInfo { id: a.clone(), name: Some("ann".into()) }]);
        assert_eq!(snap.ruler, Some(a));
    }
}
