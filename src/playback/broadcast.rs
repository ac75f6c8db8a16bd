//! Fan-out to playback sessions.
//!
//! The coordinator decides *who* gets a frame; the socket writer task owns
//! *how* it reaches the wire. Each session has a bounded [`Outbox`] and
//! delivery never waits: a frame that does not fit is dropped for that
//! session only.

use tokio::sync::mpsc::{self, error::TrySendError};

pub type Outbox = mpsc::Sender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience<'a> {
    Everyone,
    AllBut(&'a str),
    Only(&'a str),
}

impl Audience<'_> {
    pub fn includes(&self, id: &str) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::AllBut(skip) => *skip != id,
            Audience::Only(target) => *target == id,
        }
    }
}

/// Push `frame` to every session in `audience`. Returns how many accepted it.
pub fn deliver<'a, I>(sessions: I, audience: Audience<'_>, frame: &str) -> usize
where
    I: IntoIterator<Item = (&'a str, &'a Outbox)>,
{
    let mut delivered = 0;
    for (id, outbox) in sessions {
        if !audience.includes(id) {
            continue;
        }
        match outbox.try_send(frame.to_owned()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session = %id, "outbox full, dropping frame");
            }
            // Socket already gone; its disconnect is on the way.
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(session = %id, "outbox closed");
            }
        }
    }
    delivered
}
