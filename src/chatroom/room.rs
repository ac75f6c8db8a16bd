//! Per-room actor.
//!
//! Every room is one tokio task that owns the archive and the subscriber
//! list. Callers never touch that state; they talk to the task through a
//! bounded mailbox of [`Op`]s, and anything that needs an answer carries a
//! `oneshot` for the reply. Because only the task mutates the room, all
//! subscribe/publish/unsubscribe calls are linearised without a lock.
//!
//! ```text
//!   Room (handle) ──Op──► mailbox ──► RoomActor { archive, subscribers }
//!                                         │ try_send (never waits)
//!                         ┌───────────────┼───────────────┐
//!                         ▼               ▼               ▼
//!                   Subscription    Subscription    Subscription
//! ```
//!
//! Delivery uses `try_send` into a bounded queue per subscriber. A subscriber
//! whose queue is full when an event arrives is evicted: its sender is
//! dropped, it can still read what was queued, and then `recv` yields `None`.

use std::{collections::VecDeque, fmt, sync::Arc};

use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

use super::event::{Event, EventKind};
use crate::{
    config::RoomConfig,
    error::{not_found, AppResult},
};

enum Op {
    Subscribe(oneshot::Sender<Grant>),
    Publish(Event),
    Unsubscribe { id: u64, done: oneshot::Sender<()> },
}

struct Grant {
    id: u64,
    archive: Vec<Event>,
    events: mpsc::Receiver<Event>,
}

/// Cheap, cloneable handle to a running room.
#[derive(Clone)]
pub struct Room {
    name: Arc<str>,
    ops: mpsc::Sender<Op>,
}

/// Stops a room actor when triggered or dropped.
pub(crate) struct Shutdown(oneshot::Sender<()>);

impl Shutdown {
    pub(crate) fn trigger(self) {
        let _ = self.0.send(());
    }
}

impl Room {
    /// Start the actor for `name`. The room runs until the returned
    /// [`Shutdown`] is triggered (or dropped) or every handle is gone.
    pub(crate) fn spawn(name: &str, config: RoomConfig) -> (Room, Shutdown) {
        let (ops_tx, ops_rx) = mpsc::channel(config.mailbox_size);
        let (stop_tx, stop_rx) = oneshot::channel();

        let actor = RoomActor {
            name: name.into(),
            config,
            archive: VecDeque::with_capacity(config.archive_size),
            subscribers: Vec::new(),
            next_id: 0,
        };
        tokio::spawn(actor.run(ops_rx, stop_rx));

        (Room { name: name.into(), ops: ops_tx }, Shutdown(stop_tx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a new subscriber. The returned archive holds every event
    /// published before the subscription existed; the live channel holds
    /// every event after it.
    pub async fn subscribe(&self) -> AppResult<Subscription> {
        let (tx, rx) = oneshot::channel();
        self.ops.send(Op::Subscribe(tx)).await.map_err(|_| self.gone())?;
        let grant = rx.await.map_err(|_| self.gone())?;

        Ok(Subscription {
            id: grant.id,
            archive: grant.archive,
            events: grant.events,
            room: self.clone(),
        })
    }

    pub async fn publish(&self, event: Event) -> AppResult<()> {
        self.ops.send(Op::Publish(event)).await.map_err(|_| self.gone())
    }

    pub async fn join(&self, user: &str) -> AppResult<()> {
        self.publish(Event::now(EventKind::Join, user, "")).await
    }

    pub async fn say(&self, user: &str, text: &str) -> AppResult<()> {
        self.publish(Event::now(EventKind::Message, user, text)).await
    }

    pub async fn leave(&self, user: &str) -> AppResult<()> {
        self.publish(Event::now(EventKind::Leave, user, "")).await
    }

    pub async fn command(&self, user: &str, command: &str) -> AppResult<()> {
        self.publish(Event::now(EventKind::Command, user, command)).await
    }

    fn gone(&self) -> crate::error::AppErr {
        not_found(format!("room {}", self.name))
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room").field("name", &self.name).finish()
    }
}

/// A live view of one room: the archive at subscribe time plus every event
/// after it.
pub struct Subscription {
    id: u64,
    archive: Vec<Event>,
    events: mpsc::Receiver<Event>,
    room: Room,
}

impl Subscription {
    /// Events published before this subscription, oldest first.
    pub fn archive(&self) -> &[Event] {
        &self.archive
    }

    /// Next live event. `None` once the room has shut down, the subscription
    /// was evicted for falling behind, or it was cancelled.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Leave the room. When this returns the actor holds no sender for this
    /// subscription and anything that was in flight has been drained.
    pub async fn cancel(mut self) {
        self.detach().await;
    }

    async fn detach(&mut self) {
        let (done_tx, done_rx) = oneshot::channel();
        let op = Op::Unsubscribe { id: self.id, done: done_tx };
        if self.room.ops.send(op).await.is_ok() {
            // A dropped reply means the actor stopped, which also releases us.
            let _ = done_rx.await;
        }
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }
}

struct RoomActor {
    name: Arc<str>,
    config: RoomConfig,
    archive: VecDeque<Event>,
    /// Registration order is delivery order.
    subscribers: Vec<(u64, mpsc::Sender<Event>)>,
    next_id: u64,
}

impl RoomActor {
    async fn run(mut self, mut ops: mpsc::Receiver<Op>, mut stop: oneshot::Receiver<()>) {
        tracing::info!(room = %self.name, "room actor started");
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                op = ops.recv() => match op {
                    Some(op) => self.handle(op),
                    None => break,
                },
            }
        }

        // Refuse new work before releasing subscribers so nobody can slip in.
        ops.close();
        self.subscribers.clear();
        tracing::info!(room = %self.name, "room actor stopped");
    }

    fn handle(&mut self, op: Op) {
        match op {
            Op::Subscribe(reply) => {
                let (tx, rx) = mpsc::channel(self.config.queue_size);
                let id = self.next_id;
                self.next_id += 1;

                let grant = Grant { id, archive: self.archive.iter().cloned().collect(), events: rx };
                // Caller gave up waiting: don't register a receiver nobody holds.
                if reply.send(grant).is_ok() {
                    self.subscribers.push((id, tx));
                    tracing::debug!(room = %self.name, subscriber = id, "subscribed");
                }
            }
            Op::Publish(event) => self.publish(event),
            Op::Unsubscribe { id, done } => {
                self.subscribers.retain(|(sid, _)| *sid != id);
                tracing::debug!(room = %self.name, subscriber = id, "unsubscribed");
                let _ = done.send(());
            }
        }
    }

    fn publish(&mut self, event: Event) {
        let name = &self.name;
        self.subscribers.retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(room = %name, subscriber = *id, "subscriber queue full, evicting");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(room = %name, subscriber = *id, "subscriber dropped, pruning");
                false
            }
        });

        if self.config.archive_size == 0 {
            return;
        }
        while self.archive.len() >= self.config.archive_size {
            self.archive.pop_front();
        }
        self.archive.push_back(event);
    }
}
