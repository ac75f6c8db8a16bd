use std::sync::Arc;

use crate::{chatroom::RoomRegistry, playback::Coordinator};

/* ------------ chat rooms ------------ */
pub type Rooms = Arc<RoomRegistry>;

/* ------------ shared playback -------------- */
pub type Stage = Arc<Coordinator>;

/// Capacity of each playback session's outbox.
#[derive(Clone, Copy, Debug)]
pub struct OutboxSize(pub usize);
