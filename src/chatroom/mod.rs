//! Named chat rooms with bounded history.
//!
//! A [`RoomRegistry`] maps names to running [`Room`] actors. Each room keeps
//! the last few [`Event`]s for late joiners and fans new ones out to its
//! [`Subscription`]s.

pub mod event;
pub mod registry;
pub mod room;

pub use event::Event;
pub use registry::RoomRegistry;
pub use room::{Room, Subscription};
