//! Shared playback: one ruler drives media, position and pause state for
//! every connected session.
//!
//! ```text
//!   socket ──raw──► Coordinator::dispatch ──► Message::decode
//!                          │  (one lock)
//!                          ▼
//!                  Theater { sessions, ruler, playback }
//!                          │
//!                          ▼ announce(Audience)
//!                   session outboxes ──► socket writers
//! ```

pub mod broadcast;
pub mod message;
pub mod router;
pub mod theater;

pub use router::Coordinator;
pub use theater::Snapshot;
