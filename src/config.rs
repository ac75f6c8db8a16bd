//! Environment-driven configuration.
//!
//! Values come from the process environment after `.env` has been loaded
//! with `dotenvy`. Anything missing falls back to a default; anything present
//! but unparseable is a startup error.

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::{AppErr, AppResult};

/// Sizes that shape every room actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Events kept for late subscribers.
    pub archive_size: usize,
    /// Per-subscriber queue; a full queue evicts the subscriber.
    pub queue_size: usize,
    /// Pending operations a room accepts before callers wait.
    pub mailbox_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { archive_size: 10, queue_size: 10, mailbox_size: 10 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub room: RoomConfig,
    /// Bounded outbox per playback session.
    pub outbox_size: usize,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let rooms = RoomConfig::default();
        let room = RoomConfig {
            archive_size: parse_or(&get, "ROOM_ARCHIVE_SIZE", rooms.archive_size)?,
            queue_size: parse_or(&get, "ROOM_QUEUE_SIZE", rooms.queue_size)?,
            mailbox_size: parse_or(&get, "ROOM_MAILBOX_SIZE", rooms.mailbox_size)?,
        };
        if room.queue_size == 0 || room.mailbox_size == 0 {
            return Err(AppErr::Config("room queue and mailbox sizes must be at least 1".into()));
        }

        let outbox_size = parse_or(&get, "SESSION_OUTBOX_SIZE", 64usize)?;
        if outbox_size == 0 {
            return Err(AppErr::Config("SESSION_OUTBOX_SIZE must be at least 1".into()));
        }

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 10000)))?,
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|| "static".into()),
            room,
            outbox_size,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppErr::Config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:10000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.static_dir, PathBuf::from("static"));
        assert_eq!(cfg.room, RoomConfig::default());
        assert_eq!(cfg.outbox_size, 64);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("STATIC_DIR", "/var/lib/theater/frontend"),
            ("ROOM_ARCHIVE_SIZE", "25"),
            ("ROOM_QUEUE_SIZE", " 4 "),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.static_dir, PathBuf::from("/var/lib/theater/frontend"));
        assert_eq!(cfg.room.archive_size, 25);
        assert_eq!(cfg.room.queue_size, 4);
        assert_eq!(cfg.room.mailbox_size, 10);
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("ROOM_ARCHIVE_SIZE", "ten")])).unwrap_err();
        assert!(matches!(err, AppErr::Config(m) if m.contains("ROOM_ARCHIVE_SIZE")));
    }

    #[test]
    fn zero_sized_queues_are_rejected() {
        let err = Config::from_lookup(lookup(&[("ROOM_QUEUE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, AppErr::Config(_)));
    }
}
