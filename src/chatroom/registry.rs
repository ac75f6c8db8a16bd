use std::collections::HashMap;

use tokio::sync::RwLock;

use super::room::{Room, Shutdown};
use crate::{
    config::RoomConfig,
    error::{not_found, AppErr, AppResult},
};

struct Entry {
    room: Room,
    stop: Shutdown,
}

/// Name → running room. At most one actor per name.
///
/// Every mutation happens under the write lock, so a lookup sees either the
/// whole room or nothing.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Entry>>,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self { rooms: RwLock::new(HashMap::new()), config }
    }

    pub async fn create(&self, name: &str) -> AppResult<Room> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(name) {
            return Err(AppErr::AlreadyExists(format!("room {name}")));
        }

        let (room, stop) = Room::spawn(name, self.config);
        rooms.insert(name.to_owned(), Entry { room: room.clone(), stop });
        tracing::info!(room = %name, total = rooms.len(), "room created");
        Ok(room)
    }

    pub async fn get(&self, name: &str) -> AppResult<Room> {
        self.rooms
            .read()
            .await
            .get(name)
            .map(|e| e.room.clone())
            .ok_or_else(|| not_found(format!("room {name}")))
    }

    /// Unregister the room and stop its actor right away.
    pub async fn delete(&self, name: &str) -> AppResult<Room> {
        let entry = self
            .rooms
            .write()
            .await
            .remove(name)
            .ok_or_else(|| not_found(format!("room {name}")))?;

        entry.stop.trigger();
        tracing::info!(room = %name, "room deleted");
        Ok(entry.room)
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
