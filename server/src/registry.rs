//! Process-wide catalogue of rooms
//!
//! Rooms are only ever added. Creation takes the write lock for the whole
//! check-then-insert; lookups share the read lock.

use crate::error::GameError;
use crate::room::Room;
use log::info;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct RoomRegistry {
    // creation order
    rooms: RwLock<Vec<Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new idle room, failing if the name is taken.
    pub async fn create_room(&self, name: &str) -> Result<Arc<Room>, GameError> {
        let mut rooms = self.rooms.write().await;

        if rooms.iter().any(|room| room.name() == name) {
            return Err(GameError::RoomNameTaken(name.to_string()));
        }

        let room = Arc::new(Room::new(name));
        rooms.push(Arc::clone(&room));
        info!("Created room {} ({} rooms total)", name, rooms.len());

        Ok(room)
    }

    pub async fn find_room(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms
            .read()
            .await
            .iter()
            .find(|room| room.name() == name)
            .cloned()
    }

    /// Room names in creation order
    pub async fn list_names(&self) -> Vec<String> {
        self.rooms
            .read()
            .await
            .iter()
            .map(|room| room.name().to_string())
            .collect()
    }

    pub async fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
