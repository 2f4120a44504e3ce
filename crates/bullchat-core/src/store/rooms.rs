use tracing::{info, warn};

use crate::constants::{DEFAULT_ROOM_DESCRIPTION, DEFAULT_ROOM_NAME};
use crate::error::{ChatError, ServiceError};
use crate::models::{dedup_by_name, Room, RoomId};
use crate::service::SharedService;

/// Ordered, name-deduplicated room set plus the active-room selector.
pub struct RoomDirectory {
    service: SharedService,
    rooms: Vec<Room>,
    active: Option<RoomId>,
    last_error: Option<String>,
}

impl RoomDirectory {
    pub fn new(service: SharedService) -> Self {
        Self {
            service,
            rooms: Vec::new(),
            active: None,
            last_error: None,
        }
    }

    /// Fetch the full room list (initial load and refresh).
    ///
    /// Duplicated names collapse to their first occurrence. An empty result
    /// bootstraps the default public room. If the previously active room is
    /// gone, the first room becomes active. On failure the current set is
    /// left as is, which is empty on the very first load.
    pub async fn load(&mut self) -> Result<(), ChatError> {
        let listed = match self.service.list_rooms().await {
            Ok(rooms) => rooms,
            Err(e) => return Err(self.fail(e)),
        };

        let total = listed.len();
        let mut rooms = dedup_by_name(listed);
        if rooms.len() < total {
            info!(total, distinct = rooms.len(), "collapsed duplicate room names");
        }

        if rooms.is_empty() {
            match self
                .service
                .create_room(DEFAULT_ROOM_NAME, DEFAULT_ROOM_DESCRIPTION, false)
                .await
            {
                Ok(room) => {
                    info!(room_id = room.id, "bootstrapped default room");
                    rooms.push(room);
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.active = match self.active {
            Some(id) if rooms.iter().any(|r| r.id == id) => Some(id),
            _ => rooms.first().map(|r| r.id),
        };
        self.rooms = rooms;
        self.last_error = None;
        Ok(())
    }

    /// Create a room explicitly. It joins the directory unless a room with
    /// the same name is already listed (first seen wins).
    pub async fn create_room(
        &mut self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ChatError> {
        let room = match self.service.create_room(name, description, is_private).await {
            Ok(room) => room,
            Err(e) => return Err(self.fail(e)),
        };

        if !self.rooms.iter().any(|r| r.name == room.name) {
            self.rooms.push(room.clone());
        }
        if self.active.is_none() {
            self.active = Some(room.id);
        }
        self.last_error = None;
        Ok(room)
    }

    /// Local selection only; no remote call.
    pub fn select(&mut self, room_id: RoomId) -> Result<&Room, ChatError> {
        let room = self
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .ok_or_else(|| ChatError::UnknownRoom(room_id.to_string()))?;
        self.active = Some(room.id);
        Ok(room)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    pub fn find(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn active_room(&self) -> Option<&Room> {
        self.active.and_then(|id| self.find(id))
    }

    pub fn active_room_id(&self) -> Option<RoomId> {
        self.active
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, err: ServiceError) -> ChatError {
        warn!(error = %err, "room directory call failed");
        let err = ChatError::Rooms(err);
        self.last_error = Some(err.to_string());
        err
    }
}
