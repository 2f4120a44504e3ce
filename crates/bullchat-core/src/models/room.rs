use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Identity;

pub type RoomId = u64;

/// A named channel. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub creator: Identity,
    pub is_private: bool,
    /// Nanoseconds since epoch
    pub created_at: u64,
}

/// Collapse rooms sharing a name, keeping the first one seen.
///
/// Purely cosmetic: duplicates stay on the server untouched.
pub fn dedup_by_name(rooms: Vec<Room>) -> Vec<Room> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rooms.len());
    rooms
        .into_iter()
        .filter(|room| seen.insert(room.name.clone()))
        .collect()
}
