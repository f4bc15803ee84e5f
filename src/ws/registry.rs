use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use crate::models::RoomResponse;
use super::room::Room;

type RoomHandle = Arc<Mutex<Room>>;

/// Registry of live rooms.
///
/// Each room sits behind its own lock so rooms never contend with each other. The
/// registry map is only held long enough to look up or insert a handle, and is
/// never held while waiting on a room lock. The one nested acquisition is room then
/// map, used to unlink a room whose last participant just left.
///
/// A room is visible through [`RoomRegistry::get`] only while it has participants.
/// Once emptied it is marked closed and unlinked before its lock is released, so a
/// concurrent join that raced for the old handle retries against a fresh room.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub rooms: usize,
    pub participants: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the room, creating it first when the id is unknown.
    ///
    /// If `f` leaves the room without participants it is removed before this returns.
    pub fn get_or_create<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R {
        loop {
            let handle = {
                let mut rooms = lock(&self.rooms);
                rooms
                    .entry(room_id.to_string())
                    .or_insert_with(|| {
                        info!("Created room {}", room_id);
                        Arc::new(Mutex::new(Room::new(room_id)))
                    })
                    .clone()
            };

            let mut room = lock(&handle);
            if room.closed {
                debug!("Room {} closed while joining, retrying", room_id);
                continue;
            }
            let result = f(&mut room);
            self.unlink_if_empty(&handle, &mut room);
            return result;
        }
    }

    /// Runs `f` against an existing room. Returns `None` without calling `f` when the
    /// room is absent.
    pub fn get<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
        let handle = lock(&self.rooms).get(room_id).cloned()?;
        let mut room = lock(&handle);
        // A room still being populated by its first join is not yet observable.
        if room.closed || room.is_empty() {
            return None;
        }
        let result = f(&mut room);
        self.unlink_if_empty(&handle, &mut room);
        Some(result)
    }

    /// Removes the room if it has no participants. Returns whether it was removed.
    pub fn remove_if_empty(&self, room_id: &str) -> bool {
        let Some(handle) = lock(&self.rooms).get(room_id).cloned() else {
            return false;
        };
        let mut room = lock(&handle);
        if room.closed {
            return false;
        }
        self.unlink_if_empty(&handle, &mut room)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.get(room_id, |_| ()).is_some()
    }

    pub fn snapshot(&self, room_id: &str) -> Option<RoomResponse> {
        self.get(room_id, |room| room.snapshot())
    }

    /// Counts live rooms and their participants.
    pub fn stats(&self) -> RegistryStats {
        let handles: Vec<RoomHandle> = lock(&self.rooms).values().cloned().collect();
        handles.iter().fold(RegistryStats::default(), |mut stats, handle| {
            let room = lock(handle);
            if !room.closed && !room.is_empty() {
                stats.rooms += 1;
                stats.participants += room.participant_count();
            }
            stats
        })
    }

    fn unlink_if_empty(&self, handle: &RoomHandle, room: &mut Room) -> bool {
        if !room.is_empty() {
            return false;
        }
        room.closed = true;
        let mut rooms = lock(&self.rooms);
        if rooms.get(room.id()).is_some_and(|current| Arc::ptr_eq(current, handle)) {
            rooms.remove(room.id());
        }
        info!("Deleted empty room {}", room.id());
        true
    }
}
