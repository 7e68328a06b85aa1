//! Room table: room id to its two participant slots.
//!
//! A room is created by the first [`RoomTable::join`] and removed by the
//! [`RoomTable::leave`] that empties its last slot, so a room is present
//! exactly when at least one slot is occupied.

use std::collections::HashMap;

use tracing::debug;

use crate::protocol::Role;
use crate::registry::ConnectionHandle;

/// The two slots of one room. Holds handles only, never connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Room {
    patient: Option<ConnectionHandle>,
    practitioner: Option<ConnectionHandle>,
}

impl Room {
    pub const fn slot(&self, role: Role) -> Option<&ConnectionHandle> {
        match role {
            Role::Patient => self.patient.as_ref(),
            Role::Practitioner => self.practitioner.as_ref(),
        }
    }

    const fn slot_mut(&mut self, role: Role) -> &mut Option<ConnectionHandle> {
        match role {
            Role::Patient => &mut self.patient,
            Role::Practitioner => &mut self.practitioner,
        }
    }

    pub const fn is_vacant(&self) -> bool {
        self.patient.is_none() && self.practitioner.is_none()
    }
}

/// Result of placing a handle into a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The slot was empty.
    Joined,
    /// A different connection held the slot and was displaced silently.
    Replaced { displaced: ConnectionHandle },
    /// The same connection already held the slot.
    AlreadyJoined,
}

#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, Room>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `handle` into `role`'s slot of `room_id`, creating the room if needed.
    pub fn join(&mut self, room_id: &str, role: Role, handle: ConnectionHandle) -> JoinOutcome {
        let room = self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            debug!(room_id, "Room created");
            Room::default()
        });
        let slot = room.slot_mut(role);
        match slot.replace(handle) {
            None => JoinOutcome::Joined,
            Some(prev) if slot.as_ref() == Some(&prev) => JoinOutcome::AlreadyJoined,
            Some(displaced) => JoinOutcome::Replaced { displaced },
        }
    }

    /// Occupant of the slot opposite `role`.
    pub fn peer_of(&self, room_id: &str, role: Role) -> Option<&ConnectionHandle> {
        self.occupant(room_id, role.opposite())
    }

    pub fn occupant(&self, room_id: &str, role: Role) -> Option<&ConnectionHandle> {
        self.rooms.get(room_id).and_then(|room| room.slot(role))
    }

    /// Clear `role`'s slot, dropping the room once both slots are empty.
    /// Returns the handle that held the slot.
    pub fn leave(&mut self, room_id: &str, role: Role) -> Option<ConnectionHandle> {
        let room = self.rooms.get_mut(room_id)?;
        let vacated = room.slot_mut(role).take();
        if room.is_vacant() {
            self.rooms.remove(room_id);
            debug!(room_id, "Room removed");
        }
        vacated
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Every occupied slot as `(room_id, role, handle)`.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (&str, Role, &ConnectionHandle)> {
        self.rooms.iter().flat_map(|(id, room)| {
            Role::ALL
                .into_iter()
                .filter_map(move |role| room.slot(role).map(|h| (id.as_str(), role, h)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> ConnectionHandle {
        ConnectionHandle::from(s)
    }

    #[test]
    fn first_join_creates_room() {
        let mut table = RoomTable::new();
        assert!(!table.contains("s1"));
        assert_eq!(table.join("s1", Role::Patient, h("a")), JoinOutcome::Joined);
        assert!(table.contains("s1"));
        assert_eq!(table.occupant("s1", Role::Patient), Some(&h("a")));
        assert_eq!(table.occupant("s1", Role::Practitioner), None);
    }

    #[test]
    fn peer_of_returns_other_slot() {
        let mut table = RoomTable::new();
        table.join("s1", Role::Patient, h("a"));
        assert_eq!(table.peer_of("s1", Role::Patient), None);

        table.join("s1", Role::Practitioner, h("b"));
        assert_eq!(table.peer_of("s1", Role::Patient), Some(&h("b")));
        assert_eq!(table.peer_of("s1", Role::Practitioner), Some(&h("a")));
        assert_eq!(table.peer_of("unknown", Role::Patient), None);
    }

    #[test]
    fn occupied_slot_is_replaced_silently() {
        let mut table = RoomTable::new();
        table.join("s1", Role::Patient, h("a"));
        assert_eq!(
            table.join("s1", Role::Patient, h("b")),
            JoinOutcome::Replaced { displaced: h("a") }
        );
        assert_eq!(table.occupant("s1", Role::Patient), Some(&h("b")));
    }

    #[test]
    fn rejoining_same_slot_is_a_noop() {
        let mut table = RoomTable::new();
        table.join("s1", Role::Patient, h("a"));
        assert_eq!(
            table.join("s1", Role::Patient, h("a")),
            JoinOutcome::AlreadyJoined
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn leave_removes_room_when_vacant() {
        let mut table = RoomTable::new();
        table.join("s1", Role::Patient, h("a"));
        table.join("s1", Role::Practitioner, h("b"));

        assert_eq!(table.leave("s1", Role::Patient), Some(h("a")));
        assert!(table.contains("s1"));

        assert_eq!(table.leave("s1", Role::Practitioner), Some(h("b")));
        assert!(!table.contains("s1"));
        assert!(table.is_empty());
    }

    #[test]
    fn leave_unknown_room_is_harmless() {
        let mut table = RoomTable::new();
        assert_eq!(table.leave("nope", Role::Patient), None);
        assert!(table.is_empty());
    }

    #[test]
    fn occupied_slots_lists_every_handle() {
        let mut table = RoomTable::new();
        table.join("s1", Role::Patient, h("a"));
        table.join("s1", Role::Practitioner, h("b"));
        table.join("s2", Role::Practitioner, h("c"));

        let mut slots: Vec<_> = table
            .occupied_slots()
            .map(|(r, role, h)| (r.to_string(), role, h.as_str().to_string()))
            .collect();
        slots.sort_by(|x, y| x.2.cmp(&y.2));
        assert_eq!(
            slots,
            vec![
                ("s1".to_string(), Role::Patient, "a".to_string()),
                ("s1".to_string(), Role::Practitioner, "b".to_string()),
                ("s2".to_string(), Role::Practitioner, "c".to_string()),
            ]
        );
        assert!(table.get("s2").is_some_and(|r| !r.is_vacant()));
    }
}
