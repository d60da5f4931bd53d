//! Doors at the ends of connectors

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ids::{ConnectorId, DoorId, IdAllocator, KeyId, NodeId};
use crate::rng::DungeonRng;

use super::corridor::Connector;
use super::rect::Point;

bitflags! {
    /// Door state flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DoorFlags: u8 {
        /// A toggleable door rather than an open gap
        const IS_DOOR = 0x01;
        const OPEN = 0x02;
        const LOCKED = 0x04;
    }
}

// Manual serde impl for DoorFlags
impl Serialize for DoorFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DoorFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(DoorFlags::from_bits_truncate(bits))
    }
}

/// A door (or open gap) at one end of a connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    pub id: DoorId,
    pub pos: Point,
    pub flags: DoorFlags,
    pub key_id: Option<KeyId>,
    /// Room the door opens into, if the end meets a room
    pub room: Option<NodeId>,
    pub corridor: ConnectorId,
}

impl Door {
    /// An open gap; [`assign_door_states`] decides the final state
    pub fn new(id: DoorId, pos: Point, room: Option<NodeId>, corridor: ConnectorId) -> Self {
        Self {
            id,
            pos,
            flags: DoorFlags::OPEN,
            key_id: None,
            room,
            corridor,
        }
    }

    pub fn is_door(&self) -> bool {
        self.flags.contains(DoorFlags::IS_DOOR)
    }

    pub fn is_open(&self) -> bool {
        self.flags.contains(DoorFlags::OPEN)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(DoorFlags::LOCKED)
    }

    pub fn set_open(&mut self, open: bool) {
        self.flags.set(DoorFlags::OPEN, open);
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.flags.set(DoorFlags::LOCKED, locked);
    }

    /// Unlock with a key. Returns false if the key does not fit.
    pub fn unlock(&mut self, key: KeyId) -> bool {
        if !self.is_locked() || self.key_id != Some(key) {
            return false;
        }
        self.set_locked(false);
        true
    }
}

/// Create the two doors of a connector and link them to it
pub fn synthesize_doors(connector: &mut Connector, ids: &mut IdAllocator) -> [Door; 2] {
    let positions = connector.door_positions();
    let doors = [0, 1].map(|end| {
        Door::new(
            ids.door(),
            positions[end],
            connector.end_rooms[end],
            connector.id,
        )
    });
    connector.doors = Some([doors[0].id, doors[1].id]);
    doors
}

/// Lock up to `max_locked` room-facing doors and settle the rest
///
/// Locked doors each get their own key. Other room-facing ends become open
/// gaps when `allow_passageways` is set, closed doors otherwise. Ends that
/// meet open corridor stay gaps.
pub fn assign_door_states(
    doors: &mut [Door],
    max_locked: u32,
    allow_passageways: bool,
    rng: &mut DungeonRng,
    ids: &mut IdAllocator,
) {
    let mut candidates: Vec<usize> = doors
        .iter()
        .enumerate()
        .filter(|(_, d)| d.room.is_some())
        .map(|(i, _)| i)
        .collect();
    rng.shuffle(&mut candidates);

    let locked = candidates.len().min(max_locked as usize);
    for &i in &candidates[..locked] {
        let door = &mut doors[i];
        door.flags = DoorFlags::IS_DOOR | DoorFlags::LOCKED;
        door.key_id = Some(ids.key());
        trace!(door = %door.id, key = ?door.key_id, "locked door");
    }

    if !allow_passageways {
        for &i in &candidates[locked..] {
            doors[i].flags = DoorFlags::IS_DOOR;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::corridor::RoomPair;
    use crate::dungeon::rect::{Orientation, Rect};

    fn connector(ids: &mut IdAllocator, end_rooms: [Option<NodeId>; 2]) -> Connector {
        Connector::new(
            ids.connector(),
            Rect::new(4, 10, 2, 2),
            Orientation::Horizontal,
            RoomPair::new(NodeId(1), NodeId(2)),
            end_rooms,
        )
    }

    #[test]
    fn test_synthesize_links_both_ends() {
        let mut ids = IdAllocator::new();
        let mut conn = connector(&mut ids, [Some(NodeId(1)), Some(NodeId(2))]);
        let doors = synthesize_doors(&mut conn, &mut ids);

        assert_eq!(conn.doors, Some([doors[0].id, doors[1].id]));
        assert_eq!(doors[0].pos, Point::new(5, 9));
        assert_eq!(doors[1].pos, Point::new(5, 12));
        assert_eq!(doors[0].room, Some(NodeId(1)));
        assert_eq!(doors[1].room, Some(NodeId(2)));
        assert!(doors.iter().all(|d| d.corridor == conn.id));
    }

    #[test]
    fn test_lock_budget_respected() {
        let mut ids = IdAllocator::new();
        let mut rng = DungeonRng::new(5);
        let mut doors = Vec::new();
        for _ in 0..5 {
            let mut conn = connector(&mut ids, [Some(NodeId(1)), Some(NodeId(2))]);
            doors.extend(synthesize_doors(&mut conn, &mut ids));
        }
        assign_door_states(&mut doors, 3, true, &mut rng, &mut ids);

        let locked: Vec<&Door> = doors.iter().filter(|d| d.is_locked()).collect();
        assert_eq!(locked.len(), 3);
        let mut keys: Vec<KeyId> = locked.iter().filter_map(|d| d.key_id).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3, "each locked door has its own key");
        assert!(locked.iter().all(|d| d.is_door() && !d.is_open()));
        assert!(
            doors
                .iter()
                .filter(|d| !d.is_locked())
                .all(|d| !d.is_door() && d.is_open())
        );
    }

    #[test]
    fn test_no_passageways_means_closed_doors() {
        let mut ids = IdAllocator::new();
        let mut rng = DungeonRng::new(5);
        let mut conn = connector(&mut ids, [Some(NodeId(1)), None]);
        let mut doors = synthesize_doors(&mut conn, &mut ids).to_vec();
        assign_door_states(&mut doors, 0, false, &mut rng, &mut ids);

        assert!(doors[0].is_door() && !doors[0].is_open() && !doors[0].is_locked());
        // The end without a room stays an open gap
        assert!(!doors[1].is_door() && doors[1].is_open());
    }

    #[test]
    fn test_unlock_needs_matching_key() {
        let mut ids = IdAllocator::new();
        let mut rng = DungeonRng::new(5);
        let mut conn = connector(&mut ids, [Some(NodeId(1)), None]);
        let mut doors = synthesize_doors(&mut conn, &mut ids).to_vec();
        assign_door_states(&mut doors, 4, true, &mut rng, &mut ids);

        let door = &mut doors[0];
        let key = door.key_id.unwrap();
        assert!(!door.unlock(key.next()));
        assert!(door.unlock(key));
        assert!(!door.is_locked());
        door.set_open(true);
        assert!(door.is_open());
    }

    #[test]
    fn test_flags_serialize_as_bits() {
        let flags = DoorFlags::IS_DOOR | DoorFlags::LOCKED;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "5");
        let back: DoorFlags = serde_json::from_str("5").unwrap();
        assert_eq!(back, flags);
    }
}
