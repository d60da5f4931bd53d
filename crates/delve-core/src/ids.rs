//! Stable identifiers and the per-session allocator that hands them out
//!
//! Every cross-reference between generated structures (door to room, room to
//! staircase, room pairs to connectors) is one of these ids, never a pointer.

use serde::{Deserialize, Serialize};
use strum::Display;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);

            pub fn next(self) -> Self {
                $name(self.0 + 1)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Partition node id. Leaf node ids double as room ids.
    NodeId,
    "n"
);
define_id!(ConnectorId, "c");
define_id!(DoorId, "d");
define_id!(StaircaseId, "s");
define_id!(
    /// Key that opens a locked door. Placing the key item is up to the caller.
    KeyId,
    "k"
);

/// Rooms are leaves of the partition tree and share its ids
pub type RoomId = NodeId;

/// Kinds of id handed out by [`IdAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IdKind {
    Node,
    Connector,
    Door,
    Staircase,
    Key,
}

/// Per-session id counters
///
/// Owned by the world; ids start at 1 (0 is `NONE`) and only go back to 1
/// through [`IdAllocator::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next_node: NodeId,
    next_connector: ConnectorId,
    next_door: DoorId,
    next_staircase: StaircaseId,
    next_key: KeyId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_node: NodeId(1),
            next_connector: ConnectorId(1),
            next_door: DoorId(1),
            next_staircase: StaircaseId(1),
            next_key: KeyId(1),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn node(&mut self) -> NodeId {
        let id = self.next_node;
        self.next_node = id.next();
        id
    }

    pub fn connector(&mut self) -> ConnectorId {
        let id = self.next_connector;
        self.next_connector = id.next();
        id
    }

    pub fn door(&mut self) -> DoorId {
        let id = self.next_door;
        self.next_door = id.next();
        id
    }

    pub fn staircase(&mut self) -> StaircaseId {
        let id = self.next_staircase;
        self.next_staircase = id.next();
        id
    }

    pub fn key(&mut self) -> KeyId {
        let id = self.next_key;
        self.next_key = id.next();
        id
    }

    /// Number of ids of the given kind handed out so far
    pub fn issued(&self, kind: IdKind) -> u32 {
        match kind {
            IdKind::Node => self.next_node.0 - 1,
            IdKind::Connector => self.next_connector.0 - 1,
            IdKind::Door => self.next_door.0 - 1,
            IdKind::Staircase => self.next_staircase.0 - 1,
            IdKind::Key => self.next_key.0 - 1,
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
