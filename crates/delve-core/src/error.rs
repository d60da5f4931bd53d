//! Error types for configuration, generation, consistency checks and restore

use thiserror::Error;

use crate::ids::{ConnectorId, DoorId, NodeId, StaircaseId};

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("min_room_length must be at least 1, got {0}")]
    MinRoomLength(i32),

    #[error("world size must be positive, got {rows}x{cols}")]
    WorldSize { rows: i32, cols: i32 },

    #[error("world size {rows}x{cols} exceeds {max} on a side")]
    WorldTooLarge { rows: i32, cols: i32, max: i32 },

    #[error("room padding range is inverted or negative: {min}..={max}")]
    PaddingRange { min: i32, max: i32 },

    #[error("room padding {max} exceeds the limit of {limit}")]
    PaddingTooLarge { max: i32, limit: i32 },

    #[error("corridor half width must be at least 1, got {0}")]
    CorridorHalfWidth(i32),

    #[error("corridor half width {half_width} exceeds the limit of {limit}")]
    CorridorTooWide { half_width: i32, limit: i32 },

    #[error("config has no floors")]
    NoFloors,

    #[error("floor {floor}: {source}")]
    Floor {
        floor: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to run the generation pipeline
#[derive(Error, Debug)]
pub enum GenError {
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ConfigError),

    #[error("world already holds {0} floors; reset it before generating again")]
    AlreadyGenerated(usize),

    #[error("start floor {index} is out of range ({floors} floors)")]
    StartFloorOutOfRange { index: usize, floors: usize },
}

/// A cross-reference that does not resolve after generation
///
/// These indicate a construction bug upstream, never a normal condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("floor {0} has no cached room list")]
    MissingFloorRooms(usize),

    #[error("floor {floor}: cached room list disagrees with the partition tree")]
    StaleFloorRooms { floor: usize },

    #[error("floor {floor}: door {door} references missing connector {connector}")]
    DanglingDoorCorridor {
        floor: usize,
        door: DoorId,
        connector: ConnectorId,
    },

    #[error("floor {floor}: door {door} references missing room {room}")]
    DanglingDoorRoom {
        floor: usize,
        door: DoorId,
        room: NodeId,
    },

    #[error("floor {floor}: connector {connector} has {found} doors instead of 2")]
    ConnectorDoors {
        floor: usize,
        connector: ConnectorId,
        found: usize,
    },

    #[error("staircase {staircase} references missing room {room} on floor {floor}")]
    DanglingStaircaseRoom {
        staircase: StaircaseId,
        floor: usize,
        room: NodeId,
    },

    #[error("room {room} on floor {floor} does not point back at staircase {staircase}")]
    StaircaseBackReference {
        staircase: StaircaseId,
        floor: usize,
        room: NodeId,
    },
}

/// A persisted runtime record that could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreIssue {
    #[error("unknown door {0}")]
    UnknownDoor(DoorId),

    #[error("unknown connector {0}")]
    UnknownConnector(ConnectorId),

    #[error("connector {connector}: {field} has {found} cells, expected {expected}")]
    BitLength {
        connector: ConnectorId,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("connector {connector}: {field} contains invalid character {found:?}")]
    BitChar {
        connector: ConnectorId,
        field: &'static str,
        found: char,
    },
}
