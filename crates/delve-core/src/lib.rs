//! Procedural multi-floor dungeon topology
//!
//! Each floor is a binary space partition whose leaves are padded into
//! rooms, joined by straight corridors with a door at each end. Adjacent
//! floors are linked by staircases where room interiors overlap.
//!
//! Generation is driven by a seeded [`DungeonRng`], so the same seed and
//! parameters always rebuild the same topology. Only the runtime fields in
//! [`RuntimeState`] ever need persisting.

pub mod config;
pub mod consts;
pub mod dungeon;
pub mod error;
pub mod ids;
pub mod rng;

pub use config::{DungeonConfig, FloorParams};
pub use dungeon::{
    CellType, Connector, CorridorStrategy, Door, FloorPlan, Orientation, Point, Rect,
    RestoreReport, RuntimeState, Staircase, World,
};
pub use error::{ConfigError, ConsistencyError, GenError, RestoreIssue};
pub use ids::{ConnectorId, DoorId, IdAllocator, KeyId, NodeId, RoomId, StaircaseId};
pub use rng::DungeonRng;
