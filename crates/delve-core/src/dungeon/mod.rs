//! Dungeon topology: partitioning, rooms, corridors, doors and floors

mod cell;
mod corridor;
mod door;
mod floor;
mod partition;
mod rect;
mod staircase;
mod state;
mod world;

pub use cell::CellType;
pub use corridor::{
    Carver, ConnectivityTracker, Connector, CorridorStrategy, FlatCarver, RoomPair, TreeCarver,
    VisibilityGrid,
};
pub use door::{Door, DoorFlags, assign_door_states, synthesize_doors};
pub use floor::{FloorPlan, cell_at, set_cell};
pub use partition::{PartitionNode, PartitionTree};
pub use rect::{Orientation, Point, Rect};
pub use staircase::Staircase;
pub use state::{ConnectorRecord, DoorRecord, RestoreReport, RuntimeState};
pub use world::World;
