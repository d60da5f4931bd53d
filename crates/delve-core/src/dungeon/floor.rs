//! One floor of the dungeon: partition tree, connectors and doors

use std::collections::BTreeMap;

use hashbrown::HashMap;
use tracing::debug;

use crate::config::FloorParams;
use crate::ids::{ConnectorId, DoorId, IdAllocator, NodeId};
use crate::rng::DungeonRng;

use super::cell::CellType;
use super::corridor::{Connector, ConnectivityTracker, CorridorStrategy, RoomPair};
use super::door::{Door, assign_door_states, synthesize_doors};
use super::partition::{PartitionNode, PartitionTree};
use super::rect::{Point, Rect};

/// A generated floor
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlan {
    index: usize,
    params: FloorParams,
    tree: PartitionTree,
    connectors: Vec<Connector>,
    connector_index: HashMap<ConnectorId, usize>,
    doors: Vec<Door>,
    door_index: HashMap<DoorId, usize>,
    room_pair_index: BTreeMap<RoomPair, ConnectorId>,
}

impl FloorPlan {
    /// Run the whole per-floor pipeline: partition, pad, carve, doors
    pub fn generate(
        index: usize,
        params: &FloorParams,
        rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> Self {
        let (rows, cols) = params.world_size;
        let tree = PartitionTree::generate(
            Rect::new(0, 0, rows, cols),
            params.first_split_orientation,
            params.min_room_length,
            rng,
            ids,
        );
        let mut plan = Self::from_tree(index, params.clone(), tree);
        plan.pad_rooms(rng);
        plan.create_corridors(params.corridor_strategy, rng, ids);
        plan.create_doors(rng, ids);

        debug!(
            floor = index,
            rooms = plan.room_count(),
            connectors = plan.connectors.len(),
            doors = plan.doors.len(),
            strategy = %params.corridor_strategy,
            "generated floor"
        );
        plan
    }

    /// Wrap an already partitioned tree (hand-authored layouts)
    pub fn from_tree(index: usize, params: FloorParams, tree: PartitionTree) -> Self {
        Self {
            index,
            params,
            tree,
            connectors: Vec::new(),
            connector_index: HashMap::new(),
            doors: Vec::new(),
            door_index: HashMap::new(),
            room_pair_index: BTreeMap::new(),
        }
    }

    pub fn pad_rooms(&mut self, rng: &mut DungeonRng) {
        self.tree.pad_rooms(
            self.params.room_padding_min,
            self.params.room_padding_max,
            self.params.min_room_length,
            rng,
        );
    }

    /// Carve connectors with `strategy`. Returns the number added.
    pub fn create_corridors(
        &mut self,
        strategy: CorridorStrategy,
        rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> usize {
        let carved = strategy.carver().carve(
            &mut self.tree,
            self.params.min_corridor_half_width,
            rng,
            ids,
        );
        let mut added = 0;
        for connector in carved {
            if self.room_pair_index.contains_key(&connector.rooms) {
                continue;
            }
            self.room_pair_index.insert(connector.rooms, connector.id);
            self.connector_index.insert(connector.id, self.connectors.len());
            self.connectors.push(connector);
            added += 1;
        }
        added
    }

    /// Give every indexed connector its two doors, then lock some of them
    pub fn create_doors(&mut self, rng: &mut DungeonRng, ids: &mut IdAllocator) {
        let first_new = self.doors.len();
        let pending: Vec<ConnectorId> = self.room_pair_index.values().copied().collect();
        for id in pending {
            let Some(&idx) = self.connector_index.get(&id) else {
                continue;
            };
            let connector = &mut self.connectors[idx];
            if connector.doors.is_some() {
                continue;
            }
            for door in synthesize_doors(connector, ids) {
                self.door_index.insert(door.id, self.doors.len());
                self.doors.push(door);
            }
        }

        assign_door_states(
            &mut self.doors[first_new..],
            self.params.max_num_locked_doors,
            self.params.allow_passageways,
            rng,
            ids,
        );
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn params(&self) -> &FloorParams {
        &self.params
    }

    pub fn tree(&self) -> &PartitionTree {
        &self.tree
    }

    /// Rows and columns covered by the floor
    pub fn extent(&self) -> (i32, i32) {
        let region = self.tree.root().region;
        (region.bottom(), region.right())
    }

    /// Leaf room ids, left to right
    pub fn rooms(&self) -> Vec<NodeId> {
        self.tree.leaves()
    }

    pub fn room_count(&self) -> usize {
        self.tree.nodes().filter(|n| n.is_leaf()).count()
    }

    pub fn room(&self, id: NodeId) -> Option<Rect> {
        self.tree.room(id)
    }

    pub fn room_node(&self, id: NodeId) -> Option<&PartitionNode> {
        self.tree.node(id).filter(|n| n.is_leaf())
    }

    pub(crate) fn room_node_mut(&mut self, id: NodeId) -> Option<&mut PartitionNode> {
        self.tree.node_mut(id).filter(|n| n.is_leaf())
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connector_index.get(&id).map(|&i| &self.connectors[i])
    }

    pub fn connector_mut(&mut self, id: ConnectorId) -> Option<&mut Connector> {
        self.connector_index.get(&id).map(|&i| &mut self.connectors[i])
    }

    /// Room pair to connector map, in id order
    pub fn room_pairs(&self) -> &BTreeMap<RoomPair, ConnectorId> {
        &self.room_pair_index
    }

    pub fn connector_between(&self, a: NodeId, b: NodeId) -> Option<&Connector> {
        self.room_pair_index
            .get(&RoomPair::new(a, b))
            .and_then(|&id| self.connector(id))
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.door_index.get(&id).map(|&i| &self.doors[i])
    }

    pub fn door_mut(&mut self, id: DoorId) -> Option<&mut Door> {
        self.door_index.get(&id).map(|&i| &mut self.doors[i])
    }

    fn room_graph(&self) -> (ConnectivityTracker, usize) {
        let rooms = self.rooms();
        let slot: HashMap<NodeId, usize> = rooms.iter().enumerate().map(|(i, &r)| (r, i)).collect();
        let mut tracker = ConnectivityTracker::new(rooms.len());
        let mut redundant = 0;
        for pair in self.room_pair_index.keys() {
            if let (Some(&a), Some(&b)) = (slot.get(&pair.first()), slot.get(&pair.second()))
                && !tracker.merge(a, b)
            {
                redundant += 1;
            }
        }
        (tracker, redundant)
    }

    /// Whether every room is reachable through the room-pair graph
    pub fn is_connected(&self) -> bool {
        self.room_graph().0.all_connected()
    }

    /// Whether the room-pair graph contains a cycle
    pub fn has_cycles(&self) -> bool {
        self.room_graph().1 > 0
    }

    /// Rasterize rooms, corridors and doors into a row-major grid
    pub fn rasterize(&self) -> Vec<Vec<CellType>> {
        let (rows, cols) = self.extent();
        let mut grid = vec![vec![CellType::Stone; cols.max(0) as usize]; rows.max(0) as usize];

        for room in self.rooms().into_iter().filter_map(|id| self.room(id)) {
            for r in room.r..room.bottom() {
                for c in room.c..room.right() {
                    let edge = r == room.r
                        || r == room.bottom() - 1
                        || c == room.c
                        || c == room.right() - 1;
                    let cell = if edge { CellType::Wall } else { CellType::Floor };
                    set_cell(&mut grid, Point::new(r, c), cell);
                }
            }
        }

        for connector in &self.connectors {
            let bb = connector.bb;
            for r in bb.r..bb.bottom() {
                for c in bb.c..bb.right() {
                    let p = Point::new(r, c);
                    if matches!(cell_at(&grid, p), Some(CellType::Stone | CellType::Wall)) {
                        set_cell(&mut grid, p, CellType::Corridor);
                    }
                }
            }
        }

        for door in &self.doors {
            let cell = if door.is_door() {
                CellType::Door
            } else {
                CellType::Passage
            };
            set_cell(&mut grid, door.pos, cell);
        }

        grid
    }
}

/// Cell at `p`, or `None` outside the grid
pub fn cell_at(grid: &[Vec<CellType>], p: Point) -> Option<CellType> {
    if p.r < 0 || p.c < 0 {
        return None;
    }
    grid.get(p.r as usize)
        .and_then(|row| row.get(p.c as usize))
        .copied()
}

/// Overwrite the cell at `p` if it lies inside the grid
pub fn set_cell(grid: &mut [Vec<CellType>], p: Point, cell: CellType) {
    if p.r < 0 || p.c < 0 {
        return;
    }
    if let Some(slot) = grid
        .get_mut(p.r as usize)
        .and_then(|row| row.get_mut(p.c as usize))
    {
        *slot = cell;
    }
}
