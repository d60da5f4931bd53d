//! Multi-floor dungeon
//!
//! The [`World`] owns every floor, the staircases between them, the RNG and
//! the id allocator. Generation runs once per session; afterwards only the
//! runtime fields captured by [`RuntimeState`] change.

use tracing::{debug, error, info, warn};

use crate::config::{DungeonConfig, FloorParams};
use crate::error::{ConfigError, ConsistencyError, GenError, RestoreIssue};
use crate::ids::{ConnectorId, DoorId, IdAllocator, NodeId, StaircaseId};
use crate::rng::DungeonRng;

use super::corridor::Connector;
use super::door::Door;
use super::floor::FloorPlan;
use super::rect::Rect;
use super::staircase::Staircase;
use super::state::{ConnectorRecord, DoorRecord, RestoreReport, RuntimeState};

/// A generated dungeon session
#[derive(Debug, Clone)]
pub struct World {
    rng: DungeonRng,
    ids: IdAllocator,
    floors: Vec<FloorPlan>,
    staircases: Vec<Staircase>,
    floor_rooms: Vec<Vec<NodeId>>,
    world_size: (i32, i32),
    active_floor: usize,
}

impl World {
    /// Empty world seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DungeonRng::new(seed),
            ids: IdAllocator::new(),
            floors: Vec::new(),
            staircases: Vec::new(),
            floor_rooms: Vec::new(),
            world_size: (0, 0),
            active_floor: 0,
        }
    }

    /// Drop everything, restart the id counters and reseed
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Full pipeline: floors, staircases, start floor
    pub fn from_config(config: &DungeonConfig) -> Result<Self, GenError> {
        config.validate()?;
        let seed = config
            .seed
            .unwrap_or_else(|| DungeonRng::from_entropy().seed());
        let mut world = Self::new(seed);
        world.generate(&config.floors)?;
        world.create_staircases(config.staircase_chance);
        world.set_start_floor(config.start_floor)?;
        info!(
            seed,
            floors = world.floors.len(),
            staircases = world.staircases.len(),
            "dungeon ready"
        );
        Ok(world)
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Build one floor per parameter record, top floor first
    pub fn generate(&mut self, params: &[FloorParams]) -> Result<(), GenError> {
        if !self.floors.is_empty() {
            return Err(GenError::AlreadyGenerated(self.floors.len()));
        }
        if params.is_empty() {
            return Err(ConfigError::NoFloors.into());
        }
        for (floor, p) in params.iter().enumerate() {
            p.validate().map_err(|source| ConfigError::Floor {
                floor,
                source: Box::new(source),
            })?;
        }

        for (index, p) in params.iter().enumerate() {
            let plan = FloorPlan::generate(index, p, &mut self.rng, &mut self.ids);
            let (rows, cols) = plan.extent();
            self.world_size = (self.world_size.0.max(rows), self.world_size.1.max(cols));
            self.floor_rooms.push(plan.rooms());
            self.floors.push(plan);
        }
        self.active_floor = self.floors.len() - 1;

        info!(
            floors = self.floors.len(),
            rows = self.world_size.0,
            cols = self.world_size.1,
            "generated floors"
        );
        Ok(())
    }

    /// Pick the floor play starts on; `None` selects the lowest floor
    pub fn set_start_floor(&mut self, start: Option<usize>) -> Result<(), GenError> {
        let floors = self.floors.len();
        let index = match start {
            Some(index) if index < floors => index,
            Some(index) => return Err(GenError::StartFloorOutOfRange { index, floors }),
            None => floors.saturating_sub(1),
        };
        self.active_floor = index;
        Ok(())
    }

    /// Link rooms on adjacent floors whose interiors overlap
    ///
    /// Each candidate pair is tried with probability `1 / prob_in_room`
    /// (0 counts as 1). An upper room stops at its first staircase and no
    /// room takes more than one. Returns the number placed.
    pub fn create_staircases(&mut self, prob_in_room: u32) -> usize {
        let prob = prob_in_room.max(1);
        let mut placed = 0;

        for upper in 0..self.floors.len().saturating_sub(1) {
            let lower = upper + 1;
            let upper_rooms = self.floor_rooms[upper].clone();
            let lower_rooms = self.floor_rooms[lower].clone();

            for a in upper_rooms {
                let Some(a_interior) = self.free_interior(upper, a) else {
                    continue;
                };
                for &b in &lower_rooms {
                    let Some(b_interior) = self.free_interior(lower, b) else {
                        continue;
                    };
                    if !self.rng.one_in(prob) {
                        continue;
                    }
                    let Some(overlap) = a_interior.intersection(&b_interior) else {
                        continue;
                    };

                    let staircase = Staircase {
                        id: self.ids.staircase(),
                        pos: overlap.random_point(&mut self.rng),
                        upper_floor: upper,
                        upper_room: a,
                        lower_floor: lower,
                        lower_room: b,
                    };
                    for (floor, room) in staircase.endpoints() {
                        if let Some(node) = self.floors[floor].room_node_mut(room) {
                            node.bind_staircase(staircase.id);
                        }
                    }
                    debug!(
                        staircase = %staircase.id,
                        upper = %a,
                        lower = %b,
                        pos = ?staircase.pos,
                        "placed staircase"
                    );
                    self.staircases.push(staircase);
                    placed += 1;
                    break;
                }
            }
        }
        placed
    }

    /// Interior of a room that has no staircase yet
    fn free_interior(&self, floor: usize, room: NodeId) -> Option<Rect> {
        let node = self.floors.get(floor)?.room_node(room)?;
        if node.has_staircase() {
            return None;
        }
        Some(node.room.unwrap_or(node.region).interior())
    }

    pub fn floor(&self, index: usize) -> Option<&FloorPlan> {
        self.floors.get(index)
    }

    pub fn floors(&self) -> &[FloorPlan] {
        &self.floors
    }

    /// Cached leaf rooms of a floor
    pub fn rooms(&self, floor: usize) -> Option<&[NodeId]> {
        self.floor_rooms.get(floor).map(Vec::as_slice)
    }

    pub fn staircases(&self) -> &[Staircase] {
        &self.staircases
    }

    pub fn staircase(&self, id: StaircaseId) -> Option<&Staircase> {
        self.staircases.iter().find(|s| s.id == id)
    }

    pub fn staircases_on(&self, floor: usize) -> Vec<&Staircase> {
        self.staircases.iter().filter(|s| s.touches(floor)).collect()
    }

    /// Per-axis maximum of all floor extents
    pub fn world_size(&self) -> (i32, i32) {
        self.world_size
    }

    pub fn active_floor(&self) -> usize {
        self.active_floor
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.floors.iter().find_map(|f| f.door(id))
    }

    pub fn door_mut(&mut self, id: DoorId) -> Option<&mut Door> {
        self.floors.iter_mut().find_map(|f| f.door_mut(id))
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.floors.iter().find_map(|f| f.connector(id))
    }

    pub fn connector_mut(&mut self, id: ConnectorId) -> Option<&mut Connector> {
        self.floors.iter_mut().find_map(|f| f.connector_mut(id))
    }

    /// Every broken cross-reference, in floor order
    pub fn violations(&self) -> Vec<ConsistencyError> {
        let mut found = Vec::new();

        for (index, floor) in self.floors.iter().enumerate() {
            match self.floor_rooms.get(index) {
                None => found.push(ConsistencyError::MissingFloorRooms(index)),
                Some(cached) if *cached != floor.rooms() => {
                    found.push(ConsistencyError::StaleFloorRooms { floor: index })
                }
                Some(_) => {}
            }

            for door in floor.doors() {
                if floor.connector(door.corridor).is_none() {
                    found.push(ConsistencyError::DanglingDoorCorridor {
                        floor: index,
                        door: door.id,
                        connector: door.corridor,
                    });
                }
                if let Some(room) = door.room
                    && floor.room_node(room).is_none()
                {
                    found.push(ConsistencyError::DanglingDoorRoom {
                        floor: index,
                        door: door.id,
                        room,
                    });
                }
            }

            for connector in floor.connectors() {
                let linked = connector.doors.map_or(0, |ids| {
                    ids.iter()
                        .filter(|&&id| floor.door(id).is_some_and(|d| d.corridor == connector.id))
                        .count()
                });
                if linked != 2 {
                    found.push(ConsistencyError::ConnectorDoors {
                        floor: index,
                        connector: connector.id,
                        found: linked,
                    });
                }
            }
        }

        for staircase in &self.staircases {
            for (floor, room) in staircase.endpoints() {
                let node = self.floors.get(floor).and_then(|f| f.room_node(room));
                match node {
                    None => found.push(ConsistencyError::DanglingStaircaseRoom {
                        staircase: staircase.id,
                        floor,
                        room,
                    }),
                    Some(node) if node.staircase != Some(staircase.id) => {
                        found.push(ConsistencyError::StaircaseBackReference {
                            staircase: staircase.id,
                            floor,
                            room,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        found
    }

    /// Check every cross-reference; reports the first violation
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        let violations = self.violations();
        for violation in &violations {
            error!(%violation, "consistency violation");
        }
        match violations.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }

    /// Capture the runtime-mutable fields of every door and connector
    pub fn snapshot(&self) -> RuntimeState {
        let mut state = RuntimeState::default();
        for floor in &self.floors {
            state.doors.extend(floor.doors().iter().map(|d| DoorRecord {
                id: d.id,
                is_open: d.is_open(),
                is_locked: d.is_locked(),
            }));
            state
                .connectors
                .extend(floor.connectors().iter().map(|c| ConnectorRecord {
                    id: c.id,
                    fog_of_war: c.visibility.fog_bits(),
                    light: c.visibility.light_bits(),
                }));
        }
        state
    }

    /// Overlay saved runtime fields by id
    ///
    /// Records that do not match the regenerated topology are skipped and
    /// reported; the rest still apply.
    pub fn restore(&mut self, state: &RuntimeState) -> RestoreReport {
        let mut report = RestoreReport::default();

        for record in &state.doors {
            match self.door_mut(record.id) {
                Some(door) => {
                    door.set_open(record.is_open);
                    door.set_locked(record.is_locked);
                    report.applied += 1;
                }
                None => report.skipped.push(RestoreIssue::UnknownDoor(record.id)),
            }
        }

        for record in &state.connectors {
            let result = match self.connector_mut(record.id) {
                Some(connector) => {
                    connector
                        .visibility
                        .load_bits(record.id, &record.fog_of_war, &record.light)
                }
                None => Err(RestoreIssue::UnknownConnector(record.id)),
            };
            match result {
                Ok(()) => report.applied += 1,
                Err(issue) => report.skipped.push(issue),
            }
        }

        for issue in &report.skipped {
            warn!(%issue, "skipped runtime record");
        }
        debug!(
            applied = report.applied,
            skipped = report.skipped.len(),
            "restored runtime state"
        );
        report
    }
}
