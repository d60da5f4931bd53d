use delve_core::dungeon::{
    CellType, CorridorStrategy, FloorPlan, Orientation, PartitionTree, Point, Rect, cell_at,
};
use delve_core::{DungeonConfig, DungeonRng, FloorParams, IdAllocator, NodeId, World};
use proptest::prelude::*;

fn floor_params(
    rows: i32,
    cols: i32,
    min_room_length: i32,
    orientation: Orientation,
    strategy: CorridorStrategy,
) -> FloorParams {
    FloorParams {
        min_room_length,
        world_size: (rows, cols),
        first_split_orientation: orientation,
        room_padding_min: 1,
        room_padding_max: 4,
        min_corridor_half_width: 1,
        max_num_locked_doors: 2,
        allow_passageways: true,
        corridor_strategy: strategy,
    }
}

fn plan(seed: u64, params: &FloorParams) -> FloorPlan {
    let mut rng = DungeonRng::new(seed);
    let mut ids = IdAllocator::new();
    FloorPlan::generate(0, params, &mut rng, &mut ids)
}

fn check_tiling(tree: &PartitionTree, min_room_length: i32) -> Result<(), TestCaseError> {
    for node in tree.nodes() {
        let Some([a, b]) = node.children else {
            continue;
        };
        let a = tree.node(a).unwrap();
        let b = tree.node(b).unwrap();
        let along = node.orientation;
        let (la, lb) = (a.region.len_along(along), b.region.len_along(along));
        prop_assert_eq!(la + lb, node.region.len_along(along));
        prop_assert!(la >= min_room_length && lb >= min_room_length);
        prop_assert!(!a.region.intersects(&b.region));
        prop_assert_eq!(a.region.union(&b.region), node.region);
        prop_assert_eq!(a.orientation, along.flipped());
        prop_assert_eq!(a.level, node.level + 1);
    }
    Ok(())
}

/// Cells reachable from `start` through passable cells
fn walk_from(grid: &[Vec<CellType>], start: Point) -> Vec<Vec<bool>> {
    let mut seen: Vec<Vec<bool>> = grid.iter().map(|row| vec![false; row.len()]).collect();
    let mut stack = vec![start];
    while let Some(p) = stack.pop() {
        if !cell_at(grid, p).is_some_and(|cell| cell.is_passable()) {
            continue;
        }
        let slot = &mut seen[p.r as usize][p.c as usize];
        if *slot {
            continue;
        }
        *slot = true;
        for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            stack.push(Point::new(p.r + dr, p.c + dc));
        }
    }
    seen
}

fn inside(plan: &FloorPlan, room: NodeId) -> Point {
    plan.room(room).unwrap().interior().center()
}

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Vertical), Just(Orientation::Horizontal)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn partition_tiles_and_rooms_fit(
        seed in any::<u64>(),
        rows in 4i32..60,
        cols in 4i32..100,
        min_room_length in 3i32..8,
        first in orientation(),
    ) {
        let params = floor_params(rows, cols, min_room_length, first, CorridorStrategy::Flat);
        let plan = plan(seed, &params);
        check_tiling(plan.tree(), min_room_length)?;

        for id in plan.rooms() {
            let node = plan.room_node(id).unwrap();
            let room = node.room.unwrap();
            prop_assert!(node.region.contains(&room));
            if node.region.r_len >= min_room_length && node.region.c_len >= min_room_length {
                prop_assert!(room.r_len >= min_room_length);
                prop_assert!(room.c_len >= min_room_length);
            }
        }
    }

    #[test]
    fn tree_corridors_span_rooms(
        seed in any::<u64>(),
        rows in 4i32..60,
        cols in 4i32..100,
        first in orientation(),
    ) {
        let params = floor_params(rows, cols, 4, first, CorridorStrategy::Tree);
        let plan = plan(seed, &params);
        let leaves = plan.room_count();
        prop_assert_eq!(plan.connectors().len(), leaves - 1);
        prop_assert_eq!(plan.doors().len(), 2 * plan.connectors().len());
        prop_assert!(plan.is_connected());
        prop_assert!(!plan.has_cycles());
    }

    #[test]
    fn tree_rooms_reachable_on_foot(
        seed in any::<u64>(),
        rows in 6i32..60,
        cols in 6i32..100,
        min_room_length in 3i32..8,
        half_width in 1i32..3,
        first in orientation(),
    ) {
        let params = FloorParams {
            min_corridor_half_width: half_width,
            ..floor_params(rows, cols, min_room_length, first, CorridorStrategy::Tree)
        };
        let plan = plan(seed, &params);
        let rooms = plan.rooms();
        let seen = walk_from(&plan.rasterize(), inside(&plan, rooms[0]));
        for id in rooms {
            let p = inside(&plan, id);
            prop_assert!(seen[p.r as usize][p.c as usize], "room {} unreachable", id);
        }
    }

    #[test]
    fn flat_linked_rooms_reachable_on_foot(
        seed in any::<u64>(),
        rows in 6i32..60,
        cols in 6i32..100,
        min_room_length in 3i32..8,
        first in orientation(),
    ) {
        let params = floor_params(rows, cols, min_room_length, first, CorridorStrategy::Flat);
        let plan = plan(seed, &params);
        let grid = plan.rasterize();
        for pair in plan.room_pairs().keys() {
            let seen = walk_from(&grid, inside(&plan, pair.first()));
            let p = inside(&plan, pair.second());
            prop_assert!(seen[p.r as usize][p.c as usize], "{:?} not joined on foot", pair);
        }
    }

    #[test]
    fn flat_corridors_avoid_third_rooms(
        seed in any::<u64>(),
        rows in 10i32..60,
        cols in 10i32..100,
        first in orientation(),
    ) {
        let params = floor_params(rows, cols, 4, first, CorridorStrategy::Flat);
        let plan = plan(seed, &params);
        for conn in plan.connectors() {
            for id in plan.rooms() {
                if conn.rooms.contains(id) {
                    continue;
                }
                let interior = plan.room(id).unwrap().interior();
                prop_assert!(!interior.intersects(&conn.bb));
            }
        }
    }

    #[test]
    fn every_connector_has_two_end_doors(
        seed in any::<u64>(),
        tree in any::<bool>(),
    ) {
        let strategy = if tree { CorridorStrategy::Tree } else { CorridorStrategy::Flat };
        let params = floor_params(29, 79, 4, Orientation::Vertical, strategy);
        let plan = plan(seed, &params);
        for conn in plan.connectors() {
            let [d0, d1] = conn.doors.unwrap();
            let ends = conn.door_positions();
            prop_assert_eq!(plan.door(d0).unwrap().pos, ends[0]);
            prop_assert_eq!(plan.door(d1).unwrap().pos, ends[1]);
        }
    }

    #[test]
    fn staircases_link_overlapping_interiors(seed in any::<u64>(), chance in 0u32..4) {
        let config = DungeonConfig {
            seed: Some(seed),
            staircase_chance: chance,
            ..DungeonConfig::default()
        };
        let world = World::from_config(&config).unwrap();

        let mut ends: Vec<(usize, NodeId)> = Vec::new();
        for stairs in world.staircases() {
            for (floor, room) in stairs.endpoints() {
                let rect = world.floor(floor).unwrap().room(room).unwrap();
                prop_assert!(rect.interior().contains_point(stairs.pos));
                ends.push((floor, room));
            }
        }
        let total = ends.len();
        ends.sort();
        ends.dedup();
        prop_assert_eq!(ends.len(), total);
        prop_assert!(world.validate().is_ok());
    }
}

#[test]
fn scenario_29_by_79_tree() {
    let params = floor_params(29, 79, 4, Orientation::Vertical, CorridorStrategy::Tree);
    let plan = plan(2024, &params);
    let leaves = plan.room_count();
    assert!(leaves >= 1);
    assert_eq!(plan.connectors().len(), leaves - 1);
    assert_eq!(plan.doors().len(), 2 * plan.connectors().len());
}

#[test]
fn regeneration_is_deterministic() {
    let config = DungeonConfig {
        seed: Some(99),
        staircase_chance: 1,
        ..DungeonConfig::default()
    };
    let a = World::from_config(&config).unwrap();
    let b = World::from_config(&config).unwrap();
    assert_eq!(a.floors(), b.floors());
    assert_eq!(a.staircases(), b.staircases());
    assert_eq!(a.world_size(), b.world_size());

    let other = World::from_config(&DungeonConfig {
        seed: Some(100),
        ..config
    })
    .unwrap();
    assert_ne!(a.floors(), other.floors());
}

#[test]
fn fresh_snapshot_round_trips_through_json() {
    let config = DungeonConfig {
        seed: Some(7),
        ..DungeonConfig::default()
    };
    let world = World::from_config(&config).unwrap();
    let json = serde_json::to_string(&world.snapshot()).unwrap();

    let mut rebuilt = World::from_config(&config).unwrap();
    let report = rebuilt.restore(&serde_json::from_str(&json).unwrap());
    assert!(report.is_clean());
    assert_eq!(rebuilt.snapshot(), world.snapshot());
}

#[test]
fn reset_restarts_ids() {
    let params = vec![FloorParams::default(); 2];
    let mut world = World::new(5);
    world.generate(&params).unwrap();
    let first_room = world.rooms(0).unwrap()[0];

    world.reset(5);
    world.generate(&params).unwrap();
    assert_eq!(world.rooms(0).unwrap()[0], first_room);
    assert_eq!(world.floor(0).unwrap().tree().root_id(), NodeId(1));
}

#[test]
fn hand_built_tree_links_two_rooms() {
    let mut ids = IdAllocator::new();
    let mut rng = DungeonRng::new(0);
    let mut tree = PartitionTree::new(Rect::new(0, 0, 10, 22), Orientation::Vertical, &mut ids);
    let [a, b] = tree.split_node(tree.root_id(), 11, &mut ids).unwrap();
    assert!(tree.set_room(a, Rect::new(0, 0, 10, 10)));
    assert!(tree.set_room(b, Rect::new(0, 12, 10, 10)));

    let params = floor_params(10, 22, 4, Orientation::Vertical, CorridorStrategy::Flat);
    let mut plan = FloorPlan::from_tree(0, params, tree);
    assert_eq!(plan.create_corridors(CorridorStrategy::Flat, &mut rng, &mut ids), 1);
    plan.create_doors(&mut rng, &mut ids);

    let conn = plan.connector_between(a, b).unwrap();
    assert_eq!(conn.orientation, Orientation::Horizontal);
    assert_eq!((conn.bb.c, conn.bb.c_len, conn.bb.r_len), (10, 2, 2));
    assert_eq!(plan.doors().len(), 2);
    assert!(plan.is_connected());
}
