//! Corridor carving
//!
//! Two interchangeable strategies produce the same [`Connector`] shape:
//! - [`TreeCarver`] walks the partition tree bottom-up and joins the two
//!   halves of every split, yielding a spanning tree over rooms.
//! - [`FlatCarver`] tries every pair of rooms and links those that can be
//!   joined by a straight corridor without crossing a third room.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::trace;

use crate::error::RestoreIssue;
use crate::ids::{ConnectorId, DoorId, IdAllocator, NodeId};
use crate::rng::DungeonRng;

use super::partition::PartitionTree;
use super::rect::{Orientation, Point, Rect};

/// Which carver a floor uses
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum CorridorStrategy {
    /// One corridor per split, rooms form a tree
    Tree,
    /// Every feasible room pair, possibly with cycles
    #[default]
    Flat,
}

impl CorridorStrategy {
    pub fn carver(self) -> &'static dyn Carver {
        match self {
            CorridorStrategy::Tree => &TreeCarver,
            CorridorStrategy::Flat => &FlatCarver,
        }
    }
}

/// Unordered pair of rooms, stored smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomPair(NodeId, NodeId);

impl RoomPair {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { RoomPair(a, b) } else { RoomPair(b, a) }
    }

    pub fn first(&self) -> NodeId {
        self.0
    }

    pub fn second(&self) -> NodeId {
        self.1
    }

    pub fn contains(&self, room: NodeId) -> bool {
        self.0 == room || self.1 == room
    }
}

/// Per-cell fog-of-war and light bits over a connector's rectangle
///
/// Owned here but written by the visibility system at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityGrid {
    r_len: usize,
    c_len: usize,
    fog_of_war: Vec<bool>,
    light: Vec<bool>,
}

impl VisibilityGrid {
    /// Fully fogged and unlit
    pub fn new(bb: &Rect) -> Self {
        let r_len = bb.r_len.max(0) as usize;
        let c_len = bb.c_len.max(0) as usize;
        Self {
            r_len,
            c_len,
            fog_of_war: vec![true; r_len * c_len],
            light: vec![false; r_len * c_len],
        }
    }

    pub fn len(&self) -> usize {
        self.fog_of_war.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fog_of_war.is_empty()
    }

    fn offset(&self, r: usize, c: usize) -> Option<usize> {
        (r < self.r_len && c < self.c_len).then(|| r * self.c_len + c)
    }

    /// Fog bit at a cell relative to the connector's top-left corner
    pub fn is_fogged(&self, r: usize, c: usize) -> bool {
        self.offset(r, c).is_some_and(|i| self.fog_of_war[i])
    }

    pub fn set_fog(&mut self, r: usize, c: usize, fogged: bool) {
        if let Some(i) = self.offset(r, c) {
            self.fog_of_war[i] = fogged;
        }
    }

    pub fn is_lit(&self, r: usize, c: usize) -> bool {
        self.offset(r, c).is_some_and(|i| self.light[i])
    }

    pub fn set_lit(&mut self, r: usize, c: usize, lit: bool) {
        if let Some(i) = self.offset(r, c) {
            self.light[i] = lit;
        }
    }

    /// Fog bits as a row-major string of `0`/`1`
    pub fn fog_bits(&self) -> String {
        encode_bits(&self.fog_of_war)
    }

    pub fn light_bits(&self) -> String {
        encode_bits(&self.light)
    }

    /// Overwrite both fields from their `0`/`1` encodings
    ///
    /// Nothing is written unless both strings decode to the right length.
    pub fn load_bits(
        &mut self,
        connector: ConnectorId,
        fog_of_war: &str,
        light: &str,
    ) -> Result<(), RestoreIssue> {
        let fog = decode_bits(connector, "fog_of_war", fog_of_war, self.len())?;
        let light = decode_bits(connector, "light", light, self.len())?;
        self.fog_of_war = fog;
        self.light = light;
        Ok(())
    }
}

fn encode_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn decode_bits(
    connector: ConnectorId,
    field: &'static str,
    text: &str,
    expected: usize,
) -> Result<Vec<bool>, RestoreIssue> {
    let found = text.chars().count();
    if found != expected {
        return Err(RestoreIssue::BitLength {
            connector,
            field,
            expected,
            found,
        });
    }
    text.chars()
        .map(|ch| match ch {
            '0' => Ok(false),
            '1' => Ok(true),
            found => Err(RestoreIssue::BitChar {
                connector,
                field,
                found,
            }),
        })
        .collect()
}

/// A straight rectangular corridor between two rooms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub id: ConnectorId,
    pub bb: Rect,
    /// Direction of travel: `Horizontal` runs along columns
    pub orientation: Orientation,
    /// Room pair this connector is indexed under
    pub rooms: RoomPair,
    /// Room each end opens into; `None` where an end meets open corridor
    pub end_rooms: [Option<NodeId>; 2],
    /// Set once doors are synthesized
    pub doors: Option<[DoorId; 2]>,
    pub visibility: VisibilityGrid,
}

impl Connector {
    pub fn new(
        id: ConnectorId,
        bb: Rect,
        orientation: Orientation,
        rooms: RoomPair,
        end_rooms: [Option<NodeId>; 2],
    ) -> Self {
        Self {
            id,
            bb,
            orientation,
            rooms,
            end_rooms,
            doors: None,
            visibility: VisibilityGrid::new(&bb),
        }
    }

    /// Midpoints of the two ends, one cell outside the rectangle
    ///
    /// Where an end opens into a room this cell lies on the room's wall.
    pub fn door_positions(&self) -> [Point; 2] {
        end_cells(&self.bb, self.orientation)
    }
}

fn end_cells(bb: &Rect, travel: Orientation) -> [Point; 2] {
    match travel {
        Orientation::Horizontal => {
            let mid = bb.r + bb.r_len / 2;
            [Point::new(mid, bb.c - 1), Point::new(mid, bb.right())]
        }
        Orientation::Vertical => {
            let mid = bb.c + bb.c_len / 2;
            [Point::new(bb.r - 1, mid), Point::new(bb.bottom(), mid)]
        }
    }
}

/// A corridor-carving strategy
pub trait Carver {
    /// Build connectors for the padded rooms of `tree`
    ///
    /// Implementations may record per-node state in the tree but must not
    /// change its geometry.
    fn carve(
        &self,
        tree: &mut PartitionTree,
        half_width: i32,
        rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> Vec<Connector>;
}

/// Start and end (exclusive) of `rect` along the direction of travel
fn along_span(rect: &Rect, travel: Orientation) -> (i32, i32) {
    match travel {
        Orientation::Horizontal => (rect.c, rect.right()),
        Orientation::Vertical => (rect.r, rect.bottom()),
    }
}

/// Start and end (exclusive) of `rect` across the direction of travel
fn across_span(rect: &Rect, travel: Orientation) -> (i32, i32) {
    match travel {
        Orientation::Horizontal => (rect.r, rect.bottom()),
        Orientation::Vertical => (rect.c, rect.right()),
    }
}

/// Corridor covering `lo..hi` across the travel and `from..to` along it
fn band_rect(travel: Orientation, (lo, hi): (i32, i32), from: i32, to: i32) -> Rect {
    let len = to.saturating_sub(from).max(0);
    let width = hi.saturating_sub(lo).max(0);
    match travel {
        Orientation::Horizontal => Rect::new(lo, from, width, len),
        Orientation::Vertical => Rect::new(from, lo, len, width),
    }
}

/// Corridor `2 * half_width` thick centred on `centre`, spanning `from..to`
fn corridor_rect(travel: Orientation, centre: i32, half_width: i32, from: i32, to: i32) -> Rect {
    let band = (
        centre.saturating_sub(half_width),
        centre.saturating_add(half_width),
    );
    band_rect(travel, band, from, to)
}

/// Corridor centres that keep a corridor clear of a room's wall corners
///
/// Rows (or columns) `centre - hw .. centre + hw` must fall strictly inside
/// the wall ring.
fn centre_span(room: &Rect, travel: Orientation, half_width: i32) -> (i32, i32) {
    let (lo, hi) = across_span(room, travel);
    let inset = half_width.saturating_add(1);
    (lo.saturating_add(inset), hi.saturating_sub(inset))
}

/// Closest pair of cells, one from each half-open span
fn closest(a: (i32, i32), b: (i32, i32)) -> (i32, i32) {
    if a.1 <= b.0 {
        (a.1 - 1, b.0)
    } else if b.1 <= a.0 {
        (a.0, b.1 - 1)
    } else {
        let shared = a.0.max(b.0);
        (shared, shared)
    }
}

/// Something on one side of a split a tree corridor can end against
#[derive(Debug, Clone, Copy)]
struct Landing {
    rect: Rect,
    /// Cells across the travel (end exclusive) where an end leads inside
    walk: (i32, i32),
    room: Option<NodeId>,
}

impl Landing {
    fn at_room(id: NodeId, room: Rect, travel: Orientation) -> Self {
        let inner = if room.interior().is_valid() {
            room.interior()
        } else {
            room
        };
        Self {
            rect: room,
            walk: across_span(&inner, travel),
            room: Some(id),
        }
    }

    fn at_corridor(bb: Rect, travel: Orientation) -> Self {
        Self {
            rect: bb,
            walk: across_span(&bb, travel),
            room: None,
        }
    }

    fn meets(&self, band: (i32, i32)) -> bool {
        self.walk.0 < band.1 && band.0 < self.walk.1
    }

    fn accepts(&self, across: i32) -> bool {
        self.walk.0 <= across && across < self.walk.1
    }

    /// Centres whose whole band stays inside `walk`
    fn clean(&self, half_width: i32) -> (i32, i32) {
        (
            self.walk.0.saturating_add(half_width),
            self.walk.1.saturating_sub(half_width),
        )
    }
}

/// Joins the two children of every split, bottom-up
///
/// Each side of a split offers its rooms and the corridors already carved
/// inside it. The joining corridor runs from the landing closest to the
/// split on one side to the closest on the other, so it never enters a
/// room interior it does not open into. Walls it crosses are cut through.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCarver;

impl TreeCarver {
    /// Rooms and carved corridors of the subtree at `id`
    fn landings(
        tree: &PartitionTree,
        built: &[Connector],
        id: NodeId,
        travel: Orientation,
    ) -> Vec<Landing> {
        let mut landings = Vec::new();
        for id in tree.subtree(id) {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if node.is_leaf() {
                landings.push(Landing::at_room(id, node.room.unwrap_or(node.region), travel));
            } else if let Some(conn) = node
                .connector
                .and_then(|cid| built.iter().find(|c| c.id == cid))
                && conn.bb.is_valid()
            {
                landings.push(Landing::at_corridor(conn.bb, travel));
            }
        }
        landings
    }

    /// Landing closest to the split among those `band` meets
    fn nearest(
        landings: &[Landing],
        side: usize,
        band: (i32, i32),
        travel: Orientation,
    ) -> Option<Landing> {
        let meeting = landings.iter().filter(|l| l.meets(band));
        let found = if side == 0 {
            meeting.max_by_key(|l| along_span(&l.rect, travel).1)
        } else {
            meeting.min_by_key(|l| along_span(&l.rect, travel).0)
        };
        found.copied()
    }

    /// Shortest corridor of the standard width whose centreline enters a
    /// landing on both sides
    ///
    /// Centres that keep the whole width inside both landings win, then
    /// shorter corridors, then centres nearer the middle of the shared
    /// range.
    fn straight(
        sides: [&[Landing]; 2],
        across: (i32, i32),
        half_width: i32,
        travel: Orientation,
    ) -> Option<(Rect, [Landing; 2])> {
        let first = across.0.saturating_add(half_width);
        let last = across.1.saturating_sub(half_width);

        let mut best: Option<((bool, i32, i32, i32), Rect, [Landing; 2])> = None;
        for centre in first..=last {
            let band = (centre - half_width, centre + half_width);
            let (Some(a), Some(b)) = (
                Self::nearest(sides[0], 0, band, travel),
                Self::nearest(sides[1], 1, band, travel),
            ) else {
                continue;
            };
            if !a.accepts(centre) || !b.accepts(centre) {
                continue;
            }

            let from = along_span(&a.rect, travel).1;
            let to = along_span(&b.rect, travel).0.max(from);
            let (ca, cb) = (a.clean(half_width), b.clean(half_width));
            let (lo, hi) = (ca.0.max(cb.0), ca.1.min(cb.1));
            let fits = lo <= centre && centre <= hi;
            let target = if lo <= hi {
                lo + hi
            } else {
                (ca.0 + ca.1 + cb.0 + cb.1) / 2
            };
            let key = (!fits, to - from, (2 * centre - target).abs(), centre);
            if best.as_ref().is_none_or(|(k, ..)| key < *k) {
                let bb = corridor_rect(travel, centre, half_width, from, to);
                best = Some((key, bb, [a, b]));
            }
        }
        best.map(|(_, bb, ends)| (bb, ends))
    }

    /// Corridor widened to cover the closest cells of both sides
    ///
    /// Used when no single centreline enters both sides. Ends at a room
    /// reach over its wall.
    fn hall(
        sides: [&[Landing]; 2],
        across: (i32, i32),
        half_width: i32,
        travel: Orientation,
    ) -> Option<(Rect, [Landing; 2])> {
        let mut cells: Option<(i32, i32)> = None;
        for a in sides[0] {
            for b in sides[1] {
                let pair = closest(a.walk, b.walk);
                if cells.is_none_or(|(x, y)| (pair.0 - pair.1).abs() < (x - y).abs()) {
                    cells = Some(pair);
                }
            }
        }
        let (x, y) = cells?;
        let band = (
            x.min(y).saturating_sub(half_width).max(across.0),
            x.max(y).saturating_add(half_width).min(across.1),
        );

        let a = Self::nearest(sides[0], 0, band, travel)?;
        let b = Self::nearest(sides[1], 1, band, travel)?;
        let from = along_span(&a.rect, travel).1 - i32::from(a.room.is_some());
        let to = (along_span(&b.rect, travel).0 + i32::from(b.room.is_some())).max(from);
        Some((band_rect(travel, band, from, to), [a, b]))
    }

    fn join(
        tree: &PartitionTree,
        built: &[Connector],
        parent: NodeId,
        half_width: i32,
        ids: &mut IdAllocator,
    ) -> Option<Connector> {
        let node = tree.node(parent)?;
        let [a, b] = node.children?;
        let travel = node.orientation.flipped();
        let across = across_span(&node.region, travel);

        let landings = [
            Self::landings(tree, built, a, travel),
            Self::landings(tree, built, b, travel),
        ];
        let sides = [landings[0].as_slice(), landings[1].as_slice()];
        let (bb, ends) = match Self::straight(sides, across, half_width, travel) {
            Some(found) => found,
            None => {
                trace!(parent = %parent, "no shared centreline, widening corridor");
                Self::hall(sides, across, half_width, travel)?
            }
        };

        // A side ending at a corridor is represented by its nearest room
        let cells = end_cells(&bb, travel);
        let rooms = RoomPair::new(
            ends[0].room.or_else(|| tree.nearest_leaf(a, cells[0]))?,
            ends[1].room.or_else(|| tree.nearest_leaf(b, cells[1]))?,
        );
        let leaves = tree.leaves_under(parent);
        let end_rooms = cells.map(|cell| {
            leaves
                .iter()
                .copied()
                .find(|&leaf| tree.room(leaf).is_some_and(|room| room.contains_point(cell)))
        });
        trace!(parent = %parent, ?bb, "tree corridor");

        Some(Connector::new(ids.connector(), bb, travel, rooms, end_rooms))
    }
}

impl Carver for TreeCarver {
    fn carve(
        &self,
        tree: &mut PartitionTree,
        half_width: i32,
        _rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> Vec<Connector> {
        let mut connectors = Vec::new();
        for id in tree.post_order() {
            let pending = tree.node(id).is_some_and(|n| !n.is_leaf() && !n.has_corridor());
            if !pending {
                continue;
            }
            let Some(connector) = Self::join(tree, &connectors, id, half_width, ids) else {
                continue;
            };
            if let Some(node) = tree.node_mut(id) {
                node.connector = Some(connector.id);
            }
            connectors.push(connector);
        }
        connectors
    }
}

/// Links every room pair a straight corridor can join
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatCarver;

impl FlatCarver {
    /// Try to join `a` (before) to `b` (after) along `travel`
    fn link(
        rooms: &[(NodeId, Rect)],
        (a_id, a): (NodeId, Rect),
        (b_id, b): (NodeId, Rect),
        travel: Orientation,
        half_width: i32,
        rng: &mut DungeonRng,
    ) -> Option<Rect> {
        let (_, a_end) = along_span(&a, travel);
        let (b_start, _) = along_span(&b, travel);
        if a_end > b_start {
            return None;
        }

        let (a_lo, a_hi) = centre_span(&a, travel, half_width);
        let (b_lo, b_hi) = centre_span(&b, travel, half_width);
        let lo = a_lo.max(b_lo);
        let hi = a_hi.min(b_hi);
        if lo > hi {
            return None;
        }

        let mut centres: Vec<i32> = (lo..=hi).collect();
        rng.shuffle(&mut centres);
        centres.into_iter().find_map(|centre| {
            let bb = corridor_rect(travel, centre, half_width, a_end, b_start);
            let blocked = rooms
                .iter()
                .any(|&(id, room)| id != a_id && id != b_id && room.intersects(&bb));
            (!blocked).then_some(bb)
        })
    }
}

impl Carver for FlatCarver {
    fn carve(
        &self,
        tree: &mut PartitionTree,
        half_width: i32,
        rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> Vec<Connector> {
        let rooms: Vec<(NodeId, Rect)> = tree
            .leaves()
            .into_iter()
            .filter_map(|leaf| tree.room(leaf).map(|room| (leaf, room)))
            .collect();

        let mut linked = BTreeSet::new();
        let mut connectors = Vec::new();
        for &a in &rooms {
            for &b in &rooms {
                if a.0 == b.0 {
                    continue;
                }
                let pair = RoomPair::new(a.0, b.0);
                if linked.contains(&pair) {
                    continue;
                }
                let found = Self::link(&rooms, a, b, Orientation::Horizontal, half_width, rng)
                    .map(|bb| (bb, Orientation::Horizontal))
                    .or_else(|| {
                        Self::link(&rooms, a, b, Orientation::Vertical, half_width, rng)
                            .map(|bb| (bb, Orientation::Vertical))
                    });
                let Some((bb, orientation)) = found else {
                    continue;
                };
                trace!(a = %a.0, b = %b.0, ?bb, "flat corridor");
                linked.insert(pair);
                connectors.push(Connector::new(
                    ids.connector(),
                    bb,
                    orientation,
                    pair,
                    [Some(a.0), Some(b.0)],
                ));
            }
        }
        connectors
    }
}

/// Tracks room connectivity with equivalence classes
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    /// Each room's equivalence class (rooms in same class are connected)
    classes: Vec<usize>,
}

impl ConnectivityTracker {
    /// Create a new tracker for the given number of rooms
    pub fn new(num_rooms: usize) -> Self {
        Self {
            classes: (0..num_rooms).collect(),
        }
    }

    /// Check if two rooms are connected (in same equivalence class)
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        if a >= self.classes.len() || b >= self.classes.len() {
            return false;
        }
        self.classes[a] == self.classes[b]
    }

    /// Merge the classes of `a` and `b`
    ///
    /// Returns false if they were already connected, i.e. the new edge
    /// closes a cycle.
    pub fn merge(&mut self, a: usize, b: usize) -> bool {
        if a >= self.classes.len() || b >= self.classes.len() {
            return false;
        }

        let old_class = self.classes[b];
        let new_class = self.classes[a];
        if old_class == new_class {
            return false;
        }

        for eq in &mut self.classes {
            if *eq == old_class {
                *eq = new_class;
            }
        }
        true
    }

    /// Check if all rooms are connected
    pub fn all_connected(&self) -> bool {
        match self.classes.first() {
            Some(&first) => self.classes.iter().all(|&c| c == first),
            None => true,
        }
    }
}
