//! Binary space partition of a floor
//!
//! The tree is stored as an arena of [`PartitionNode`]s addressed by
//! [`NodeId`]. Each internal node owns exactly two children that tile its
//! region along its split axis; leaves are padded into rooms.

use hashbrown::HashMap;
use tracing::trace;

use crate::consts::PAD_RETRIES;
use crate::ids::{ConnectorId, IdAllocator, NodeId, StaircaseId};
use crate::rng::DungeonRng;

use super::rect::{Orientation, Point, Rect};

/// A region of the floor, either split in two or holding a room
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionNode {
    pub id: NodeId,
    /// Axis along which this region splits
    pub orientation: Orientation,
    /// Fraction of the split axis given to child 0, in `[0, 1)`
    pub split_fraction: f64,
    /// Area before padding
    pub region: Rect,
    /// Room carved out of the region (leaves only, after padding)
    pub room: Option<Rect>,
    pub children: Option<[NodeId; 2]>,
    /// Corridor joining the two children (tree strategy only)
    pub connector: Option<ConnectorId>,
    /// Depth from the root
    pub level: u32,
    pub staircase: Option<StaircaseId>,
}

impl PartitionNode {
    fn new(id: NodeId, region: Rect, orientation: Orientation, level: u32) -> Self {
        Self {
            id,
            orientation,
            split_fraction: 0.0,
            region,
            room: None,
            children: None,
            connector: None,
            level,
            staircase: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn has_corridor(&self) -> bool {
        self.connector.is_some()
    }

    pub fn has_staircase(&self) -> bool {
        self.staircase.is_some()
    }

    /// Bind a staircase to this room. A room takes at most one.
    pub fn bind_staircase(&mut self, staircase: StaircaseId) -> bool {
        if self.staircase.is_some() {
            return false;
        }
        self.staircase = Some(staircase);
        true
    }
}

/// Arena holding one floor's partition tree
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTree {
    nodes: Vec<PartitionNode>,
    index: HashMap<NodeId, usize>,
}

impl PartitionTree {
    /// A tree made of a single unsplit root
    pub fn new(region: Rect, orientation: Orientation, ids: &mut IdAllocator) -> Self {
        let root = PartitionNode::new(ids.node(), region, orientation, 0);
        let mut index = HashMap::new();
        index.insert(root.id, 0);
        Self {
            nodes: vec![root],
            index,
        }
    }

    /// Recursively partition `region`
    ///
    /// Every node draws a split fraction; it is split only when both pieces
    /// are at least `min_room_length` long. Child 0's subtree is built (and
    /// numbered) before child 1's.
    pub fn generate(
        region: Rect,
        orientation: Orientation,
        min_room_length: i32,
        rng: &mut DungeonRng,
        ids: &mut IdAllocator,
    ) -> Self {
        let mut tree = Self::new(region, orientation, ids);
        let mut stack = vec![tree.root_id()];

        while let Some(id) = stack.pop() {
            let Some(&idx) = tree.index.get(&id) else {
                continue;
            };
            let fraction = rng.fraction();
            let node = &mut tree.nodes[idx];
            node.split_fraction = fraction;

            let extent = node.region.len_along(node.orientation);
            let split0 = (extent as f64 * fraction).round() as i32;
            let split1 = extent - split0;
            if split0 < min_room_length || split1 < min_room_length {
                continue;
            }

            let [a, b] = tree.attach_children(idx, split0, ids);
            trace!(parent = %id, split0, split1, "split region");
            stack.push(b);
            stack.push(a);
        }

        tree
    }

    /// Split a leaf so that child 0 is `split0` long along its split axis
    ///
    /// Returns `None` if the node is unknown, already split, or `split0`
    /// would leave an empty child.
    pub fn split_node(
        &mut self,
        id: NodeId,
        split0: i32,
        ids: &mut IdAllocator,
    ) -> Option<[NodeId; 2]> {
        let idx = *self.index.get(&id)?;
        let node = &self.nodes[idx];
        let extent = node.region.len_along(node.orientation);
        if !node.is_leaf() || split0 <= 0 || split0 >= extent {
            return None;
        }
        self.nodes[idx].split_fraction = split0 as f64 / extent as f64;
        Some(self.attach_children(idx, split0, ids))
    }

    fn attach_children(&mut self, idx: usize, split0: i32, ids: &mut IdAllocator) -> [NodeId; 2] {
        let parent = &self.nodes[idx];
        let (r0, r1) = parent.region.split(parent.orientation, split0);
        let orientation = parent.orientation.flipped();
        let level = parent.level + 1;

        let child0 = PartitionNode::new(ids.node(), r0, orientation, level);
        let child1 = PartitionNode::new(ids.node(), r1, orientation, level);
        let children = [child0.id, child1.id];

        for child in [child0, child1] {
            self.index.insert(child.id, self.nodes.len());
            self.nodes.push(child);
        }
        self.nodes[idx].children = Some(children);
        children
    }

    pub fn root(&self) -> &PartitionNode {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> NodeId {
        self.nodes[0].id
    }

    pub fn node(&self, id: NodeId) -> Option<&PartitionNode> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PartitionNode> {
        self.index.get(&id).map(|&idx| &mut self.nodes[idx])
    }

    /// All nodes in construction order
    pub fn nodes(&self) -> impl Iterator<Item = &PartitionNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf ids, left to right (child 0 before child 1)
    pub fn leaves(&self) -> Vec<NodeId> {
        self.leaves_under(self.root_id())
    }

    /// Ids of the subtree rooted at `id`, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            found.push(id);
            if let Some([a, b]) = node.children {
                stack.push(b);
                stack.push(a);
            }
        }
        found
    }

    /// Leaf ids of the subtree rooted at `id`
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id)
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(|n| n.is_leaf()))
            .collect()
    }

    /// Node ids with both children listed before their parent
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root_id(), false)];
        while let Some((id, expanded)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            match node.children {
                Some([a, b]) if !expanded => {
                    stack.push((id, true));
                    stack.push((b, false));
                    stack.push((a, false));
                }
                _ => order.push(id),
            }
        }
        order
    }

    pub fn room(&self, id: NodeId) -> Option<Rect> {
        self.node(id).and_then(|n| n.room)
    }

    /// Set a leaf's room by hand. The room must lie inside the region.
    pub fn set_room(&mut self, id: NodeId, room: Rect) -> bool {
        match self.node_mut(id) {
            Some(node) if node.is_leaf() && node.region.contains(&room) && room.is_valid() => {
                node.room = Some(room);
                true
            }
            _ => false,
        }
    }

    /// Leaf under `id` whose room center lies closest to `target`
    pub fn nearest_leaf(&self, id: NodeId, target: Point) -> Option<NodeId> {
        self.leaves_under(id)
            .into_iter()
            .filter_map(|leaf| {
                let node = self.node(leaf)?;
                let center = node.room.unwrap_or(node.region).center();
                Some((center.distance(&target), leaf))
            })
            .min()
            .map(|(_, leaf)| leaf)
    }

    /// Carve a room out of every leaf
    ///
    /// Each side is padded by a random amount in `min_pad..=max_pad`; a
    /// candidate is kept once both sides are at least `min_room_length`.
    /// After [`PAD_RETRIES`] misses `min_pad` drops to 0, and after as many
    /// more the unpadded region is used.
    pub fn pad_rooms(
        &mut self,
        min_pad: i32,
        max_pad: i32,
        min_room_length: i32,
        rng: &mut DungeonRng,
    ) {
        for leaf in self.leaves() {
            let Some(&idx) = self.index.get(&leaf) else {
                continue;
            };
            let region = self.nodes[idx].region;
            let room = if region.r_len < min_room_length || region.c_len < min_room_length {
                region
            } else {
                pad_region(region, min_pad, max_pad, min_room_length, rng)
            };
            trace!(leaf = %leaf, ?room, "padded room");
            self.nodes[idx].room = Some(room);
        }
    }
}

fn pad_region(
    region: Rect,
    min_pad: i32,
    max_pad: i32,
    min_room_length: i32,
    rng: &mut DungeonRng,
) -> Rect {
    let mut min_pad = min_pad;
    for attempt in 0..PAD_RETRIES * 2 {
        if attempt == PAD_RETRIES {
            min_pad = 0;
        }
        let top = rng.range(min_pad, max_pad);
        let bottom = rng.range(min_pad, max_pad);
        let left = rng.range(min_pad, max_pad);
        let right = rng.range(min_pad, max_pad);

        let candidate = region.shrink(top, bottom, left, right);
        if candidate.r_len >= min_room_length && candidate.c_len >= min_room_length {
            return candidate;
        }
    }
    region
}
