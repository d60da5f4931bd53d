//! Staircases linking rooms on adjacent floors

use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, StaircaseId};

use super::rect::Point;

/// A staircase between a room on one floor and a room on the floor below
///
/// Both rooms share world coordinates, so `pos` lies inside both interiors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staircase {
    pub id: StaircaseId,
    pub pos: Point,
    pub upper_floor: usize,
    pub upper_room: NodeId,
    pub lower_floor: usize,
    pub lower_room: NodeId,
}

impl Staircase {
    pub fn touches(&self, floor: usize) -> bool {
        self.upper_floor == floor || self.lower_floor == floor
    }

    /// The room this staircase opens into on `floor`
    pub fn room_on(&self, floor: usize) -> Option<NodeId> {
        if floor == self.upper_floor {
            Some(self.upper_room)
        } else if floor == self.lower_floor {
            Some(self.lower_room)
        } else {
            None
        }
    }

    /// Both endpoints as (floor, room)
    pub fn endpoints(&self) -> [(usize, NodeId); 2] {
        [
            (self.upper_floor, self.upper_room),
            (self.lower_floor, self.lower_room),
        ]
    }
}
