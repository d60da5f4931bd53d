//! Cell kinds of a rasterized floor

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// What occupies a cell once a floor's topology is rasterized
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellType {
    #[default]
    Stone = 0,
    Wall = 1,
    Floor = 2,
    Corridor = 3,
    /// Toggleable door in a wall
    Door = 4,
    /// Open gap where a corridor meets a room or another corridor
    Passage = 5,
    Stairs = 6,
}

impl CellType {
    /// Check if this is passable (can walk through, doors included)
    pub const fn is_passable(&self) -> bool {
        matches!(
            self,
            CellType::Floor
                | CellType::Corridor
                | CellType::Door
                | CellType::Passage
                | CellType::Stairs
        )
    }

    /// Get the display character for this cell type
    pub const fn symbol(&self) -> char {
        match self {
            CellType::Stone => ' ',
            CellType::Wall => '#',
            CellType::Floor => '.',
            CellType::Corridor => ',',
            CellType::Door => '+',
            CellType::Passage => '\'',
            CellType::Stairs => '>',
        }
    }
}
