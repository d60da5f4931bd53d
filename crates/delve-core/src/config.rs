//! Generation parameters
//!
//! One [`FloorParams`] record per floor, bundled with the seed and the
//! cross-floor settings in a [`DungeonConfig`] that loads from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::dungeon::{CorridorStrategy, Orientation};
use crate::error::ConfigError;

/// Parameters for a single floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorParams {
    /// Smallest side length a partition or a padded room may have
    pub min_room_length: i32,
    /// Floor extent as (rows, cols)
    pub world_size: (i32, i32),
    /// Orientation of the root split
    pub first_split_orientation: Orientation,
    pub room_padding_min: i32,
    pub room_padding_max: i32,
    /// Corridors are `2 * min_corridor_half_width` cells thick
    pub min_corridor_half_width: i32,
    pub max_num_locked_doors: u32,
    /// Unlocked corridor ends become open gaps instead of doors
    pub allow_passageways: bool,
    pub corridor_strategy: CorridorStrategy,
}

impl Default for FloorParams {
    fn default() -> Self {
        Self {
            min_room_length: DEFAULT_MIN_ROOM_LENGTH,
            world_size: (DEFAULT_ROWS, DEFAULT_COLS),
            first_split_orientation: Orientation::Vertical,
            room_padding_min: DEFAULT_PAD_MIN,
            room_padding_max: DEFAULT_PAD_MAX,
            min_corridor_half_width: DEFAULT_CORRIDOR_HALF_WIDTH,
            max_num_locked_doors: DEFAULT_MAX_LOCKED_DOORS,
            allow_passageways: true,
            corridor_strategy: CorridorStrategy::Flat,
        }
    }
}

impl FloorParams {
    /// Check parameter ranges
    ///
    /// Small extents are not an error: they simply produce a single
    /// unsplit room. Sides, padding and corridor width are all capped at
    /// [`MAX_WORLD_LENGTH`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_room_length < 1 {
            return Err(ConfigError::MinRoomLength(self.min_room_length));
        }
        let (rows, cols) = self.world_size;
        if rows < 1 || cols < 1 {
            return Err(ConfigError::WorldSize { rows, cols });
        }
        if rows > MAX_WORLD_LENGTH || cols > MAX_WORLD_LENGTH {
            return Err(ConfigError::WorldTooLarge {
                rows,
                cols,
                max: MAX_WORLD_LENGTH,
            });
        }
        if self.room_padding_min < 0 || self.room_padding_max < self.room_padding_min {
            return Err(ConfigError::PaddingRange {
                min: self.room_padding_min,
                max: self.room_padding_max,
            });
        }
        if self.room_padding_max > MAX_WORLD_LENGTH {
            return Err(ConfigError::PaddingTooLarge {
                max: self.room_padding_max,
                limit: MAX_WORLD_LENGTH,
            });
        }
        if self.min_corridor_half_width < 1 {
            return Err(ConfigError::CorridorHalfWidth(self.min_corridor_half_width));
        }
        if self.min_corridor_half_width > MAX_WORLD_LENGTH {
            return Err(ConfigError::CorridorTooWide {
                half_width: self.min_corridor_half_width,
                limit: MAX_WORLD_LENGTH,
            });
        }
        Ok(())
    }
}

/// Complete dungeon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Floors from the top down
    pub floors: Vec<FloorParams>,
    /// Each candidate room pair gets a staircase with probability 1/n
    pub staircase_chance: u32,
    /// Floor the player starts on; `None` selects the lowest floor
    pub start_floor: Option<usize>,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            seed: None,
            floors: vec![FloorParams::default(); 3],
            staircase_chance: DEFAULT_STAIRCASE_CHANCE,
            start_floor: None,
        }
    }
}

impl DungeonConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DungeonConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.floors.is_empty() {
            return Err(ConfigError::NoFloors);
        }
        for (floor, params) in self.floors.iter().enumerate() {
            params.validate().map_err(|source| ConfigError::Floor {
                floor,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }
}
