//! Generation constants and parameter defaults

/// Default floor extent (rows, cols)
pub const DEFAULT_ROWS: i32 = 29;
pub const DEFAULT_COLS: i32 = 79;

/// Largest accepted floor side
pub const MAX_WORLD_LENGTH: i32 = 1 << 12;

/// Smallest room side (walls included) a split or a padded room may produce
pub const DEFAULT_MIN_ROOM_LENGTH: i32 = 4;

/// Room padding bounds, per side
pub const DEFAULT_PAD_MIN: i32 = 1;
pub const DEFAULT_PAD_MAX: i32 = 4;

/// Corridor half width (corridors are twice this thick)
pub const DEFAULT_CORRIDOR_HALF_WIDTH: i32 = 1;

/// Locked door budget per floor
pub const DEFAULT_MAX_LOCKED_DOORS: u32 = 2;

/// Staircase chance is 1 in this many per candidate room pair
pub const DEFAULT_STAIRCASE_CHANCE: u32 = 2;

/// Padding attempts before `min_pad` is relaxed to 0, and again after
pub const PAD_RETRIES: u32 = 20;
