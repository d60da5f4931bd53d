//! Rectangles, points and split orientation
//!
//! All geometry is in cell coordinates: `r` grows downward, `c` grows to the
//! right. A room rectangle includes its wall ring.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rng::DungeonRng;

/// Axis along which a region is cut
///
/// `Vertical` cuts with a vertical line, so the children sit side by side
/// and the split axis is the column axis. `Horizontal` cuts with a
/// horizontal line and stacks the children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    /// The other orientation
    pub const fn flipped(self) -> Self {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }
}

/// A cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub r: i32,
    pub c: i32,
}

impl Point {
    pub const fn new(r: i32, c: i32) -> Self {
        Self { r, c }
    }

    /// Manhattan distance
    pub fn distance(&self, other: &Point) -> i32 {
        (self.r - other.r).abs() + (self.c - other.c).abs()
    }
}

/// An axis-aligned rectangle given by its top-left cell and its lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top row
    pub r: i32,
    /// Left column
    pub c: i32,
    /// Number of rows
    pub r_len: i32,
    /// Number of columns
    pub c_len: i32,
}

impl Rect {
    pub const fn new(r: i32, c: i32, r_len: i32, c_len: i32) -> Self {
        Self { r, c, r_len, c_len }
    }

    /// Row one past the bottom edge
    pub const fn bottom(&self) -> i32 {
        self.r + self.r_len
    }

    /// Column one past the right edge
    pub const fn right(&self) -> i32 {
        self.c + self.c_len
    }

    /// Check if the rectangle has positive area
    pub const fn is_valid(&self) -> bool {
        self.r_len > 0 && self.c_len > 0
    }

    pub const fn area(&self) -> i32 {
        if self.is_valid() {
            self.r_len * self.c_len
        } else {
            0
        }
    }

    /// Length along the split axis of `orientation`
    pub const fn len_along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Vertical => self.c_len,
            Orientation::Horizontal => self.r_len,
        }
    }

    /// Center cell (rounded toward the top-left)
    pub fn center(&self) -> Point {
        Point::new(self.r + (self.r_len - 1).max(0) / 2, self.c + (self.c_len - 1).max(0) / 2)
    }

    pub const fn contains_point(&self, p: Point) -> bool {
        p.r >= self.r && p.r < self.bottom() && p.c >= self.c && p.c < self.right()
    }

    /// Check if this rectangle contains another
    pub const fn contains(&self, other: &Rect) -> bool {
        self.r <= other.r
            && self.c <= other.c
            && self.bottom() >= other.bottom()
            && self.right() >= other.right()
    }

    /// Check if this rectangle shares at least one cell with another
    pub const fn intersects(&self, other: &Rect) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.r < other.bottom()
            && other.r < self.bottom()
            && self.c < other.right()
            && other.c < self.right()
    }

    /// Calculate the intersection of two rectangles
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let r = self.r.max(other.r);
        let c = self.c.max(other.c);
        Some(Rect::new(
            r,
            c,
            self.bottom().min(other.bottom()) - r,
            self.right().min(other.right()) - c,
        ))
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let r = self.r.min(other.r);
        let c = self.c.min(other.c);
        Rect::new(
            r,
            c,
            self.bottom().max(other.bottom()) - r,
            self.right().max(other.right()) - c,
        )
    }

    /// Shrink each side independently. The result may be invalid.
    pub const fn shrink(&self, top: i32, bottom: i32, left: i32, right: i32) -> Rect {
        Rect::new(
            self.r.saturating_add(top),
            self.c.saturating_add(left),
            self.r_len.saturating_sub(top).saturating_sub(bottom),
            self.c_len.saturating_sub(left).saturating_sub(right),
        )
    }

    /// Interior of a room rectangle (walls removed)
    pub const fn interior(&self) -> Rect {
        self.shrink(1, 1, 1, 1)
    }

    /// Cut along `orientation` so that the first piece is `split0` long
    pub const fn split(&self, orientation: Orientation, split0: i32) -> (Rect, Rect) {
        match orientation {
            Orientation::Vertical => (
                Rect::new(self.r, self.c, self.r_len, split0),
                Rect::new(self.r, self.c + split0, self.r_len, self.c_len - split0),
            ),
            Orientation::Horizontal => (
                Rect::new(self.r, self.c, split0, self.c_len),
                Rect::new(self.r + split0, self.c, self.r_len - split0, self.c_len),
            ),
        }
    }

    /// Uniformly random cell inside the rectangle
    pub fn random_point(&self, rng: &mut DungeonRng) -> Point {
        Point::new(
            self.r + rng.rn2(self.r_len.max(1) as u32) as i32,
            self.c + rng.rn2(self.c_len.max(1) as u32) as i32,
        )
    }
}
