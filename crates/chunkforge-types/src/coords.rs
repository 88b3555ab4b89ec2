//! Cell positions, region coordinates, and step directions.
//!
//! The world is a grid of cells addressed by [`CellPos`]. Cells are grouped
//! into fixed-width square columns called regions, addressed by
//! [`RegionCoord`]. The mapping between the two depends on the region width
//! of the space, which lives in [`RegionLayout`](crate::RegionLayout).
//!
//! All coordinate arithmetic saturates at the `i32` bounds instead of
//! wrapping.

use serde::{Deserialize, Serialize};

/// One of the six axis-aligned unit steps between neighbouring cells.
///
/// Horizontal rotation follows the compass: `North -> East -> South -> West`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards negative y.
    Down,
    /// Towards positive y.
    Up,
    /// Towards negative z.
    North,
    /// Towards positive z.
    South,
    /// Towards negative x.
    West,
    /// Towards positive x.
    East,
}

impl Direction {
    /// The four horizontal directions in clockwise order starting at north.
    pub const HORIZONTAL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Return the `(dx, dy, dz)` unit step for this direction.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Return the direction pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Rotate a quarter turn clockwise around the vertical axis.
    ///
    /// Vertical directions are returned unchanged.
    pub const fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::Up | Self::Down => self,
        }
    }

    /// Rotate a quarter turn counter-clockwise around the vertical axis.
    ///
    /// Vertical directions are returned unchanged.
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
            Self::Up | Self::Down => self,
        }
    }

    /// Whether this direction lies in the horizontal plane.
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Self::Up | Self::Down)
    }
}

/// Absolute position of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl CellPos {
    /// Create a cell position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return the neighbouring position one step in `direction`.
    pub const fn relative(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Return the same column at a different height.
    pub const fn at_y(self, y: i32) -> Self {
        Self { x: self.x, y, z: self.z }
    }
}

impl core::fmt::Display for CellPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Coordinate of a region in the horizontal region grid of one space.
///
/// Immutable value type; unique per `(space, x, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionCoord {
    /// Region column along the east-west axis.
    pub x: i32,
    /// Region row along the north-south axis.
    pub z: i32,
}

impl RegionCoord {
    /// Create a region coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Return the coordinate of the adjacent region in a horizontal
    /// direction. Vertical directions return `self`.
    pub const fn neighbour(self, direction: Direction) -> Self {
        let (dx, _, dz) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }
}

impl core::fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
