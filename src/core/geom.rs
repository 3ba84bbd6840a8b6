//! Grid Geometry
//!
//! Integer cell coordinates. Rows are half-block units, row 0 is the top
//! of the level and y grows downward.

use serde::{Serialize, Deserialize};

/// Number of columns in every level.
pub const GRID_WIDTH: i32 = 20;

/// Maximum number of (half-block) rows in a level.
pub const MAX_GRID_HEIGHT: i32 = 25;

/// Vertical sub-units per row for in-flight domino displacement.
pub const ROW_UNITS: i8 = 4;

/// A cell coordinate. May be out of range; the grid checks bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    /// Column
    pub x: i32,
    /// Row (half-block units)
    pub y: i32,
}

impl CellPos {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by a delta.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Cell one row up.
    #[inline]
    pub const fn up(self) -> Self {
        self.offset(0, -1)
    }

    /// Cell one row down.
    #[inline]
    pub const fn down(self) -> Self {
        self.offset(0, 1)
    }

    /// Neighbour in the given facing.
    #[inline]
    pub const fn toward(self, facing: Facing) -> Self {
        self.offset(facing.dx(), 0)
    }

    /// Is this a full-floor row (as opposed to a half step row)?
    #[inline]
    pub const fn on_even_row(self) -> bool {
        self.y % 2 == 0
    }
}

/// Horizontal facing of the ant or of a push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Toward column 0
    Left,
    /// Toward the last column
    Right,
}

impl Facing {
    /// Column delta for this facing.
    #[inline]
    pub const fn dx(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    /// Domino direction value for this facing.
    #[inline]
    pub const fn dir(self) -> i8 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    /// Reverse facing.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Facing for a signed direction.
    pub fn from_dir(dir: i32) -> Option<Self> {
        match dir.signum() {
            -1 => Some(Facing::Left),
            1 => Some(Facing::Right),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        let p = CellPos::new(4, 6);
        assert_eq!(p.up(), CellPos::new(4, 5));
        assert_eq!(p.down(), CellPos::new(4, 7));
        assert_eq!(p.toward(Facing::Left), CellPos::new(3, 6));
        assert_eq!(p.toward(Facing::Right), CellPos::new(5, 6));
        assert!(p.on_even_row());
        assert!(!p.down().on_even_row());
    }

    #[test]
    fn test_facing_from_dir() {
        assert_eq!(Facing::from_dir(-20), Some(Facing::Left));
        assert_eq!(Facing::from_dir(1), Some(Facing::Right));
        assert_eq!(Facing::from_dir(0), None);
        assert_eq!(Facing::Left.opposite(), Facing::Right);
    }
}
