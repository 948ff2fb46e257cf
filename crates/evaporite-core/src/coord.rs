//! Integer block coordinates and directions.
//!
//! Axes: `+x` is east, `+y` is up, `+z` is south.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// A block position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Move `n` blocks in `dir`.
    pub fn offset(self, dir: Direction, n: i32) -> Self {
        let (dx, dy, dz) = dir.delta();
        Self::new(self.x + dx * n, self.y + dy * n, self.z + dz * n)
    }

    /// The neighbouring block in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        self.offset(dir, 1)
    }

    pub fn above(self) -> Self {
        self.step(Direction::Up)
    }

    pub fn below(self) -> Self {
        self.step(Direction::Down)
    }

    /// Translate by an arbitrary delta.
    pub fn translate(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// All six face-adjacent neighbours.
    pub fn neighbors(self) -> impl Iterator<Item = BlockPos> {
        Direction::ALL.into_iter().map(move |d| self.step(d))
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Unit offset for this direction.
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// The horizontal direction a controller's front face points to.
///
/// The tower extends behind the controller. "Right" and "left" are taken
/// from the point of view of someone standing in front of the controller and
/// looking at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn direction(self) -> Direction {
        match self {
            Facing::North => Direction::North,
            Facing::East => Direction::East,
            Facing::South => Direction::South,
            Facing::West => Direction::West,
        }
    }

    /// Into the tower, away from the front face.
    pub fn back(self) -> Direction {
        self.direction().opposite()
    }

    /// The viewer's right-hand side.
    pub fn right(self) -> Direction {
        match self {
            Facing::North => Direction::West,
            Facing::West => Direction::South,
            Facing::South => Direction::East,
            Facing::East => Direction::North,
        }
    }

    pub fn left(self) -> Direction {
        self.right().opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_moves_along_axis() {
        let p = BlockPos::new(1, 2, 3);
        assert_eq!(p.offset(Direction::East, 3), BlockPos::new(4, 2, 3));
        assert_eq!(p.offset(Direction::North, 2), BlockPos::new(1, 2, 1));
        assert_eq!(p.above(), BlockPos::new(1, 3, 3));
        assert_eq!(p.below().below(), BlockPos::new(1, 0, 3));
        assert_eq!(p.offset(Direction::West, -1), BlockPos::new(2, 2, 3));
    }

    #[test]
    fn opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn neighbors_are_adjacent() {
        let p = BlockPos::new(0, 0, 0);
        let n: Vec<_> = p.neighbors().collect();
        assert_eq!(n.len(), 6);
        for q in n {
            let d = (q.x - p.x).abs() + (q.y - p.y).abs() + (q.z - p.z).abs();
            assert_eq!(d, 1);
        }
    }

    #[test]
    fn facing_axes_are_perpendicular() {
        for f in Facing::ALL {
            let (rx, ry, rz) = f.right().delta();
            let (bx, by, bz) = f.back().delta();
            assert_eq!(rx * bx + ry * by + rz * bz, 0);
            assert_eq!(f.left(), f.right().opposite());
            assert_eq!(f.back(), f.direction().opposite());
        }
    }

    #[test]
    fn right_of_north_facing_is_west() {
        assert_eq!(Facing::North.right(), Direction::West);
        assert_eq!(Facing::South.right(), Direction::East);
        assert_eq!(Facing::East.back(), Direction::West);
    }
}
