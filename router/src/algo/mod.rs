pub mod lee;

pub use lee::{Backtrace, ClaimedBins, LeeSolver};

use std::fmt;

/// Heading of a single grid step. North is towards row 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
        };
        f.write_str(name)
    }
}

/// Order in which neighbours are scanned. It only decides ties, never
/// reachability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn from_clockwise(clockwise: bool) -> Self {
        if clockwise {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        }
    }

    #[inline]
    pub fn scan_order(self) -> [Direction; 4] {
        use Direction::*;
        match self {
            Rotation::Clockwise => [North, East, South, West],
            Rotation::CounterClockwise => [North, West, South, East],
        }
    }
}
