use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell of the routing grid, addressed by (row, col).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BinCoord {
    pub row: u32,
    pub col: u32,
}

impl BinCoord {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Squared distance in bin units, used to order drains around a source.
    pub fn dist_sq(&self, other: BinCoord) -> u64 {
        let dr = self.row as i64 - other.row as i64;
        let dc = self.col as i64 - other.col as i64;
        (dr * dr + dc * dc) as u64
    }

    pub fn manhattan(&self, other: BinCoord) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for BinCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
