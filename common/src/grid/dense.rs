use crate::geom::coord::BinCoord;
use serde::Serialize;

/// Row-major 2-D array of bin counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DenseGrid {
    rows: u32,
    cols: u32,
    cells: Vec<u32>,
}

impl DenseGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        let size = (rows as usize) * (cols as usize);

        if size > 100_000_000 {
            log::warn!(
                "Allocating large DenseGrid: {} bins. Ensure sufficient RAM.",
                size
            );
        }

        Self {
            rows,
            cols,
            cells: vec![0; size],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn contains(&self, bin: BinCoord) -> bool {
        bin.row < self.rows && bin.col < self.cols
    }

    #[inline(always)]
    pub fn index(&self, bin: BinCoord) -> usize {
        (bin.row as usize) * (self.cols as usize) + (bin.col as usize)
    }

    #[inline(always)]
    pub fn coord(&self, idx: usize) -> BinCoord {
        let cols = self.cols as usize;
        BinCoord::new((idx / cols) as u32, (idx % cols) as u32)
    }

    /// Panics on an out-of-range bin; callers validate at the boundary.
    #[inline]
    pub fn get(&self, bin: BinCoord) -> u32 {
        self.cells[self.index(bin)]
    }

    #[inline]
    pub fn set(&mut self, bin: BinCoord, value: u32) {
        let idx = self.index(bin);
        self.cells[idx] = value;
    }

    #[inline]
    pub fn increment(&mut self, bin: BinCoord) {
        let idx = self.index(bin);
        self.cells[idx] = self.cells[idx].saturating_add(1);
    }

    pub fn fill(&mut self, value: u32) {
        self.cells.fill(value);
    }

    pub fn max(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    pub fn count_nonzero(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BinCoord, u32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.coord(i), v))
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.cols.max(1) as usize)
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let mut g = DenseGrid::new(3, 4);
        g.increment(BinCoord::new(2, 1));
        g.increment(BinCoord::new(2, 1));
        g.set(BinCoord::new(0, 3), 7);

        assert_eq!(g.index(BinCoord::new(2, 1)), 9);
        assert_eq!(g.coord(9), BinCoord::new(2, 1));
        assert_eq!(g.get(BinCoord::new(2, 1)), 2);
        assert_eq!(g.max(), 7);
        assert_eq!(g.total(), 9);
        assert_eq!(g.count_nonzero(), 2);

        let rows = g.to_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![0, 0, 0, 7]);
        assert_eq!(rows[2][1], 2);
    }

    #[test]
    fn test_contains() {
        let g = DenseGrid::new(2, 5);
        assert!(g.contains(BinCoord::new(1, 4)));
        assert!(!g.contains(BinCoord::new(2, 0)));
        assert!(!g.contains(BinCoord::new(0, 5)));
    }
}
