pub mod conversion;
pub mod dense;

pub use conversion::BinConverter;
pub use dense::DenseGrid;

use crate::geom::coord::BinCoord;
use crate::geom::point::Point;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("bins already exist for this design; remove them first")]
    AlreadyExists,
    #[error("there are no bins created")]
    Missing,
    #[error("bin grid must be at least 1x1, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("bin ({row},{col}) is out of bounds for a {rows}x{cols} grid")]
    OutOfBounds { row: u32, col: u32, rows: u32, cols: u32 },
}

/// The three same-sized grids of a design: net occupancy, element occupancy
/// and the blockage mask.
#[derive(Clone, Debug)]
pub struct BinGrids {
    converter: BinConverter,
    occupancy: DenseGrid,
    elements: DenseGrid,
    blockages: DenseGrid,
}

impl BinGrids {
    pub fn new(converter: BinConverter) -> Self {
        let (rows, cols) = (converter.rows(), converter.cols());
        Self {
            converter,
            occupancy: DenseGrid::new(rows, cols),
            elements: DenseGrid::new(rows, cols),
            blockages: DenseGrid::new(rows, cols),
        }
    }

    pub fn rows(&self) -> u32 {
        self.converter.rows()
    }

    pub fn cols(&self) -> u32 {
        self.converter.cols()
    }

    pub fn converter(&self) -> &BinConverter {
        &self.converter
    }

    pub fn occupancy(&self) -> &DenseGrid {
        &self.occupancy
    }

    pub fn elements(&self) -> &DenseGrid {
        &self.elements
    }

    pub fn blockages(&self) -> &DenseGrid {
        &self.blockages
    }

    pub fn coordinate_to_bin(&self, p: Point<f64>) -> BinCoord {
        self.converter.to_bin(p)
    }

    pub fn bin_center(&self, bin: BinCoord) -> Point<f64> {
        self.converter.bin_center(bin)
    }

    pub fn check_bounds(&self, bin: BinCoord) -> Result<(), GridError> {
        if self.blockages.contains(bin) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                row: bin.row,
                col: bin.col,
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    pub fn set_blockage(&mut self, bin: BinCoord, blocked: bool) -> Result<(), GridError> {
        self.check_bounds(bin)?;
        self.blockages.set(bin, blocked as u32);
        Ok(())
    }

    pub fn get_blockage(&self, bin: BinCoord) -> Result<bool, GridError> {
        self.check_bounds(bin)?;
        Ok(self.blockages.get(bin) != 0)
    }

    /// Unchecked variant for bins produced by the grid itself.
    #[inline]
    pub fn is_blocked(&self, bin: BinCoord) -> bool {
        self.blockages.get(bin) != 0
    }

    pub fn increment_occupancy(&mut self, bin: BinCoord) {
        self.occupancy.increment(bin);
    }

    pub fn clear_occupancy(&mut self) {
        self.occupancy.fill(0);
    }

    pub(crate) fn place_element(&mut self, bin: BinCoord) {
        self.elements.increment(bin);
    }

    pub(crate) fn clear_elements(&mut self) {
        self.elements.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockage_bounds() {
        let mut grids = BinGrids::new(BinConverter::new(10.0, 10.0, 2, 3));
        assert!(grids.set_blockage(BinCoord::new(1, 2), true).is_ok());
        assert_eq!(grids.get_blockage(BinCoord::new(1, 2)), Ok(true));
        assert_eq!(grids.get_blockage(BinCoord::new(0, 0)), Ok(false));
        assert_eq!(
            grids.set_blockage(BinCoord::new(2, 0), true),
            Err(GridError::OutOfBounds { row: 2, col: 0, rows: 2, cols: 3 })
        );
        grids.set_blockage(BinCoord::new(1, 2), false).unwrap();
        assert!(!grids.is_blocked(BinCoord::new(1, 2)));
    }

    #[test]
    fn test_occupancy_is_independent_of_blockages() {
        let mut grids = BinGrids::new(BinConverter::new(4.0, 4.0, 4, 4));
        grids.increment_occupancy(BinCoord::new(2, 2));
        assert_eq!(grids.occupancy().get(BinCoord::new(2, 2)), 1);
        assert!(!grids.is_blocked(BinCoord::new(2, 2)));
        grids.clear_occupancy();
        assert_eq!(grids.occupancy().total(), 0);
    }
}
