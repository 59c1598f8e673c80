use crate::algo::Direction;
use lee_common::geom::coord::BinCoord;
use lee_common::grid::BinGrids;

/// The view of the bin grid the maze router needs: its shape and the
/// blockage mask. Net occupancy is never an obstacle.
pub trait RoutingGrid {
    fn rows(&self) -> u32;
    fn cols(&self) -> u32;
    fn is_blocked(&self, bin: BinCoord) -> bool;

    #[inline]
    fn len(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    #[inline]
    fn index(&self, bin: BinCoord) -> usize {
        bin.row as usize * self.cols() as usize + bin.col as usize
    }

    /// The neighbour one step away, or `None` past the grid edge.
    #[inline]
    fn neighbor(&self, bin: BinCoord, dir: Direction) -> Option<BinCoord> {
        match dir {
            Direction::North if bin.row > 0 => Some(BinCoord::new(bin.row - 1, bin.col)),
            Direction::East if bin.col + 1 < self.cols() => {
                Some(BinCoord::new(bin.row, bin.col + 1))
            }
            Direction::South if bin.row + 1 < self.rows() => {
                Some(BinCoord::new(bin.row + 1, bin.col))
            }
            Direction::West if bin.col > 0 => Some(BinCoord::new(bin.row, bin.col - 1)),
            _ => None,
        }
    }
}

impl RoutingGrid for BinGrids {
    #[inline]
    fn rows(&self) -> u32 {
        BinGrids::rows(self)
    }

    #[inline]
    fn cols(&self) -> u32 {
        BinGrids::cols(self)
    }

    #[inline]
    fn is_blocked(&self, bin: BinCoord) -> bool {
        BinGrids::is_blocked(self, bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lee_common::grid::BinConverter;

    #[test]
    fn test_neighbors_respect_edges() {
        let grids = BinGrids::new(BinConverter::new(3.0, 2.0, 2, 3));
        let corner = BinCoord::new(0, 0);
        assert_eq!(grids.neighbor(corner, Direction::North), None);
        assert_eq!(grids.neighbor(corner, Direction::West), None);
        assert_eq!(
            grids.neighbor(corner, Direction::East),
            Some(BinCoord::new(0, 1))
        );
        assert_eq!(
            grids.neighbor(corner, Direction::South),
            Some(BinCoord::new(1, 0))
        );

        let far = BinCoord::new(1, 2);
        assert_eq!(grids.neighbor(far, Direction::East), None);
        assert_eq!(grids.neighbor(far, Direction::South), None);
        assert_eq!(RoutingGrid::index(&grids, far), 5);
    }
}
