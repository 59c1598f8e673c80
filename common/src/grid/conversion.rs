use crate::geom::coord::BinCoord;
use crate::geom::point::Point;
use serde::Serialize;

/// Maps layout coordinates to bins and back.
///
/// The layout spans the core plus a symmetric offset on each side, so a bin is
/// `(core.width + 2 * x_offset) / cols` wide and
/// `(core.height + 2 * y_offset) / rows` tall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BinConverter {
    bin_width: f64,
    bin_height: f64,
    rows: u32,
    cols: u32,
}

impl BinConverter {
    pub fn new(layout_w: f64, layout_h: f64, rows: u32, cols: u32) -> Self {
        Self {
            bin_width: layout_w / cols as f64,
            bin_height: layout_h / rows as f64,
            rows,
            cols,
        }
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn bin_height(&self) -> f64 {
        self.bin_height
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Coordinates on the right/top boundary (or beyond) land in the last bin.
    pub fn to_bin(&self, p: Point<f64>) -> BinCoord {
        let col = (p.x / self.bin_width).floor().max(0.0).min((self.cols - 1) as f64) as u32;
        let row = (p.y / self.bin_height).floor().max(0.0).min((self.rows - 1) as f64) as u32;

        BinCoord::new(row, col)
    }

    pub fn bin_center(&self, bin: BinCoord) -> Point<f64> {
        Point::new(
            (bin.col as f64 + 0.5) * self.bin_width,
            (bin.row as f64 + 0.5) * self.bin_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_maps_into_last_bin() {
        let conv = BinConverter::new(100.0, 50.0, 5, 10);
        assert_eq!(conv.to_bin(Point::new(100.0, 50.0)), BinCoord::new(4, 9));
        assert_eq!(conv.to_bin(Point::new(0.0, 0.0)), BinCoord::new(0, 0));
        assert_eq!(conv.to_bin(Point::new(-3.0, -1.0)), BinCoord::new(0, 0));
        assert_eq!(conv.to_bin(Point::new(19.99, 10.0)), BinCoord::new(1, 1));
    }

    #[test]
    fn test_every_coordinate_in_range() {
        let conv = BinConverter::new(37.0, 23.0, 7, 11);
        let mut x = 0.0;
        while x <= 37.0 {
            let mut y = 0.0;
            while y <= 23.0 {
                let b = conv.to_bin(Point::new(x, y));
                assert!(b.row < 7 && b.col < 11, "({x},{y}) -> {b}");
                y += 0.25;
            }
            x += 0.25;
        }
    }

    #[test]
    fn test_center_round_trips() {
        let conv = BinConverter::new(40.0, 40.0, 4, 4);
        let bin = BinCoord::new(2, 3);
        let c = conv.bin_center(bin);
        assert_eq!(c, Point::new(35.0, 25.0));
        assert_eq!(conv.to_bin(c), bin);
    }
}
