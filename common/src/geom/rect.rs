use super::point::Point;

#[derive(Clone, Copy, Debug, Default)]
pub struct Rect {
    pub min: Point<f64>,
    pub max: Point<f64>,
}

impl Rect {
    pub fn new(min: Point<f64>, max: Point<f64>) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle enclosing every point. Returns `None` for an empty set.
    pub fn bounding<I: IntoIterator<Item = Point<f64>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect::new(first, first);
        for p in iter {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
    pub fn half_perimeter(&self) -> f64 {
        self.width() + self.height()
    }
    pub fn center(&self) -> Point<f64> {
        Point::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
        )
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, p: Point<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let pts = [
            Point::new(2.0, 8.0),
            Point::new(6.0, 1.0),
            Point::new(4.0, 4.0),
        ];
        let bb = Rect::bounding(pts).unwrap();
        assert_eq!(bb.half_perimeter(), 4.0 + 7.0);
        assert_eq!(bb.center(), Point::new(4.0, 4.5));
        assert!(Rect::bounding(Vec::new()).is_none());
    }

    #[test]
    fn test_touching_rects_do_not_overlap() {
        let a = Rect::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = Rect::new(Point::new(1.0, 0.0), Point::new(2.0, 1.0));
        assert!(!a.overlaps(&b));
    }
}
