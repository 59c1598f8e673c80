use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<f64> {
    #[inline]
    pub fn dist_sq(&self, other: Point<f64>) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    #[inline]
    pub fn manhattan(&self, other: Point<f64>) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// True when both points lie on one horizontal or vertical line.
    #[inline]
    pub fn is_aligned_with(&self, other: Point<f64>) -> bool {
        self.x == other.x || self.y == other.y
    }
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Point<T>;

    fn add(self, rhs: Self) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Point<T>;

    fn sub(self, rhs: Self) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let a = Point::new(1.0, 2.0);
        assert!(a.is_aligned_with(Point::new(1.0, 9.0)));
        assert!(a.is_aligned_with(Point::new(-4.0, 2.0)));
        assert!(!a.is_aligned_with(Point::new(3.0, 3.0)));
    }

    #[test]
    fn test_distances() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.dist_sq(b), 25.0);
        assert_eq!(a.manhattan(b), 7.0);
        assert_eq!(b - a, b);
        assert_eq!(a + b, b);
    }
}
