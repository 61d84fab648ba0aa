//! Symmetric distance matrix.

use crate::models::GeoPoint;

use super::geo::haversine_km;

/// Symmetric pairwise distances with a zero diagonal.
///
/// Only the strict upper triangle is stored, row by row: entry `(i, j)` with
/// `i < j` lives at `i * (2n - i - 1) / 2 + (j - i - 1)`.
///
/// # Examples
///
/// ```
/// use u_busroute::distance::DistanceMatrix;
/// use u_busroute::models::GeoPoint;
///
/// let dm = DistanceMatrix::from_points(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0)]);
/// assert!((dm.get(0, 1) - 111.19).abs() < 0.01);
/// assert_eq!(dm.get(1, 0), dm.get(0, 1));
/// assert_eq!(dm.size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    upper: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Haversine kilometres between every pair of `points`.
    pub fn from_points(points: &[GeoPoint]) -> Self {
        let size = points.len();
        let mut upper = Vec::with_capacity(size * size.saturating_sub(1) / 2);
        for (i, &a) in points.iter().enumerate() {
            upper.extend(points[i + 1..].iter().map(|&b| haversine_km(a, b)));
        }
        Self { upper, size }
    }

    /// Copy with every entry multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            upper: self.upper.iter().map(|d| d * factor).collect(),
            size: self.size,
        }
    }

    /// Entry between two indices, in either order.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, a: usize, b: usize) -> f64 {
        assert!(a < self.size && b < self.size, "index out of bounds");
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.upper[self.offset(a, b)],
            std::cmp::Ordering::Greater => self.upper[self.offset(b, a)],
        }
    }

    /// Number of points.
    pub fn size(&self) -> usize {
        self.size
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        i * (2 * self.size - i - 1) / 2 + (j - i - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> DistanceMatrix {
        DistanceMatrix::from_points(&[
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 3.0),
        ])
    }

    #[test]
    fn test_packed_layout() {
        let dm = line();
        assert_eq!(dm.size(), 4);
        assert_eq!(dm.upper.len(), 6);
        let unit = dm.get(0, 1);
        for i in 0..4 {
            assert_eq!(dm.get(i, i), 0.0);
            for j in 0..4 {
                let expected = unit * (i as f64 - j as f64).abs();
                assert!((dm.get(i, j) - expected).abs() < 1e-6, "({i}, {j})");
            }
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(DistanceMatrix::from_points(&[]).size(), 0);
        let one = DistanceMatrix::from_points(&[GeoPoint::new(1.0, 1.0)]);
        assert_eq!(one.get(0, 0), 0.0);
    }

    #[test]
    fn test_scaled() {
        let dm = line();
        let twice = dm.scaled(2.0);
        assert!((twice.get(3, 1) - 2.0 * dm.get(1, 3)).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_out_of_bounds() {
        line().get(0, 4);
    }
}
