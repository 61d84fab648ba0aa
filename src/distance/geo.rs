//! Great-circle distance on WGS84 coordinates.

use crate::models::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometres.
///
/// # Examples
///
/// ```
/// use u_busroute::distance::haversine_km;
/// use u_busroute::models::GeoPoint;
///
/// // One degree of latitude is ~111.2 km.
/// let d = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodes.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Arithmetic centroid of a set of coordinates.
///
/// Adequate for the city-scale extents routing works with. Returns `None`
/// for an empty slice.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    Some(GeoPoint::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(12.97, 77.59);
        assert!(haversine_km(p, p).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = GeoPoint::new(12.97, 77.59);
        let b = GeoPoint::new(13.02, 77.64);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_equator_longitude_degree() {
        let d = haversine_km(GeoPoint::new(0.0, 10.0), GeoPoint::new(0.0, 11.0));
        assert!((d - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(2.0, 4.0)]).expect("non-empty");
        assert_eq!(c, GeoPoint::new(1.0, 2.0));
        assert!(centroid(&[]).is_none());
    }
}
