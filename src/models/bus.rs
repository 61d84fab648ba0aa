//! Bus type with capacity and fuel parameters.

use serde::{Deserialize, Serialize};

/// Default fuel efficiency in kilometres per litre.
pub const DEFAULT_KM_PER_LITRE: f64 = 8.0;

/// Operational status of a bus. Only [`Active`](BusStatus::Active) buses
/// receive routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusStatus {
    /// In service.
    #[default]
    Active,
    /// Temporarily out of service.
    Maintenance,
    /// Permanently out of service.
    Retired,
}

/// A bus that can serve one route.
///
/// # Examples
///
/// ```
/// use u_busroute::models::{Bus, BusStatus};
///
/// let b = Bus::new(3, 45).with_fuel_efficiency(6.5);
/// assert_eq!(b.capacity(), 45);
/// assert_eq!(b.status(), BusStatus::Active);
/// assert!((b.fuel_litres(13.0) - 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    id: u64,
    capacity: u32,
    km_per_litre: f64,
    status: BusStatus,
}

impl Bus {
    /// Creates an active bus with the default fuel efficiency.
    pub fn new(id: u64, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            km_per_litre: DEFAULT_KM_PER_LITRE,
            status: BusStatus::Active,
        }
    }

    /// Sets fuel efficiency in km per litre.
    pub fn with_fuel_efficiency(mut self, km_per_litre: f64) -> Self {
        self.km_per_litre = km_per_litre;
        self
    }

    /// Sets the operational status.
    pub fn with_status(mut self, status: BusStatus) -> Self {
        self.status = status;
        self
    }

    /// External bus id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Seating capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Fuel efficiency in km per litre.
    pub fn km_per_litre(&self) -> f64 {
        self.km_per_litre
    }

    /// Operational status.
    pub fn status(&self) -> BusStatus {
        self.status
    }

    /// Returns `true` if the bus may be assigned a route.
    pub fn is_eligible(&self) -> bool {
        self.status == BusStatus::Active
    }

    /// Litres of fuel needed to drive `distance_km`.
    pub fn fuel_litres(&self, distance_km: f64) -> f64 {
        distance_km / self.km_per_litre
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_new() {
        let b = Bus::new(0, 50);
        assert_eq!(b.id(), 0);
        assert_eq!(b.capacity(), 50);
        assert_eq!(b.km_per_litre(), DEFAULT_KM_PER_LITRE);
        assert!(b.is_eligible());
    }

    #[test]
    fn test_bus_status() {
        let b = Bus::new(1, 40).with_status(BusStatus::Maintenance);
        assert!(!b.is_eligible());
        let b = b.with_status(BusStatus::Retired);
        assert!(!b.is_eligible());
    }

    #[test]
    fn test_fuel() {
        let b = Bus::new(1, 40);
        assert!((b.fuel_litres(16.0) - 2.0).abs() < 1e-10);
    }
}
