use geo::{Distance, Euclidean, Haversine};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self {
            point: geo::Point::new(lon, lat),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(&self.point, &to.point)
    }

    pub fn haversine_distance(&self, to: &Location) -> f64 {
        Haversine.distance(self.point, to.point)
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = Location::from_cartesian(0.0, 0.0);
        let b = Location::from_cartesian(3.0, 4.0);

        assert_eq!(a.euclidean_distance(&b), 5.0);
    }

    #[test]
    fn test_lat_lon_order() {
        let location = Location::from_lat_lon(50.8, 4.35);

        assert_eq!(location.y(), 50.8);
        assert_eq!(location.x(), 4.35);
    }
}
