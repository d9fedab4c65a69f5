//! Coordinates and great-circle distance.

use std::str::FromStr;

use crate::error::CarbonError;

/// Mean Earth radius used for geodesic distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// The club's premises in Paris, departure of every outing.
pub const ORIGIN_GEOLOC: &str = "48.839676861676594, 2.3338748374810754";

/// Rough bounding box of the core of the Alps, from Gap (south-west) to
/// Zurich (north-east). Mountain roads there can be closed in winter, which
/// the distance provider only knows about when given a departure time.
const ALPS_SOUTH_WEST: Coordinate = Coordinate {
    latitude: 44.55441,
    longitude: 6.07655,
};
const ALPS_NORTH_EAST: Coordinate = Coordinate {
    latitude: 47.36917,
    longitude: 8.55061,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Haversine distance in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Strictly inside the Alps bounding box.
    pub fn is_in_alps(&self) -> bool {
        self.latitude > ALPS_SOUTH_WEST.latitude
            && self.longitude > ALPS_SOUTH_WEST.longitude
            && self.latitude < ALPS_NORTH_EAST.latitude
            && self.longitude < ALPS_NORTH_EAST.longitude
    }
}

/// Parses `"latitude, longitude"` in decimal degrees.
impl FromStr for Coordinate {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CarbonError::InvalidCoordinate(s.to_string());

        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid());
        }

        Ok(Coordinate {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_with_and_without_spaces() {
        assert_eq!(
            coord("44.91766184972169, 6.416012074469731"),
            Coordinate {
                latitude: 44.91766184972169,
                longitude: 6.416012074469731
            }
        );
        assert_eq!(coord("-12.5,130").longitude, 130.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "48.8", "abc, 2.3", "48.8; 2.3", "95.0, 2.3", "48.8, 2.3, 1"] {
            assert!(
                matches!(raw.parse::<Coordinate>(), Err(CarbonError::InvalidCoordinate(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = coord(ORIGIN_GEOLOC);
        assert_eq!(p.distance_to(&p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let paris = coord(ORIGIN_GEOLOC);
        let briancon = coord("44.8986, 6.6433");
        assert!((paris.distance_to(&briancon) - briancon.distance_to(&paris)).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = coord("45.0, 6.0");
        let b = coord("46.0, 6.0");
        assert!((a.distance_to(&b) - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_alps_box() {
        assert!(coord("44.91766184972169, 6.416012074469731").is_in_alps());
        assert!(coord("45.9237, 6.8694").is_in_alps()); // Chamonix
        assert!(!coord(ORIGIN_GEOLOC).is_in_alps());
        assert!(!coord("43.2965, 5.3698").is_in_alps()); // Marseille
        // Corners are outside.
        assert!(!coord("44.55441, 7.0").is_in_alps());
    }
}
