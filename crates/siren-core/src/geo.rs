//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by [`distance`], in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const SCALE: f64 = 1_000_000.0;

/// A validated latitude/longitude pair in decimal degrees.
///
/// Both components are rounded to 6 decimal places on construction, which is
/// the precision the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
  latitude:  f64,
  longitude: f64,
}

impl Coordinate {
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    let valid = latitude.is_finite()
      && longitude.is_finite()
      && (-90.0..=90.0).contains(&latitude)
      && (-180.0..=180.0).contains(&longitude);
    if !valid {
      return Err(Error::InvalidCoordinate { latitude, longitude });
    }
    Ok(Self {
      latitude:  round6(latitude),
      longitude: round6(longitude),
    })
  }

  pub fn latitude(&self) -> f64 { self.latitude }

  pub fn longitude(&self) -> f64 { self.longitude }
}

fn round6(v: f64) -> f64 { (v * SCALE).round() / SCALE }

#[derive(Deserialize)]
struct RawCoordinate {
  latitude:  f64,
  longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
  type Error = Error;

  fn try_from(raw: RawCoordinate) -> Result<Self> {
    Self::new(raw.latitude, raw.longitude)
  }
}

/// Haversine distance between `a` and `b` in kilometres.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
  let lat1 = a.latitude.to_radians();
  let lat2 = b.latitude.to_radians();
  let d_lat = lat2 - lat1;
  let d_lon = (b.longitude - a.longitude).to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
  let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
  EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
  use super::*;

  fn c(lat: f64, lon: f64) -> Coordinate { Coordinate::new(lat, lon).unwrap() }

  #[test]
  fn rejects_out_of_range() {
    assert!(Coordinate::new(90.5, 0.0).is_err());
    assert!(Coordinate::new(-91.0, 0.0).is_err());
    assert!(Coordinate::new(0.0, 180.1).is_err());
    assert!(Coordinate::new(0.0, -181.0).is_err());
    assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    assert!(Coordinate::new(90.0, -180.0).is_ok());
  }

  #[test]
  fn rounds_to_six_places() {
    let p = c(40.123_456_789, -74.987_654_321);
    assert_eq!(p.latitude(), 40.123457);
    assert_eq!(p.longitude(), -74.987654);
  }

  #[test]
  fn distance_to_self_is_zero() {
    for p in [c(0.0, 0.0), c(40.0, -74.0), c(-33.8688, 151.2093), c(90.0, 0.0)] {
      assert_eq!(distance(p, p), 0.0);
    }
  }

  #[test]
  fn distance_is_symmetric() {
    let pairs = [
      (c(40.0, -74.0), c(41.0, -74.0)),
      (c(51.5074, -0.1278), c(48.8566, 2.3522)),
      (c(-33.8688, 151.2093), c(35.6762, 139.6503)),
      (c(0.0, 179.9), c(0.0, -179.9)),
    ];
    for (a, b) in pairs {
      assert_eq!(distance(a, b), distance(b, a));
    }
  }

  #[test]
  fn known_distances() {
    let origin = c(40.0, -74.0);
    let near = distance(origin, c(40.01, -74.0));
    let far = distance(origin, c(41.0, -74.0));
    assert!((near - 1.112).abs() < 0.01, "near = {near}");
    assert!((far - 111.19).abs() < 0.1, "far = {far}");

    let london_paris = distance(c(51.5074, -0.1278), c(48.8566, 2.3522));
    assert!((london_paris - 343.5).abs() < 1.0, "london_paris = {london_paris}");
  }

  #[test]
  fn antimeridian_is_short() {
    let d = distance(c(0.0, 179.9), c(0.0, -179.9));
    assert!(d < 25.0, "d = {d}");
  }

  #[test]
  fn deserialize_validates() {
    let ok: Coordinate =
      serde_json::from_str(r#"{"latitude":40.0,"longitude":-74.0}"#).unwrap();
    assert_eq!(ok, c(40.0, -74.0));
    let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":100.0,"longitude":0.0}"#);
    assert!(bad.is_err());
  }
}
