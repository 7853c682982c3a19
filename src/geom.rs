use std::ops::Deref;

use crate::error::{PolyError, Result};

// coordinates are stored as degrees * SCALE
pub const SCALE: f64 = 10_000_000.0;

// lon => x, lat => y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
  pub x: i32,
  pub y: i32,
}

impl Point {
  pub fn new(x: i32, y: i32) -> Point {
    Point { x, y }
  }

  pub fn from_degrees(lon: f64, lat: f64) -> Result<Point> {
    Ok(Point {
      x: to_fixed(lon)?,
      y: to_fixed(lat)?,
    })
  }

  pub fn to_degrees(self) -> (f64, f64) {
    (self.x as f64 / SCALE, self.y as f64 / SCALE)
  }
}

// ties go to the even neighbour, same as the tools that produce these files
fn to_fixed(degrees: f64) -> Result<i32> {
  let scaled = (degrees * SCALE).round_ties_even();
  if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
    return Err(PolyError::CoordinateOutOfRange { value: degrees });
  }
  Ok(scaled as i32)
}

/// Converts a tolerance in degrees into fixed-point units.
pub fn scale_tolerance(degrees: f64) -> Result<f64> {
  if !degrees.is_finite() || degrees < 0.0 {
    return Err(PolyError::InvalidTolerance(degrees));
  }
  Ok(degrees * SCALE)
}

/// One polygon boundary, outer or hole. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ring {
  pub points: Vec<Point>,
}

impl Ring {
  pub fn new() -> Ring {
    Ring { points: Vec::new() }
  }

  pub fn push(&mut self, point: Point) {
    self.points.push(point);
  }

  /// A ring needs at least 3 points, and the same first and last point, to be closed.
  pub fn is_closed(&self) -> bool {
    if self.points.len() < 3 {
      return false;
    }
    self.points[0] == self.points[self.points.len() - 1]
  }

  pub fn close(&mut self) {
    if self.is_closed() {
      return;
    }
    if let Some(&first) = self.points.first() {
      self.points.push(first);
    }
  }
}

impl Deref for Ring {
  type Target = [Point];

  fn deref(&self) -> &[Point] {
    &self.points
  }
}

impl From<Vec<Point>> for Ring {
  fn from(points: Vec<Point>) -> Ring {
    Ring { points }
  }
}

impl FromIterator<Point> for Ring {
  fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Ring {
    Ring {
      points: iter.into_iter().collect(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
  Outer,
  Inner,
}

/// A named boundary: outer rings plus holes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolyFile {
  pub name: String,
  pub outer: Vec<Ring>,
  pub inner: Vec<Ring>,
}

impl PolyFile {
  pub fn new(name: impl Into<String>) -> PolyFile {
    PolyFile {
      name: name.into(),
      outer: Vec::new(),
      inner: Vec::new(),
    }
  }

  pub fn add_ring(&mut self, kind: RingKind, ring: Ring) {
    match kind {
      RingKind::Outer => self.outer.push(ring),
      RingKind::Inner => self.inner.push(ring),
    }
  }

  pub fn ring_count(&self) -> usize {
    self.outer.len() + self.inner.len()
  }

  pub fn point_count(&self) -> usize {
    self.rings().map(|(_, ring)| ring.len()).sum()
  }

  // outer rings first, then holes, each in file order
  pub fn rings(&self) -> impl Iterator<Item = (RingKind, &Ring)> {
    self
      .outer
      .iter()
      .map(|ring| (RingKind::Outer, ring))
      .chain(self.inner.iter().map(|ring| (RingKind::Inner, ring)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn square() -> Ring {
    Ring::from(vec![
      Point::new(0, 0),
      Point::new(10, 0),
      Point::new(10, 10),
      Point::new(0, 10),
    ])
  }

  #[test]
  fn test_is_closed() {
    assert!(!Ring::new().is_closed());
    assert!(!Ring::from(vec![Point::new(1, 1), Point::new(1, 1)]).is_closed());
    assert!(!square().is_closed());

    let mut ring = square();
    ring.push(Point::new(0, 0));
    assert!(ring.is_closed());
  }

  #[test]
  fn test_close() {
    let mut ring = square();
    ring.close();
    assert_eq!(ring.len(), 5);
    assert_eq!(ring[4], Point::new(0, 0));
    assert!(ring.is_closed());

    // closing twice does nothing
    ring.close();
    assert_eq!(ring.len(), 5);

    let mut empty = Ring::new();
    empty.close();
    assert!(empty.is_empty());
  }

  #[test]
  fn test_from_degrees() {
    assert_eq!(
      Point::from_degrees(13.3888599, 52.5170365).unwrap(),
      Point::new(133_888_599, 525_170_365)
    );
    assert_eq!(
      Point::from_degrees(-180.0, -90.0).unwrap(),
      Point::new(-1_800_000_000, -900_000_000)
    );
    assert_eq!(
      Point::from_degrees(0.00000004, -0.00000006).unwrap(),
      Point::new(0, -1)
    );
    assert!(matches!(
      Point::from_degrees(250.0, 0.0),
      Err(PolyError::CoordinateOutOfRange { .. })
    ));
    assert!(Point::from_degrees(f64::NAN, 0.0).is_err());
  }

  #[test]
  fn test_to_degrees() {
    assert_eq!(Point::new(133_888_599, -5).to_degrees(), (13.3888599, -0.0000005));
  }

  #[test]
  fn test_scale_tolerance() {
    assert_eq!(scale_tolerance(0.5).unwrap(), 5_000_000.0);
    assert_eq!(scale_tolerance(0.0).unwrap(), 0.0);
    assert!(matches!(
      scale_tolerance(-0.1),
      Err(PolyError::InvalidTolerance(_))
    ));
    assert!(scale_tolerance(f64::INFINITY).is_err());
  }

  #[test]
  fn test_poly_file_rings() {
    let mut poly = PolyFile::new("test");
    poly.add_ring(RingKind::Inner, square());
    poly.add_ring(RingKind::Outer, Ring::from(vec![Point::new(5, 5)]));
    assert_eq!(poly.ring_count(), 2);
    assert_eq!(poly.point_count(), 5);
    let kinds: Vec<RingKind> = poly.rings().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![RingKind::Outer, RingKind::Inner]);
  }
}
