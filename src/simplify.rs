// Douglas-Peucker simplification on fixed-point coordinates.
//
// The partitioning runs off an explicit work stack instead of recursion, so
// memory is bounded by the ring length and very long borders (tens of
// thousands of points) can't blow the call stack.

use crossbeam_utils::atomic::AtomicCell;

use crate::geom::{Point, Ring};

#[derive(Debug, Clone, Copy)]
struct Span {
  start: usize,
  finish: usize,
}

impl Span {
  fn has_interior(self) -> bool {
    self.finish - self.start > 1
  }
}

/// The point of segment `a`-`b` that `v` is measured against.
///
/// `a` when the segment is degenerate or `v` projects before `a`, `b` when it
/// projects past `b`, otherwise the projection with its offset from `a`
/// truncated toward zero.
pub fn closest_point(v: Point, a: Point, b: Point) -> Point {
  let dx = b.x as f64 - a.x as f64;
  let dy = b.y as f64 - a.y as f64;
  if dx == 0.0 && dy == 0.0 {
    return a;
  }

  let k =
    ((v.x as f64 - a.x as f64) * dx + (v.y as f64 - a.y as f64) * dy) / (dx * dx + dy * dy);
  if k > 1.0 {
    b
  } else if k > 0.0 {
    Point {
      x: (a.x as i64 + (dx * k) as i64) as i32,
      y: (a.y as i64 + (dy * k) as i64) as i32,
    }
  } else {
    a
  }
}

/// Squared distance from `v` to the segment `a`-`b`, in fixed-point units squared.
pub fn sq_segment_distance(v: Point, a: Point, b: Point) -> f64 {
  let reference = closest_point(v, a, b);
  let dx = v.x as f64 - reference.x as f64;
  let dy = v.y as f64 - reference.y as f64;
  dx * dx + dy * dy
}

/// Per-index record of which input points survive simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionMask {
  retained: Vec<bool>,
}

impl RetentionMask {
  // only the endpoints are kept to begin with
  fn new(len: usize) -> RetentionMask {
    let mut retained = vec![false; len];
    if len > 0 {
      retained[0] = true;
      retained[len - 1] = true;
    }
    RetentionMask { retained }
  }

  pub fn len(&self) -> usize {
    self.retained.len()
  }

  pub fn is_empty(&self) -> bool {
    self.retained.is_empty()
  }

  pub fn is_retained(&self, index: usize) -> bool {
    self.retained.get(index).copied().unwrap_or(false)
  }

  pub fn retained_count(&self) -> usize {
    self.retained.iter().filter(|&&keep| keep).count()
  }

  pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
    self
      .retained
      .iter()
      .enumerate()
      .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
  }

  /// Collects the retained points in their original order.
  ///
  /// `points` must be the slice the mask was built from.
  pub fn apply(&self, points: &[Point]) -> Vec<Point> {
    debug_assert_eq!(points.len(), self.len(), "mask built for a different slice");
    let mut result = Vec::with_capacity(self.retained_count());
    for i in self.indices() {
      result.push(points[i]);
    }
    result
  }
}

// Returns false if `should_stop` fired before every span was resolved.
fn partition(
  points: &[Point],
  tolerance: f64,
  mask: &mut RetentionMask,
  mut should_stop: impl FnMut() -> bool,
) -> bool {
  if points.len() < 3 {
    return true;
  }
  let sq_tolerance = tolerance * tolerance;

  let mut stack = vec![Span {
    start: 0,
    finish: points.len() - 1,
  }];

  while let Some(span) = stack.pop() {
    if should_stop() {
      return false;
    }

    let a = points[span.start];
    let b = points[span.finish];
    let mut index_max = span.start;
    let mut max_sq_distance = 0.0;

    for (i, &v) in points
      .iter()
      .enumerate()
      .take(span.finish)
      .skip(span.start + 1)
    {
      let sq_distance = sq_segment_distance(v, a, b);
      if sq_distance > max_sq_distance {
        index_max = i;
        max_sq_distance = sq_distance;
      }
    }

    if max_sq_distance > sq_tolerance {
      mask.retained[index_max] = true;

      let left = Span {
        start: span.start,
        finish: index_max,
      };
      let right = Span {
        start: index_max,
        finish: span.finish,
      };
      if left.has_interior() {
        stack.push(left);
      }
      if right.has_interior() {
        stack.push(right);
      }
    }
  }

  true
}

/// Marks the points of `points` that survive simplification at `tolerance`.
///
/// `tolerance` is in fixed-point units. Inputs shorter than 3 points are
/// retained in full.
pub fn retention_mask(points: &[Point], tolerance: f64) -> RetentionMask {
  let mut mask = RetentionMask::new(points.len());
  partition(points, tolerance, &mut mask, || false);
  mask
}

/// Simplifies a polyline, keeping both endpoints and the original point order.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
  if points.len() < 3 {
    return points.to_vec();
  }
  retention_mask(points, tolerance).apply(points)
}

pub fn simplify_ring(ring: &Ring, tolerance: f64) -> Ring {
  Ring::from(simplify(ring, tolerance))
}

/// Same as [`simplify`], but gives up and returns `None` once `cancelled` is set.
/// The flag is polled between spans.
pub fn simplify_cancellable(
  points: &[Point],
  tolerance: f64,
  cancelled: &AtomicCell<bool>,
) -> Option<Vec<Point>> {
  if cancelled.load() {
    return None;
  }
  if points.len() < 3 {
    return Some(points.to_vec());
  }
  let mut mask = RetentionMask::new(points.len());
  if !partition(points, tolerance, &mut mask, || cancelled.load()) {
    return None;
  }
  Some(mask.apply(points))
}
