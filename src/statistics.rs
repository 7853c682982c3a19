use std::fmt;

/// Point counts before and after simplification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyStats {
  pub rings: usize,
  pub points_before: usize,
  pub points_after: usize,
}

impl SimplifyStats {
  pub fn record(&mut self, before: usize, after: usize) {
    self.rings += 1;
    self.points_before += before;
    self.points_after += after;
  }

  /// `None` when there was nothing to simplify.
  pub fn retained_fraction(&self) -> Option<f64> {
    if self.points_before == 0 {
      return None;
    }
    Some(self.points_after as f64 / self.points_before as f64)
  }
}

impl fmt::Display for SimplifyStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Points: {} -> {}", self.points_before, self.points_after)?;
    match self.retained_fraction() {
      Some(fraction) => write!(f, " ({:.0}%)", fraction * 100.0),
      None => write!(f, " (-)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record() {
    let mut stats = SimplifyStats::default();
    stats.record(120, 30);
    stats.record(80, 20);
    stats.record(10, 10);

    assert_eq!(
      stats,
      SimplifyStats {
        rings: 3,
        points_before: 210,
        points_after: 60,
      }
    );
  }

  #[test]
  fn test_display() {
    let mut stats = SimplifyStats::default();
    assert_eq!(stats.retained_fraction(), None);
    assert_eq!(stats.to_string(), "Points: 0 -> 0 (-)");

    stats.record(200, 50);
    assert_eq!(stats.retained_fraction(), Some(0.25));
    assert_eq!(stats.to_string(), "Points: 200 -> 50 (25%)");

    stats.record(100, 1);
    assert_eq!(stats.to_string(), "Points: 300 -> 51 (17%)");
  }
}
