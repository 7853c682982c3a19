use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::{PolyError, Result};
use crate::geom::{Point, PolyFile, Ring, RingKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
  /// Close rings that reach END unclosed instead of dropping them.
  pub close_rings: bool,
}

struct OpenRing {
  kind: RingKind,
  header: String,
  ring: Ring,
}

fn is_gzip(data: &[u8]) -> bool {
  data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn parse_error(line: usize, message: impl Into<String>) -> PolyError {
  PolyError::Parse {
    line,
    message: message.into(),
  }
}

fn parse_coordinate(text: &str, line: usize) -> Result<Point> {
  let mut fields = text.split_whitespace();
  let mut next_value = |axis: &str| -> Result<f64> {
    let field = fields
      .next()
      .ok_or_else(|| parse_error(line, format!("missing {}", axis)))?;
    field
      .parse::<f64>()
      .map_err(|_| parse_error(line, format!("invalid {} {:?}", axis, field)))
  };
  let lon = next_value("longitude")?;
  let lat = next_value("latitude")?;
  Point::from_degrees(lon, lat).map_err(|err| parse_error(line, err.to_string()))
}

fn finish_ring(poly: &mut PolyFile, open: OpenRing, options: &ReadOptions) {
  let OpenRing {
    kind,
    header,
    mut ring,
  } = open;
  if options.close_rings {
    ring.close();
  }
  if ring.is_closed() {
    debug!(header = %header, points = ring.len(), "read ring");
    poly.add_ring(kind, ring);
  } else {
    warn!(header = %header, points = ring.len(), "dropping ring that is not closed");
  }
}

/// Parses a polygon filter (`.poly`) description.
///
/// Only rings terminated by `END` are kept, and only if they are closed (or
/// `close_rings` is set). Other rings are dropped rather than reported as
/// errors. Any malformed coordinate line fails the whole read.
pub fn read_poly<R: BufRead>(reader: R, options: &ReadOptions) -> Result<PolyFile> {
  let mut lines = reader.lines();
  let name = match lines.next() {
    Some(line) => line?,
    None => return Err(PolyError::MissingName),
  };
  let mut poly = PolyFile::new(name.trim_end());
  let mut current: Option<OpenRing> = None;

  for (i, line) in lines.enumerate() {
    // the name was line 1
    let line_no = i + 2;
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }

    if line.starts_with(char::is_whitespace) {
      let open = current
        .as_mut()
        .ok_or_else(|| parse_error(line_no, "coordinate line outside of a ring"))?;
      open.ring.push(parse_coordinate(&line, line_no)?);
      continue;
    }

    let header = line.trim_end();
    if header == "END" {
      // END without an open ring terminates the file
      if let Some(open) = current.take() {
        finish_ring(&mut poly, open, options);
      }
      continue;
    }

    // only END commits a ring
    if let Some(open) = current.take() {
      warn!(
        header = %open.header,
        points = open.ring.len(),
        "dropping ring that has no END before the next header"
      );
    }
    let kind = if header.starts_with('!') {
      RingKind::Inner
    } else {
      RingKind::Outer
    };
    current = Some(OpenRing {
      kind,
      header: header.to_string(),
      ring: Ring::new(),
    });
  }

  if let Some(open) = current {
    warn!(
      header = %open.header,
      points = open.ring.len(),
      "dropping ring left open at end of input"
    );
  }

  Ok(poly)
}

/// Reads a `.poly` file from disk, gunzipping it first if needed.
pub fn open_poly(path: &Path, options: &ReadOptions) -> Result<PolyFile> {
  let data = std::fs::read(path)?;
  let poly = if is_gzip(&data) {
    debug!(path = %path.display(), "reading gzip-compressed poly file");
    read_poly(BufReader::new(GzDecoder::new(data.as_slice())), options)?
  } else {
    read_poly(data.as_slice(), options)?
  };
  debug!(
    path = %path.display(),
    outer = poly.outer.len(),
    inner = poly.inner.len(),
    points = poly.point_count(),
    "read poly file"
  );
  Ok(poly)
}
