use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::Result;
use crate::geom::{PolyFile, Ring, RingKind};

fn write_ring<W: Write>(writer: &mut W, counter: usize, kind: RingKind, ring: &Ring) -> Result<()> {
  if kind == RingKind::Inner {
    write!(writer, "!")?;
  }
  writeln!(writer, "{}", counter)?;

  for point in ring.iter() {
    let (lon, lat) = point.to_degrees();
    writeln!(writer, "   {} {}", lon, lat)?;
  }

  writeln!(writer, "END")?;
  Ok(())
}

/// Writes `poly` in polygon filter format: outer rings first, then holes,
/// numbered from 1.
pub fn write_poly<W: Write>(poly: &PolyFile, mut writer: W) -> Result<()> {
  writeln!(writer, "{}", poly.name)?;
  for (i, (kind, ring)) in poly.rings().enumerate() {
    write_ring(&mut writer, i + 1, kind, ring)?;
  }
  writeln!(writer, "END")?;
  writer.flush()?;
  Ok(())
}

/// Saves `poly` to `path`, gzip-compressed when the path ends in `.gz`.
pub fn save_poly(poly: &PolyFile, path: &Path) -> Result<()> {
  let file = BufWriter::new(File::create(path)?);
  if path.extension().map_or(false, |ext| ext == "gz") {
    let mut gz = GzEncoder::new(file, Compression::default());
    write_poly(poly, &mut gz)?;
    gz.finish()?.flush()?;
  } else {
    write_poly(poly, file)?;
  }
  debug!(path = %path.display(), points = poly.point_count(), "wrote poly file");
  Ok(())
}
