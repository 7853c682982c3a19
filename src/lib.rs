//! Douglas-Peucker simplification of polygon filter (`.poly`) boundary files.
//!
//! Coordinates are fixed-point: degrees multiplied by [`geom::SCALE`] and
//! stored as `i32`. Tolerances passed to [`simplify`] are in the same units.

pub mod batch;
pub mod error;
pub mod geom;
pub mod reader;
pub mod simplify;
pub mod statistics;
pub mod writer;

pub use error::{PolyError, Result};
pub use geom::{Point, PolyFile, Ring, RingKind};
pub use simplify::simplify;
