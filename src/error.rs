use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolyError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("poly file has no name line")]
  MissingName,

  #[error("line {line}: {message}")]
  Parse { line: usize, message: String },

  #[error("coordinate {value} does not fit the fixed-point range")]
  CoordinateOutOfRange { value: f64 },

  #[error("tolerance must be a finite, non-negative number (got {0})")]
  InvalidTolerance(f64),

  #[error("simplification was cancelled")]
  Cancelled,

  #[error("a simplification worker panicked")]
  WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, PolyError>;
