//! Error type for `pulse-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pulse_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A column held a value outside its domain (unknown enum text, timestamp
  /// out of range).
  #[error("decode error: {0}")]
  Decode(String),
}

impl From<Error> for pulse_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => pulse_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
