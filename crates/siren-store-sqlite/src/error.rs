//! Error type for `siren-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] siren_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside the set the schema allows.
  #[error("cannot decode {column}: {value:?}")]
  Decode { column: &'static str, value: String },

  #[error("responder not found: {0}")]
  ResponderNotFound(uuid::Uuid),
}

impl siren_core::StoreError for Error {
  fn into_core(self) -> siren_core::Error {
    match self {
      Error::Core(inner) => inner,
      other => siren_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
