//! Error type for `paddock-store-sqlite`.

use paddock_core::{ClassifyError, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] paddock_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl ClassifyError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Core(e) => e.class(),
      // Anything below is a backend failure or stored-row corruption, not a
      // property of the event being applied.
      Error::Database(_) | Error::Json(_) | Error::Uuid(_) | Error::DateParse(_) => {
        ErrorClass::Storage
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
