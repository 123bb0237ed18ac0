//! Error types for `paddock-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The subject has no active animal projection. Covers both "never
  /// created" and "already removed"; the feed cannot distinguish them.
  #[error("dinosaur {0} not found or not active")]
  AnimalNotFound(i64),

  #[error("invalid habitat code: {0}")]
  InvalidHabitat(String),

  /// A logged raw payload that no longer parses as a feed event.
  #[error("malformed event payload: {0}")]
  MalformedEvent(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse error classes driving the batch processor's propagation policy:
/// `NotFound` and `Validation` fail a single event and are skipped; repeated
/// `Storage` failures abort the whole poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  NotFound,
  Validation,
  Storage,
}

/// Implemented by store error types so higher layers can apply the
/// propagation policy without depending on a concrete backend.
pub trait ClassifyError {
  fn class(&self) -> ErrorClass;
}

impl ClassifyError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::AnimalNotFound(_) | Error::InvalidHabitat(_) => ErrorClass::NotFound,
      Error::MalformedEvent(_) | Error::Serialization(_) => ErrorClass::Validation,
    }
  }
}
