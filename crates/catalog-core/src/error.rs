//! Error types for `catalog-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown currency: {0:?}")]
  UnknownCurrency(String),

  #[error("unknown ingredient kind: {0:?}")]
  UnknownIngredientKind(String),

  /// The backend does not implement this operation at all.
  #[error("operation not supported by this backend: {0}")]
  Unsupported(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
