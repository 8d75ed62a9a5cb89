//! Error type for `catalog-store-eventlog`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] catalog_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// No event in the price's stream carries this identity.
  #[error("price not found: {0}")]
  PriceNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
