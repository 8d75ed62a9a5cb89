//! Error type for `catalog-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] catalog_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("price not found: {0}")]
  PriceNotFound(uuid::Uuid),

  #[error("shop not found: {0}")]
  ShopNotFound(uuid::Uuid),

  #[error("ingredient not found: {0}")]
  IngredientNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
