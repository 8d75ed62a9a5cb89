//! Error types for `catalog-ingest`.

use thiserror::Error;

use crate::message::ValidationError;

/// A type-erased error from a storage backend or broker client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a delivery could not be processed.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to decode price update: {0}")]
  Decode(#[source] serde_json::Error),

  #[error("invalid price update: {0}")]
  Validation(#[from] ValidationError),

  #[error("failed to get last updated price: {0}")]
  LookupPrice(#[source] BoxError),

  #[error("failed to update price: {0}")]
  UpdatePrice(#[source] BoxError),

  #[error("failed to insert price: {0}")]
  InsertPrice(#[source] BoxError),

  #[error(transparent)]
  Broker(#[from] BrokerError),
}

impl Error {
  /// Whether retrying the same body can never succeed.
  ///
  /// Only used for logging; the consumer retries every failure alike.
  pub fn is_permanent(&self) -> bool {
    matches!(self, Self::Decode(_) | Self::Validation(_))
  }
}

/// A failure talking to the message broker.
#[derive(Debug, Error)]
pub enum BrokerError {
  #[error("failed to connect to broker: {0}")]
  Connection(#[source] BoxError),

  #[error("failed to open channel: {0}")]
  Channel(#[source] BoxError),

  #[error("failed to declare queue {queue}: {source}")]
  Declare { queue: String, source: BoxError },

  #[error("failed to consume from {queue}: {source}")]
  Consume { queue: String, source: BoxError },

  #[error("failed to publish to {queue}: {source}")]
  Publish { queue: String, source: BoxError },

  #[error("failed to acknowledge delivery: {0}")]
  Ack(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
