//! The broker seam: what the consumer needs from a message broker.
//!
//! [`crate::amqp`] implements it over AMQP; the tests use an in-process
//! implementation.

use std::future::Future;

use crate::BrokerError;

/// A message bound for a queue through the default exchange.
#[derive(Debug, Clone)]
pub struct Publication<'a> {
  pub queue:        &'a str,
  pub body:         &'a [u8],
  pub content_type: &'a str,
  pub headers:      Vec<(&'static str, String)>,
}

/// Something channels can be opened on.
pub trait Broker: Send + Sync {
  type Channel: Channel;

  /// Open a fresh channel, connecting first if needed. The channel delivers
  /// at most one unacknowledged message at a time.
  fn open_channel(
    &self,
  ) -> impl Future<Output = Result<Self::Channel, BrokerError>> + Send + '_;
}

/// One channel: declares queues, consumes from one of them, publishes.
pub trait Channel: Send {
  type Delivery: Delivery;

  /// Declare a durable, non-exclusive queue. Idempotent.
  fn declare_queue<'a>(
    &'a mut self,
    queue: &'a str,
  ) -> impl Future<Output = Result<(), BrokerError>> + Send + 'a;

  /// Start consuming `queue` with manual acknowledgement.
  fn consume<'a>(
    &'a mut self,
    queue: &'a str,
    consumer_tag: &'a str,
  ) -> impl Future<Output = Result<(), BrokerError>> + Send + 'a;

  /// The next delivery, or `None` once the channel is closed.
  fn next_delivery(
    &mut self,
  ) -> impl Future<Output = Option<Result<Self::Delivery, BrokerError>>> + Send + '_;

  fn publish<'a>(
    &'a mut self,
    publication: Publication<'a>,
  ) -> impl Future<Output = Result<(), BrokerError>> + Send + 'a;
}

/// A received message awaiting acknowledgement.
pub trait Delivery: Send {
  fn body(&self) -> &[u8];

  fn ack(self) -> impl Future<Output = Result<(), BrokerError>> + Send;
}
