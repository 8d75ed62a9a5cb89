//! The work-queue consumer: decode, validate, reconcile, retry, dead-letter.

use std::time::Duration;

use tracing::{error, info, warn};

use catalog_core::store::CatalogStore;

use crate::{
  Error, Result,
  broker::{Broker, Channel, Delivery, Publication},
  message::PriceUpdate,
  reconcile::{Reconciliation, reconcile},
  shutdown::Shutdown,
};

/// Header naming the queue a dead-lettered message was taken from.
pub const HEADER_ORIGINAL_QUEUE: &str = "x-original-queue";
/// Header carrying the last processing error of a dead-lettered message.
pub const HEADER_ERROR: &str = "x-error";

const CONTENT_TYPE_JSON: &str = "application/json";

// ─── Configuration ───────────────────────────────────────────────────────────

/// How often and how patiently a delivery is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  /// The n-th failed attempt waits `n * backoff_step`.
  pub backoff_step: Duration,
}

impl RetryPolicy {
  pub fn backoff(&self, attempt: u32) -> Duration {
    self.backoff_step.saturating_mul(attempt)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 3, backoff_step: Duration::from_secs(1) }
  }
}

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
  pub queue:             String,
  pub dead_letter_queue: String,
  pub consumer_tag:      String,
  pub retry:             RetryPolicy,
}

impl Default for ConsumerConfig {
  fn default() -> Self {
    Self {
      queue:             "add-price-catalog".into(),
      dead_letter_queue: "dead-letter".into(),
      consumer_tag:      "catalog".into(),
      retry:             RetryPolicy::default(),
    }
  }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// Result of running one delivery through the retry loop.
enum Attempts {
  Succeeded,
  Exhausted(Error),
  Interrupted,
}

/// Consumes price updates from one queue into a [`CatalogStore`].
///
/// Deliveries are handled strictly one after another. Every delivery that
/// leaves the retry loop is acknowledged, whether it succeeded or not; a
/// failed one is first published to the dead-letter queue, and if that
/// publish fails too the message is lost.
pub struct Consumer<B, S> {
  broker: B,
  store:  S,
  config: ConsumerConfig,
}

impl<B, S> Consumer<B, S>
where
  B: Broker,
  S: CatalogStore,
{
  pub fn new(broker: B, store: S, config: ConsumerConfig) -> Self {
    Self { broker, store, config }
  }

  pub fn broker(&self) -> &B { &self.broker }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &ConsumerConfig { &self.config }

  /// Consume until the channel closes or `shutdown` fires.
  ///
  /// Errors setting up the channel, or acknowledging, end the run; the
  /// caller decides whether to start another.
  pub async fn run(&self, shutdown: &Shutdown) -> Result<()> {
    let queue = self.config.queue.as_str();

    let mut channel = self.broker.open_channel().await?;
    channel.declare_queue(queue).await?;
    channel.declare_queue(&self.config.dead_letter_queue).await?;
    channel.consume(queue, &self.config.consumer_tag).await?;
    info!(queue, consumer_tag = %self.config.consumer_tag, "consuming");

    loop {
      let next = tokio::select! {
        biased;
        () = shutdown.cancelled() => {
          info!(queue, "shutdown requested, consumer stopping");
          return Ok(());
        }
        next = channel.next_delivery() => next,
      };
      let Some(delivery) = next else {
        info!(queue, "channel closed");
        return Ok(());
      };
      let delivery = delivery?;

      match self.attempt(delivery.body(), shutdown).await {
        Attempts::Succeeded => {}
        Attempts::Exhausted(error) => {
          self.dead_letter(&mut channel, delivery.body(), &error).await;
        }
        Attempts::Interrupted => {
          info!(
            queue,
            "shutdown during backoff, leaving delivery for redelivery"
          );
          return Ok(());
        }
      }
      delivery.ack().await?;
    }
  }

  /// Decode, validate and reconcile one body.
  pub async fn process(&self, body: &[u8]) -> Result<Reconciliation> {
    let update: PriceUpdate =
      serde_json::from_slice(body).map_err(Error::Decode)?;
    let update = update.validate()?;
    reconcile(&self.store, &update).await
  }

  async fn attempt(&self, body: &[u8], shutdown: &Shutdown) -> Attempts {
    let retry = self.config.retry;
    let mut attempt = 1;
    loop {
      let error = match self.process(body).await {
        Ok(outcome) => {
          let price = outcome.price();
          info!(
            queue = %self.config.queue,
            shop_id = %price.shop_id,
            product_id = %price.product_id,
            attempt,
            created = matches!(outcome, Reconciliation::Created(_)),
            "price update processed"
          );
          return Attempts::Succeeded;
        }
        Err(error) => error,
      };

      warn!(
        queue = %self.config.queue,
        attempt,
        max_attempts = retry.max_attempts,
        permanent = error.is_permanent(),
        error = %error,
        "price update failed"
      );

      tokio::select! {
        biased;
        () = shutdown.cancelled() => return Attempts::Interrupted,
        () = tokio::time::sleep(retry.backoff(attempt)) => {}
      }

      if attempt >= retry.max_attempts {
        return Attempts::Exhausted(error);
      }
      attempt += 1;
    }
  }

  /// Best effort: a failed publish is logged and otherwise ignored.
  async fn dead_letter(
    &self,
    channel: &mut B::Channel,
    body: &[u8],
    error: &Error,
  ) {
    let publication = Publication {
      queue: &self.config.dead_letter_queue,
      body,
      content_type: CONTENT_TYPE_JSON,
      headers: vec![
        (HEADER_ORIGINAL_QUEUE, self.config.queue.clone()),
        (HEADER_ERROR, error.to_string()),
      ],
    };
    match channel.publish(publication).await {
      Ok(()) => warn!(
        queue = %self.config.queue,
        dead_letter_queue = %self.config.dead_letter_queue,
        error = %error,
        "retries exhausted, message dead-lettered"
      ),
      Err(publish_error) => error!(
        queue = %self.config.queue,
        dead_letter_queue = %self.config.dead_letter_queue,
        error = %error,
        publish_error = %publish_error,
        "retries exhausted and dead-letter publish failed, message dropped"
      ),
    }
  }
}
