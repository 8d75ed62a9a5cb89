//! Keeps a [`Consumer`] running across failures until shutdown.

use std::time::Duration;

use tracing::{error, info};

use catalog_core::store::CatalogStore;

use crate::{broker::Broker, consumer::Consumer, shutdown::Shutdown};

pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

pub struct Supervisor<B, S> {
  consumer:      Consumer<B, S>,
  restart_delay: Duration,
}

impl<B, S> Supervisor<B, S>
where
  B: Broker,
  S: CatalogStore,
{
  pub fn new(consumer: Consumer<B, S>) -> Self {
    Self { consumer, restart_delay: DEFAULT_RESTART_DELAY }
  }

  pub fn with_restart_delay(mut self, restart_delay: Duration) -> Self {
    self.restart_delay = restart_delay;
    self
  }

  pub fn consumer(&self) -> &Consumer<B, S> { &self.consumer }

  /// Run the consumer, restarting it after every exit, until `shutdown`
  /// fires. Consumer errors are logged, never returned.
  pub async fn run(&self, shutdown: Shutdown) {
    let queue = self.consumer.config().queue.as_str();
    loop {
      if shutdown.is_cancelled() {
        break;
      }

      match self.consumer.run(&shutdown).await {
        Ok(()) => info!(queue, "consumer exited"),
        Err(e) => error!(queue, error = %e, "consumer failed"),
      }

      tokio::select! {
        biased;
        () = shutdown.cancelled() => break,
        () = tokio::time::sleep(self.restart_delay) => {
          info!(queue, delay = ?self.restart_delay, "restarting consumer");
        }
      }
    }
    info!(queue, "supervisor stopped");
  }
}
