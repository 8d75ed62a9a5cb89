//! Cooperative cancellation shared by the supervisor and the consumer.

use tokio::sync::watch;

/// Create a linked trigger and listener.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
  let (tx, rx) = watch::channel(false);
  (ShutdownTrigger { tx }, Shutdown { rx })
}

/// The sending half. Dropping it also counts as a shutdown request.
#[derive(Debug)]
pub struct ShutdownTrigger {
  tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
  pub fn trigger(&self) { self.tx.send_replace(true); }
}

/// The listening half; clone it for every task that must stop.
#[derive(Debug, Clone)]
pub struct Shutdown {
  rx: watch::Receiver<bool>,
}

impl Shutdown {
  pub fn is_cancelled(&self) -> bool {
    *self.rx.borrow() || self.rx.has_changed().is_err()
  }

  /// Resolves once shutdown was requested. Returns immediately if it
  /// already was.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    // An error means the trigger is gone, which is a request as well.
    let _ = rx.wait_for(|cancelled| *cancelled).await;
  }
}
