//! An in-process [`Broker`] for the pipeline tests.
//!
//! Queues are plain FIFO buffers. Published messages, acknowledgements and
//! opened channels are recorded so callers can inspect what a consumer did.
//! Failures can be switched on to exercise error paths.

use std::{
  collections::{HashMap, VecDeque},
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use tokio::sync::Notify;

use crate::{
  BrokerError,
  broker::{Broker, Channel, Delivery, Publication},
};

/// A message published through [`MemoryBroker`].
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
  pub queue:        String,
  pub body:         Vec<u8>,
  pub content_type: String,
  pub headers:      Vec<(String, String)>,
}

impl Published {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
  }
}

#[derive(Default)]
struct State {
  queues:    HashMap<String, VecDeque<Vec<u8>>>,
  declared:  Vec<String>,
  published: Vec<Published>,
  acked:     Vec<Vec<u8>>,
}

#[derive(Default)]
struct Inner {
  state:         Mutex<State>,
  arrived:       Notify,
  closed:        AtomicBool,
  fail_channels: AtomicBool,
  fail_publish:  AtomicBool,
  channels:      AtomicUsize,
}

/// Cloning shares the same queues.
#[derive(Clone, Default)]
pub struct MemoryBroker {
  inner: Arc<Inner>,
}

impl MemoryBroker {
  pub fn new() -> Self { Self::default() }

  fn state(&self) -> MutexGuard<'_, State> { lock(&self.inner) }

  /// Enqueue `body` on `queue`.
  pub fn push(&self, queue: &str, body: impl Into<Vec<u8>>) {
    self
      .state()
      .queues
      .entry(queue.to_owned())
      .or_default()
      .push_back(body.into());
    self.inner.arrived.notify_waiters();
  }

  /// Close every channel once its queue is drained.
  pub fn close(&self) {
    self.inner.closed.store(true, Ordering::SeqCst);
    self.inner.arrived.notify_waiters();
  }

  /// Make [`Broker::open_channel`] fail while set.
  pub fn fail_channels(&self, fail: bool) {
    self.inner.fail_channels.store(fail, Ordering::SeqCst);
  }

  /// Make [`Channel::publish`] fail while set.
  pub fn fail_publish(&self, fail: bool) {
    self.inner.fail_publish.store(fail, Ordering::SeqCst);
  }

  /// How many times a channel was requested, failed attempts included.
  pub fn channels_opened(&self) -> usize {
    self.inner.channels.load(Ordering::SeqCst)
  }

  pub fn declared(&self) -> Vec<String> { self.state().declared.clone() }

  pub fn published(&self) -> Vec<Published> { self.state().published.clone() }

  /// Bodies acknowledged so far, in order.
  pub fn acked(&self) -> Vec<Vec<u8>> { self.state().acked.clone() }

  /// Messages still waiting on `queue`.
  pub fn pending(&self, queue: &str) -> usize {
    self.state().queues.get(queue).map_or(0, VecDeque::len)
  }
}

fn lock(inner: &Inner) -> MutexGuard<'_, State> {
  // State stays consistent even if a holder panicked mid-test.
  inner.state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Broker for MemoryBroker {
  type Channel = MemoryChannel;

  async fn open_channel(&self) -> Result<MemoryChannel, BrokerError> {
    self.inner.channels.fetch_add(1, Ordering::SeqCst);
    if self.inner.fail_channels.load(Ordering::SeqCst) {
      return Err(BrokerError::Connection("broker unavailable".into()));
    }
    Ok(MemoryChannel { inner: self.inner.clone(), queue: None })
  }
}

pub struct MemoryChannel {
  inner: Arc<Inner>,
  queue: Option<String>,
}

impl Channel for MemoryChannel {
  type Delivery = MemoryDelivery;

  async fn declare_queue(&mut self, queue: &str) -> Result<(), BrokerError> {
    let mut state = lock(&self.inner);
    if !state.declared.iter().any(|q| q == queue) {
      state.declared.push(queue.to_owned());
    }
    state.queues.entry(queue.to_owned()).or_default();
    Ok(())
  }

  async fn consume(
    &mut self,
    queue: &str,
    _consumer_tag: &str,
  ) -> Result<(), BrokerError> {
    self.queue = Some(queue.to_owned());
    Ok(())
  }

  async fn next_delivery(
    &mut self,
  ) -> Option<Result<MemoryDelivery, BrokerError>> {
    let queue = self.queue.clone()?;
    loop {
      // Registered before checking so a push in between is not missed.
      let arrived = self.inner.arrived.notified();
      let body = lock(&self.inner)
        .queues
        .get_mut(&queue)
        .and_then(VecDeque::pop_front);
      if let Some(body) = body {
        return Some(Ok(MemoryDelivery { inner: self.inner.clone(), body }));
      }
      if self.inner.closed.load(Ordering::SeqCst) {
        return None;
      }
      arrived.await;
    }
  }

  async fn publish(
    &mut self,
    publication: Publication<'_>,
  ) -> Result<(), BrokerError> {
    if self.inner.fail_publish.load(Ordering::SeqCst) {
      return Err(BrokerError::Publish {
        queue:  publication.queue.to_owned(),
        source: "publish refused".into(),
      });
    }
    let mut state = lock(&self.inner);
    state.published.push(Published {
      queue:        publication.queue.to_owned(),
      body:         publication.body.to_vec(),
      content_type: publication.content_type.to_owned(),
      headers:      publication
        .headers
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect(),
    });
    state
      .queues
      .entry(publication.queue.to_owned())
      .or_default()
      .push_back(publication.body.to_vec());
    Ok(())
  }
}

pub struct MemoryDelivery {
  inner: Arc<Inner>,
  body:  Vec<u8>,
}

impl Delivery for MemoryDelivery {
  fn body(&self) -> &[u8] { &self.body }

  async fn ack(self) -> Result<(), BrokerError> {
    lock(&self.inner).acked.push(self.body);
    Ok(())
  }
}
