//! Price ingestion: from a broker delivery to a reconciled price record.
//!
//! A [`consumer::Consumer`] pulls deliveries one at a time, decodes and
//! validates them into [`message::ValidPriceUpdate`]s, and hands them to
//! [`reconcile::reconcile`], which talks to storage only through
//! [`catalog_core::store::CatalogStore`]. Failed deliveries are retried with
//! a linear backoff and then dead-lettered. A [`supervisor::Supervisor`]
//! keeps the consumer running until shutdown.

pub mod amqp;
pub mod broker;
pub mod consumer;
pub mod error;
#[cfg(test)]
mod memory;
pub mod message;
pub mod reconcile;
pub mod shutdown;
pub mod supervisor;

pub use error::{BrokerError, Error, Result};
