//! Append-only event-log backend for the catalog store.
//!
//! Every price write appends an immutable event to a per-key stream; the
//! current price is whatever the most recent event of that stream says.
//! The log lives in a single SQLite table accessed through
//! [`tokio_rusqlite`].

mod encode;
mod log;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use log::{Direction, EventType, RecordedEvent};
pub use store::EventLogStore;
