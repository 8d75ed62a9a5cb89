//! Low-level stream operations on the `events` table.
//!
//! These functions run synchronously on the connection thread (inside
//! `tokio_rusqlite::Connection::call`). Appends run in a single transaction
//! so a stream's versions are gap-free and strictly increasing, and a forward
//! replay ends on the same event a backward read starts with.

use catalog_core::price::Price;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{EVENT_COLUMNS, RawEvent, encode_uuid},
};

/// Event types starting with this prefix are system records, not facts.
pub const SYSTEM_PREFIX: &str = "$";

/// System record written at version 0 of every stream.
pub const STREAM_CREATED: &str = "$stream-created";

// ─── Event types ─────────────────────────────────────────────────────────────

/// The price facts this log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
  PriceCreated,
  PriceUpdated,
}

impl EventType {
  /// The discriminant stored in the `event_type` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PriceCreated => "PriceCreated",
      Self::PriceUpdated => "PriceUpdated",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "PriceCreated" => Some(Self::PriceCreated),
      "PriceUpdated" => Some(Self::PriceUpdated),
      _ => None,
    }
  }
}

/// Read order for [`crate::EventLogStore::read_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forwards,
  Backwards,
}

impl Direction {
  fn order(self) -> &'static str {
    match self {
      Self::Forwards => "ASC",
      Self::Backwards => "DESC",
    }
  }
}

// ─── Recorded events ─────────────────────────────────────────────────────────

/// An event as stored in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
  /// Position in the global log; strictly increasing across all streams.
  pub position:       i64,
  pub stream_name:    String,
  /// Position within the stream; the system record sits at 0.
  pub stream_version: i64,
  pub event_type:     String,
  pub data:           serde_json::Value,
  pub recorded_at:    DateTime<Utc>,
}

impl RecordedEvent {
  pub fn is_system(&self) -> bool { self.event_type.starts_with(SYSTEM_PREFIX) }

  /// Decode the payload if this is a price fact; `None` for anything else.
  pub fn to_price(&self) -> Result<Option<Price>> {
    if EventType::parse(&self.event_type).is_none() {
      return Ok(None);
    }
    Ok(Some(serde_json::from_value(self.data.clone())?))
  }
}

// ─── Appends ─────────────────────────────────────────────────────────────────

/// An event ready to be written.
pub struct PendingEvent {
  pub event_type:  EventType,
  /// The price as the caller wants it recorded.
  pub price:       Price,
  pub recorded_at: String,
  /// Refuse the append unless the stream already holds this price, and
  /// only take its mutable fields from `price`.
  pub must_exist:  bool,
}

const INSERT_EVENT: &str = "INSERT INTO events (
    stream_name, stream_version, event_type, entity_id, data, recorded_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

fn payload_error(e: serde_json::Error) -> rusqlite::Error {
  rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

/// Append `event` to `stream`, creating the stream on first use.
///
/// Returns the global position of the new event and the price it records,
/// or `None` if `must_exist` was set and the price is unknown to the stream.
/// For an existing price, identity, key and `created_at` come from its
/// latest event; amount, currency and `updated_at` from the caller.
pub fn append(
  conn: &mut rusqlite::Connection,
  stream: &str,
  event: PendingEvent,
) -> rusqlite::Result<Option<(i64, Price)>> {
  let tx = conn.transaction()?;
  let entity_id = encode_uuid(event.price.price_id);

  let price = if event.must_exist {
    let stored: Option<String> = tx
      .query_row(
        "SELECT data FROM events
         WHERE stream_name = ?1 AND entity_id = ?2
         ORDER BY stream_version DESC
         LIMIT 1",
        rusqlite::params![stream, entity_id],
        |row| row.get(0),
      )
      .optional()?;
    let Some(stored) = stored else {
      return Ok(None);
    };
    let stored: Price = serde_json::from_str(&stored).map_err(payload_error)?;
    Price {
      amount: event.price.amount,
      currency: event.price.currency,
      updated_at: event.price.updated_at,
      ..stored
    }
  } else {
    event.price
  };
  let data = serde_json::to_string(&price).map_err(payload_error)?;

  let last: Option<i64> = tx.query_row(
    "SELECT MAX(stream_version) FROM events WHERE stream_name = ?1",
    rusqlite::params![stream],
    |row| row.get(0),
  )?;

  let version = match last {
    Some(v) => v + 1,
    None => {
      let marker = serde_json::json!({ "stream": stream }).to_string();
      tx.execute(
        INSERT_EVENT,
        rusqlite::params![
          stream,
          0_i64,
          STREAM_CREATED,
          Option::<String>::None,
          marker,
          event.recorded_at,
        ],
      )?;
      1
    }
  };

  tx.execute(
    INSERT_EVENT,
    rusqlite::params![
      stream,
      version,
      event.event_type.as_str(),
      entity_id,
      data,
      event.recorded_at,
    ],
  )?;
  let position = tx.last_insert_rowid();
  tx.commit()?;

  Ok(Some((position, price)))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Every event of `stream`, system records included, in `direction` order.
pub fn read_stream(
  conn: &rusqlite::Connection,
  stream: &str,
  direction: Direction,
) -> rusqlite::Result<Vec<RawEvent>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EVENT_COLUMNS} FROM events
     WHERE stream_name = ?1
     ORDER BY stream_version {}",
    direction.order()
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![stream], RawEvent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// The most recent price fact of `stream`, skipping system records.
pub fn read_last_fact(
  conn: &rusqlite::Connection,
  stream: &str,
) -> rusqlite::Result<Option<RawEvent>> {
  conn
    .query_row(
      &format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE stream_name = ?1 AND event_type IN (?2, ?3)
         ORDER BY stream_version DESC
         LIMIT 1"
      ),
      rusqlite::params![
        stream,
        EventType::PriceCreated.as_str(),
        EventType::PriceUpdated.as_str(),
      ],
      RawEvent::from_row,
    )
    .optional()
}

/// Up to `limit` events of the whole log strictly before `before`, newest
/// first.
pub fn read_all_backward(
  conn: &rusqlite::Connection,
  before: i64,
  limit: i64,
) -> rusqlite::Result<Vec<RawEvent>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EVENT_COLUMNS} FROM events
     WHERE position < ?1
     ORDER BY position DESC
     LIMIT ?2"
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![before, limit], RawEvent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
