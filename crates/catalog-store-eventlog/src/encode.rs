//! Column encoding for the `events` table.
//!
//! Timestamps are RFC 3339 UTC strings with fixed nanosecond precision.
//! Payloads are compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result, log::RecordedEvent};

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub const EVENT_COLUMNS: &str =
  "position, stream_name, stream_version, event_type, data, recorded_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub position:       i64,
  pub stream_name:    String,
  pub stream_version: i64,
  pub event_type:     String,
  pub data:           String,
  pub recorded_at:    String,
}

impl RawEvent {
  /// Map a row selected with [`EVENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      position:       row.get(0)?,
      stream_name:    row.get(1)?,
      stream_version: row.get(2)?,
      event_type:     row.get(3)?,
      data:           row.get(4)?,
      recorded_at:    row.get(5)?,
    })
  }

  pub fn into_recorded(self) -> Result<RecordedEvent> {
    Ok(RecordedEvent {
      position:       self.position,
      stream_name:    self.stream_name,
      stream_version: self.stream_version,
      event_type:     self.event_type,
      data:           serde_json::from_str(&self.data)?,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}
