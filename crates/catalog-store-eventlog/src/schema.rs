//! SQL schema for the catalog event log.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    position        INTEGER PRIMARY KEY AUTOINCREMENT,  -- global log order
    stream_name     TEXT    NOT NULL,                   -- 'price-{shop}-{product}'
    stream_version  INTEGER NOT NULL,                   -- 0 for the '$stream-created' record
    event_type      TEXT    NOT NULL,                   -- '$'-prefixed for system records
    entity_id       TEXT,                               -- price_id; NULL for system records
    data            TEXT    NOT NULL,                   -- JSON payload
    recorded_at     TEXT    NOT NULL,
    UNIQUE (stream_name, stream_version)
);

CREATE INDEX IF NOT EXISTS events_entity_idx ON events(stream_name, entity_id);

PRAGMA user_version = 1;
";
