//! SQL schema for the catalog document store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per price record. Rows are updated in place when the same value
-- is observed again; a value change inserts a new row.
CREATE TABLE IF NOT EXISTS prices (
    price_id    TEXT PRIMARY KEY,
    shop_id     TEXT NOT NULL,
    product_id  TEXT NOT NULL,
    amount      TEXT NOT NULL,   -- exact decimal, never a float
    currency    TEXT NOT NULL,   -- 'EUR' | 'USD'
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed nanosecond precision
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shops (
    shop_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    street      TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    city        TEXT NOT NULL,
    country     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ingredients (
    ingredient_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    kind          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS prices_key_idx        ON prices(shop_id, product_id, updated_at);
CREATE INDEX IF NOT EXISTS ingredients_name_idx  ON ingredients(name);
CREATE INDEX IF NOT EXISTS ingredients_kind_idx  ON ingredients(kind);

PRAGMA user_version = 1;
";
