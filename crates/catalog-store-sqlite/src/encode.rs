//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nanosecond
//! precision, so lexicographic order in SQL equals chronological order.
//! Amounts are stored as exact decimal text. UUIDs are stored as hyphenated
//! lowercase strings.

use catalog_core::{
  entity::{Ingredient, Location, Shop},
  price::Price,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_amount(amount: Decimal) -> String { amount.to_string() }

pub fn decode_amount(s: &str) -> Result<Decimal> { Ok(s.parse::<Decimal>()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PRICE_COLUMNS: &str =
  "price_id, shop_id, product_id, amount, currency, created_at, updated_at";

/// Raw strings read directly from a `prices` row.
pub struct RawPrice {
  pub price_id:   String,
  pub shop_id:    String,
  pub product_id: String,
  pub amount:     String,
  pub currency:   String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawPrice {
  /// Map a row selected with [`PRICE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      price_id:   row.get(0)?,
      shop_id:    row.get(1)?,
      product_id: row.get(2)?,
      amount:     row.get(3)?,
      currency:   row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_price(self) -> Result<Price> {
    Ok(Price {
      price_id:   decode_uuid(&self.price_id)?,
      shop_id:    self.shop_id,
      product_id: self.product_id,
      amount:     decode_amount(&self.amount)?,
      currency:   self.currency.parse()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const SHOP_COLUMNS: &str =
  "shop_id, name, street, postal_code, city, country";

/// Raw strings read directly from a `shops` row.
pub struct RawShop {
  pub shop_id:     String,
  pub name:        String,
  pub street:      String,
  pub postal_code: String,
  pub city:        String,
  pub country:     String,
}

impl RawShop {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      shop_id:     row.get(0)?,
      name:        row.get(1)?,
      street:      row.get(2)?,
      postal_code: row.get(3)?,
      city:        row.get(4)?,
      country:     row.get(5)?,
    })
  }

  pub fn into_shop(self) -> Result<Shop> {
    Ok(Shop {
      shop_id:  decode_uuid(&self.shop_id)?,
      name:     self.name,
      location: Location {
        street:      self.street,
        postal_code: self.postal_code,
        city:        self.city,
        country:     self.country,
      },
    })
  }
}

pub const INGREDIENT_COLUMNS: &str = "ingredient_id, name, description, kind";

/// Raw strings read directly from an `ingredients` row.
pub struct RawIngredient {
  pub ingredient_id: String,
  pub name:          String,
  pub description:   String,
  pub kind:          String,
}

impl RawIngredient {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ingredient_id: row.get(0)?,
      name:          row.get(1)?,
      description:   row.get(2)?,
      kind:          row.get(3)?,
    })
  }

  pub fn into_ingredient(self) -> Result<Ingredient> {
    Ok(Ingredient {
      ingredient_id: decode_uuid(&self.ingredient_id)?,
      name:          self.name,
      description:   self.description,
      kind:          self.kind.parse()?,
    })
  }
}
