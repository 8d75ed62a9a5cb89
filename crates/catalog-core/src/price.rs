//! Price types: the value object tracked per (shop, product) pair.
//!
//! A price record is created whenever a shop's price for a product changes
//! value. Observing the same value again only refreshes `updated_at`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Currency ────────────────────────────────────────────────────────────────

/// The fixed set of currencies a price may be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
  Eur,
  Usd,
}

impl Currency {
  /// The ISO 4217 code, as carried on the wire and in storage.
  pub fn code(self) -> &'static str {
    match self {
      Self::Eur => "EUR",
      Self::Usd => "USD",
    }
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Currency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "EUR" => Ok(Self::Eur),
      "USD" => Ok(Self::Usd),
      other => Err(Error::UnknownCurrency(other.to_owned())),
    }
  }
}

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The natural key of a price: one logical price entity per shop and product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
  pub shop_id:    String,
  pub product_id: String,
}

impl PriceKey {
  pub fn new(shop_id: impl Into<String>, product_id: impl Into<String>) -> Self {
    Self { shop_id: shop_id.into(), product_id: product_id.into() }
  }

  /// Deterministic name of the append-only stream holding this key's facts.
  pub fn stream_name(&self) -> String {
    format!("price-{}-{}", self.shop_id, self.product_id)
  }
}

impl fmt::Display for PriceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.shop_id, self.product_id)
  }
}

// ─── Price ───────────────────────────────────────────────────────────────────

/// A persisted price record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
  pub price_id:   Uuid,
  pub shop_id:    String,
  pub product_id: String,
  pub amount:     Decimal,
  pub currency:   Currency,
  /// Set once, when the record is first persisted.
  pub created_at: DateTime<Utc>,
  /// Refreshed on every reconciliation outcome that touches the record.
  pub updated_at: DateTime<Utc>,
}

impl Price {
  pub fn key(&self) -> PriceKey {
    PriceKey::new(self.shop_id.clone(), self.product_id.clone())
  }

  /// Whether this record already carries exactly `amount` in `currency`.
  pub fn has_value(&self, amount: Decimal, currency: Currency) -> bool {
    self.amount == amount && self.currency == currency
  }
}

// ─── NewPrice ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::create_price`].
/// Identity and both timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPrice {
  pub key:      PriceKey,
  pub amount:   Decimal,
  pub currency: Currency,
}

impl NewPrice {
  /// Materialise the stored form with a fresh identity and `now` timestamps.
  pub fn into_price(self, now: DateTime<Utc>) -> Price {
    Price {
      price_id:   Uuid::new_v4(),
      shop_id:    self.key.shop_id,
      product_id: self.key.product_id,
      amount:     self.amount,
      currency:   self.currency,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::CatalogStore::list_prices`]. Every field is
/// optional; an empty filter matches every record.
#[derive(Debug, Clone, Default)]
pub struct PriceFilter {
  pub price_id:      Option<Uuid>,
  pub shop_id:       Option<String>,
  pub product_id:    Option<String>,
  pub min_amount:    Option<Decimal>,
  pub max_amount:    Option<Decimal>,
  /// Inclusive lower bound on `created_at`.
  pub created_from:  Option<DateTime<Utc>>,
  /// Inclusive upper bound on `updated_at`.
  pub updated_until: Option<DateTime<Utc>>,
}

impl PriceFilter {
  /// Restrict to a single key.
  pub fn for_key(key: &PriceKey) -> Self {
    Self {
      shop_id: Some(key.shop_id.clone()),
      product_id: Some(key.product_id.clone()),
      ..Self::default()
    }
  }

  pub fn matches(&self, price: &Price) -> bool {
    self.price_id.is_none_or(|id| price.price_id == id)
      && self.shop_id.as_ref().is_none_or(|s| &price.shop_id == s)
      && self.product_id.as_ref().is_none_or(|p| &price.product_id == p)
      && self.min_amount.is_none_or(|min| price.amount >= min)
      && self.max_amount.is_none_or(|max| price.amount <= max)
      && self.created_from.is_none_or(|from| price.created_at >= from)
      && self.updated_until.is_none_or(|until| price.updated_at <= until)
  }
}
