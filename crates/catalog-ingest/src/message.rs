//! The inbound price-update message and its validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use thiserror::Error;

use catalog_core::price::{Currency, NewPrice, PriceKey};

/// A price update as it arrives on the work queue.
///
/// Field names follow the producers' JSON: `productId`, `shopId`, `price`,
/// `devise`, `date`. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
  pub product_id: String,
  pub shop_id:    String,
  /// A JSON number; quoted amounts are rejected.
  #[serde(
    deserialize_with = "deserialize_number",
    serialize_with = "serialize_number"
  )]
  pub price:      Decimal,
  /// Currency code; checked against [`Currency`] during validation.
  pub devise:     String,
  /// When the producer observed this price.
  pub date:       DateTime<Utc>,
}

/// Read `price` through `serde_json::Number`, which only accepts numbers,
/// and convert its text form so the written digits are kept.
fn deserialize_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
  D: Deserializer<'de>,
{
  let text = serde_json::Number::deserialize(deserializer)?.to_string();
  text
    .parse::<Decimal>()
    .or_else(|_| Decimal::from_scientific(&text))
    .map_err(de::Error::custom)
}

fn serialize_number<S>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  price
    .to_string()
    .parse::<serde_json::Number>()
    .map_err(ser::Error::custom)?
    .serialize(serializer)
}

/// A rule broken by a [`PriceUpdate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("productId must not be empty")]
  EmptyProductId,

  #[error("shopId must not be empty")]
  EmptyShopId,

  #[error("price must be positive, got {0}")]
  NonPositivePrice(Decimal),

  #[error("unsupported devise {0:?}")]
  UnknownDevise(String),
}

impl PriceUpdate {
  /// Check every field and convert into the typed form used downstream.
  pub fn validate(self) -> Result<ValidPriceUpdate, ValidationError> {
    if self.product_id.trim().is_empty() {
      return Err(ValidationError::EmptyProductId);
    }
    if self.shop_id.trim().is_empty() {
      return Err(ValidationError::EmptyShopId);
    }
    if self.price <= Decimal::ZERO {
      return Err(ValidationError::NonPositivePrice(self.price));
    }
    let currency = self
      .devise
      .parse::<Currency>()
      .map_err(|_| ValidationError::UnknownDevise(self.devise.clone()))?;

    Ok(ValidPriceUpdate {
      key: PriceKey::new(self.shop_id, self.product_id),
      amount: self.price,
      currency,
      effective_date: self.date,
    })
  }
}

/// A price fact that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPriceUpdate {
  pub key:            PriceKey,
  pub amount:         Decimal,
  pub currency:       Currency,
  pub effective_date: DateTime<Utc>,
}

impl ValidPriceUpdate {
  /// The record to create when this fact carries a new value.
  pub fn to_new_price(&self) -> NewPrice {
    NewPrice {
      key:      self.key.clone(),
      amount:   self.amount,
      currency: self.currency,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn update(body: serde_json::Value) -> PriceUpdate {
    serde_json::from_value(body).unwrap()
  }

  fn valid_body() -> serde_json::Value {
    json!({
      "productId": "P1",
      "shopId": "S1",
      "price": 10.5,
      "devise": "EUR",
      "date": "2024-03-01T12:00:00Z",
    })
  }

  #[test]
  fn decodes_and_validates_wire_message() {
    let valid = update(valid_body()).validate().unwrap();
    assert_eq!(valid.key, PriceKey::new("S1", "P1"));
    assert_eq!(valid.amount, "10.5".parse::<Decimal>().unwrap());
    assert_eq!(valid.currency, Currency::Eur);
    assert_eq!(valid.effective_date.to_rfc3339(), "2024-03-01T12:00:00+00:00");
  }

  #[test]
  fn quoted_price_fails_to_decode() {
    let mut body = valid_body();
    body["price"] = json!("10.5");
    assert!(serde_json::from_value::<PriceUpdate>(body).is_err());
  }

  #[test]
  fn price_is_written_back_as_a_number() {
    let value = serde_json::to_value(update(valid_body())).unwrap();
    assert_eq!(value["price"], json!(10.5));
  }

  #[test]
  fn missing_field_fails_to_decode() {
    let mut body = valid_body();
    body.as_object_mut().unwrap().remove("date");
    assert!(serde_json::from_value::<PriceUpdate>(body).is_err());
  }

  #[test]
  fn rejects_empty_ids() {
    let mut u = update(valid_body());
    u.product_id = "  ".into();
    assert_eq!(u.validate(), Err(ValidationError::EmptyProductId));

    let mut u = update(valid_body());
    u.shop_id = String::new();
    assert_eq!(u.validate(), Err(ValidationError::EmptyShopId));
  }

  #[test]
  fn rejects_non_positive_price() {
    let mut u = update(valid_body());
    u.price = Decimal::ZERO;
    assert!(matches!(
      u.validate(),
      Err(ValidationError::NonPositivePrice(_))
    ));
  }

  #[test]
  fn rejects_unknown_devise() {
    let mut u = update(valid_body());
    u.devise = "GBP".into();
    assert_eq!(
      u.validate(),
      Err(ValidationError::UnknownDevise("GBP".into()))
    );
  }
}
