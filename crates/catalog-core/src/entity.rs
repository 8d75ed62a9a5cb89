//! Non-price catalog entities: shops and ingredients.
//!
//! The ingestion pipeline never touches these; they share the store
//! abstraction so a routing backend can send them somewhere other than the
//! prices.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Shops ───────────────────────────────────────────────────────────────────

/// Postal location of a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub street:      String,
  pub postal_code: String,
  pub city:        String,
  pub country:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
  pub shop_id:  Uuid,
  pub name:     String,
  pub location: Location,
}

/// Input to [`crate::store::CatalogStore::add_shop`].
#[derive(Debug, Clone)]
pub struct NewShop {
  pub name:     String,
  pub location: Location,
}

// ─── Ingredients ─────────────────────────────────────────────────────────────

/// The category an ingredient belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
  Vegetable,
  Fruit,
  Meat,
  Fish,
  Dairy,
  Spice,
  Sugar,
  Cereals,
  Nuts,
  Other,
}

impl IngredientKind {
  /// The discriminant string stored in the `kind` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Vegetable => "vegetable",
      Self::Fruit => "fruit",
      Self::Meat => "meat",
      Self::Fish => "fish",
      Self::Dairy => "dairy",
      Self::Spice => "spice",
      Self::Sugar => "sugar",
      Self::Cereals => "cereals",
      Self::Nuts => "nuts",
      Self::Other => "other",
    }
  }
}

impl FromStr for IngredientKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "vegetable" => Ok(Self::Vegetable),
      "fruit" => Ok(Self::Fruit),
      "meat" => Ok(Self::Meat),
      "fish" => Ok(Self::Fish),
      "dairy" => Ok(Self::Dairy),
      "spice" => Ok(Self::Spice),
      "sugar" => Ok(Self::Sugar),
      "cereals" => Ok(Self::Cereals),
      "nuts" => Ok(Self::Nuts),
      "other" => Ok(Self::Other),
      other => Err(Error::UnknownIngredientKind(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
  pub ingredient_id: Uuid,
  pub name:          String,
  pub description:   String,
  pub kind:          IngredientKind,
}

/// Input to [`crate::store::CatalogStore::add_ingredient`].
#[derive(Debug, Clone)]
pub struct NewIngredient {
  pub name:        String,
  pub description: String,
  pub kind:        IngredientKind,
}
