//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (`catalog-store-sqlite`,
//! `catalog-store-eventlog`) and by the [`RoutingStore`] composite. The
//! ingestion pipeline depends on this abstraction, not on any concrete
//! backend.
//!
//! [`RoutingStore`]: crate::routing::RoutingStore

use std::future::Future;

use uuid::Uuid;

use crate::{
  entity::{Ingredient, IngredientKind, NewIngredient, NewShop, Shop},
  price::{NewPrice, Price, PriceFilter, PriceKey},
};

/// Abstraction over a catalog storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Connection lifecycle ──────────────────────────────────────────────

  /// Check that the backend is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Release the backend's connection. Later calls are expected to fail.
  fn disconnect(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Prices ────────────────────────────────────────────────────────────

  /// Return the price with the greatest `updated_at` for `key`, or `None`
  /// if no price was ever recorded for it.
  fn current_price<'a>(
    &'a self,
    key: &'a PriceKey,
  ) -> impl Future<Output = Result<Option<Price>, Self::Error>> + Send + 'a;

  /// Persist a new price. Identity, `created_at` and `updated_at` are
  /// assigned by the store.
  fn create_price(
    &self,
    input: NewPrice,
  ) -> impl Future<Output = Result<Price, Self::Error>> + Send + '_;

  /// Overwrite amount, currency and `updated_at` of an existing price with
  /// the values carried by `price`.
  ///
  /// Returns a not-found error if `price.price_id` is unknown to the store.
  fn update_price(
    &self,
    price: Price,
  ) -> impl Future<Output = Result<Price, Self::Error>> + Send + '_;

  /// Return every price matching `filter`, in no particular order.
  fn list_prices<'a>(
    &'a self,
    filter: &'a PriceFilter,
  ) -> impl Future<Output = Result<Vec<Price>, Self::Error>> + Send + 'a;

  // ── Ingredients ───────────────────────────────────────────────────────

  fn add_ingredient(
    &self,
    input: NewIngredient,
  ) -> impl Future<Output = Result<Ingredient, Self::Error>> + Send + '_;

  /// Retrieve an ingredient by UUID. Returns `None` if not found.
  fn get_ingredient(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Ingredient>, Self::Error>> + Send + '_;

  fn find_ingredient_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Ingredient>, Self::Error>> + Send + 'a;

  /// List all ingredients, optionally filtered by kind.
  fn list_ingredients(
    &self,
    kind: Option<IngredientKind>,
  ) -> impl Future<Output = Result<Vec<Ingredient>, Self::Error>> + Send + '_;

  /// Replace every field of an existing ingredient.
  fn update_ingredient(
    &self,
    ingredient: Ingredient,
  ) -> impl Future<Output = Result<Ingredient, Self::Error>> + Send + '_;

  // ── Shops ─────────────────────────────────────────────────────────────

  fn add_shop(
    &self,
    input: NewShop,
  ) -> impl Future<Output = Result<Shop, Self::Error>> + Send + '_;

  /// Retrieve a shop by UUID. Returns `None` if not found.
  fn get_shop(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Shop>, Self::Error>> + Send + '_;

  fn list_shops(
    &self,
  ) -> impl Future<Output = Result<Vec<Shop>, Self::Error>> + Send + '_;

  /// Replace name and location of an existing shop.
  fn update_shop(
    &self,
    shop: Shop,
  ) -> impl Future<Output = Result<Shop, Self::Error>> + Send + '_;

  fn delete_shop(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
