//! [`RoutingStore`], a structural composite of two stores.
//!
//! Price operations go to one backend, every other entity goes to the other.
//! This is composition, not a merge: nothing is checked across the two, and
//! each backend is assumed consistent for what is routed to it.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
  entity::{Ingredient, IngredientKind, NewIngredient, NewShop, Shop},
  price::{NewPrice, Price, PriceFilter, PriceKey},
  store::CatalogStore,
};

/// Which side of a [`RoutingStore`] produced an error.
#[derive(Debug, Error)]
pub enum RoutingError<P, E> {
  #[error("price backend: {0}")]
  Prices(#[source] P),

  #[error("entity backend: {0}")]
  Entities(#[source] E),
}

/// Routes prices to `P` and shops/ingredients to `E`.
///
/// Cloning is as cheap as cloning both backends.
#[derive(Debug, Clone)]
pub struct RoutingStore<P, E> {
  prices:   P,
  entities: E,
}

impl<P, E> RoutingStore<P, E> {
  pub fn new(prices: P, entities: E) -> Self { Self { prices, entities } }

  pub fn prices(&self) -> &P { &self.prices }

  pub fn entities(&self) -> &E { &self.entities }
}

/// Keep the first failure of a fan-out; the second is only logged.
fn first_failure<P, E>(
  op: &str,
  prices: Result<(), P>,
  entities: Result<(), E>,
) -> Result<(), RoutingError<P, E>>
where
  P: std::fmt::Display,
  E: std::fmt::Display,
{
  match (prices, entities) {
    (Err(p), Err(e)) => {
      warn!(error = %e, "{op} also failed on the entity backend");
      Err(RoutingError::Prices(p))
    }
    (Err(p), Ok(())) => Err(RoutingError::Prices(p)),
    (Ok(()), Err(e)) => Err(RoutingError::Entities(e)),
    (Ok(()), Ok(())) => Ok(()),
  }
}

impl<P, E> CatalogStore for RoutingStore<P, E>
where
  P: CatalogStore,
  E: CatalogStore,
{
  type Error = RoutingError<P::Error, E::Error>;

  // ── Connection lifecycle: fan out to both ─────────────────────────────────

  async fn ping(&self) -> Result<(), Self::Error> {
    let prices = self.prices.ping().await;
    let entities = self.entities.ping().await;
    first_failure("ping", prices, entities)
  }

  async fn disconnect(&self) -> Result<(), Self::Error> {
    let prices = self.prices.disconnect().await;
    let entities = self.entities.disconnect().await;
    first_failure("disconnect", prices, entities)
  }

  // ── Prices ────────────────────────────────────────────────────────────────

  async fn current_price(
    &self,
    key: &PriceKey,
  ) -> Result<Option<Price>, Self::Error> {
    self.prices.current_price(key).await.map_err(RoutingError::Prices)
  }

  async fn create_price(&self, input: NewPrice) -> Result<Price, Self::Error> {
    self.prices.create_price(input).await.map_err(RoutingError::Prices)
  }

  async fn update_price(&self, price: Price) -> Result<Price, Self::Error> {
    self.prices.update_price(price).await.map_err(RoutingError::Prices)
  }

  async fn list_prices(
    &self,
    filter: &PriceFilter,
  ) -> Result<Vec<Price>, Self::Error> {
    self.prices.list_prices(filter).await.map_err(RoutingError::Prices)
  }

  // ── Ingredients ───────────────────────────────────────────────────────────

  async fn add_ingredient(
    &self,
    input: NewIngredient,
  ) -> Result<Ingredient, Self::Error> {
    self.entities.add_ingredient(input).await.map_err(RoutingError::Entities)
  }

  async fn get_ingredient(
    &self,
    id: Uuid,
  ) -> Result<Option<Ingredient>, Self::Error> {
    self.entities.get_ingredient(id).await.map_err(RoutingError::Entities)
  }

  async fn find_ingredient_by_name(
    &self,
    name: &str,
  ) -> Result<Option<Ingredient>, Self::Error> {
    self
      .entities
      .find_ingredient_by_name(name)
      .await
      .map_err(RoutingError::Entities)
  }

  async fn list_ingredients(
    &self,
    kind: Option<IngredientKind>,
  ) -> Result<Vec<Ingredient>, Self::Error> {
    self.entities.list_ingredients(kind).await.map_err(RoutingError::Entities)
  }

  async fn update_ingredient(
    &self,
    ingredient: Ingredient,
  ) -> Result<Ingredient, Self::Error> {
    self
      .entities
      .update_ingredient(ingredient)
      .await
      .map_err(RoutingError::Entities)
  }

  // ── Shops ─────────────────────────────────────────────────────────────────

  async fn add_shop(&self, input: NewShop) -> Result<Shop, Self::Error> {
    self.entities.add_shop(input).await.map_err(RoutingError::Entities)
  }

  async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>, Self::Error> {
    self.entities.get_shop(id).await.map_err(RoutingError::Entities)
  }

  async fn list_shops(&self) -> Result<Vec<Shop>, Self::Error> {
    self.entities.list_shops().await.map_err(RoutingError::Entities)
  }

  async fn update_shop(&self, shop: Shop) -> Result<Shop, Self::Error> {
    self.entities.update_shop(shop).await.map_err(RoutingError::Entities)
  }

  async fn delete_shop(&self, id: Uuid) -> Result<(), Self::Error> {
    self.entities.delete_shop(id).await.map_err(RoutingError::Entities)
  }
}
