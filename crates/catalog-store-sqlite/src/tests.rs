//! Integration tests for `SqliteStore` against an in-memory database.

use catalog_core::{
  entity::{IngredientKind, Location, NewIngredient, NewShop},
  price::{Currency, NewPrice, PriceFilter, PriceKey},
  store::CatalogStore,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn dec(s: &str) -> Decimal { s.parse().unwrap() }

fn new_price(shop: &str, product: &str, amount: &str) -> NewPrice {
  NewPrice {
    key:      PriceKey::new(shop, product),
    amount:   dec(amount),
    currency: Currency::Eur,
  }
}

// ─── Prices ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_succeeds_on_open_store() {
  store().await.ping().await.unwrap();
}

#[tokio::test]
async fn current_price_missing_returns_none() {
  let s = store().await;
  let current = s.current_price(&PriceKey::new("S1", "P1")).await.unwrap();
  assert!(current.is_none());
}

#[tokio::test]
async fn create_price_assigns_identity_and_timestamps() {
  let s = store().await;
  let before = Utc::now();

  let price = s.create_price(new_price("S1", "P1", "10.0")).await.unwrap();
  assert!(price.created_at >= before);
  assert_eq!(price.created_at, price.updated_at);

  let current = s
    .current_price(&PriceKey::new("S1", "P1"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(current, price);
}

#[tokio::test]
async fn amount_roundtrips_exactly() {
  let s = store().await;
  let price = s.create_price(new_price("S1", "P1", "0.10")).await.unwrap();
  let current = s.current_price(&price.key()).await.unwrap().unwrap();
  assert_eq!(current.amount, dec("0.10"));
  assert_eq!(current.amount.to_string(), "0.10");
}

#[tokio::test]
async fn current_price_picks_greatest_updated_at() {
  let s = store().await;
  let first = s.create_price(new_price("S1", "P1", "10")).await.unwrap();
  let second = s.create_price(new_price("S1", "P1", "12")).await.unwrap();

  let current = s.current_price(&first.key()).await.unwrap().unwrap();
  assert_eq!(current.price_id, second.price_id);

  // Push the first record's timestamp past the second one.
  let mut bumped = first.clone();
  bumped.updated_at = second.updated_at + Duration::hours(1);
  s.update_price(bumped).await.unwrap();

  let current = s.current_price(&first.key()).await.unwrap().unwrap();
  assert_eq!(current.price_id, first.price_id);
}

#[tokio::test]
async fn current_price_is_stable_without_writes() {
  let s = store().await;
  s.create_price(new_price("S1", "P1", "10")).await.unwrap();
  s.create_price(new_price("S1", "P1", "11")).await.unwrap();

  let key = PriceKey::new("S1", "P1");
  let a = s.current_price(&key).await.unwrap();
  let b = s.current_price(&key).await.unwrap();
  assert_eq!(a, b);
}

#[tokio::test]
async fn update_price_mutates_in_place() {
  let s = store().await;
  let price = s.create_price(new_price("S1", "P1", "10")).await.unwrap();

  let effective = Utc::now() + Duration::days(1);
  let mut update = price.clone();
  update.updated_at = effective;
  let updated = s.update_price(update).await.unwrap();

  assert_eq!(updated.price_id, price.price_id);
  assert_eq!(updated.created_at, price.created_at);
  assert_eq!(updated.updated_at, effective);

  let all = s.list_prices(&PriceFilter::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn update_unknown_price_is_not_found() {
  let s = store().await;
  let ghost = new_price("S1", "P1", "10").into_price(Utc::now());
  let err = s.update_price(ghost.clone()).await.unwrap_err();
  assert!(matches!(err, Error::PriceNotFound(id) if id == ghost.price_id));
}

#[tokio::test]
async fn list_prices_filters_by_key_amount_and_dates() {
  let s = store().await;
  let cheap = s.create_price(new_price("S1", "P1", "5")).await.unwrap();
  let dear = s.create_price(new_price("S1", "P1", "50")).await.unwrap();
  s.create_price(new_price("S2", "P1", "7")).await.unwrap();

  let all = s.list_prices(&PriceFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let s1 = s
    .list_prices(&PriceFilter::for_key(&PriceKey::new("S1", "P1")))
    .await
    .unwrap();
  assert_eq!(s1.len(), 2);

  let mut bounded = PriceFilter::for_key(&PriceKey::new("S1", "P1"));
  bounded.max_amount = Some(dec("10"));
  let found = s.list_prices(&bounded).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].price_id, cheap.price_id);

  let by_id = PriceFilter { price_id: Some(dear.price_id), ..PriceFilter::default() };
  assert_eq!(s.list_prices(&by_id).await.unwrap(), vec![dear.clone()]);

  let future = PriceFilter {
    created_from: Some(Utc::now() + Duration::hours(1)),
    ..PriceFilter::default()
  };
  assert!(s.list_prices(&future).await.unwrap().is_empty());

  let past = PriceFilter {
    updated_until: Some(cheap.updated_at - Duration::seconds(1)),
    ..PriceFilter::default()
  };
  assert!(s.list_prices(&past).await.unwrap().is_empty());
}

#[tokio::test]
async fn disconnect_closes_connection() {
  let s = store().await;
  s.disconnect().await.unwrap();
  assert!(s.ping().await.is_err());
}

#[tokio::test]
async fn disconnect_twice_fails() {
  let s = store().await;
  s.disconnect().await.unwrap();
  assert!(matches!(s.disconnect().await, Err(Error::Database(_))));
}

// ─── Ingredients ─────────────────────────────────────────────────────────────

fn tomato() -> NewIngredient {
  NewIngredient {
    name:        "tomato".into(),
    description: "red and round".into(),
    kind:        IngredientKind::Vegetable,
  }
}

#[tokio::test]
async fn add_and_find_ingredient() {
  let s = store().await;
  let added = s.add_ingredient(tomato()).await.unwrap();

  let by_id = s.get_ingredient(added.ingredient_id).await.unwrap();
  assert_eq!(by_id.as_ref(), Some(&added));

  let by_name = s.find_ingredient_by_name("tomato").await.unwrap();
  assert_eq!(by_name, Some(added));

  assert!(s.find_ingredient_by_name("basil").await.unwrap().is_none());
}

#[tokio::test]
async fn list_ingredients_filtered_by_kind() {
  let s = store().await;
  s.add_ingredient(tomato()).await.unwrap();
  s.add_ingredient(NewIngredient {
    name:        "apple".into(),
    description: "crisp".into(),
    kind:        IngredientKind::Fruit,
  })
  .await
  .unwrap();

  assert_eq!(s.list_ingredients(None).await.unwrap().len(), 2);
  let fruit = s.list_ingredients(Some(IngredientKind::Fruit)).await.unwrap();
  assert_eq!(fruit.len(), 1);
  assert_eq!(fruit[0].name, "apple");
}

#[tokio::test]
async fn update_ingredient_replaces_fields() {
  let s = store().await;
  let mut ingredient = s.add_ingredient(tomato()).await.unwrap();
  ingredient.kind = IngredientKind::Fruit;
  s.update_ingredient(ingredient.clone()).await.unwrap();

  let fetched = s.get_ingredient(ingredient.ingredient_id).await.unwrap();
  assert_eq!(fetched.unwrap().kind, IngredientKind::Fruit);

  ingredient.ingredient_id = Uuid::new_v4();
  let err = s.update_ingredient(ingredient).await.unwrap_err();
  assert!(matches!(err, Error::IngredientNotFound(_)));
}

// ─── Shops ───────────────────────────────────────────────────────────────────

fn corner_shop() -> NewShop {
  NewShop {
    name:     "Corner shop".into(),
    location: Location {
      street:      "1 Main Street".into(),
      postal_code: "75001".into(),
      city:        "Paris".into(),
      country:     "France".into(),
    },
  }
}

#[tokio::test]
async fn shop_crud() {
  let s = store().await;
  let mut shop = s.add_shop(corner_shop()).await.unwrap();
  assert_eq!(s.list_shops().await.unwrap().len(), 1);

  shop.name = "Renamed".into();
  s.update_shop(shop.clone()).await.unwrap();
  let fetched = s.get_shop(shop.shop_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Renamed");
  assert_eq!(fetched.location, shop.location);

  s.delete_shop(shop.shop_id).await.unwrap();
  assert!(s.get_shop(shop.shop_id).await.unwrap().is_none());

  let err = s.delete_shop(shop.shop_id).await.unwrap_err();
  assert!(matches!(err, Error::ShopNotFound(_)));
}
