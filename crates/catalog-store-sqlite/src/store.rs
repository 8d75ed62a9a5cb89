//! [`SqliteStore`]: the SQLite document implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::{debug, warn};
use uuid::Uuid;

use catalog_core::{
  entity::{Ingredient, IngredientKind, NewIngredient, NewShop, Shop},
  price::{NewPrice, Price, PriceFilter, PriceKey},
  store::CatalogStore,
};

use crate::{
  Error, Result,
  encode::{
    INGREDIENT_COLUMNS, PRICE_COLUMNS, RawIngredient, RawPrice, RawShop,
    SHOP_COLUMNS, encode_amount, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_price(&self, price: &Price) -> Result<()> {
    let price_id_str   = encode_uuid(price.price_id);
    let shop_id        = price.shop_id.clone();
    let product_id     = price.product_id.clone();
    let amount_str     = encode_amount(price.amount);
    let currency_str   = price.currency.code();
    let created_at_str = encode_dt(price.created_at);
    let updated_at_str = encode_dt(price.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO prices (
             price_id, shop_id, product_id, amount, currency,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            price_id_str,
            shop_id,
            product_id,
            amount_str,
            currency_str,
            created_at_str,
            updated_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Connection lifecycle ──────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fails if the connection is already closed.
  async fn disconnect(&self) -> Result<()> {
    // `close` on a closed connection reports success, so check first.
    self.ping().await?;
    self.conn.clone().close().await?;
    debug!("document store connection closed");
    Ok(())
  }

  // ── Prices ────────────────────────────────────────────────────────────────

  async fn current_price(&self, key: &PriceKey) -> Result<Option<Price>> {
    let shop_id    = key.shop_id.clone();
    let product_id = key.product_id.clone();

    let raw: Option<RawPrice> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PRICE_COLUMNS} FROM prices
               WHERE shop_id = ?1 AND product_id = ?2
               ORDER BY updated_at DESC
               LIMIT 1"
            ),
            rusqlite::params![shop_id, product_id],
            RawPrice::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPrice::into_price).transpose()
  }

  async fn create_price(&self, input: NewPrice) -> Result<Price> {
    let price = input.into_price(Utc::now());
    self.insert_price(&price).await?;
    Ok(price)
  }

  async fn update_price(&self, price: Price) -> Result<Price> {
    let price_id       = price.price_id;
    let price_id_str   = encode_uuid(price_id);
    let amount_str     = encode_amount(price.amount);
    let currency_str   = price.currency.code();
    let updated_at_str = encode_dt(price.updated_at);

    let raw: Option<RawPrice> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE prices SET amount = ?2, currency = ?3, updated_at = ?4
           WHERE price_id = ?1",
          rusqlite::params![price_id_str, amount_str, currency_str, updated_at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {PRICE_COLUMNS} FROM prices WHERE price_id = ?1"),
          rusqlite::params![price_id_str],
          RawPrice::from_row,
        )?))
      })
      .await?;

    match raw {
      Some(raw) => raw.into_price(),
      None => {
        warn!(%price_id, "update of unknown price");
        Err(Error::PriceNotFound(price_id))
      }
    }
  }

  async fn list_prices(&self, filter: &PriceFilter) -> Result<Vec<Price>> {
    // Amount bounds are checked after decoding; `amount` is text in SQL.
    let mut conds: Vec<String> = vec![];
    let mut args: Vec<String> = vec![];
    let mut push = |cond: &str, arg: String| {
      args.push(arg);
      conds.push(format!("{cond} ?{}", args.len()));
    };

    if let Some(id) = filter.price_id {
      push("price_id =", encode_uuid(id));
    }
    if let Some(shop_id) = &filter.shop_id {
      push("shop_id =", shop_id.clone());
    }
    if let Some(product_id) = &filter.product_id {
      push("product_id =", product_id.clone());
    }
    if let Some(from) = filter.created_from {
      push("created_at >=", encode_dt(from));
    }
    if let Some(until) = filter.updated_until {
      push("updated_at <=", encode_dt(until));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let raws: Vec<RawPrice> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {PRICE_COLUMNS} FROM prices {where_clause}"))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawPrice::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut prices: Vec<Price> = raws
      .into_iter()
      .map(RawPrice::into_price)
      .collect::<Result<_>>()?;
    prices.retain(|p| filter.matches(p));
    Ok(prices)
  }

  // ── Ingredients ───────────────────────────────────────────────────────────

  async fn add_ingredient(&self, input: NewIngredient) -> Result<Ingredient> {
    let ingredient = Ingredient {
      ingredient_id: Uuid::new_v4(),
      name:          input.name,
      description:   input.description,
      kind:          input.kind,
    };

    let id_str      = encode_uuid(ingredient.ingredient_id);
    let name        = ingredient.name.clone();
    let description = ingredient.description.clone();
    let kind_str    = ingredient.kind.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ingredients (ingredient_id, name, description, kind)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, description, kind_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(ingredient)
  }

  async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIngredient> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE ingredient_id = ?1"
            ),
            rusqlite::params![id_str],
            RawIngredient::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawIngredient::into_ingredient).transpose()
  }

  async fn find_ingredient_by_name(&self, name: &str) -> Result<Option<Ingredient>> {
    let name = name.to_owned();

    let raw: Option<RawIngredient> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE name = ?1 LIMIT 1"
            ),
            rusqlite::params![name],
            RawIngredient::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawIngredient::into_ingredient).transpose()
  }

  async fn list_ingredients(
    &self,
    kind: Option<IngredientKind>,
  ) -> Result<Vec<Ingredient>> {
    let kind_str = kind.map(IngredientKind::as_str);

    let raws: Vec<RawIngredient> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(k) = kind_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE kind = ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![k], RawIngredient::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt =
            conn.prepare(&format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients"))?;
          stmt
            .query_map([], RawIngredient::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIngredient::into_ingredient).collect()
  }

  async fn update_ingredient(&self, ingredient: Ingredient) -> Result<Ingredient> {
    let id_str      = encode_uuid(ingredient.ingredient_id);
    let name        = ingredient.name.clone();
    let description = ingredient.description.clone();
    let kind_str    = ingredient.kind.as_str();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE ingredients SET name = ?2, description = ?3, kind = ?4
           WHERE ingredient_id = ?1",
          rusqlite::params![id_str, name, description, kind_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IngredientNotFound(ingredient.ingredient_id));
    }
    Ok(ingredient)
  }

  // ── Shops ─────────────────────────────────────────────────────────────────

  async fn add_shop(&self, input: NewShop) -> Result<Shop> {
    let shop = Shop {
      shop_id:  Uuid::new_v4(),
      name:     input.name,
      location: input.location,
    };

    let id_str   = encode_uuid(shop.shop_id);
    let name     = shop.name.clone();
    let location = shop.location.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shops (shop_id, name, street, postal_code, city, country)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            name,
            location.street,
            location.postal_code,
            location.city,
            location.country,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(shop)
  }

  async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawShop> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE shop_id = ?1"),
            rusqlite::params![id_str],
            RawShop::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawShop::into_shop).transpose()
  }

  async fn list_shops(&self) -> Result<Vec<Shop>> {
    let raws: Vec<RawShop> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {SHOP_COLUMNS} FROM shops"))?;
        let rows = stmt
          .query_map([], RawShop::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShop::into_shop).collect()
  }

  async fn update_shop(&self, shop: Shop) -> Result<Shop> {
    let id_str   = encode_uuid(shop.shop_id);
    let name     = shop.name.clone();
    let location = shop.location.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shops
           SET name = ?2, street = ?3, postal_code = ?4, city = ?5, country = ?6
           WHERE shop_id = ?1",
          rusqlite::params![
            id_str,
            name,
            location.street,
            location.postal_code,
            location.city,
            location.country,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ShopNotFound(shop.shop_id));
    }
    Ok(shop)
  }

  async fn delete_shop(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM shops WHERE shop_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::ShopNotFound(id));
    }
    Ok(())
  }
}
