//! [`EventLogStore`]: the append-only implementation of [`CatalogStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use catalog_core::{
  entity::{Ingredient, IngredientKind, NewIngredient, NewShop, Shop},
  price::{NewPrice, Price, PriceFilter, PriceKey},
  store::CatalogStore,
};

use crate::{
  Error, Result,
  encode::{RawEvent, encode_dt},
  log::{self, Direction, EventType, PendingEvent, RecordedEvent},
  schema::SCHEMA,
};

/// Number of events fetched per round-trip when scanning the whole log.
const DEFAULT_PAGE_SIZE: i64 = 100;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A price store that never mutates: every write is an appended event.
///
/// Only price operations are supported; shops and ingredients return
/// [`catalog_core::Error::Unsupported`]. Pair it with a document store
/// through [`catalog_core::routing::RoutingStore`] to get both.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct EventLogStore {
  conn:      tokio_rusqlite::Connection,
  page_size: i64,
}

impl EventLogStore {
  /// Open (or create) a log at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory log, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, page_size: DEFAULT_PAGE_SIZE })
  }

  /// Change how many events a full-log scan reads per round-trip.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = i64::try_from(page_size.max(1)).unwrap_or(i64::MAX);
    self
  }

  /// Every event of the stream for `key`, system records included.
  pub async fn read_stream(
    &self,
    key: &PriceKey,
    direction: Direction,
  ) -> Result<Vec<RecordedEvent>> {
    let stream = key.stream_name();
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| Ok(log::read_stream(conn, &stream, direction)?))
      .await?;
    raws.into_iter().map(RawEvent::into_recorded).collect()
  }

  async fn append_price(
    &self,
    event_type: EventType,
    price: Price,
    must_exist: bool,
  ) -> Result<Price> {
    let price_id = price.price_id;
    let stream = price.key().stream_name();
    let pending = PendingEvent {
      event_type,
      price,
      recorded_at: encode_dt(Utc::now()),
      must_exist,
    };

    let stream_for_log = stream.clone();
    let appended = self
      .conn
      .call(move |conn| Ok(log::append(conn, &stream, pending)?))
      .await?;

    match appended {
      Some((position, price)) => {
        debug!(
          stream = %stream_for_log,
          position,
          event_type = event_type.as_str(),
          "appended price event"
        );
        Ok(price)
      }
      None => Err(Error::PriceNotFound(price_id)),
    }
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for EventLogStore {
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
    debug!("event log connection closed");
    Ok(())
  }

  // ── Prices ────────────────────────────────────────────────────────────────

  async fn current_price(&self, key: &PriceKey) -> Result<Option<Price>> {
    let stream = key.stream_name();
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| Ok(log::read_last_fact(conn, &stream)?))
      .await?;

    match raw {
      Some(raw) => raw.into_recorded()?.to_price(),
      None => Ok(None),
    }
  }

  async fn create_price(&self, input: NewPrice) -> Result<Price> {
    let price = input.into_price(Utc::now());
    self.append_price(EventType::PriceCreated, price, false).await
  }

  /// Appends a `PriceUpdated` event with the caller's amount, currency and
  /// `updated_at` over the stored record; earlier events are left untouched.
  async fn update_price(&self, price: Price) -> Result<Price> {
    self.append_price(EventType::PriceUpdated, price, true).await
  }

  /// Reduces the whole log, newest first, to one price per key. The filter
  /// is applied to the reduced set; there is no pushdown.
  async fn list_prices(&self, filter: &PriceFilter) -> Result<Vec<Price>> {
    let mut latest: HashMap<PriceKey, Price> = HashMap::new();
    let mut before = i64::MAX;
    let page_size = self.page_size;

    loop {
      let raws: Vec<RawEvent> = self
        .conn
        .call(move |conn| Ok(log::read_all_backward(conn, before, page_size)?))
        .await?;

      let Some(last) = raws.last() else { break };
      before = last.position;
      let exhausted = (raws.len() as i64) < page_size;

      for raw in raws {
        if raw.event_type.starts_with(log::SYSTEM_PREFIX) {
          continue;
        }
        if EventType::parse(&raw.event_type).is_none() {
          continue;
        }
        let price: Price = match serde_json::from_str(&raw.data) {
          Ok(price) => price,
          Err(e) => {
            warn!(
              error = %e,
              position = raw.position,
              stream = %raw.stream_name,
              "skipping undecodable price event"
            );
            continue;
          }
        };
        latest.entry(price.key()).or_insert(price);
      }

      if exhausted {
        break;
      }
    }

    Ok(latest.into_values().filter(|p| filter.matches(p)).collect())
  }

  // ── Ingredients and shops: not kept in the log ────────────────────────────

  async fn add_ingredient(&self, _input: NewIngredient) -> Result<Ingredient> {
    Err(catalog_core::Error::Unsupported("add_ingredient").into())
  }

  async fn get_ingredient(&self, _id: Uuid) -> Result<Option<Ingredient>> {
    Err(catalog_core::Error::Unsupported("get_ingredient").into())
  }

  async fn find_ingredient_by_name(
    &self,
    _name: &str,
  ) -> Result<Option<Ingredient>> {
    Err(catalog_core::Error::Unsupported("find_ingredient_by_name").into())
  }

  async fn list_ingredients(
    &self,
    _kind: Option<IngredientKind>,
  ) -> Result<Vec<Ingredient>> {
    Err(catalog_core::Error::Unsupported("list_ingredients").into())
  }

  async fn update_ingredient(&self, _ingredient: Ingredient) -> Result<Ingredient> {
    Err(catalog_core::Error::Unsupported("update_ingredient").into())
  }

  async fn add_shop(&self, _input: NewShop) -> Result<Shop> {
    Err(catalog_core::Error::Unsupported("add_shop").into())
  }

  async fn get_shop(&self, _id: Uuid) -> Result<Option<Shop>> {
    Err(catalog_core::Error::Unsupported("get_shop").into())
  }

  async fn list_shops(&self) -> Result<Vec<Shop>> {
    Err(catalog_core::Error::Unsupported("list_shops").into())
  }

  async fn update_shop(&self, _shop: Shop) -> Result<Shop> {
    Err(catalog_core::Error::Unsupported("update_shop").into())
  }

  async fn delete_shop(&self, _id: Uuid) -> Result<()> {
    Err(catalog_core::Error::Unsupported("delete_shop").into())
  }
}
