//! The reconciliation rule: latest price wins, identical values are merged.

use tracing::debug;

use catalog_core::{price::Price, store::CatalogStore};

use crate::{Error, Result, message::ValidPriceUpdate};

/// Which branch [`reconcile`] took.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
  /// The fact carried a new value (or the key was unknown); a record was
  /// created.
  Created(Price),
  /// The fact repeated the current value; only `updated_at` moved.
  Refreshed(Price),
}

impl Reconciliation {
  pub fn price(&self) -> &Price {
    match self {
      Self::Created(price) | Self::Refreshed(price) => price,
    }
  }

  pub fn into_price(self) -> Price {
    match self {
      Self::Created(price) | Self::Refreshed(price) => price,
    }
  }
}

/// Apply one validated fact to `store`.
///
/// The lookup and the following write are two separate calls with nothing
/// held in between, so two concurrent facts for an unknown key may both
/// create a record.
pub async fn reconcile<S: CatalogStore>(
  store: &S,
  update: &ValidPriceUpdate,
) -> Result<Reconciliation> {
  let current = store
    .current_price(&update.key)
    .await
    .map_err(|e| Error::LookupPrice(Box::new(e)))?;

  match current {
    Some(mut price) if price.has_value(update.amount, update.currency) => {
      // The producer's date is taken as is, even if it moves backwards.
      price.updated_at = update.effective_date;
      let price = store
        .update_price(price)
        .await
        .map_err(|e| Error::UpdatePrice(Box::new(e)))?;
      debug!(
        shop_id = %price.shop_id,
        product_id = %price.product_id,
        price_id = %price.price_id,
        "price unchanged, refreshed updated_at"
      );
      Ok(Reconciliation::Refreshed(price))
    }
    _ => {
      let price = store
        .create_price(update.to_new_price())
        .await
        .map_err(|e| Error::InsertPrice(Box::new(e)))?;
      debug!(
        shop_id = %price.shop_id,
        product_id = %price.product_id,
        price_id = %price.price_id,
        amount = %price.amount,
        currency = %price.currency,
        "recorded new price"
      );
      Ok(Reconciliation::Created(price))
    }
  }
}
