//! Core types and the storage trait for the catalog price store.
//!
//! Storage backends and the ingestion pipeline depend on this crate; it has
//! no broker or database dependencies of its own.

pub mod entity;
pub mod error;
pub mod price;
pub mod routing;
pub mod store;

pub use error::{Error, Result};
