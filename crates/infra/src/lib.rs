//! Infrastructure layer: price storage (Postgres and in-memory) and pool wiring.

pub mod db;
pub mod price_store;

pub use price_store::{InMemoryPriceStore, PostgresPriceStore, PriceStore, StoreError};
