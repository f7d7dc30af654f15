//! `pricehub-core`: price catalog domain building blocks.
//!
//! This crate contains **pure domain** types (no archive, CSV or storage concerns).

pub mod error;
pub mod record;
pub mod stats;

pub use error::{DomainError, DomainResult};
pub use record::{Price, PriceRecord, FIELD_COUNT};
pub use stats::{truncate_total, ImportStats, StatsAccumulator};
pub use rust_decimal::Decimal;
