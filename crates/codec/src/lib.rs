//! `pricehub-codec`: wire formats of the price catalog.
//!
//! - `archive`: zip container in/out (one `*data.csv` entry)
//! - `parser`: import CSV → `PriceRecord`s, with the short-row tolerance policy
//! - `export`: `PriceRecord`s → export CSV
//!
//! Everything works on in-memory buffers; uploads are bounded upstream.

pub mod archive;
pub mod error;
pub mod export;
pub mod parser;

pub use archive::{build_archive, PriceArchive, DATA_ENTRY_SUFFIX, EXPORT_ENTRY_NAME};
pub use error::CodecError;
pub use export::{encode_export, export_archive};
pub use parser::{ParsedBatch, RecordParser, Row};
