//! Export CSV encoding.
//!
//! Export rows use the column order `product_id, created_at, product_name,
//! category, price`, which differs from the import order. No header line is
//! written.

use csv::WriterBuilder;
use pricehub_core::PriceRecord;

use crate::archive::{build_archive, EXPORT_ENTRY_NAME};
use crate::error::CodecError;

/// Encode records as export CSV bytes.
pub fn encode_export<'a, I>(records: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = &'a PriceRecord>,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    for record in records {
        writer
            .write_record(record.export_fields())
            .map_err(|e| CodecError::Encoding(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| CodecError::Encoding(e.to_string()))
}

/// Encode records and wrap them as the single `data.csv` entry of a zip.
pub fn export_archive<'a, I>(records: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = &'a PriceRecord>,
{
    let csv = encode_export(records)?;
    build_archive(EXPORT_ENTRY_NAME, &csv)
}
