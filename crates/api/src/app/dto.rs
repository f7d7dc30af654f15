//! Response DTOs.

use serde::Serialize;

use pricehub_core::ImportStats;

/// Body of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportResponse {
    pub total_items: u64,
    pub total_categories: u64,
    pub total_price: i64,
}

impl From<ImportStats> for ImportResponse {
    fn from(stats: ImportStats) -> Self {
        Self {
            total_items: stats.total_items,
            total_categories: stats.total_categories,
            total_price: stats.total_price,
        }
    }
}

/// Export download headers.
pub const EXPORT_CONTENT_TYPE: &str = "application/zip";
pub const EXPORT_CONTENT_DISPOSITION: &str = "attachment; filename=\"prices.zip\"";
