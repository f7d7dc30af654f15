//! Zip container handling for catalog uploads and downloads.

use std::io::{self, Cursor, Read, Write};

use chrono::{Datelike, NaiveDateTime, Timelike, Utc};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::CodecError;

/// Upload entries are matched by this name suffix.
pub const DATA_ENTRY_SUFFIX: &str = "data.csv";

/// Name of the single entry written on export.
pub const EXPORT_ENTRY_NAME: &str = "data.csv";

/// Read side of an uploaded archive.
///
/// Borrows the upload buffer; nothing is copied until an entry is read.
pub struct PriceArchive<'a> {
    inner: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> PriceArchive<'a> {
    /// Open a zip container held in memory.
    pub fn open(bytes: &'a [u8]) -> Result<Self, CodecError> {
        let inner = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| CodecError::ArchiveFormat(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Index of the first file entry whose name ends with `suffix`.
    pub fn find_entry(&mut self, suffix: &str) -> Result<Option<usize>, CodecError> {
        for idx in 0..self.inner.len() {
            let entry = self
                .inner
                .by_index(idx)
                .map_err(|e| CodecError::ArchiveFormat(e.to_string()))?;
            if !entry.is_dir() && entry.name().ends_with(suffix) {
                tracing::debug!(entry = entry.name(), "found catalog entry");
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }

    /// Stream the first `*data.csv` entry, or `None` if the archive has none.
    ///
    /// The entry may inflate to at most `max_bytes`: a larger declared size is
    /// rejected up front, and reading past the cap fails with
    /// [`EntryLimitExceeded`] inside the I/O error. Whether a missing entry is
    /// an error is up to the caller.
    pub fn data_entry(&mut self, max_bytes: u64) -> Result<Option<impl Read + '_>, CodecError> {
        let Some(idx) = self.find_entry(DATA_ENTRY_SUFFIX)? else {
            return Ok(None);
        };

        let entry = self
            .inner
            .by_index(idx)
            .map_err(|e| CodecError::ArchiveFormat(e.to_string()))?;
        if entry.size() > max_bytes {
            tracing::warn!(declared = entry.size(), limit = max_bytes, "catalog entry too large");
            return Err(CodecError::EntryTooLarge { limit: max_bytes });
        }
        Ok(Some(CappedReader::new(entry, max_bytes)))
    }
}

/// Carried inside `io::Error` when an entry inflates past its cap.
#[derive(Debug, Error)]
#[error("entry exceeds {0} bytes once decompressed")]
pub struct EntryLimitExceeded(pub u64);

/// Reader that fails instead of yielding more than `limit` bytes.
///
/// Unlike `Read::take`, hitting the cap is an error rather than a silent EOF.
pub(crate) struct CappedReader<R> {
    inner: R,
    remaining: u64,
    limit: u64,
}

impl<R: Read> CappedReader<R> {
    pub(crate) fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            limit,
        }
    }
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.remaining == 0 {
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    EntryLimitExceeded(self.limit),
                )),
            };
        }

        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Build a Deflate-compressed zip holding exactly one entry.
pub fn build_archive(entry_name: &str, content: &[u8]) -> Result<Vec<u8>, CodecError> {
    build_archive_at(entry_name, content, Utc::now().naive_utc())
}

/// Same as [`build_archive`] with an explicit entry timestamp.
pub fn build_archive_at(
    entry_name: &str,
    content: &[u8],
    modified: NaiveDateTime,
) -> Result<Vec<u8>, CodecError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_timestamp(modified));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(entry_name, options)
        .map_err(|e| CodecError::ArchiveWrite(e.to_string()))?;
    writer
        .write_all(content)
        .map_err(|e| CodecError::ArchiveWrite(e.to_string()))?;
    let cursor = writer
        .finish()
        .map_err(|e| CodecError::ArchiveWrite(e.to_string()))?;

    Ok(cursor.into_inner())
}

// Zip timestamps cover 1980..=2107; anything outside falls back to the format's epoch.
fn zip_timestamp(dt: NaiveDateTime) -> zip::DateTime {
    let (Ok(year), Ok(month), Ok(day), Ok(hour), Ok(minute), Ok(second)) = (
        u16::try_from(dt.year()),
        u8::try_from(dt.month()),
        u8::try_from(dt.day()),
        u8::try_from(dt.hour()),
        u8::try_from(dt.minute()),
        u8::try_from(dt.second()),
    ) else {
        return zip::DateTime::default();
    };

    zip::DateTime::from_date_and_time(year, month, day, hour, minute, second).unwrap_or_default()
}
