//! Import CSV reader.
//!
//! Columns are positional: `product_id, product_name, category, price, created_at`.
//! The header line is read and logged but never used to remap columns.
//!
//! Row policy:
//! - fewer than 5 fields: skipped, parsing continues
//! - 5+ fields with a non-numeric price: hard error, the whole import fails

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use pricehub_core::{DomainError, PriceRecord, FIELD_COUNT};

use crate::archive::EntryLimitExceeded;
use crate::error::CodecError;

/// One data line of the import CSV.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Record(PriceRecord),
    /// Too few fields; not an error.
    Skipped { line: u64, fields: usize },
}

/// Everything accepted from one CSV stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    pub header: Vec<String>,
    pub records: Vec<PriceRecord>,
    pub skipped: usize,
}

/// Streaming parser over an import CSV.
pub struct RecordParser<R> {
    reader: csv::Reader<R>,
    record: StringRecord,
    header: Option<Vec<String>>,
}

impl<R: Read> RecordParser<R> {
    pub fn new(source: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);

        Self {
            reader,
            record: StringRecord::new(),
            header: None,
        }
    }

    /// Consume the first line as column labels.
    ///
    /// Fails with `MissingHeader` on empty input or a line of empty labels.
    /// Calling it again returns the labels read the first time.
    pub fn read_header(&mut self) -> Result<Vec<String>, CodecError> {
        if let Some(header) = &self.header {
            return Ok(header.clone());
        }

        if !self.reader.read_record(&mut self.record).map_err(csv_error)? {
            return Err(CodecError::MissingHeader);
        }

        let labels: Vec<String> = self.record.iter().map(|f| f.trim().to_string()).collect();
        if labels.iter().all(String::is_empty) {
            return Err(CodecError::MissingHeader);
        }

        tracing::debug!(?labels, "csv header");
        self.header = Some(labels.clone());
        Ok(labels)
    }

    /// Read the next data line, or `None` at end of input.
    ///
    /// Reads the header first if the caller has not.
    pub fn next_row(&mut self) -> Result<Option<Row>, CodecError> {
        if self.header.is_none() {
            self.read_header()?;
        }

        if !self.reader.read_record(&mut self.record).map_err(csv_error)? {
            return Ok(None);
        }

        let line = self.record.position().map(|p| p.line()).unwrap_or_default();
        if self.record.len() < FIELD_COUNT {
            return Ok(Some(Row::Skipped {
                line,
                fields: self.record.len(),
            }));
        }

        match PriceRecord::from_import_fields(self.record.iter()) {
            Ok(record) => Ok(Some(Row::Record(record))),
            Err(DomainError::InvalidPrice(value)) => Err(CodecError::InvalidPrice { line, value }),
            Err(e) => Err(CodecError::CsvFormat(format!("line {line}: {e}"))),
        }
    }

    /// Drain the stream into a batch.
    ///
    /// Stops at the first hard error; nothing read so far is returned then.
    pub fn parse_all(mut self) -> Result<ParsedBatch, CodecError> {
        let header = self.read_header()?;
        let mut batch = ParsedBatch {
            header,
            ..ParsedBatch::default()
        };

        while let Some(row) = self.next_row()? {
            match row {
                Row::Record(record) => batch.records.push(record),
                Row::Skipped { line, fields } => {
                    tracing::warn!(line, fields, "skipping csv row with too few fields");
                    batch.skipped += 1;
                }
            }
        }

        Ok(batch)
    }
}

fn csv_error(err: csv::Error) -> CodecError {
    if let csv::ErrorKind::Io(io) = err.kind() {
        if let Some(exceeded) = io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<EntryLimitExceeded>())
        {
            return CodecError::EntryTooLarge { limit: exceeded.0 };
        }
    }
    CodecError::CsvFormat(err.to_string())
}
