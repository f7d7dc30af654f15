use thiserror::Error;

/// Failures while decoding or encoding catalog archives and CSV.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Upload bytes are not a readable zip container.
    #[error("invalid archive: {0}")]
    ArchiveFormat(String),

    /// Writing the export archive failed.
    #[error("archive write failed: {0}")]
    ArchiveWrite(String),

    /// The catalog entry inflates past the configured ceiling.
    #[error("archive entry exceeds {limit} bytes once decompressed")]
    EntryTooLarge { limit: u64 },

    /// The CSV stream holds no header line.
    #[error("csv header is missing or empty")]
    MissingHeader,

    /// The CSV stream could not be read (I/O, encoding, quoting).
    #[error("unreadable csv: {0}")]
    CsvFormat(String),

    /// A complete row carries a price that is not a number.
    #[error("line {line}: invalid price {value:?}")]
    InvalidPrice { line: u64, value: String },

    /// Producing export CSV bytes failed.
    #[error("csv encoding failed: {0}")]
    Encoding(String),
}
