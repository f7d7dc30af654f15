use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pricehub_codec::CodecError;

use crate::app::services::{ExportError, ImportError};

/// Map an import failure to a client response.
///
/// Upload problems are 400 with a short reason; storage and internal failures
/// are logged in full and reported as 500 without detail.
pub fn import_error_to_response(err: ImportError) -> axum::response::Response {
    match err {
        ImportError::Codec(e) => codec_error_to_response(e),
        ImportError::MissingEntry => json_error(
            StatusCode::BAD_REQUEST,
            "csv_entry_not_found",
            "archive has no entry ending in data.csv",
        ),
        ImportError::Store(e) => {
            tracing::error!(error = %e, "import failed in storage");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage error")
        }
        ImportError::Internal(msg) => {
            tracing::error!(error = %msg, "import failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn export_error_to_response(err: ExportError) -> axum::response::Response {
    match err {
        ExportError::Store(e) => {
            tracing::error!(error = %e, "export failed in storage");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage error")
        }
        ExportError::Encoding(e) => {
            tracing::error!(error = %e, "export encoding failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "encoding_error", "could not build export")
        }
        ExportError::Internal(msg) => {
            tracing::error!(error = %msg, "export failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn codec_error_to_response(err: CodecError) -> axum::response::Response {
    tracing::warn!(error = %err, "rejected upload");
    match err {
        CodecError::ArchiveFormat(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_archive", "could not read zip archive")
        }
        CodecError::EntryTooLarge { .. } => json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "archive entry is too large once decompressed",
        ),
        CodecError::MissingHeader => {
            json_error(StatusCode::BAD_REQUEST, "missing_header", "csv header is missing")
        }
        CodecError::CsvFormat(_) => json_error(StatusCode::BAD_REQUEST, "invalid_csv", "could not read csv"),
        CodecError::InvalidPrice { line, value } => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_price",
            format!("line {line}: price {value:?} is not a number"),
        ),
        CodecError::ArchiveWrite(_) | CodecError::Encoding(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "encoding_error",
            "internal encoding error",
        ),
    }
}

/// Malformed multipart body. Oversized bodies keep their 413.
pub fn multipart_error_to_response(err: MultipartError) -> axum::response::Response {
    tracing::warn!(error = %err, "rejected multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return json_error(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "upload is too large");
    }
    json_error(StatusCode::BAD_REQUEST, "invalid_request", "malformed multipart body")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
