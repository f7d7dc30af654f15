use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Multipart field carrying the archive.
pub const UPLOAD_FIELD: &str = "file";

pub async fn import_prices(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> axum::response::Response {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "request is not multipart");
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "expected a multipart/form-data body",
            );
        }
    };

    let upload = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    format!("missing form field {UPLOAD_FIELD:?}"),
                );
            }
            Err(e) => return errors::multipart_error_to_response(e),
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        match field.bytes().await {
            Ok(bytes) => break bytes,
            Err(e) => return errors::multipart_error_to_response(e),
        }
    };

    match services.catalog.import_archive(upload).await {
        Ok(stats) => {
            tracing::debug!("responding");
            (StatusCode::OK, Json(dto::ImportResponse::from(stats))).into_response()
        }
        Err(e) => errors::import_error_to_response(e),
    }
}

pub async fn export_prices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.export_archive().await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, dto::EXPORT_CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, dto::EXPORT_CONTENT_DISPOSITION),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => errors::export_error_to_response(e),
    }
}
