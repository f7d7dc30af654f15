use axum::{routing::post, Router};

pub mod prices;
pub mod system;

/// Router for the versioned price endpoints.
pub fn router() -> Router {
    Router::new().route(
        "/prices",
        post(prices::import_prices).get(prices::export_prices),
    )
}
