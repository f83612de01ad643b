//! Handlers for the embedded HTML pages.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use crate::static_assets;

/// Serve one embedded page, never cached so edits to the form take effect immediately.
fn serve_page(name: &str) -> Response {
    let Some(content) = static_assets::Assets::get(name) else {
        error!("Embedded page {name} is missing from the build");
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = mime_guess::from_path(name).first_or_text_plain();

    (
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from(content.data.into_owned()),
    )
        .into_response()
}

/// Item registration form.
#[instrument]
pub async fn index() -> Response {
    serve_page("index.html")
}

/// Inventory browser; loads items from `/api/items`.
#[instrument]
pub async fn inventory() -> Response {
    serve_page("inventario.html")
}

/// Confirmation shown after a submission.
#[instrument]
pub async fn success() -> Response {
    serve_page("sucesso.html")
}
