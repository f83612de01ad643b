//! HTTP layer: route handlers and wire models.
//!
//! - **[`handlers`]**: Axum handlers for the pages, the JSON API and the HTML forms
//! - **[`models`]**: Request/response structures, with the Portuguese field names the pages use
//!
//! The JSON routes (`/api/*`) answer errors as `{"error": "..."}` with a status code. The form
//! routes (`/submit`, `/update`) redirect on success and answer errors as plain text.
//!
//! The JSON API is documented with `utoipa`; the Scalar UI is served at `/docs`.

pub mod handlers;
pub mod models;
