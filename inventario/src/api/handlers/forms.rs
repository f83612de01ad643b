//! Handlers for the URL-encoded HTML forms.
//!
//! Both redirect with 303 on success. Failures are answered with a plain-text message for the
//! browser to show as-is.

use axum::{
    extract::{RawForm, State},
    response::Redirect,
};

use crate::AppState;
use crate::api::models::forms::FormFields;
use crate::errors::FormError;

/// Record one or more new items.
#[tracing::instrument(skip_all)]
pub async fn submit(State(state): State<AppState>, RawForm(body): RawForm) -> Result<Redirect, FormError> {
    let submission = FormFields::parse(&body).into_submission().map_err(FormError::submit)?;
    state.inventory.submit_items(submission).await.map_err(FormError::submit)?;
    Ok(Redirect::to("/sucesso"))
}

/// Overwrite one existing item.
#[tracing::instrument(skip_all)]
pub async fn update(State(state): State<AppState>, RawForm(body): RawForm) -> Result<Redirect, FormError> {
    let (position, draft) = FormFields::parse(&body).into_update().map_err(FormError::update)?;
    state.inventory.update_item(position, draft).await.map_err(FormError::update)?;
    Ok(Redirect::to("/inventario"))
}
