//! Handlers for the JSON inventory API.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use crate::AppState;
use crate::api::models::items::{ItemResponse, ListItemsResponse, SuccessResponse, UpdateRowRequest};
use crate::errors::{Error, ErrorBody, Result};

/// Message returned when an update request is unusable.
pub const INVALID_PARAMETERS: &str = "Parâmetros inválidos";

#[utoipa::path(
    get,
    path = "/api/items",
    tag = "items",
    summary = "List items",
    description = "Every inventory item in sheet order, with the row number needed to edit it.",
    responses(
        (status = 200, description = "All items", body = ListItemsResponse),
        (status = 404, description = "Spreadsheet not found", body = ErrorBody),
        (status = 500, description = "Spreadsheet service failure", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<ListItemsResponse>> {
    let records = state.inventory.list_items().await?;
    let items = records.into_iter().map(ItemResponse::from).collect();
    Ok(Json(ListItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/update_row",
    tag = "items",
    summary = "Update item",
    description = "Overwrite the row at `row_number`. Omitted fields become empty; an omitted timestamp becomes now.",
    request_body = UpdateRowRequest,
    responses(
        (status = 200, description = "Row updated", body = SuccessResponse),
        (status = 400, description = "Missing or invalid row_number", body = ErrorBody),
        (status = 404, description = "Spreadsheet not found", body = ErrorBody),
        (status = 500, description = "Spreadsheet service failure", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_row(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateRowRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let request = payload
        .map_err(|rejection| {
            debug!("Rejected update body: {}", rejection.body_text());
            Error::bad_request(INVALID_PARAMETERS)
        })?
        .0;
    let (position, draft) = request.into_parts().ok_or_else(|| Error::bad_request(INVALID_PARAMETERS))?;

    state.inventory.update_item(position, draft).await?;
    Ok(Json(SuccessResponse { success: true }))
}
