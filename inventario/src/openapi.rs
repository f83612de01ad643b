//! OpenAPI document for the JSON API, served at `/api-docs/openapi.json` and rendered at `/docs`.
//!
//! The HTML pages and form posts are not part of it.

use utoipa::OpenApi;

use crate::api::handlers::items;
use crate::api::models::items::{ItemResponse, ListItemsResponse, RowNumber, SuccessResponse, UpdateRowRequest};
use crate::errors::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventário API",
        description = "Read and edit the asset inventory spreadsheet."
    ),
    paths(items::list_items, items::update_row),
    components(schemas(ItemResponse, ListItemsResponse, RowNumber, UpdateRowRequest, SuccessResponse, ErrorBody)),
    tags(
        (name = "items", description = "Inventory items. Each item is one spreadsheet row, addressed by its row number.")
    )
)]
pub struct ApiDoc;
