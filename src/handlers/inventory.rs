// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{InventoryWrite, RequireRole},
    },
};

// GET /api/inventory/locations/{location}/products
pub async fn products_for_location(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(location): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state
        .inventory_service
        .products_for_location(&location)
        .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockPayload {
    #[validate(length(min = 1, message = "O produto é obrigatório."))]
    pub product_id: String,

    #[validate(length(min = 1, message = "O local é obrigatório."))]
    pub location: String,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i64,
}

// POST /api/inventory/stock
pub async fn update_stock_quantity(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<InventoryWrite>,
    Json(payload): Json<UpdateStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .inventory_service
        .update_stock_quantity(&payload.product_id, &payload.location, payload.quantity, &user.0)
        .await?;
    Ok(Json(product))
}
