// src/handlers/purchase_orders.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::validate_positive},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, SupplierPay},
    },
    models::invoice::PaymentDetails,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPaymentPayload {
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    pub details: PaymentDetails,
}

// POST /api/purchase-orders/{id}/payments
pub async fn log_supplier_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<SupplierPay>,
    Path(purchase_order_id): Path<String>,
    Json(payload): Json<SupplierPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let purchase_order = app_state
        .purchase_order_service
        .log_supplier_payment(&purchase_order_id, payload.amount, payload.details, &user.0)
        .await?;

    Ok((StatusCode::CREATED, Json(purchase_order)))
}
