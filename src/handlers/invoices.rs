// src/handlers/invoices.rs

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
        rbac::{PaymentConfirm, PaymentLog, QuoteWrite, RequireRole},
    },
    models::invoice::{PaymentDetails, QuoteStatus},
};

// GET /api/invoices
pub async fn list_invoices(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.invoice_service.list_invoices(&user.0).await?;
    Ok(Json(invoices))
}

// =============================================================================
//  PAGAMENTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogPaymentPayload {
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    pub details: PaymentDetails,
}

// POST /api/invoices/{id}/payments
pub async fn log_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<PaymentLog>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<LogPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state
        .invoice_service
        .log_payment(&invoice_id, payload.amount, payload.details, &user.0)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// POST /api/payments/{id}/confirm
pub async fn confirm_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<PaymentConfirm>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = app_state
        .invoice_service
        .confirm_payment(&payment_id, &user.0)
        .await?;
    Ok(Json(payment))
}

// =============================================================================
//  ORÇAMENTOS
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusPayload {
    pub status: QuoteStatus,
}

// POST /api/quotes/{id}/status
pub async fn update_quote_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<QuoteWrite>,
    Path(quote_id): Path<String>,
    Json(payload): Json<QuoteStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .invoice_service
        .update_quote_status(&quote_id, payload.status, &user.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
