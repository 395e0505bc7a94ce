// src/handlers/dispatch.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DispatchApprove, RequireRole},
    },
};

// GET /api/dispatch/{invoice_id}
pub async fn overview(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.dispatch_service.overview(&invoice_id).await?;
    Ok(Json(overview))
}

// POST /api/dispatch/{invoice_id}/approve
pub async fn approve_all(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<DispatchApprove>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state
        .dispatch_service
        .approve_all(&invoice_id, &user.0)
        .await?;
    Ok(Json(overview))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectDispatchPayload {
    pub reason: Option<String>,
}

// POST /api/dispatch/{invoice_id}/reject
pub async fn reject_all(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<DispatchApprove>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<RejectDispatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.reason.filter(|r| !r.trim().is_empty());
    let overview = app_state
        .dispatch_service
        .reject_all(&invoice_id, reason, &user.0)
        .await?;
    Ok(Json(overview))
}
