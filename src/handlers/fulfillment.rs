// src/handlers/fulfillment.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::validate_not_negative},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{FulfillmentWrite, RequireRole},
    },
    models::{
        fulfillment::{FieldRep, FulfillmentPlan, FulfillmentSource, Supplier},
        purchase_order::PurchaseOrder,
    },
};

// =============================================================================
//  1. RASCUNHO
// =============================================================================

// GET /api/fulfillment/{invoice_id}/draft
pub async fn open_draft(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let plan = app_state
        .fulfillment_service
        .open_draft(&invoice_id, &user.0)
        .await?;
    Ok(Json(plan))
}

// DELETE /api/fulfillment/{invoice_id}/draft
pub async fn discard_draft(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.fulfillment_service.discard_draft(&invoice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/fulfillment/{invoice_id}/progress
pub async fn progress(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let progress = app_state.fulfillment_service.progress(&invoice_id).await?;
    Ok(Json(progress))
}

// =============================================================================
//  2. DIVISÕES
// =============================================================================

// POST /api/fulfillment/{invoice_id}/lines/{line_id}/splits
pub async fn add_split(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path((invoice_id, line_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let plan = app_state
        .fulfillment_service
        .edit(&invoice_id, |plan| plan.add_split(&line_id).map(|_| ()))
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Edição parcial de uma divisão. Campos ausentes não mudam.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSplitPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    pub quantity: Option<u32>,

    pub fulfillment_source: Option<FulfillmentSource>,

    // Volta a divisão para "sem fonte", limpando os campos dependentes
    #[serde(default)]
    pub clear_source: bool,

    pub serial_numbers: Option<Vec<String>>,

    pub field_rep: Option<FieldRep>,

    // Vincula uma ordem de compra já existente
    pub purchase_order_id: Option<String>,
    pub supplier: Option<Supplier>,
}

impl UpdateSplitPayload {
    fn apply(self, plan: &mut FulfillmentPlan, split_id: Uuid) -> Result<(), AppError> {
        // A fonte vem primeiro: trocar de fonte limpa os campos que não se aplicam
        if self.clear_source {
            plan.set_split_source(split_id, None)?;
        } else if let Some(source) = self.fulfillment_source {
            plan.set_split_source(split_id, Some(source))?;
        }
        if let Some(quantity) = self.quantity {
            plan.set_split_quantity(split_id, quantity)?;
        }
        if let Some(serials) = self.serial_numbers {
            plan.set_serial_numbers(split_id, serials)?;
        }
        if let Some(rep) = self.field_rep {
            plan.assign_field_rep(split_id, rep)?;
        }
        if let Some(po_id) = self.purchase_order_id {
            plan.bind_purchase_order(split_id, &po_id, self.supplier)?;
        }
        Ok(())
    }
}

// PATCH /api/fulfillment/{invoice_id}/splits/{split_id}
pub async fn update_split(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path((invoice_id, split_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateSplitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let plan = app_state
        .fulfillment_service
        .edit(&invoice_id, |plan| payload.apply(plan, split_id))
        .await?;
    Ok(Json(plan))
}

// DELETE /api/fulfillment/{invoice_id}/splits/{split_id}
pub async fn remove_split(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path((invoice_id, split_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let plan = app_state
        .fulfillment_service
        .edit(&invoice_id, |plan| plan.remove_split(split_id))
        .await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipPayload {
    pub skip: bool,
    pub reason: Option<String>,
}

// POST /api/fulfillment/{invoice_id}/lines/{line_id}/skip
pub async fn set_skip(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path((invoice_id, line_id)): Path<(String, String)>,
    Json(payload): Json<SkipPayload>,
) -> Result<impl IntoResponse, AppError> {
    let plan = app_state
        .fulfillment_service
        .edit(&invoice_id, |plan| plan.set_skip(&line_id, payload.skip, payload.reason))
        .await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignPayload {
    #[validate(length(min = 1, message = "Selecione pelo menos um item."))]
    pub line_item_ids: Vec<String>,
    pub fulfillment_source: FulfillmentSource,
}

// POST /api/fulfillment/{invoice_id}/bulk-assign
pub async fn bulk_assign(
    State(app_state): State<AppState>,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<BulkAssignPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let plan = app_state
        .fulfillment_service
        .bulk_assign(&invoice_id, &payload.line_item_ids, payload.fulfillment_source)
        .await?;
    Ok(Json(plan))
}

// =============================================================================
//  3. ENVIO E ORDENS DE COMPRA
// =============================================================================

// POST /api/fulfillment/{invoice_id}/submit
pub async fn submit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state
        .fulfillment_service
        .submit(&invoice_id, &user.0)
        .await?;
    Ok((StatusCode::CREATED, Json(orders)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    pub split_id: Uuid,
    pub supplier: Supplier,

    #[validate(custom(function = "validate_not_negative"))]
    pub purchase_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderCreated {
    pub purchase_order: PurchaseOrder,
    pub plan: FulfillmentPlan,
}

// POST /api/fulfillment/{invoice_id}/purchase-orders
pub async fn create_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<FulfillmentWrite>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (purchase_order, plan) = app_state
        .fulfillment_service
        .create_purchase_order(
            &invoice_id,
            payload.split_id,
            payload.supplier,
            payload.purchase_price,
            payload.selling_price,
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PurchaseOrderCreated { purchase_order, plan })))
}
