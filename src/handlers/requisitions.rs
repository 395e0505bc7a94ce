// src/handlers/requisitions.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::{
    clients::Attachment,
    common::{error::AppError, validation::validate_positive},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{FloatWrite, RequireRole, RequisitionApprove, RequisitionPay},
    },
    models::requisition::{Requisition, RequisitionAction, RequisitionItem},
    services::requisition_service::{PaymentProof, RequisitionDraft},
};

/// Requisição com as ações que o usuário pode tentar agora.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionView {
    #[serde(flatten)]
    pub requisition: Requisition,
    pub available_actions: Vec<RequisitionAction>,
}

impl From<Requisition> for RequisitionView {
    fn from(requisition: Requisition) -> Self {
        Self {
            available_actions: requisition.available_actions(),
            requisition,
        }
    }
}

// Lê um corpo multipart com um campo "payload" (JSON) e um "file" opcional.
async fn read_multipart<T: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<(T, Option<Attachment>), AppError> {
    let mut payload = None;
    let mut attachment = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("payload") => {
                let text = field.text().await?;
                payload = Some(serde_json::from_str::<T>(&text)?);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("attachment").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                attachment = Some(Attachment {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| AppError::InvalidEdit("o campo 'payload' é obrigatório".into()))?;
    Ok((payload, attachment))
}

// =============================================================================
//  1. LISTAGEM E CRIAÇÃO
// =============================================================================

// GET /api/requisitions
pub async fn list_requisitions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let requisitions: Vec<RequisitionView> = app_state
        .requisition_service
        .list(&user.0)
        .await?
        .into_iter()
        .map(RequisitionView::from)
        .collect();
    Ok(Json(requisitions))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequisitionPayload {
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,

    #[validate(length(min = 1, message = "A classe é obrigatória."))]
    pub class: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "O tipo é obrigatório."))]
    pub kind: String,

    #[validate(length(min = 1, message = "Inclua pelo menos um item."), nested)]
    pub items: Vec<RequisitionItem>,
}

// POST /api/requisitions
pub async fn create_requisition(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateRequisitionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = RequisitionDraft {
        category: payload.category,
        class: payload.class,
        kind: payload.kind,
        items: payload.items,
    };
    let created = app_state.requisition_service.create(draft, &user.0).await?;
    Ok((StatusCode::CREATED, Json(RequisitionView::from(created))))
}

// =============================================================================
//  2. TRANSIÇÕES
// =============================================================================

// POST /api/requisitions/{id}/approve
pub async fn approve_requisition(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<RequisitionApprove>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = &app_state.requisition_service;
    let current = service.get(&id).await?;
    let updated = service.approve(&current, &user.0).await?;
    Ok(Json(RequisitionView::from(updated)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequisitionPayload {
    pub reason: Option<String>,
}

// POST /api/requisitions/{id}/reject
pub async fn reject_requisition(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<RequisitionApprove>,
    Path(id): Path<String>,
    Json(payload): Json<RejectRequisitionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let service = &app_state.requisition_service;
    let current = service.get(&id).await?;
    let reason = payload.reason.filter(|r| !r.trim().is_empty());
    let updated = service.reject(&current, reason, &user.0).await?;
    Ok(Json(RequisitionView::from(updated)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayRequisitionPayload {
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,

    #[validate(length(min = 1, message = "A referência do pagamento é obrigatória."))]
    pub payment_reference: String,
}

// POST /api/requisitions/{id}/pay (multipart: payload + file)
pub async fn pay_requisition(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<RequisitionPay>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, attachment) = read_multipart::<PayRequisitionPayload>(multipart).await?;
    payload.validate()?;

    let service = &app_state.requisition_service;
    let current = service.get(&id).await?;
    let proof = PaymentProof {
        amount: payload.amount,
        payment_reference: payload.payment_reference,
    };
    let updated = service.pay(&current, proof, attachment, &user.0).await?;
    Ok(Json(RequisitionView::from(updated)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveRequisitionPayload {
    #[validate(length(min = 1, message = "Informe quem recebeu."))]
    pub receiver_name: String,
}

// POST /api/requisitions/{id}/receive (multipart: payload + file)
pub async fn receive_requisition(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, attachment) = read_multipart::<ReceiveRequisitionPayload>(multipart).await?;
    payload.validate()?;

    let service = &app_state.requisition_service;
    let current = service.get(&id).await?;
    let updated = service
        .receive(&current, &payload.receiver_name, attachment, &user.0)
        .await?;
    Ok(Json(RequisitionView::from(updated)))
}

// =============================================================================
//  3. CAIXA (FLOAT)
// =============================================================================

// GET /api/float
pub async fn float_balance(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state.requisition_service.float_balance().await?;
    Ok(Json(balance))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddFloatPayload {
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    pub note: Option<String>,
}

// POST /api/float
pub async fn add_float_funds(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<FloatWrite>,
    Json(payload): Json<AddFloatPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let balance = app_state
        .requisition_service
        .add_float_funds(payload.amount, payload.note, &user.0)
        .await?;
    Ok((StatusCode::CREATED, Json(balance)))
}
