use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::{fulfillment::PlanViolation, requisition::RequisitionAction};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // O plano de atendimento não pode ser enviado (erros de campo, sem chamada remota)
    #[error("Plano de atendimento incompleto")]
    PlanRejected(Vec<PlanViolation>),

    #[error("Edição inválida: {0}")]
    InvalidEdit(String),

    #[error("Ação '{action}' não permitida no estado atual: {reason}")]
    TransitionNotAllowed {
        action: RequisitionAction,
        reason: String,
    },

    #[error("Nenhuma ordem pendente de aprovação para a fatura {0}")]
    NothingPending(String),

    #[error("Anexo obrigatório ausente: {0}")]
    AttachmentMissing(&'static str),

    #[error("Falha no upload do anexo: {0}")]
    UploadFailed(String),

    // Mensagem do colaborador, repassada literalmente
    #[error("{0}")]
    Remote(String),

    #[error("O registro foi alterado por outra pessoa. Recarregue e tente novamente.")]
    Conflict,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Você precisa de um dos papéis {0} para realizar esta ação.")]
    Forbidden(String),

    #[error("Erro de comunicação com o colaborador: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Corpo multipart inválido: {0}")]
    MultipartError(#[from] MultipartError),

    #[error("JSON inválido: {0}")]
    JsonError(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::PlanRejected(violations) => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "details": violations,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::InvalidEdit(_)
            | AppError::AttachmentMissing(_)
            | AppError::MultipartError(_)
            | AppError::JsonError(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::TransitionNotAllowed { .. } | AppError::NothingPending(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::UploadFailed(_) | AppError::Remote(_) => {
                tracing::warn!("Ação remota falhou: {}", self);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::TransportError(e) => {
                tracing::error!("Falha de transporte: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Não foi possível contatar o colaborador remoto.".to_string(),
                )
            }
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            AppError::InternalServerError(e) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_rejected_maps_to_unprocessable() {
        let err = AppError::PlanRejected(vec![PlanViolation::NoSplits {
            line_item_id: "L1".into(),
        }]);
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_remote_and_conflict_status_codes() {
        assert_eq!(
            AppError::Remote("Sheet locked".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Conflict.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = AppError::Remote("Invoice INV-9 is closed".into());
        assert_eq!(err.to_string(), "Invoice INV-9 is closed");
    }
}
