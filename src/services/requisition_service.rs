// src/services/requisition_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    clients::{Attachment, FileStore, RequisitionStore},
    common::error::AppError,
    models::{
        auth::Actor,
        requisition::{
            ApprovalStatus, FloatBalance, FloatTopUp, NewRequisition, PaymentStatus, ReceiptStatus,
            Requisition, RequisitionAction, RequisitionItem, RequisitionTransition, TransitionChange,
        },
    },
};

// --- GUARDAS ---
// Avaliadas sobre o registro carregado, antes de qualquer chamada remota.

fn refuse(action: RequisitionAction, reason: &str) -> AppError {
    AppError::TransitionNotAllowed {
        action,
        reason: reason.to_string(),
    }
}

impl Requisition {
    pub fn guard(&self, action: RequisitionAction) -> Result<(), AppError> {
        match action {
            RequisitionAction::Approve | RequisitionAction::Reject => {
                if self.approval_status != ApprovalStatus::PendingApproval {
                    return Err(refuse(action, "a requisição não está pendente de aprovação"));
                }
            }
            RequisitionAction::Pay => {
                if self.approval_status != ApprovalStatus::Approved {
                    return Err(refuse(action, "a requisição ainda não foi aprovada"));
                }
                if self.payment_status != PaymentStatus::Unpaid {
                    return Err(refuse(action, "a requisição já foi paga"));
                }
            }
            RequisitionAction::Receive => {
                if self.payment_status != PaymentStatus::Paid {
                    return Err(refuse(action, "a requisição ainda não foi paga"));
                }
                if self.receipt_status == ReceiptStatus::Received {
                    return Err(refuse(action, "o recebimento já foi confirmado"));
                }
            }
        }
        Ok(())
    }

    /// Ações que a interface pode oferecer agora.
    pub fn available_actions(&self) -> Vec<RequisitionAction> {
        [
            RequisitionAction::Approve,
            RequisitionAction::Reject,
            RequisitionAction::Pay,
            RequisitionAction::Receive,
        ]
        .into_iter()
        .filter(|a| self.guard(*a).is_ok())
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RequisitionDraft {
    pub category: String,
    pub class: String,
    pub kind: String,
    pub items: Vec<RequisitionItem>,
}

#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub amount: Decimal,
    pub payment_reference: String,
}

#[derive(Clone)]
pub struct RequisitionService {
    store: Arc<dyn RequisitionStore>,
    files: Arc<dyn FileStore>,
}

impl RequisitionService {
    pub fn new(store: Arc<dyn RequisitionStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Requisition>, AppError> {
        let created_by = (!actor.role.sees_all_records()).then_some(actor.id.as_str());
        self.store.list(created_by).await
    }

    pub async fn get(&self, id: &str) -> Result<Requisition, AppError> {
        self.store.get(id).await
    }

    pub async fn create(&self, draft: RequisitionDraft, actor: &Actor) -> Result<Requisition, AppError> {
        if draft.items.is_empty() {
            return Err(AppError::InvalidEdit("a requisição precisa de pelo menos um item".into()));
        }

        for item in &draft.items {
            item.validate()?;
        }

        let total_amount = draft
            .items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| {
                item.line_total().and_then(|line| total.checked_add(line))
            })
            .ok_or_else(|| AppError::InvalidEdit("o total da requisição excede o limite".into()))?;
        let requisition = NewRequisition {
            requested_by: actor.id.clone(),
            requested_by_name: actor.name.clone(),
            requested_at: Utc::now(),
            category: draft.category,
            class: draft.class,
            kind: draft.kind,
            items: draft.items,
            total_amount,
        };

        let created = self.store.create(&requisition).await?;
        tracing::info!(requisition_id = %created.id, %total_amount, "Requisição criada");
        Ok(created)
    }

    // --- TRANSIÇÕES ---

    pub async fn approve(&self, requisition: &Requisition, actor: &Actor) -> Result<Requisition, AppError> {
        requisition.guard(RequisitionAction::Approve)?;
        self.send(requisition, actor, TransitionChange::Approve).await
    }

    pub async fn reject(
        &self,
        requisition: &Requisition,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<Requisition, AppError> {
        requisition.guard(RequisitionAction::Reject)?;
        self.send(requisition, actor, TransitionChange::Reject { reason }).await
    }

    /// Pagamento em duas fases: envia o comprovante, depois o status com a URL.
    pub async fn pay(
        &self,
        requisition: &Requisition,
        proof: PaymentProof,
        attachment: Option<Attachment>,
        actor: &Actor,
    ) -> Result<Requisition, AppError> {
        requisition.guard(RequisitionAction::Pay)?;

        if proof.amount <= Decimal::ZERO {
            return Err(AppError::InvalidEdit("o valor pago deve ser positivo".into()));
        }
        if proof.payment_reference.trim().is_empty() {
            return Err(AppError::InvalidEdit("a referência do pagamento é obrigatória".into()));
        }
        let attachment = attachment
            .filter(|a| !a.is_empty())
            .ok_or(AppError::AttachmentMissing("comprovante de pagamento"))?;

        // 1. Upload. Se falhar, o status não é alterado.
        let proof_url = self.files.upload(&requisition.id, &attachment).await?;

        // 2. Mudança de status carregando a URL
        self.send(
            requisition,
            actor,
            TransitionChange::Pay {
                amount: proof.amount,
                payment_reference: proof.payment_reference.trim().to_string(),
                proof_url,
            },
        )
        .await
    }

    pub async fn receive(
        &self,
        requisition: &Requisition,
        receiver_name: &str,
        attachment: Option<Attachment>,
        actor: &Actor,
    ) -> Result<Requisition, AppError> {
        requisition.guard(RequisitionAction::Receive)?;

        if receiver_name.trim().is_empty() {
            return Err(AppError::InvalidEdit("o nome de quem recebeu é obrigatório".into()));
        }
        let attachment = attachment
            .filter(|a| !a.is_empty())
            .ok_or(AppError::AttachmentMissing("recibo de entrega"))?;

        let receipt_url = self.files.upload(&requisition.id, &attachment).await?;

        self.send(
            requisition,
            actor,
            TransitionChange::Receive {
                receiver_name: receiver_name.trim().to_string(),
                receipt_url,
            },
        )
        .await
    }

    async fn send(
        &self,
        requisition: &Requisition,
        actor: &Actor,
        change: TransitionChange,
    ) -> Result<Requisition, AppError> {
        let transition = RequisitionTransition {
            requisition_id: requisition.id.clone(),
            expected_version: requisition.version,
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            at: Utc::now(),
            change,
        };

        let updated = self.store.transition(&transition).await?;
        tracing::info!(
            requisition_id = %updated.id,
            actor = %actor.id,
            approval = ?updated.approval_status,
            payment = ?updated.payment_status,
            receipt = ?updated.receipt_status,
            "Transição de requisição registrada"
        );
        Ok(updated)
    }

    // --- CAIXA ---

    pub async fn float_balance(&self) -> Result<FloatBalance, AppError> {
        self.store.float_balance().await
    }

    pub async fn add_float_funds(
        &self,
        amount: Decimal,
        note: Option<String>,
        actor: &Actor,
    ) -> Result<FloatBalance, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidEdit("o aporte deve ser positivo".into()));
        }
        let top_up = FloatTopUp {
            amount,
            note,
            added_by: actor.id.clone(),
            added_at: Utc::now(),
        };
        let balance = self.store.add_float_funds(&top_up).await?;
        tracing::info!(%amount, balance = %balance.balance, "Caixa reforçado");
        Ok(balance)
    }
}
