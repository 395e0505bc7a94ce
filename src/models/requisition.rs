// src/models/requisition.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::validation::validate_not_negative;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Pending,
    Received,
}

/// Ações do ciclo de vida, usadas nas mensagens de transição negada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequisitionAction {
    Approve,
    Reject,
    Pay,
    Receive,
}

impl std::fmt::Display for RequisitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequisitionAction::Approve => write!(f, "approve"),
            RequisitionAction::Reject => write!(f, "reject"),
            RequisitionAction::Pay => write!(f, "pay"),
            RequisitionAction::Receive => write!(f, "receive"),
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionItem {
    #[validate(length(min = 1, message = "A descrição do item é obrigatória."))]
    pub description: String,

    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    pub quantity: u32,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,
}

impl RequisitionItem {
    /// `None` quando o produto não cabe em um Decimal.
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    pub id: String,
    pub requested_by: String,
    pub requested_by_name: String,
    pub requested_at: DateTime<Utc>,

    // Classificação
    pub category: String,
    pub class: String,
    #[serde(rename = "type")]
    pub kind: String,

    pub items: Vec<RequisitionItem>,
    pub total_amount: Decimal,

    pub approval_status: ApprovalStatus,
    pub payment_status: PaymentStatus,
    pub receipt_status: ReceiptStatus,

    // Trilha de auditoria de cada transição
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub paid_by: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub payment_proof_url: Option<String>,
    pub received_by: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,

    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequisition {
    pub requested_by: String,
    pub requested_by_name: String,
    pub requested_at: DateTime<Utc>,
    pub category: String,
    pub class: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<RequisitionItem>,
    pub total_amount: Decimal,
}

/// Mudança de status enviada ao colaborador de requisições.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionTransition {
    pub requisition_id: String,
    pub expected_version: u64,
    pub actor_id: String,
    pub actor_name: String,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub change: TransitionChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transition", rename_all = "camelCase")]
pub enum TransitionChange {
    Approve,
    #[serde(rename_all = "camelCase")]
    Reject { reason: Option<String> },
    #[serde(rename_all = "camelCase")]
    Pay {
        amount: Decimal,
        payment_reference: String,
        proof_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Receive { receiver_name: String, receipt_url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatBalance {
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatTopUp {
    pub amount: Decimal,
    pub note: Option<String>,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}
