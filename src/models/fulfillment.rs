// src/models/fulfillment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

/// De onde sai a mercadoria de uma divisão (split).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentSource {
    MainHq,   // Armazém central
    Nyamira,  // Filial
    FieldRep, // Estoque pessoal do representante
    Outsource, // Compra em fornecedor externo
}

impl FulfillmentSource {
    /// Fontes que exigem números de série (uma por unidade)
    pub fn uses_serials(self) -> bool {
        matches!(
            self,
            FulfillmentSource::MainHq | FulfillmentSource::Nyamira | FulfillmentSource::FieldRep
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            FulfillmentSource::MainHq => "Main HQ warehouse",
            FulfillmentSource::Nyamira => "Nyamira branch",
            FulfillmentSource::FieldRep => "Field rep stock",
            FulfillmentSource::Outsource => "Outsourced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchApprovalStatus {
    #[serde(rename = "Awaiting Fulfillment")]
    AwaitingFulfillment,
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Approved,
    Rejected,
}

/// Status de atendimento de uma fatura. Sempre derivado na leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    AwaitingFulfillment,
    PendingApproval,
    ReadyForDispatch,
    Dispatched,
    Completed,
}

/// Marcador terminal gravado pelo colaborador de despacho na fatura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMarker {
    Dispatched,
    Completed,
}

// --- Identidades ligadas a uma divisão ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRep {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

// --- Divisão (split) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitField {
    Quantity,
    Source,
    SerialNumbers,
    FieldRep,
    PurchaseOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentSplit {
    pub id: Uuid,
    pub line_item_id: String,
    pub quantity: u32,
    pub fulfillment_source: Option<FulfillmentSource>,
    #[serde(default)]
    pub serial_numbers: Vec<String>,
    pub field_rep: Option<FieldRep>,
    pub purchase_order_id: Option<String>,
    pub supplier: Option<Supplier>,
}

impl FulfillmentSplit {
    pub fn empty(line_item_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            line_item_id: line_item_id.to_string(),
            quantity: 0,
            fulfillment_source: None,
            serial_numbers: Vec::new(),
            field_rep: None,
            purchase_order_id: None,
            supplier: None,
        }
    }

    /// Campos que ainda faltam para a divisão ser considerada completa.
    pub fn missing_fields(&self) -> Vec<SplitField> {
        let mut missing = Vec::new();

        if self.quantity == 0 {
            missing.push(SplitField::Quantity);
        }

        let Some(source) = self.fulfillment_source else {
            missing.push(SplitField::Source);
            return missing;
        };

        if source.uses_serials() && self.serial_numbers.len() < self.quantity as usize {
            missing.push(SplitField::SerialNumbers);
        }
        if source == FulfillmentSource::FieldRep && self.field_rep.is_none() {
            missing.push(SplitField::FieldRep);
        }
        if source == FulfillmentSource::Outsource
            && self.purchase_order_id.as_deref().is_none_or(|po| po.trim().is_empty())
        {
            missing.push(SplitField::PurchaseOrder);
        }

        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Troca a fonte e limpa o que não se aplica à nova fonte.
    pub fn switch_source(&mut self, source: Option<FulfillmentSource>) {
        self.fulfillment_source = source;

        let keeps_serials = source.is_some_and(FulfillmentSource::uses_serials);
        if !keeps_serials {
            self.serial_numbers.clear();
        }
        if source != Some(FulfillmentSource::FieldRep) {
            self.field_rep = None;
        }
        if source != Some(FulfillmentSource::Outsource) {
            self.purchase_order_id = None;
            self.supplier = None;
        }
    }

    /// Descrição legível gravada na ordem de despacho.
    pub fn source_description(&self) -> String {
        match self.fulfillment_source {
            None => "Unassigned".to_string(),
            Some(FulfillmentSource::FieldRep) => match &self.field_rep {
                Some(rep) => format!("Field rep stock ({})", rep.name),
                None => FulfillmentSource::FieldRep.label().to_string(),
            },
            Some(FulfillmentSource::Outsource) => {
                let po = self.purchase_order_id.as_deref().unwrap_or("-");
                match &self.supplier {
                    Some(supplier) => format!("Outsourced via {} ({})", po, supplier.name),
                    None => format!("Outsourced via {}", po),
                }
            }
            Some(source) => source.label().to_string(),
        }
    }
}

// --- Rascunho do plano de atendimento ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLine {
    pub line_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub skip_fulfillment: bool,
    pub skip_reason: Option<String>,
    pub splits: Vec<FulfillmentSplit>,
}

impl PlanLine {
    /// Soma em u64: nenhuma combinação de divisões u32 estoura.
    pub fn assigned_quantity(&self) -> u64 {
        self.splits.iter().map(|s| u64::from(s.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentPlan {
    pub invoice_id: String,
    pub customer_name: String,
    pub lines: Vec<PlanLine>,
    pub opened_by: String,
    pub opened_at: DateTime<Utc>,
}

/// Erro de campo que bloqueia o envio do plano.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlanViolation {
    #[serde(rename_all = "camelCase")]
    SkipReasonMissing { line_item_id: String },
    #[serde(rename_all = "camelCase")]
    NoSplits { line_item_id: String },
    #[serde(rename_all = "camelCase")]
    QuantityMismatch {
        line_item_id: String,
        requested: u32,
        assigned: u64,
    },
    #[serde(rename_all = "camelCase")]
    SplitIncomplete {
        line_item_id: String,
        split_id: Uuid,
        missing: Vec<SplitField>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    pub complete_splits: usize,
    pub total_splits: usize,
    pub percent: f64,
    pub violations: Vec<PlanViolation>,
}

// --- Ordens de despacho ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrder {
    pub id: String,
    pub invoice_id: String,
    pub line_item_id: Option<String>,
    pub product_id: String,
    pub quantity: u32,
    pub source_description: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub dispatch_approval_status: DispatchApprovalStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub version: u64,
}

/// Um pedido de criação de ordem de despacho, um por divisão.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrderRequest {
    pub invoice_id: String,
    pub line_item_id: String,
    pub split_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub fulfillment_source: FulfillmentSource,
    pub source_description: String,
    pub serial_numbers: Vec<String>,
    pub field_rep_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub supplier_id: Option<String>,
    pub submitted_by: String,
    pub submitted_by_name: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    pub line_item_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPlanRequest {
    pub invoice_id: String,
    pub orders: Vec<DispatchOrderRequest>,
    pub skipped_lines: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderVersion {
    pub id: String,
    pub expected_version: u64,
}

/// Pedido único que leva todas as ordens pendentes de uma fatura ao estado final.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchDecisionRequest {
    pub invoice_id: String,
    pub decision: DispatchDecision,
    pub orders: Vec<OrderVersion>,
    pub decided_by: String,
    pub decided_by_name: String,
    pub decided_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Visão de despacho de uma fatura com o status recalculado.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOverview {
    pub invoice_id: String,
    pub fulfillment_status: FulfillmentStatus,
    pub orders: Vec<DispatchOrder>,
}
