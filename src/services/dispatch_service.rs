// src/services/dispatch_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    clients::InventoryStore,
    common::error::AppError,
    models::{
        auth::Actor,
        fulfillment::{
            DispatchApprovalStatus, DispatchDecision, DispatchDecisionRequest, DispatchOverview,
            OrderVersion,
        },
    },
    services::{invoice_service::InvoiceService, status_deriver::derive_fulfillment_status},
};

/// Aprovação de despacho: tudo ou nada por fatura.
#[derive(Clone)]
pub struct DispatchService {
    inventory: Arc<dyn InventoryStore>,
    invoice_service: InvoiceService,
}

impl DispatchService {
    pub fn new(inventory: Arc<dyn InventoryStore>, invoice_service: InvoiceService) -> Self {
        Self {
            inventory,
            invoice_service,
        }
    }

    /// Ordens da fatura com o status recalculado nesta leitura.
    pub async fn overview(&self, invoice_id: &str) -> Result<DispatchOverview, AppError> {
        let invoice = self.invoice_service.find_invoice(invoice_id).await?;
        let orders = self.inventory.dispatch_orders(Some(invoice_id)).await?;

        Ok(DispatchOverview {
            invoice_id: invoice.id.clone(),
            fulfillment_status: derive_fulfillment_status(&invoice, &orders),
            orders,
        })
    }

    pub async fn approve_all(&self, invoice_id: &str, actor: &Actor) -> Result<DispatchOverview, AppError> {
        self.decide(invoice_id, DispatchDecision::Approved, None, actor).await
    }

    pub async fn reject_all(
        &self,
        invoice_id: &str,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<DispatchOverview, AppError> {
        self.decide(invoice_id, DispatchDecision::Rejected, reason, actor).await
    }

    async fn decide(
        &self,
        invoice_id: &str,
        decision: DispatchDecision,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<DispatchOverview, AppError> {
        let orders = self.inventory.dispatch_orders(Some(invoice_id)).await?;

        let pending: Vec<OrderVersion> = orders
            .iter()
            .filter(|o| o.invoice_id == invoice_id)
            .filter(|o| o.dispatch_approval_status == DispatchApprovalStatus::PendingApproval)
            .map(|o| OrderVersion {
                id: o.id.clone(),
                expected_version: o.version,
            })
            .collect();

        if pending.is_empty() {
            return Err(AppError::NothingPending(invoice_id.to_string()));
        }

        let request = DispatchDecisionRequest {
            invoice_id: invoice_id.to_string(),
            decision,
            orders: pending,
            decided_by: actor.id.clone(),
            decided_by_name: actor.name.clone(),
            decided_at: Utc::now(),
            reason,
        };

        // Um único pedido leva todas as ordens pendentes ao estado final
        self.inventory.decide_dispatch(&request).await?;
        tracing::info!(
            invoice_id,
            decision = ?decision,
            orders = request.orders.len(),
            decided_by = %actor.id,
            "Decisão de despacho registrada"
        );

        // Relê as ordens para recalcular o status da fatura
        self.overview(invoice_id).await
    }
}
