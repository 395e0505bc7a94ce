// src/services/purchase_order_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    clients::InventoryStore,
    common::error::AppError,
    models::{
        auth::Actor,
        fulfillment::Supplier,
        invoice::PaymentDetails,
        purchase_order::{
            NewPurchaseOrder, PurchaseOrder, SupplierPayment, SupplierPaymentEntry,
            SupplierPaymentStatus,
        },
    },
};

/// Dados para abrir uma ordem de compra de uma divisão OUTSOURCE.
#[derive(Debug, Clone)]
pub struct PurchaseOrderDraft {
    pub invoice_id: String,
    pub line_item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub supplier: Supplier,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    inventory: Arc<dyn InventoryStore>,
}

impl PurchaseOrderService {
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }

    /// Cria a ordem de compra no colaborador. Só devolve depois da confirmação.
    pub async fn create(&self, draft: PurchaseOrderDraft, actor: &Actor) -> Result<PurchaseOrder, AppError> {
        if draft.quantity == 0 {
            return Err(AppError::InvalidEdit("a ordem de compra precisa de quantidade".into()));
        }
        if draft.purchase_price < Decimal::ZERO || draft.selling_price < Decimal::ZERO {
            return Err(AppError::InvalidEdit("preços não podem ser negativos".into()));
        }

        let order = NewPurchaseOrder {
            profit: draft.selling_price - draft.purchase_price,
            invoice_id: draft.invoice_id,
            line_item_id: draft.line_item_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
            supplier: draft.supplier,
            purchase_price: draft.purchase_price,
            selling_price: draft.selling_price,
            created_by: actor.id.clone(),
            created_at: Utc::now(),
        };

        let created = self.inventory.create_purchase_order(&order).await?;
        tracing::info!(
            purchase_order_id = %created.id,
            invoice_id = %created.invoice_id,
            "Ordem de compra criada"
        );
        Ok(created)
    }

    /// Registra um pagamento ao fornecedor e recalcula o status de pagamento.
    pub async fn log_supplier_payment(
        &self,
        purchase_order_id: &str,
        amount: Decimal,
        details: PaymentDetails,
        actor: &Actor,
    ) -> Result<PurchaseOrder, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidEdit("o valor do pagamento deve ser positivo".into()));
        }
        if !details.is_well_formed() {
            return Err(AppError::InvalidEdit(
                "detalhes do pagamento incompletos para o meio escolhido".into(),
            ));
        }

        let current = self.inventory.purchase_order(purchase_order_id).await?;
        let total_paid = current
            .total_paid()
            .and_then(|paid| paid.checked_add(amount))
            .ok_or_else(|| AppError::InvalidEdit("o total pago excede o limite".into()))?;
        let resulting_status = SupplierPaymentStatus::from_totals(total_paid, current.purchase_price);

        let entry = SupplierPaymentEntry {
            purchase_order_id: purchase_order_id.to_string(),
            payment: SupplierPayment {
                amount,
                details,
                paid_by: actor.id.clone(),
                paid_at: Utc::now(),
            },
            total_paid,
            resulting_status,
        };

        let updated = self.inventory.log_supplier_payment(&entry).await?;
        tracing::info!(
            purchase_order_id,
            %total_paid,
            status = ?updated.payment_status_to_supplier,
            "Pagamento a fornecedor registrado"
        );
        Ok(updated)
    }
}
