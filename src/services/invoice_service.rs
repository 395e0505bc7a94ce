// src/services/invoice_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    clients::{
        InventoryStore, InvoiceStore,
        invoice_client::{PaymentConfirmRequest, PaymentLogRequest, QuoteStatusRequest},
    },
    common::error::AppError,
    models::{
        auth::Actor,
        invoice::{Invoice, InvoicePayment, InvoicePaymentStatus, InvoiceSummary, PaymentDetails, QuoteStatus},
    },
    services::status_deriver::derive_fulfillment_status,
};

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    inventory: Arc<dyn InventoryStore>,
}

impl InvoiceService {
    pub fn new(invoices: Arc<dyn InvoiceStore>, inventory: Arc<dyn InventoryStore>) -> Self {
        Self {
            invoices,
            inventory,
        }
    }

    pub async fn find_invoice(&self, invoice_id: &str) -> Result<Invoice, AppError> {
        self.invoices
            .invoice_book(None)
            .await?
            .invoices
            .into_iter()
            .find(|i| i.id == invoice_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Fatura {}", invoice_id)))
    }

    /// Lista as faturas visíveis para o usuário, com o status de atendimento
    /// recalculado agora a partir das ordens de despacho.
    pub async fn list_invoices(&self, actor: &Actor) -> Result<Vec<InvoiceSummary>, AppError> {
        let requested_by = (!actor.role.sees_all_records()).then_some(actor.id.as_str());

        let book = self.invoices.invoice_book(requested_by).await?;
        let orders = self.inventory.dispatch_orders(None).await?;

        book.invoices
            .into_iter()
            .map(|invoice| -> Result<InvoiceSummary, AppError> {
                let payments: Vec<InvoicePayment> = book
                    .payments
                    .iter()
                    .filter(|p| p.invoice_id == invoice.id)
                    .cloned()
                    .collect();
                let amount_paid = payments
                    .iter()
                    .filter(|p| p.status == InvoicePaymentStatus::Confirmed)
                    .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.amount))
                    .ok_or_else(|| {
                        AppError::Remote(format!("pagamentos da fatura {} somam além do limite", invoice.id))
                    })?;

                Ok(InvoiceSummary {
                    fulfillment_status: derive_fulfillment_status(&invoice, &orders),
                    invoice,
                    amount_paid,
                    payments,
                })
            })
            .collect()
    }

    // --- PAGAMENTOS ---

    pub async fn log_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        details: PaymentDetails,
        actor: &Actor,
    ) -> Result<InvoicePayment, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidEdit("o valor do pagamento deve ser positivo".into()));
        }
        if !details.is_well_formed() {
            return Err(AppError::InvalidEdit(
                "detalhes do pagamento incompletos para o meio escolhido".into(),
            ));
        }

        let request = PaymentLogRequest {
            invoice_id: invoice_id.to_string(),
            amount,
            details,
            logged_by: actor.id.clone(),
            logged_by_name: actor.name.clone(),
            logged_at: Utc::now(),
        };

        let payment = self.invoices.log_payment(&request).await?;
        tracing::info!(invoice_id, payment_id = %payment.id, %amount, "Pagamento registrado");
        Ok(payment)
    }

    pub async fn confirm_payment(&self, payment_id: &str, actor: &Actor) -> Result<InvoicePayment, AppError> {
        let request = PaymentConfirmRequest {
            payment_id: payment_id.to_string(),
            confirmed_by: actor.id.clone(),
            confirmed_at: Utc::now(),
        };
        let payment = self.invoices.confirm_payment(&request).await?;
        tracing::info!(payment_id, confirmed_by = %actor.id, "Pagamento confirmado");
        Ok(payment)
    }

    pub async fn update_quote_status(
        &self,
        quote_id: &str,
        status: QuoteStatus,
        actor: &Actor,
    ) -> Result<(), AppError> {
        let request = QuoteStatusRequest {
            quote_id: quote_id.to_string(),
            status,
            updated_by: actor.id.clone(),
            updated_at: Utc::now(),
        };
        self.invoices.update_quote_status(&request).await
    }
}
