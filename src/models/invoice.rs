// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::fulfillment::{
    DispatchMarker, FieldRep, FulfillmentSource, FulfillmentSplit, FulfillmentStatus, Supplier,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,

    #[serde(default)]
    pub splits: Vec<FulfillmentSplit>,
    #[serde(default)]
    pub skip_fulfillment: bool,
    pub skip_reason: Option<String>,

    // Formato antigo: uma única fonte por item, sem divisões
    pub fulfillment_source: Option<FulfillmentSource>,
    #[serde(default)]
    pub serial_numbers: Vec<String>,
    pub field_rep: Option<FieldRep>,
    pub purchase_order_id: Option<String>,
    pub supplier: Option<Supplier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub issue_date: NaiveDate,
    pub line_items: Vec<InvoiceLineItem>,
    pub total_amount: Decimal,
    pub created_by: Option<String>,
    /// Só o colaborador de despacho grava este marcador.
    pub dispatch_marker: Option<DispatchMarker>,
}

// --- Pagamentos ---

/// Detalhes do pagamento. Uma única forma tipada, validada na fronteira.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDetails {
    Cash,
    #[serde(rename_all = "camelCase")]
    MobileMoney { reference: String, phone: Option<String> },
    #[serde(rename_all = "camelCase")]
    BankTransfer { reference: String, bank_name: String },
    #[serde(rename_all = "camelCase")]
    Cheque { cheque_number: String, bank_name: String },
}

impl PaymentDetails {
    /// Todo meio rastreável precisa de uma referência não vazia.
    pub fn is_well_formed(&self) -> bool {
        match self {
            PaymentDetails::Cash => true,
            PaymentDetails::MobileMoney { reference, .. } => !reference.trim().is_empty(),
            PaymentDetails::BankTransfer { reference, bank_name } => {
                !reference.trim().is_empty() && !bank_name.trim().is_empty()
            }
            PaymentDetails::Cheque { cheque_number, bank_name } => {
                !cheque_number.trim().is_empty() && !bank_name.trim().is_empty()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoicePaymentStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub details: PaymentDetails,
    pub status: InvoicePaymentStatus,
    pub logged_by: String,
    pub logged_at: DateTime<Utc>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Resposta de leitura do colaborador de faturas.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceBook {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub payments: Vec<InvoicePayment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Converted,
}

/// Fatura anotada com o status derivado e o total já pago.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub fulfillment_status: FulfillmentStatus,
    pub amount_paid: Decimal,
    pub payments: Vec<InvoicePayment>,
}
