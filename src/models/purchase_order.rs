// src/models/purchase_order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{fulfillment::Supplier, invoice::PaymentDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierPaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl SupplierPaymentStatus {
    /// Pago quando o total cobre o preço de compra, parcial quando há algo pago.
    pub fn from_totals(total_paid: Decimal, purchase_price: Decimal) -> Self {
        if total_paid >= purchase_price {
            SupplierPaymentStatus::Paid
        } else if total_paid > Decimal::ZERO {
            SupplierPaymentStatus::Partial
        } else {
            SupplierPaymentStatus::Unpaid
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayment {
    pub amount: Decimal,
    pub details: PaymentDetails,
    pub paid_by: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub invoice_id: String,
    pub line_item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub supplier: Supplier,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub payment_status_to_supplier: SupplierPaymentStatus,
    #[serde(default)]
    pub payments: Vec<SupplierPayment>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// `None` se a soma dos pagamentos estourar o Decimal.
    pub fn total_paid(&self) -> Option<Decimal> {
        self.payments
            .iter()
            .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    pub invoice_id: String,
    pub line_item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub supplier: Supplier,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPaymentEntry {
    pub purchase_order_id: String,
    pub payment: SupplierPayment,
    pub total_paid: Decimal,
    pub resulting_status: SupplierPaymentStatus,
}
