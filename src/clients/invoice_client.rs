// src/clients/invoice_client.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    clients::script_client::{ScriptClient, typed_body},
    common::error::AppError,
    models::invoice::{InvoiceBook, InvoicePayment, PaymentDetails, QuoteStatus},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLogRequest {
    pub invoice_id: String,
    pub amount: Decimal,
    pub details: PaymentDetails,
    pub logged_by: String,
    pub logged_by_name: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmRequest {
    pub payment_id: String,
    pub confirmed_by: String,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusRequest {
    pub quote_id: String,
    pub status: QuoteStatus,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Colaborador de faturas e pagamentos.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn invoice_book(&self, requested_by: Option<&str>) -> Result<InvoiceBook, AppError>;
    async fn log_payment(&self, request: &PaymentLogRequest) -> Result<InvoicePayment, AppError>;
    async fn confirm_payment(&self, request: &PaymentConfirmRequest) -> Result<InvoicePayment, AppError>;
    async fn update_quote_status(&self, request: &QuoteStatusRequest) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct InvoiceClient {
    script: ScriptClient,
}

impl InvoiceClient {
    pub fn new(script: ScriptClient) -> Self {
        Self { script }
    }
}

#[async_trait]
impl InvoiceStore for InvoiceClient {
    async fn invoice_book(&self, requested_by: Option<&str>) -> Result<InvoiceBook, AppError> {
        let filters: Vec<(&str, &str)> = requested_by.map(|r| ("requestedBy", r)).into_iter().collect();
        self.script.read("getInvoices", &filters).await
    }

    async fn log_payment(&self, request: &PaymentLogRequest) -> Result<InvoicePayment, AppError> {
        self.script.write_expecting(&typed_body("logPayment", request)?).await
    }

    async fn confirm_payment(&self, request: &PaymentConfirmRequest) -> Result<InvoicePayment, AppError> {
        self.script.write_expecting(&typed_body("confirmPayment", request)?).await
    }

    async fn update_quote_status(&self, request: &QuoteStatusRequest) -> Result<(), AppError> {
        self.script
            .write::<serde_json::Value>(&typed_body("updateQuoteStatus", request)?)
            .await?;
        Ok(())
    }
}
