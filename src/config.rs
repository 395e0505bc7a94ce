// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    clients::{InventoryClient, InvoiceClient, RequisitionClient, ScriptClient, UploadClient},
    services::{
        auth::AuthService, dispatch_service::DispatchService,
        fulfillment_service::{DEFAULT_DRAFT_TTL_HOURS, DraftStore, FulfillmentService},
        inventory_service::InventoryService, invoice_service::InvoiceService,
        purchase_order_service::PurchaseOrderService, requisition_service::RequisitionService,
    },
};

/// Configuração lida do `.env` e do ambiente.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub invoice_store_url: String,
    pub requisition_store_url: String,
    pub inventory_store_url: String,
    pub upload_service_url: String,
    pub http_timeout: Duration,
    pub draft_ttl: chrono::Duration,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} deve ser definida", name))
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("HTTP_TIMEOUT_SECS inválido: {}", raw))?,
            Err(_) => 30,
        };

        let draft_ttl_hours = match env::var("DRAFT_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("DRAFT_TTL_HOURS inválido: {}", raw))?,
            Err(_) => DEFAULT_DRAFT_TTL_HOURS,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            invoice_store_url: required("INVOICE_STORE_URL")?,
            requisition_store_url: required("REQUISITION_STORE_URL")?,
            inventory_store_url: required("INVENTORY_STORE_URL")?,
            upload_service_url: required("UPLOAD_SERVICE_URL")?,
            http_timeout: Duration::from_secs(http_timeout_secs),
            draft_ttl: chrono::Duration::hours(draft_ttl_hours),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub invoice_service: InvoiceService,
    pub fulfillment_service: FulfillmentService,
    pub dispatch_service: DispatchService,
    pub purchase_order_service: PurchaseOrderService,
    pub requisition_service: RequisitionService,
    pub inventory_service: InventoryService,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .context("Falha ao criar o cliente HTTP")?;

        // --- Monta o gráfico de dependências ---
        let invoices = Arc::new(InvoiceClient::new(ScriptClient::new(
            http.clone(),
            settings.invoice_store_url.clone(),
            "invoices",
        )));
        let requisitions = Arc::new(RequisitionClient::new(ScriptClient::new(
            http.clone(),
            settings.requisition_store_url.clone(),
            "requisitions",
        )));
        let inventory = Arc::new(InventoryClient::new(ScriptClient::new(
            http.clone(),
            settings.inventory_store_url.clone(),
            "inventory",
        )));
        let files = Arc::new(UploadClient::new(http, settings.upload_service_url.clone()));

        let invoice_service = InvoiceService::new(invoices, inventory.clone());
        let purchase_order_service = PurchaseOrderService::new(inventory.clone());
        let fulfillment_service = FulfillmentService::new(
            DraftStore::default(),
            inventory.clone(),
            invoice_service.clone(),
            purchase_order_service.clone(),
        )
        .with_draft_ttl(settings.draft_ttl);
        let dispatch_service = DispatchService::new(inventory.clone(), invoice_service.clone());
        let requisition_service = RequisitionService::new(requisitions, files);
        let inventory_service = InventoryService::new(inventory);

        tracing::info!("✅ Colaboradores configurados");

        Ok(Self {
            auth_service: AuthService::new(settings.jwt_secret.clone()),
            invoice_service,
            fulfillment_service,
            dispatch_service,
            purchase_order_service,
            requisition_service,
            inventory_service,
        })
    }
}
