// src/clients/inventory_client.rs

use async_trait::async_trait;

use crate::{
    clients::script_client::{ScriptClient, action_body},
    common::error::AppError,
    models::{
        fulfillment::{DispatchDecision, DispatchDecisionRequest, DispatchOrder, SubmitPlanRequest},
        inventory::{LocationProduct, StockAdjustment},
        purchase_order::{NewPurchaseOrder, PurchaseOrder, SupplierPaymentEntry},
    },
};

/// Colaborador de estoque e despacho.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn dispatch_orders(&self, invoice_id: Option<&str>) -> Result<Vec<DispatchOrder>, AppError>;
    async fn submit_fulfillment_plan(&self, plan: &SubmitPlanRequest) -> Result<Vec<DispatchOrder>, AppError>;
    async fn decide_dispatch(&self, decision: &DispatchDecisionRequest) -> Result<Vec<DispatchOrder>, AppError>;
    async fn create_purchase_order(&self, order: &NewPurchaseOrder) -> Result<PurchaseOrder, AppError>;
    async fn purchase_order(&self, id: &str) -> Result<PurchaseOrder, AppError>;
    async fn log_supplier_payment(&self, entry: &SupplierPaymentEntry) -> Result<PurchaseOrder, AppError>;
    async fn products_for_location(&self, location: &str) -> Result<Vec<LocationProduct>, AppError>;
    async fn update_stock_quantity(&self, adjustment: &StockAdjustment) -> Result<LocationProduct, AppError>;
}

#[derive(Clone)]
pub struct InventoryClient {
    script: ScriptClient,
}

impl InventoryClient {
    pub fn new(script: ScriptClient) -> Self {
        Self { script }
    }
}

#[async_trait]
impl InventoryStore for InventoryClient {
    async fn dispatch_orders(&self, invoice_id: Option<&str>) -> Result<Vec<DispatchOrder>, AppError> {
        let filters: Vec<(&str, &str)> = invoice_id.map(|id| ("invoiceId", id)).into_iter().collect();
        self.script.read("getDispatchOrders", &filters).await
    }

    async fn submit_fulfillment_plan(&self, plan: &SubmitPlanRequest) -> Result<Vec<DispatchOrder>, AppError> {
        self.script
            .write_expecting(&action_body("submitFulfillmentPlan", plan)?)
            .await
    }

    async fn decide_dispatch(&self, decision: &DispatchDecisionRequest) -> Result<Vec<DispatchOrder>, AppError> {
        let action = match decision.decision {
            DispatchDecision::Approved => "approveDispatch",
            DispatchDecision::Rejected => "rejectDispatch",
        };
        self.script.write_expecting(&action_body(action, decision)?).await
    }

    async fn create_purchase_order(&self, order: &NewPurchaseOrder) -> Result<PurchaseOrder, AppError> {
        self.script
            .write_expecting(&action_body("createPurchaseOrder", order)?)
            .await
    }

    async fn purchase_order(&self, id: &str) -> Result<PurchaseOrder, AppError> {
        let found: Vec<PurchaseOrder> = self.script.read("getPurchaseOrders", &[("id", id)]).await?;
        found
            .into_iter()
            .find(|po| po.id == id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de compra {}", id)))
    }

    async fn log_supplier_payment(&self, entry: &SupplierPaymentEntry) -> Result<PurchaseOrder, AppError> {
        self.script
            .write_expecting(&action_body("logSupplierPayment", entry)?)
            .await
    }

    async fn products_for_location(&self, location: &str) -> Result<Vec<LocationProduct>, AppError> {
        self.script
            .write_expecting(&action_body(
                "getProductsForLocation",
                &serde_json::json!({ "location": location }),
            )?)
            .await
    }

    async fn update_stock_quantity(&self, adjustment: &StockAdjustment) -> Result<LocationProduct, AppError> {
        self.script
            .write_expecting(&action_body("updateStockQuantity", adjustment)?)
            .await
    }
}
