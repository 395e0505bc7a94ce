// src/clients/requisition_client.rs

use async_trait::async_trait;
use serde_json::json;

use crate::{
    clients::script_client::{ScriptClient, action_body},
    common::error::AppError,
    models::requisition::{
        FloatBalance, FloatTopUp, NewRequisition, Requisition, RequisitionTransition,
        TransitionChange,
    },
};

/// Colaborador de requisições (e do caixa que as paga).
#[async_trait]
pub trait RequisitionStore: Send + Sync {
    async fn list(&self, created_by: Option<&str>) -> Result<Vec<Requisition>, AppError>;
    async fn get(&self, id: &str) -> Result<Requisition, AppError>;
    async fn create(&self, requisition: &NewRequisition) -> Result<Requisition, AppError>;
    async fn transition(&self, transition: &RequisitionTransition) -> Result<Requisition, AppError>;
    async fn float_balance(&self) -> Result<FloatBalance, AppError>;
    async fn add_float_funds(&self, top_up: &FloatTopUp) -> Result<FloatBalance, AppError>;
}

pub(crate) fn transition_action(change: &TransitionChange) -> &'static str {
    match change {
        TransitionChange::Approve => "approve",
        TransitionChange::Reject { .. } => "reject",
        TransitionChange::Pay { .. } => "pay",
        TransitionChange::Receive { .. } => "receive",
    }
}

#[derive(Clone)]
pub struct RequisitionClient {
    script: ScriptClient,
}

impl RequisitionClient {
    pub fn new(script: ScriptClient) -> Self {
        Self { script }
    }
}

#[async_trait]
impl RequisitionStore for RequisitionClient {
    async fn list(&self, created_by: Option<&str>) -> Result<Vec<Requisition>, AppError> {
        let filters: Vec<(&str, &str)> = created_by.map(|c| ("createdBy", c)).into_iter().collect();
        self.script.read("getRequisitions", &filters).await
    }

    async fn get(&self, id: &str) -> Result<Requisition, AppError> {
        let found: Vec<Requisition> = self.script.read("getRequisitions", &[("id", id)]).await?;
        found
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Requisição {}", id)))
    }

    async fn create(&self, requisition: &NewRequisition) -> Result<Requisition, AppError> {
        self.script.write_expecting(&action_body("create", requisition)?).await
    }

    async fn transition(&self, transition: &RequisitionTransition) -> Result<Requisition, AppError> {
        let action = transition_action(&transition.change);
        self.script.write_expecting(&action_body(action, transition)?).await
    }

    async fn float_balance(&self) -> Result<FloatBalance, AppError> {
        self.script
            .write_expecting(&action_body("getFloatBalance", &json!({}))?)
            .await
    }

    async fn add_float_funds(&self, top_up: &FloatTopUp) -> Result<FloatBalance, AppError> {
        self.script.write_expecting(&action_body("addFloatFunds", top_up)?).await
    }
}
