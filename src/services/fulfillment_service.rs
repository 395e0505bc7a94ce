// src/services/fulfillment_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    clients::InventoryStore,
    common::error::AppError,
    models::{
        auth::Actor,
        fulfillment::{
            DispatchOrder, DispatchOrderRequest, FulfillmentPlan, FulfillmentSource,
            FulfillmentStatus, PlanProgress, SkippedLine, SubmitPlanRequest, Supplier,
        },
        purchase_order::PurchaseOrder,
    },
    services::{
        invoice_service::InvoiceService,
        purchase_order_service::{PurchaseOrderDraft, PurchaseOrderService},
        status_deriver::derive_fulfillment_status,
    },
};

/// Rascunhos em edição, um por fatura. Único estado local do serviço.
pub type DraftStore = Arc<RwLock<HashMap<String, FulfillmentPlan>>>;

/// Rascunhos abertos há mais tempo que isso são descartados.
pub const DEFAULT_DRAFT_TTL_HOURS: i64 = 12;

impl FulfillmentPlan {
    /// Aplica a mesma fonte a todas as divisões ativas dos itens escolhidos.
    pub fn bulk_assign(&mut self, line_item_ids: &[String], source: FulfillmentSource) -> Result<(), AppError> {
        // Valida todos os ids antes de mexer em qualquer coisa
        for id in line_item_ids {
            self.line(id)?;
        }

        for line in self
            .lines
            .iter_mut()
            .filter(|l| line_item_ids.contains(&l.line_item_id))
            .filter(|l| !l.skip_fulfillment)
        {
            for split in &mut line.splits {
                split.switch_source(Some(source));
            }
        }
        Ok(())
    }

    pub fn progress(&self) -> PlanProgress {
        let active = self
            .lines
            .iter()
            .filter(|l| !l.skip_fulfillment)
            .flat_map(|l| l.splits.iter());

        let (complete_splits, total_splits) = active.fold((0, 0), |(done, total), split| {
            (done + usize::from(split.is_complete()), total + 1)
        });

        let percent = if total_splits == 0 {
            0.0
        } else {
            complete_splits as f64 / total_splits as f64 * 100.0
        };

        PlanProgress {
            complete_splits,
            total_splits,
            percent,
            violations: self.validate(),
        }
    }

    /// Traduz o plano validado em um pedido de criação por divisão.
    pub fn to_submission(&self, actor: &Actor, submitted_at: DateTime<Utc>) -> SubmitPlanRequest {
        let mut orders = Vec::new();
        let mut skipped_lines = Vec::new();

        for line in &self.lines {
            if line.skip_fulfillment {
                skipped_lines.push(SkippedLine {
                    line_item_id: line.line_item_id.clone(),
                    reason: line.skip_reason.clone().unwrap_or_default(),
                });
                continue;
            }

            for split in &line.splits {
                let Some(source) = split.fulfillment_source else {
                    continue;
                };
                orders.push(DispatchOrderRequest {
                    invoice_id: self.invoice_id.clone(),
                    line_item_id: line.line_item_id.clone(),
                    split_id: split.id,
                    product_id: line.product_id.clone(),
                    product_name: line.product_name.clone(),
                    quantity: split.quantity,
                    fulfillment_source: source,
                    source_description: split.source_description(),
                    serial_numbers: split.serial_numbers.clone(),
                    field_rep_id: split.field_rep.as_ref().map(|r| r.id.clone()),
                    purchase_order_id: split.purchase_order_id.clone(),
                    supplier_id: split.supplier.as_ref().map(|s| s.id.clone()),
                    submitted_by: actor.id.clone(),
                    submitted_by_name: actor.name.clone(),
                    submitted_at,
                });
            }
        }

        SubmitPlanRequest {
            invoice_id: self.invoice_id.clone(),
            orders,
            skipped_lines,
        }
    }
}

#[derive(Clone)]
pub struct FulfillmentService {
    drafts: DraftStore,
    inventory: Arc<dyn InventoryStore>,
    invoice_service: InvoiceService,
    purchase_order_service: PurchaseOrderService,
    draft_ttl: Duration,
}

impl FulfillmentService {
    pub fn new(
        drafts: DraftStore,
        inventory: Arc<dyn InventoryStore>,
        invoice_service: InvoiceService,
        purchase_order_service: PurchaseOrderService,
    ) -> Self {
        Self {
            drafts,
            inventory,
            invoice_service,
            purchase_order_service,
            draft_ttl: Duration::hours(DEFAULT_DRAFT_TTL_HOURS),
        }
    }

    pub fn with_draft_ttl(mut self, ttl: Duration) -> Self {
        self.draft_ttl = ttl;
        self
    }

    /// Remove rascunhos abertos e abandonados além do prazo.
    async fn prune_expired(&self, now: DateTime<Utc>) {
        let mut drafts = self.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, plan| now - plan.opened_at < self.draft_ttl);

        let removed = before - drafts.len();
        if removed > 0 {
            tracing::info!(removed, "Rascunhos expirados descartados");
        }
    }

    // --- RASCUNHO ---

    /// Abre (ou retoma) o rascunho de atendimento de uma fatura.
    pub async fn open_draft(&self, invoice_id: &str, actor: &Actor) -> Result<FulfillmentPlan, AppError> {
        self.prune_expired(Utc::now()).await;

        if let Some(plan) = self.drafts.read().await.get(invoice_id) {
            return Ok(plan.clone());
        }

        let invoice = self.invoice_service.find_invoice(invoice_id).await?;
        let orders = self.inventory.dispatch_orders(Some(invoice_id)).await?;

        // Fatura com lote vivo (pendente ou aprovado) não recebe outro plano
        let status = derive_fulfillment_status(&invoice, &orders);
        if status != FulfillmentStatus::AwaitingFulfillment {
            return Err(AppError::InvalidEdit(format!(
                "a fatura {} está em {:?} e não aceita novo plano",
                invoice_id, status
            )));
        }

        let plan = FulfillmentPlan::from_invoice(&invoice, &actor.id, Utc::now());

        // Outro operador pode ter aberto o rascunho durante a leitura
        let mut drafts = self.drafts.write().await;
        let plan = drafts.entry(invoice_id.to_string()).or_insert(plan).clone();
        tracing::info!(invoice_id, opened_by = %actor.id, "Rascunho de atendimento aberto");
        Ok(plan)
    }

    pub async fn discard_draft(&self, invoice_id: &str) -> Result<(), AppError> {
        self.drafts
            .write()
            .await
            .remove(invoice_id)
            .map(|_| ())
            .ok_or_else(|| AppError::ResourceNotFound(format!("Rascunho da fatura {}", invoice_id)))
    }

    /// Aplica uma edição ao rascunho. Se a edição falhar, nada muda.
    pub async fn edit<F>(&self, invoice_id: &str, apply: F) -> Result<FulfillmentPlan, AppError>
    where
        F: FnOnce(&mut FulfillmentPlan) -> Result<(), AppError>,
    {
        let mut drafts = self.drafts.write().await;
        let plan = drafts
            .get_mut(invoice_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Rascunho da fatura {}", invoice_id)))?;

        let mut edited = plan.clone();
        apply(&mut edited)?;
        *plan = edited;
        Ok(plan.clone())
    }

    pub async fn bulk_assign(
        &self,
        invoice_id: &str,
        line_item_ids: &[String],
        source: FulfillmentSource,
    ) -> Result<FulfillmentPlan, AppError> {
        self.edit(invoice_id, |plan| plan.bulk_assign(line_item_ids, source))
            .await
    }

    pub async fn progress(&self, invoice_id: &str) -> Result<PlanProgress, AppError> {
        self.drafts
            .read()
            .await
            .get(invoice_id)
            .map(FulfillmentPlan::progress)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Rascunho da fatura {}", invoice_id)))
    }

    // --- ORDEM DE COMPRA ---

    /// Abre a ordem de compra de uma divisão OUTSOURCE e a vincula ao rascunho
    /// depois que o colaborador confirma a criação.
    pub async fn create_purchase_order(
        &self,
        invoice_id: &str,
        split_id: Uuid,
        supplier: Supplier,
        purchase_price: Decimal,
        selling_price: Decimal,
        actor: &Actor,
    ) -> Result<(PurchaseOrder, FulfillmentPlan), AppError> {
        let draft = {
            let drafts = self.drafts.read().await;
            let plan = drafts
                .get(invoice_id)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Rascunho da fatura {}", invoice_id)))?;
            let split = plan.split(split_id)?;
            if split.fulfillment_source != Some(FulfillmentSource::Outsource) {
                return Err(AppError::InvalidEdit(
                    "ordem de compra só pode ser vinculada a divisões OUTSOURCE".into(),
                ));
            }
            let line = plan.line(&split.line_item_id)?;
            PurchaseOrderDraft {
                invoice_id: invoice_id.to_string(),
                line_item_id: line.line_item_id.clone(),
                product_id: line.product_id.clone(),
                quantity: split.quantity,
                supplier,
                purchase_price,
                selling_price,
            }
        };

        let order = self.purchase_order_service.create(draft, actor).await?;

        let plan = self
            .edit(invoice_id, |plan| {
                plan.bind_purchase_order(split_id, &order.id, Some(order.supplier.clone()))
            })
            .await?;
        Ok((order, plan))
    }

    // --- ENVIO ---

    /// Envia o plano. Com erros de campo, nada sai pela rede.
    pub async fn submit(&self, invoice_id: &str, actor: &Actor) -> Result<Vec<DispatchOrder>, AppError> {
        let plan = self
            .drafts
            .read()
            .await
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| AppError::ResourceNotFound(format!("Rascunho da fatura {}", invoice_id)))?;

        let violations = plan.validate();
        if !violations.is_empty() {
            tracing::info!(invoice_id, count = violations.len(), "Plano recusado na validação");
            return Err(AppError::PlanRejected(violations));
        }

        let request = plan.to_submission(actor, Utc::now());
        let created = self.inventory.submit_fulfillment_plan(&request).await?;

        self.drafts.write().await.remove(invoice_id);
        tracing::info!(
            invoice_id,
            orders = created.len(),
            submitted_by = %actor.id,
            "✅ Plano de atendimento enviado"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            auth::Role,
            fulfillment::{DispatchApprovalStatus, PlanViolation, SplitField},
        },
        testing::{MemoryInventoryStore, MemoryInvoiceStore, actor, dispatch_order, invoice_with_lines, supplier},
    };

    struct Fixture {
        service: FulfillmentService,
        inventory: Arc<MemoryInventoryStore>,
    }

    fn fixture(lines: &[(&str, u32)]) -> Fixture {
        fixture_with_orders(lines, vec![])
    }

    fn fixture_with_orders(lines: &[(&str, u32)], orders: Vec<DispatchOrder>) -> Fixture {
        let invoices = Arc::new(MemoryInvoiceStore::with_invoices(vec![invoice_with_lines("INV-1", lines)]));
        let inventory = Arc::new(MemoryInventoryStore::with_orders(orders));
        let invoice_service = InvoiceService::new(invoices, inventory.clone());
        let po_service = PurchaseOrderService::new(inventory.clone());
        let service = FulfillmentService::new(
            DraftStore::default(),
            inventory.clone(),
            invoice_service,
            po_service,
        );
        Fixture { service, inventory }
    }

    #[tokio::test]
    async fn test_bulk_assign_only_touches_selected_lines() {
        let f = fixture(&[("L1", 2), ("L2", 3), ("L3", 1)]);
        let storekeeper = actor(Role::Storekeeper);
        let plan = f.service.open_draft("INV-1", &storekeeper).await.unwrap();
        let l1_first = plan.lines[0].splits[0].id;
        let l3_only = plan.lines[2].splits[0].id;

        f.service
            .edit("INV-1", |p| {
                p.add_split("L1")?;
                p.set_split_source(l1_first, Some(FulfillmentSource::FieldRep))?;
                p.set_split_source(l3_only, Some(FulfillmentSource::Nyamira))
            })
            .await
            .unwrap();

        let plan = f
            .service
            .bulk_assign("INV-1", &["L1".to_string(), "L2".to_string()], FulfillmentSource::MainHq)
            .await
            .unwrap();

        for line in &plan.lines[..2] {
            assert!(
                line.splits
                    .iter()
                    .all(|s| s.fulfillment_source == Some(FulfillmentSource::MainHq))
            );
        }
        assert_eq!(
            plan.lines[2].splits[0].fulfillment_source,
            Some(FulfillmentSource::Nyamira)
        );
    }

    #[tokio::test]
    async fn test_bulk_assign_skips_skipped_lines_and_rejects_unknown_ids() {
        let f = fixture(&[("L1", 2), ("L2", 3)]);
        f.service.open_draft("INV-1", &actor(Role::Storekeeper)).await.unwrap();
        f.service
            .edit("INV-1", |p| p.set_skip("L2", true, Some("Backorder".into())))
            .await
            .unwrap();

        let plan = f
            .service
            .bulk_assign("INV-1", &["L1".to_string(), "L2".to_string()], FulfillmentSource::Outsource)
            .await
            .unwrap();
        assert_eq!(plan.lines[0].splits[0].fulfillment_source, Some(FulfillmentSource::Outsource));
        assert_eq!(plan.lines[1].splits[0].fulfillment_source, None);

        let unknown = f
            .service
            .bulk_assign("INV-1", &["L1".to_string(), "NOPE".to_string()], FulfillmentSource::MainHq)
            .await;
        assert!(matches!(unknown, Err(AppError::ResourceNotFound(_))));
        // A edição recusada não alterou nada
        let progress = f.service.progress("INV-1").await.unwrap();
        assert_eq!(progress.total_splits, 1);
        let plan = f.service.open_draft("INV-1", &actor(Role::Storekeeper)).await.unwrap();
        assert_eq!(plan.lines[0].splits[0].fulfillment_source, Some(FulfillmentSource::Outsource));
    }

    #[tokio::test]
    async fn test_progress_counts_complete_splits() {
        let f = fixture(&[("L1", 1), ("L2", 1)]);
        let plan = f.service.open_draft("INV-1", &actor(Role::Storekeeper)).await.unwrap();
        let first = plan.lines[0].splits[0].id;

        f.service
            .edit("INV-1", |p| {
                p.set_split_source(first, Some(FulfillmentSource::MainHq))?;
                p.set_serial_numbers(first, vec!["SN-1".into()])
            })
            .await
            .unwrap();

        let progress = f.service.progress("INV-1").await.unwrap();
        assert_eq!(progress.complete_splits, 1);
        assert_eq!(progress.total_splits, 2);
        assert!((progress.percent - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_split_plan_becomes_valid_after_purchase_order_binding() {
        let f = fixture(&[("L1", 10)]);
        let storekeeper = actor(Role::Storekeeper);
        let plan = f.service.open_draft("INV-1", &storekeeper).await.unwrap();
        let hq = plan.lines[0].splits[0].id;

        let serials: Vec<String> = (1..=6).map(|n| format!("SN-{n}")).collect();
        let mut outsourced = Uuid::nil();
        f.service
            .edit("INV-1", |p| {
                p.set_split_quantity(hq, 6)?;
                p.set_split_source(hq, Some(FulfillmentSource::MainHq))?;
                p.set_serial_numbers(hq, serials)?;
                outsourced = p.add_split("L1")?;
                p.set_split_quantity(outsourced, 4)?;
                p.set_split_source(outsourced, Some(FulfillmentSource::Outsource))
            })
            .await
            .unwrap();

        // Divisão OUTSOURCE sem ordem de compra bloqueia o envio, sem chamada remota
        let calls_before = f.inventory.calls().len();
        let rejected = f.service.submit("INV-1", &storekeeper).await;
        match rejected {
            Err(AppError::PlanRejected(violations)) => assert_eq!(
                violations,
                vec![PlanViolation::SplitIncomplete {
                    line_item_id: "L1".into(),
                    split_id: outsourced,
                    missing: vec![SplitField::PurchaseOrder],
                }]
            ),
            other => panic!("esperava PlanRejected, veio {:?}", other),
        }
        assert_eq!(f.inventory.calls().len(), calls_before);

        f.service
            .edit("INV-1", |p| p.bind_purchase_order(outsourced, "PO-77", None))
            .await
            .unwrap();

        let orders = f.service.submit("INV-1", &storekeeper).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(
            orders
                .iter()
                .all(|o| o.dispatch_approval_status == DispatchApprovalStatus::PendingApproval)
        );
        assert_eq!(orders.iter().map(|o| o.quantity).sum::<u32>(), 10);

        // O rascunho é descartado depois do envio
        assert!(matches!(
            f.service.progress("INV-1").await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_submission_carries_submitter_and_skips() {
        let f = fixture(&[("L1", 1), ("L2", 5)]);
        let storekeeper = actor(Role::Storekeeper);
        let plan = f.service.open_draft("INV-1", &storekeeper).await.unwrap();
        let split = plan.lines[0].splits[0].id;

        f.service
            .edit("INV-1", |p| {
                p.set_split_source(split, Some(FulfillmentSource::MainHq))?;
                p.set_serial_numbers(split, vec!["SN-1".into()])?;
                p.set_skip("L2", true, Some("Customer cancelled".into()))
            })
            .await
            .unwrap();

        let request = f
            .service
            .open_draft("INV-1", &storekeeper)
            .await
            .unwrap()
            .to_submission(&storekeeper, Utc::now());
        assert_eq!(request.orders.len(), 1);
        assert_eq!(request.orders[0].submitted_by, storekeeper.id);
        assert_eq!(request.orders[0].source_description, "Main HQ warehouse");
        assert_eq!(request.skipped_lines[0].line_item_id, "L2");

        f.service.submit("INV-1", &storekeeper).await.unwrap();
        assert_eq!(f.inventory.submitted_plans()[0], request.orders.len());
    }

    #[tokio::test]
    async fn test_abandoned_draft_expires_on_next_open() {
        let drafts = DraftStore::default();
        let invoices = Arc::new(MemoryInvoiceStore::with_invoices(vec![
            invoice_with_lines("INV-1", &[("L1", 4)]),
            invoice_with_lines("INV-2", &[("L1", 1)]),
        ]));
        let inventory = Arc::new(MemoryInventoryStore::default());
        let invoice_service = InvoiceService::new(invoices, inventory.clone());
        let service = FulfillmentService::new(
            drafts.clone(),
            inventory.clone(),
            invoice_service,
            PurchaseOrderService::new(inventory.clone()),
        )
        .with_draft_ttl(Duration::minutes(30));
        let storekeeper = actor(Role::Storekeeper);

        service.open_draft("INV-1", &storekeeper).await.unwrap();
        service
            .edit("INV-1", |p| p.add_split("L1").map(|_| ()))
            .await
            .unwrap();

        // Envelhece o rascunho além do prazo
        if let Some(plan) = drafts.write().await.get_mut("INV-1") {
            plan.opened_at = Utc::now() - Duration::hours(1);
        }

        service.open_draft("INV-2", &storekeeper).await.unwrap();
        assert!(!drafts.read().await.contains_key("INV-1"));

        // Reabrir recomeça do zero
        let reopened = service.open_draft("INV-1", &storekeeper).await.unwrap();
        assert_eq!(reopened.lines[0].splits.len(), 1);
        assert_eq!(drafts.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_cannot_open_draft_while_batch_pending() {
        let f = fixture_with_orders(
            &[("L1", 1)],
            vec![dispatch_order("D1", "INV-1", DispatchApprovalStatus::PendingApproval)],
        );
        let result = f.service.open_draft("INV-1", &actor(Role::Storekeeper)).await;
        assert!(matches!(result, Err(AppError::InvalidEdit(_))));
    }

    #[tokio::test]
    async fn test_purchase_order_binds_only_after_creation() {
        let f = fixture(&[("L1", 4)]);
        let storekeeper = actor(Role::Storekeeper);
        let plan = f.service.open_draft("INV-1", &storekeeper).await.unwrap();
        let split = plan.lines[0].splits[0].id;
        f.service
            .edit("INV-1", |p| p.set_split_source(split, Some(FulfillmentSource::Outsource)))
            .await
            .unwrap();

        f.inventory.fail_next("Supplier sheet is locked");
        let failed = f
            .service
            .create_purchase_order("INV-1", split, supplier(), Decimal::from(800), Decimal::from(1000), &storekeeper)
            .await;
        assert!(matches!(failed, Err(AppError::Remote(ref m)) if m == "Supplier sheet is locked"));
        let progress = f.service.progress("INV-1").await.unwrap();
        assert_eq!(progress.complete_splits, 0);

        let (order, plan) = f
            .service
            .create_purchase_order("INV-1", split, supplier(), Decimal::from(800), Decimal::from(1000), &storekeeper)
            .await
            .unwrap();
        assert_eq!(plan.lines[0].splits[0].purchase_order_id.as_deref(), Some(order.id.as_str()));
        assert!(plan.validate().is_empty());
    }
}
