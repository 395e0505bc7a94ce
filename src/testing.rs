// src/testing.rs
// Colaboradores em memória para os testes. Registram cada chamada.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::{
    clients::{
        Attachment, FileStore, InventoryStore, InvoiceStore, RequisitionStore,
        invoice_client::{PaymentConfirmRequest, PaymentLogRequest, QuoteStatusRequest},
        requisition_client::transition_action,
    },
    common::error::AppError,
    models::{
        auth::{Actor, Role},
        fulfillment::{
            DispatchApprovalStatus, DispatchDecision, DispatchDecisionRequest, DispatchOrder,
            SubmitPlanRequest, Supplier,
        },
        inventory::{LocationProduct, StockAdjustment},
        invoice::{Invoice, InvoiceBook, InvoiceLineItem, InvoicePayment, InvoicePaymentStatus},
        purchase_order::{NewPurchaseOrder, PurchaseOrder, SupplierPaymentEntry, SupplierPaymentStatus},
        requisition::{
            ApprovalStatus, FloatBalance, FloatTopUp, NewRequisition, PaymentStatus, ReceiptStatus,
            Requisition, RequisitionTransition, TransitionChange,
        },
    },
};

// --- Construtores ---

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}

pub fn actor(role: Role) -> Actor {
    let slug = format!("{:?}", role).to_lowercase();
    Actor {
        id: format!("user-{}", slug),
        name: format!("Test {}", slug),
        role,
    }
}

pub fn supplier() -> Supplier {
    Supplier {
        id: "SUP-1".into(),
        name: "Kisii Traders".into(),
        phone: Some("+254700000001".into()),
    }
}

pub fn invoice_with_lines(id: &str, lines: &[(&str, u32)]) -> Invoice {
    let line_items: Vec<InvoiceLineItem> = lines
        .iter()
        .map(|(line_id, quantity)| InvoiceLineItem {
            id: line_id.to_string(),
            product_id: format!("P-{}", line_id),
            product_name: format!("Product {}", line_id),
            quantity: *quantity,
            unit_price: Decimal::from(100),
            splits: Vec::new(),
            skip_fulfillment: false,
            skip_reason: None,
            fulfillment_source: None,
            serial_numbers: Vec::new(),
            field_rep: None,
            purchase_order_id: None,
            supplier: None,
        })
        .collect();

    let total_amount = line_items
        .iter()
        .map(|l| Decimal::from(l.quantity) * l.unit_price)
        .sum();

    Invoice {
        id: id.to_string(),
        customer_name: "Acme Ltd".into(),
        customer_phone: None,
        issue_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        line_items,
        total_amount,
        created_by: Some("user-sales".into()),
        dispatch_marker: None,
    }
}

pub fn dispatch_order(id: &str, invoice_id: &str, status: DispatchApprovalStatus) -> DispatchOrder {
    DispatchOrder {
        id: id.to_string(),
        invoice_id: invoice_id.to_string(),
        line_item_id: Some("L1".into()),
        product_id: "P-L1".into(),
        quantity: 1,
        source_description: "Main HQ warehouse".into(),
        submitted_by: "user-storekeeper".into(),
        submitted_at: now(),
        dispatch_approval_status: status,
        approved_by: None,
        approved_at: None,
        rejection_reason: None,
        version: 1,
    }
}

pub fn requisition(
    id: &str,
    approval_status: ApprovalStatus,
    payment_status: PaymentStatus,
    receipt_status: ReceiptStatus,
) -> Requisition {
    Requisition {
        id: id.to_string(),
        requested_by: "user-staff".into(),
        requested_by_name: "Test staff".into(),
        requested_at: now(),
        category: "Operations".into(),
        class: "Consumables".into(),
        kind: "Purchase".into(),
        items: Vec::new(),
        total_amount: Decimal::from(1500),
        approval_status,
        payment_status,
        receipt_status,
        approved_by: None,
        approved_at: None,
        rejection_reason: None,
        paid_by: None,
        paid_at: None,
        payment_reference: None,
        payment_proof_url: None,
        received_by: None,
        received_at: None,
        receipt_url: None,
        version: 1,
    }
}

pub fn attachment() -> Attachment {
    Attachment {
        file_name: "proof.jpg".into(),
        content_type: "image/jpeg".into(),
        bytes: vec![0xFF, 0xD8, 0xFF],
    }
}

// --- Faturas ---

#[derive(Default)]
pub struct MemoryInvoiceStore {
    book: Mutex<InvoiceBook>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl MemoryInvoiceStore {
    pub fn with_invoices(invoices: Vec<Invoice>) -> Self {
        Self {
            book: Mutex::new(InvoiceBook {
                invoices,
                payments: Vec::new(),
            }),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn invoice_book(&self, requested_by: Option<&str>) -> Result<InvoiceBook, AppError> {
        self.record(format!("getInvoices:{}", requested_by.unwrap_or("*")));
        let book = self.book.lock().unwrap();
        let invoices = book
            .invoices
            .iter()
            .filter(|i| requested_by.is_none() || i.created_by.as_deref() == requested_by)
            .cloned()
            .collect();
        Ok(InvoiceBook {
            invoices,
            payments: book.payments.clone(),
        })
    }

    async fn log_payment(&self, request: &PaymentLogRequest) -> Result<InvoicePayment, AppError> {
        self.record("logPayment".into());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let payment = InvoicePayment {
            id: format!("PAY-{}", n),
            invoice_id: request.invoice_id.clone(),
            amount: request.amount,
            details: request.details.clone(),
            status: InvoicePaymentStatus::Pending,
            logged_by: request.logged_by.clone(),
            logged_at: request.logged_at,
            confirmed_by: None,
            confirmed_at: None,
        };
        self.book.lock().unwrap().payments.push(payment.clone());
        Ok(payment)
    }

    async fn confirm_payment(&self, request: &PaymentConfirmRequest) -> Result<InvoicePayment, AppError> {
        self.record("confirmPayment".into());
        let mut book = self.book.lock().unwrap();
        let payment = book
            .payments
            .iter_mut()
            .find(|p| p.id == request.payment_id)
            .ok_or_else(|| AppError::Remote(format!("Payment {} not found", request.payment_id)))?;
        payment.status = InvoicePaymentStatus::Confirmed;
        payment.confirmed_by = Some(request.confirmed_by.clone());
        payment.confirmed_at = Some(request.confirmed_at);
        Ok(payment.clone())
    }

    async fn update_quote_status(&self, request: &QuoteStatusRequest) -> Result<(), AppError> {
        self.record(format!("updateQuoteStatus:{}", request.quote_id));
        Ok(())
    }
}

// --- Estoque e despacho ---

#[derive(Default)]
pub struct MemoryInventoryStore {
    orders: Mutex<Vec<DispatchOrder>>,
    purchase_orders: Mutex<Vec<PurchaseOrder>>,
    products: Mutex<Vec<LocationProduct>>,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<usize>>,
    decisions: Mutex<Vec<Vec<String>>>,
    fail_next: Mutex<Option<String>>,
    bump_on_read: AtomicBool,
    next_id: AtomicUsize,
}

impl MemoryInventoryStore {
    pub fn with_orders(orders: Vec<DispatchOrder>) -> Self {
        Self {
            orders: Mutex::new(orders),
            ..Default::default()
        }
    }

    pub fn with_products(products: Vec<LocationProduct>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Quantidade de ordens em cada plano recebido.
    pub fn submitted_plans(&self) -> Vec<usize> {
        self.submitted.lock().unwrap().clone()
    }

    /// Ids das ordens em cada pedido de decisão recebido.
    pub fn decisions(&self) -> Vec<Vec<String>> {
        self.decisions.lock().unwrap().clone()
    }

    /// A próxima escrita falha com esta mensagem.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// Simula outro operador alterando as ordens logo após cada leitura.
    pub fn bump_version_on_read(&self) {
        self.bump_on_read.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn write(&self, call: &str) -> Result<(), AppError> {
        self.record(call);
        match self.fail_next.lock().unwrap().take() {
            Some(message) => Err(AppError::Remote(message)),
            None => Ok(()),
        }
    }

    fn next(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn dispatch_orders(&self, invoice_id: Option<&str>) -> Result<Vec<DispatchOrder>, AppError> {
        self.record("getDispatchOrders");
        let mut orders = self.orders.lock().unwrap();
        let found = orders
            .iter()
            .filter(|o| invoice_id.is_none_or(|id| o.invoice_id == id))
            .cloned()
            .collect();
        if self.bump_on_read.load(Ordering::SeqCst) {
            orders.iter_mut().for_each(|o| o.version += 1);
        }
        Ok(found)
    }

    async fn submit_fulfillment_plan(&self, plan: &SubmitPlanRequest) -> Result<Vec<DispatchOrder>, AppError> {
        self.write("submitFulfillmentPlan")?;
        let created: Vec<DispatchOrder> = plan
            .orders
            .iter()
            .map(|request| DispatchOrder {
                id: self.next("D"),
                invoice_id: request.invoice_id.clone(),
                line_item_id: Some(request.line_item_id.clone()),
                product_id: request.product_id.clone(),
                quantity: request.quantity,
                source_description: request.source_description.clone(),
                submitted_by: request.submitted_by.clone(),
                submitted_at: request.submitted_at,
                dispatch_approval_status: DispatchApprovalStatus::PendingApproval,
                approved_by: None,
                approved_at: None,
                rejection_reason: None,
                version: 1,
            })
            .collect();
        self.orders.lock().unwrap().extend(created.iter().cloned());
        self.submitted.lock().unwrap().push(created.len());
        Ok(created)
    }

    async fn decide_dispatch(&self, decision: &DispatchDecisionRequest) -> Result<Vec<DispatchOrder>, AppError> {
        self.write("decideDispatch")?;
        let mut orders = self.orders.lock().unwrap();

        // Confere todas as versões antes de alterar qualquer ordem
        for wanted in &decision.orders {
            let current = orders
                .iter()
                .find(|o| o.id == wanted.id)
                .ok_or_else(|| AppError::Remote(format!("Order {} not found", wanted.id)))?;
            if current.version != wanted.expected_version {
                return Err(AppError::Conflict);
            }
        }

        let status = match decision.decision {
            DispatchDecision::Approved => DispatchApprovalStatus::Approved,
            DispatchDecision::Rejected => DispatchApprovalStatus::Rejected,
        };
        let ids: Vec<String> = decision.orders.iter().map(|o| o.id.clone()).collect();
        let mut updated = Vec::new();
        for order in orders.iter_mut().filter(|o| ids.contains(&o.id)) {
            order.dispatch_approval_status = status;
            order.approved_by = Some(decision.decided_by.clone());
            order.approved_at = Some(decision.decided_at);
            order.rejection_reason = decision.reason.clone();
            order.version += 1;
            updated.push(order.clone());
        }
        self.decisions.lock().unwrap().push(ids);
        Ok(updated)
    }

    async fn create_purchase_order(&self, order: &NewPurchaseOrder) -> Result<PurchaseOrder, AppError> {
        self.write("createPurchaseOrder")?;
        let created = PurchaseOrder {
            id: self.next("PO"),
            invoice_id: order.invoice_id.clone(),
            line_item_id: order.line_item_id.clone(),
            product_id: order.product_id.clone(),
            quantity: order.quantity,
            supplier: order.supplier.clone(),
            purchase_price: order.purchase_price,
            selling_price: order.selling_price,
            profit: order.profit,
            payment_status_to_supplier: SupplierPaymentStatus::Unpaid,
            payments: Vec::new(),
            created_by: order.created_by.clone(),
            created_at: order.created_at,
        };
        self.purchase_orders.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn purchase_order(&self, id: &str) -> Result<PurchaseOrder, AppError> {
        self.record("getPurchaseOrders");
        self.purchase_orders
            .lock()
            .unwrap()
            .iter()
            .find(|po| po.id == id)
            .cloned()
            .ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de compra {}", id)))
    }

    async fn log_supplier_payment(&self, entry: &SupplierPaymentEntry) -> Result<PurchaseOrder, AppError> {
        self.write("logSupplierPayment")?;
        let mut purchase_orders = self.purchase_orders.lock().unwrap();
        let po = purchase_orders
            .iter_mut()
            .find(|po| po.id == entry.purchase_order_id)
            .ok_or_else(|| AppError::Remote("Purchase order not found".into()))?;
        po.payments.push(entry.payment.clone());
        po.payment_status_to_supplier = entry.resulting_status;
        Ok(po.clone())
    }

    async fn products_for_location(&self, location: &str) -> Result<Vec<LocationProduct>, AppError> {
        self.record("getProductsForLocation");
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.location == location)
            .cloned()
            .collect())
    }

    async fn update_stock_quantity(&self, adjustment: &StockAdjustment) -> Result<LocationProduct, AppError> {
        self.write("updateStockQuantity")?;
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.product_id == adjustment.product_id && p.location == adjustment.location)
            .ok_or_else(|| AppError::Remote("Product not stocked at location".into()))?;
        product.quantity = adjustment.quantity;
        Ok(product.clone())
    }
}

// --- Requisições ---

#[derive(Default)]
pub struct MemoryRequisitionStore {
    requisitions: Mutex<Vec<Requisition>>,
    float: Mutex<Decimal>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl MemoryRequisitionStore {
    pub fn with_requisitions(requisitions: Vec<Requisition>) -> Self {
        Self {
            requisitions: Mutex::new(requisitions),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RequisitionStore for MemoryRequisitionStore {
    async fn list(&self, created_by: Option<&str>) -> Result<Vec<Requisition>, AppError> {
        self.record(format!("list:{}", created_by.unwrap_or("*")));
        Ok(self
            .requisitions
            .lock()
            .unwrap()
            .iter()
            .filter(|r| created_by.is_none_or(|c| r.requested_by == c))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Requisition, AppError> {
        self.record(format!("get:{}", id));
        self.requisitions
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::ResourceNotFound(format!("Requisição {}", id)))
    }

    async fn create(&self, new: &NewRequisition) -> Result<Requisition, AppError> {
        self.record("create".into());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = requisition(
            &format!("REQ-{}", 100 + n),
            ApprovalStatus::PendingApproval,
            PaymentStatus::Unpaid,
            ReceiptStatus::Pending,
        );
        created.requested_by = new.requested_by.clone();
        created.requested_by_name = new.requested_by_name.clone();
        created.requested_at = new.requested_at;
        created.items = new.items.clone();
        created.total_amount = new.total_amount;
        self.requisitions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn transition(&self, transition: &RequisitionTransition) -> Result<Requisition, AppError> {
        self.record(transition_action(&transition.change).to_string());
        let mut requisitions = self.requisitions.lock().unwrap();
        let req = requisitions
            .iter_mut()
            .find(|r| r.id == transition.requisition_id)
            .ok_or_else(|| AppError::Remote("Requisition not found".into()))?;

        if req.version != transition.expected_version {
            return Err(AppError::Conflict);
        }

        match &transition.change {
            TransitionChange::Approve => {
                req.approval_status = ApprovalStatus::Approved;
                req.approved_by = Some(transition.actor_id.clone());
                req.approved_at = Some(transition.at);
            }
            TransitionChange::Reject { reason } => {
                req.approval_status = ApprovalStatus::Rejected;
                req.approved_by = Some(transition.actor_id.clone());
                req.approved_at = Some(transition.at);
                req.rejection_reason = reason.clone();
            }
            TransitionChange::Pay { payment_reference, proof_url, .. } => {
                req.payment_status = PaymentStatus::Paid;
                req.paid_by = Some(transition.actor_id.clone());
                req.paid_at = Some(transition.at);
                req.payment_reference = Some(payment_reference.clone());
                req.payment_proof_url = Some(proof_url.clone());
            }
            TransitionChange::Receive { receiver_name, receipt_url } => {
                req.receipt_status = ReceiptStatus::Received;
                req.received_by = Some(receiver_name.clone());
                req.received_at = Some(transition.at);
                req.receipt_url = Some(receipt_url.clone());
            }
        }
        req.version += 1;
        Ok(req.clone())
    }

    async fn float_balance(&self) -> Result<FloatBalance, AppError> {
        self.record("getFloatBalance".into());
        Ok(FloatBalance {
            balance: *self.float.lock().unwrap(),
        })
    }

    async fn add_float_funds(&self, top_up: &FloatTopUp) -> Result<FloatBalance, AppError> {
        self.record("addFloatFunds".into());
        let mut float = self.float.lock().unwrap();
        *float += top_up.amount;
        Ok(FloatBalance { balance: *float })
    }
}

// --- Upload ---

#[derive(Default)]
pub struct MemoryFileStore {
    uploads: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryFileStore {
    pub fn fail_uploads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(&self, record_id: &str, attachment: &Attachment) -> Result<String, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::UploadFailed("storage offline".into()));
        }
        let url = format!("https://files.test/{}/{}", record_id, attachment.file_name);
        self.uploads.lock().unwrap().push(url.clone());
        Ok(url)
    }
}
