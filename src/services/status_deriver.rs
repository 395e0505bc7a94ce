// src/services/status_deriver.rs

use crate::models::{
    fulfillment::{DispatchApprovalStatus, DispatchMarker, DispatchOrder, FulfillmentStatus},
    invoice::Invoice,
};

/// Calcula o status de atendimento de uma fatura a partir das suas ordens de despacho.
///
/// Função pura: chame a cada leitura, nunca guarde o resultado.
/// Ordens rejeitadas ficam na trilha de auditoria mas não contam como um lote vivo,
/// então uma fatura com o lote rejeitado volta a aguardar atendimento, e um lote
/// reenviado depois disso é avaliado sozinho.
pub fn derive_fulfillment_status(invoice: &Invoice, orders: &[DispatchOrder]) -> FulfillmentStatus {
    // Os estados terminais vêm do colaborador de despacho
    match invoice.dispatch_marker {
        Some(DispatchMarker::Completed) => return FulfillmentStatus::Completed,
        Some(DispatchMarker::Dispatched) => return FulfillmentStatus::Dispatched,
        None => {}
    }

    let live: Vec<&DispatchOrder> = orders
        .iter()
        .filter(|o| o.invoice_id == invoice.id)
        .filter(|o| o.dispatch_approval_status != DispatchApprovalStatus::Rejected)
        .collect();

    if live.is_empty() {
        return FulfillmentStatus::AwaitingFulfillment;
    }

    if live
        .iter()
        .any(|o| o.dispatch_approval_status == DispatchApprovalStatus::PendingApproval)
    {
        return FulfillmentStatus::PendingApproval;
    }

    if live
        .iter()
        .all(|o| o.dispatch_approval_status == DispatchApprovalStatus::Approved)
    {
        return FulfillmentStatus::ReadyForDispatch;
    }

    FulfillmentStatus::AwaitingFulfillment
}
