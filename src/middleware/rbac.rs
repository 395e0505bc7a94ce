// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Actor, Role},
};

/// 1. O Trait que define quais papéis podem passar pelo portão
pub trait RoleGate: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

pub fn check_role<T: RoleGate>(actor: &Actor) -> Result<(), AppError> {
    if T::allowed().contains(&actor.role) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!("{:?}", T::allowed())))
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleGate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (inserido pelo auth_guard)
        let actor = parts.extensions.get::<Actor>().ok_or(AppError::InvalidToken)?;

        // B. Confere o papel
        check_role::<T>(actor)?;

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PORTÕES (TIPOS)
// ---

pub struct FulfillmentWrite;
impl RoleGate for FulfillmentWrite {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Storekeeper] }
}

pub struct DispatchApprove;
impl RoleGate for DispatchApprove {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Manager] }
}

pub struct PaymentLog;
impl RoleGate for PaymentLog {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Sales, Role::Finance] }
}

pub struct PaymentConfirm;
impl RoleGate for PaymentConfirm {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Finance] }
}

pub struct QuoteWrite;
impl RoleGate for QuoteWrite {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Manager, Role::Sales] }
}

pub struct SupplierPay;
impl RoleGate for SupplierPay {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Finance] }
}

pub struct RequisitionApprove;
impl RoleGate for RequisitionApprove {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Manager] }
}

pub struct RequisitionPay;
impl RoleGate for RequisitionPay {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Finance] }
}

pub struct FloatWrite;
impl RoleGate for FloatWrite {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Finance] }
}

pub struct InventoryWrite;
impl RoleGate for InventoryWrite {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Storekeeper] }
}
