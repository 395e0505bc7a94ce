pub mod auth;
pub mod fulfillment;
pub mod inventory;
pub mod invoice;
pub mod purchase_order;
pub mod requisition;
