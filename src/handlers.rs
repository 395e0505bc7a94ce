pub mod dispatch;
pub mod fulfillment;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod purchase_orders;
pub mod requisitions;
