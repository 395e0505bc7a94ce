pub mod auth;
pub mod dispatch_service;
pub mod fulfillment_service;
pub mod inventory_service;
pub mod invoice_service;
pub mod purchase_order_service;
pub mod requisition_service;
pub mod split_model;
pub mod status_deriver;
