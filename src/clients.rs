pub mod script_client;
pub use script_client::ScriptClient;
pub mod invoice_client;
pub use invoice_client::{InvoiceClient, InvoiceStore};
pub mod requisition_client;
pub use requisition_client::{RequisitionClient, RequisitionStore};
pub mod inventory_client;
pub use inventory_client::{InventoryClient, InventoryStore};
pub mod upload_client;
pub use upload_client::{Attachment, FileStore, UploadClient};
