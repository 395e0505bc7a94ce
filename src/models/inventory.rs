// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProduct {
    pub product_id: String,
    pub product_name: String,
    pub location: String,
    pub quantity: i64,
    #[serde(default)]
    pub serial_numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: String,
    pub location: String,
    pub quantity: i64,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}
