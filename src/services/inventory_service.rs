// src/services/inventory_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    clients::InventoryStore,
    common::error::AppError,
    models::{
        auth::Actor,
        inventory::{LocationProduct, StockAdjustment},
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }

    pub async fn products_for_location(&self, location: &str) -> Result<Vec<LocationProduct>, AppError> {
        if location.trim().is_empty() {
            return Err(AppError::InvalidEdit("informe o local de estoque".into()));
        }
        self.inventory.products_for_location(location.trim()).await
    }

    /// Define a quantidade absoluta de um produto em um local.
    pub async fn update_stock_quantity(
        &self,
        product_id: &str,
        location: &str,
        quantity: i64,
        actor: &Actor,
    ) -> Result<LocationProduct, AppError> {
        if quantity < 0 {
            return Err(AppError::InvalidEdit("a quantidade em estoque não pode ser negativa".into()));
        }

        let adjustment = StockAdjustment {
            product_id: product_id.to_string(),
            location: location.to_string(),
            quantity,
            updated_by: actor.id.clone(),
            updated_at: Utc::now(),
        };

        let product = self.inventory.update_stock_quantity(&adjustment).await?;
        tracing::info!(product_id, location, quantity, updated_by = %actor.id, "Estoque ajustado");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::auth::Role,
        testing::{MemoryInventoryStore, actor},
    };

    fn stocked(product_id: &str, location: &str, quantity: i64) -> LocationProduct {
        LocationProduct {
            product_id: product_id.into(),
            product_name: format!("Product {}", product_id),
            location: location.into(),
            quantity,
            serial_numbers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_products_filtered_by_location() {
        let inventory = Arc::new(MemoryInventoryStore::with_products(vec![
            stocked("P-1", "MAIN_HQ", 5),
            stocked("P-2", "NYAMIRA", 2),
        ]));
        let svc = InventoryService::new(inventory);

        let products = svc.products_for_location("NYAMIRA").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "P-2");
    }

    #[tokio::test]
    async fn test_negative_quantity_refused_without_call() {
        let inventory = Arc::new(MemoryInventoryStore::with_products(vec![stocked("P-1", "MAIN_HQ", 5)]));
        let svc = InventoryService::new(inventory.clone());

        let result = svc
            .update_stock_quantity("P-1", "MAIN_HQ", -1, &actor(Role::Storekeeper))
            .await;
        assert!(matches!(result, Err(AppError::InvalidEdit(_))));
        assert!(inventory.calls().is_empty());

        let updated = svc
            .update_stock_quantity("P-1", "MAIN_HQ", 12, &actor(Role::Storekeeper))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 12);
    }
}
