//! Shared setup for service tests: one vendor, one product, two locations
//! on a fresh in-memory database.

use super::InventoryService;
use crate::{Database, DbConfig};
use mercato_core::{InventoryLocation, MovementReason, Product, SyncConfig, Vendor};

pub(crate) struct Fixture {
    pub service: InventoryService,
    pub vendor: Vendor,
    pub product: Product,
    pub location_a: InventoryLocation,
    pub location_b: InventoryLocation,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let vendor = db.vendors().insert(&Vendor::new("Acme Goods")).await.unwrap();
        let product = db
            .products()
            .insert(&Product::new(&vendor.id, "MUG-001", "Enamel Mug", 1200))
            .await
            .unwrap();
        let location_a = db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Warehouse"))
            .await
            .unwrap();
        let location_b = db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Storefront"))
            .await
            .unwrap();

        Fixture {
            service: InventoryService::new(db),
            vendor,
            product,
            location_a,
            location_b,
        }
    }

    /// Restocks the fixture product at `location_id`.
    pub async fn stock(&self, location_id: &str, quantity: i64) {
        self.service
            .update_location_inventory(
                &SyncConfig::disabled(&self.vendor.id),
                &self.product.id,
                location_id,
                quantity,
                MovementReason::Restock,
                None,
            )
            .await
            .unwrap();
    }
}
