//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use cafe_inventory_backend::services::item::ItemInput;
use cafe_inventory_backend::services::{
    AdminGuard, CategoryService, CountService, ItemService, OrderService, ReceivingService,
};
use cafe_inventory_backend::store::{DynStore, MemoryStore};
use shared::{Item, LineInput};
use uuid::Uuid;

pub const ADMIN_PASSWORD: &str = "espresso";

/// Services wired to one in-memory store
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub items: ItemService,
    pub orders: OrderService,
    pub receiving: ReceivingService,
    pub counts: CountService,
    pub categories: CategoryService,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: DynStore = store.clone();
    let admin = AdminGuard::new(ADMIN_PASSWORD).unwrap();

    Harness {
        items: ItemService::new(dyn_store.clone(), admin.clone()),
        orders: OrderService::new(dyn_store.clone(), admin.clone()),
        receiving: ReceivingService::new(dyn_store.clone(), admin.clone()),
        counts: CountService::new(dyn_store.clone(), admin.clone()),
        categories: CategoryService::new(dyn_store, admin),
        store,
    }
}

pub fn item_input(name: &str, quantity: i64) -> ItemInput {
    ItemInput {
        name: name.to_string(),
        quantity_in_stock: Some(quantity),
        ..ItemInput::default()
    }
}

pub async fn create_item(h: &Harness, name: &str, quantity: i64) -> Item {
    h.items.create(item_input(name, quantity)).await.unwrap()
}

pub fn lines(entries: &[(Uuid, i64)]) -> Vec<LineInput> {
    entries
        .iter()
        .map(|(item, quantity)| LineInput::new(*item, *quantity))
        .collect()
}

/// Wait long enough for `Utc::now()` to move on
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}
