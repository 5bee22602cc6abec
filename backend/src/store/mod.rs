//! Persistence for categories, items, orders, receipts and counts
//!
//! Services read through [`Store`] and write by committing a [`WriteBatch`].
//! A batch is applied all-or-nothing: PostgreSQL runs it in one transaction,
//! the in-memory store applies it to a copy of its tables and swaps on success.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{Category, InventoryCount, Item, Order, OrderStatus, Receipt};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to whichever store the server was started with
pub type DynStore = Arc<dyn Store>;

/// Item lookup criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Only items with this `active` flag
    pub active: Option<bool>,
    /// Only items in this category
    pub category: Option<Uuid>,
}

impl ItemQuery {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            category: None,
        }
    }

    pub fn archived() -> Self {
        Self {
            active: Some(false),
            category: None,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.active.map_or(true, |a| item.active == a)
            && self.category.map_or(true, |c| item.category == Some(c))
    }
}

/// Count lookup criteria. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountQuery {
    pub unsubmitted_only: bool,
    pub limit: Option<usize>,
}

/// One write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    PutCategory(Category),
    DeleteCategory(Uuid),
    /// Null out the category of every item in it
    UncategorizeItems(Uuid),
    PutItem(Item),
    /// Overwrite stock on hand and stamp `qty_last_updated`
    SetStock {
        item: Uuid,
        quantity: i32,
        at: DateTime<Utc>,
    },
    /// Add to stock on hand and stamp both item timestamps; zero still stamps
    IncrementStock {
        item: Uuid,
        quantity: i32,
        at: DateTime<Utc>,
    },
    SetItemActive {
        item: Uuid,
        active: bool,
        at: DateTime<Utc>,
    },
    PutOrder(Order),
    DeleteOrder(Uuid),
    PutReceipt(Receipt),
    DeleteReceipt(Uuid),
    PutCount(InventoryCount),
    DeleteCount(Uuid),
}

/// Writes committed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn with(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Persistence collaborator used by every service
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe for the health endpoint
    async fn ping(&self) -> AppResult<()>;

    // Categories
    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>>;
    /// All categories ordered by name
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>>;

    // Items
    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>>;
    /// Items with the given ids; unknown ids are skipped
    async fn get_items(&self, ids: &[Uuid]) -> AppResult<Vec<Item>>;
    /// Items matching the query ordered by name
    async fn find_items(&self, query: &ItemQuery) -> AppResult<Vec<Item>>;
    /// Any item, active or not, with this name or (unless `sku` is the
    /// not-for-sale sentinel) this sku
    async fn find_item_conflict(&self, name: &str, sku: &str) -> AppResult<Option<Item>>;

    // Orders
    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>>;
    /// Orders in any of `statuses`, most recently updated first
    async fn find_orders(&self, statuses: &[OrderStatus]) -> AppResult<Vec<Order>>;

    // Receipts
    async fn get_receipt(&self, id: Uuid) -> AppResult<Option<Receipt>>;
    async fn find_receipt_for_order(&self, order_id: Uuid) -> AppResult<Option<Receipt>>;
    /// Receipts newest first, optionally limited
    async fn find_receipts(&self, limit: Option<usize>) -> AppResult<Vec<Receipt>>;

    // Counts
    async fn get_count(&self, id: Uuid) -> AppResult<Option<InventoryCount>>;
    async fn find_counts(&self, query: &CountQuery) -> AppResult<Vec<InventoryCount>>;

    /// Apply every write in the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> AppResult<()>;
}
