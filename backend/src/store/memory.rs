//! In-process store used by tests and database-less local runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::{
    Category, InventoryCount, Item, Order, OrderStatus, Receipt, MAX_STOCK_QUANTITY,
};
use uuid::Uuid;

use super::{CountQuery, ItemQuery, Store, Write, WriteBatch};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, Item>,
    orders: HashMap<Uuid, Order>,
    receipts: HashMap<Uuid, Receipt>,
    counts: HashMap<Uuid, InventoryCount>,
}

/// Store keeping every record in memory behind one lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail as if the backing store were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::StorageError("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::StorageError("memory store lock poisoned".to_string()))
    }
}

impl Tables {
    fn item_mut(&mut self, id: Uuid) -> AppResult<&mut Item> {
        self.items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    fn apply(&mut self, write: Write) -> AppResult<()> {
        match write {
            Write::PutCategory(category) => {
                self.categories.insert(category.id, category);
            }
            Write::DeleteCategory(id) => {
                self.categories.remove(&id);
                for item in self.items.values_mut().filter(|i| i.category == Some(id)) {
                    item.category = None;
                }
            }
            Write::UncategorizeItems(id) => {
                for item in self.items.values_mut().filter(|i| i.category == Some(id)) {
                    item.category = None;
                }
            }
            Write::PutItem(item) => {
                self.items.insert(item.id, item);
            }
            Write::SetStock { item, quantity, at } => {
                let item = self.item_mut(item)?;
                item.quantity_in_stock = quantity;
                item.qty_last_updated = at;
            }
            Write::IncrementStock { item, quantity, at } => {
                let item = self.item_mut(item)?;
                let total = item.quantity_in_stock.saturating_add(quantity);
                if total > MAX_STOCK_QUANTITY {
                    return Err(AppError::StorageError(format!(
                        "stock for item {} would exceed {}",
                        item.id, MAX_STOCK_QUANTITY
                    )));
                }
                item.quantity_in_stock = total;
                item.qty_last_updated = at;
                item.item_last_updated = at;
            }
            Write::SetItemActive { item, active, at } => {
                let item = self.item_mut(item)?;
                item.active = active;
                item.item_last_updated = at;
            }
            Write::PutOrder(order) => {
                self.orders.insert(order.id, order);
            }
            Write::DeleteOrder(id) => {
                self.orders.remove(&id);
                self.receipts.retain(|_, r| r.order_received != Some(id));
            }
            Write::PutReceipt(receipt) => {
                if let Some(order_id) = receipt.order_received {
                    let taken = self
                        .receipts
                        .values()
                        .any(|r| r.order_received == Some(order_id) && r.id != receipt.id);
                    if taken {
                        return Err(AppError::StorageError(format!(
                            "order {} already has a receipt",
                            order_id
                        )));
                    }
                }
                self.receipts.insert(receipt.id, receipt);
            }
            Write::DeleteReceipt(id) => {
                self.receipts.remove(&id);
            }
            Write::PutCount(count) => {
                self.counts.insert(count.id, count);
            }
            Write::DeleteCount(id) => {
                self.counts.remove(&id);
            }
        }
        Ok(())
    }
}

fn by_name<T>(name: impl Fn(&T) -> &str) -> impl Fn(&T, &T) -> std::cmp::Ordering {
    move |a, b| name(a).to_lowercase().cmp(&name(b).to_lowercase())
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.read().map(|_| ())
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.read()?.categories.values().cloned().collect();
        categories.sort_by(by_name(|c: &Category| c.name.as_str()));
        Ok(categories)
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn get_items(&self, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        let tables = self.read()?;
        Ok(ids.iter().filter_map(|id| tables.items.get(id).cloned()).collect())
    }

    async fn find_items(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .read()?
            .items
            .values()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();
        items.sort_by(by_name(|i: &Item| i.name.as_str()));
        Ok(items)
    }

    async fn find_item_conflict(&self, name: &str, sku: &str) -> AppResult<Option<Item>> {
        Ok(self
            .read()?
            .items
            .values()
            .find(|i| i.conflicts_with(name, sku))
            .cloned())
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn find_orders(&self, statuses: &[OrderStatus]) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(orders)
    }

    async fn get_receipt(&self, id: Uuid) -> AppResult<Option<Receipt>> {
        Ok(self.read()?.receipts.get(&id).cloned())
    }

    async fn find_receipt_for_order(&self, order_id: Uuid) -> AppResult<Option<Receipt>> {
        Ok(self
            .read()?
            .receipts
            .values()
            .find(|r| r.order_received == Some(order_id))
            .cloned())
    }

    async fn find_receipts(&self, limit: Option<usize>) -> AppResult<Vec<Receipt>> {
        let mut receipts: Vec<Receipt> = self.read()?.receipts.values().cloned().collect();
        receipts.sort_by(|a, b| b.date_initiated.cmp(&a.date_initiated));
        if let Some(limit) = limit {
            receipts.truncate(limit);
        }
        Ok(receipts)
    }

    async fn get_count(&self, id: Uuid) -> AppResult<Option<InventoryCount>> {
        Ok(self.read()?.counts.get(&id).cloned())
    }

    async fn find_counts(&self, query: &CountQuery) -> AppResult<Vec<InventoryCount>> {
        let mut counts: Vec<InventoryCount> = self
            .read()?
            .counts
            .values()
            .filter(|c| !query.unsubmitted_only || !c.is_submitted())
            .cloned()
            .collect();
        counts.sort_by(|a, b| b.date_initiated.cmp(&a.date_initiated));
        if let Some(limit) = query.limit {
            counts.truncate(limit);
        }
        Ok(counts)
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StorageError("memory store unavailable".to_string()));
        }

        let mut tables = self.write()?;
        let mut next = tables.clone();
        for write in batch.into_writes() {
            next.apply(write)?;
        }
        *tables = next;
        Ok(())
    }
}
