//! Purchase orders: Saved → Ordered → Received

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::reconciliation::{self, ZeroLines};
use shared::{ItemQuantities, LineInput, Order, OrderFilter, OrderStatus, SubmitType};
use uuid::Uuid;

use super::{populate_lines, sort_by_name, AdminGuard, DeleteInput, PopulatedLine};
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, Write, WriteBatch};

/// Order service for the purchase order lifecycle
#[derive(Clone)]
pub struct OrderService {
    store: DynStore,
    admin: AdminGuard,
}

/// Input for creating or updating an order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub items: Vec<LineInput>,
    pub submit_type: SubmitType,
}

/// Order row in listings
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub total_quantity: i64,
}

/// Order with its lines joined to items
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<PopulatedLine>,
    pub total_quantity: i64,
    /// Receipt recorded against this order, if any
    pub receipt: Option<Uuid>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(store: DynStore, admin: AdminGuard) -> Self {
        Self { store, admin }
    }

    /// Create an order, placing it straight away on submit
    pub async fn create(&self, input: OrderInput) -> AppResult<Order> {
        let lines = self.parse_items(&input.items).await?;
        let order = Order::new(
            lines.into_lines(),
            input.submit_type.is_submit(),
            Utc::now(),
        );

        self.store
            .commit(WriteBatch::new().with(Write::PutOrder(order.clone())))
            .await?;

        tracing::info!(order_id = %order.id, status = %order.status, "Created order");
        Ok(order)
    }

    /// Replace the lines of a saved order, placing it on submit
    pub async fn update(&self, id: Uuid, input: OrderInput) -> AppResult<Order> {
        let mut order = self.get(id).await?;
        if !order.is_editable() {
            return Err(AppError::InvalidState(
                "cannot update an order once it has been placed".to_string(),
            ));
        }

        let lines = self.parse_items(&input.items).await?;
        let now = Utc::now();
        order.ordered_items = lines.into_lines();
        order.last_updated = now;
        if input.submit_type.is_submit() {
            order
                .place(now)
                .map_err(|e| AppError::InvalidState(e.to_string()))?;
        }

        self.store
            .commit(WriteBatch::new().with(Write::PutOrder(order.clone())))
            .await?;

        tracing::info!(order_id = %order.id, status = %order.status, "Updated order");
        Ok(order)
    }

    /// Place a saved order without changing its lines
    pub async fn place(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.get(id).await?;
        order
            .place(Utc::now())
            .map_err(|e| AppError::InvalidState(e.to_string()))?;

        self.store
            .commit(WriteBatch::new().with(Write::PutOrder(order.clone())))
            .await?;

        tracing::info!(order_id = %order.id, "Placed order");
        Ok(order)
    }

    /// Per-item quantity across every placed, not yet received order
    pub async fn quantity_on_order(&self) -> AppResult<ItemQuantities> {
        let orders = self.store.find_orders(&[OrderStatus::Ordered]).await?;
        Ok(reconciliation::quantity_on_order(&orders))
    }

    /// Delete an order in any state together with its receipt
    pub async fn delete(&self, id: Uuid, input: &DeleteInput) -> AppResult<()> {
        self.admin.check(input.password.as_deref())?;

        let order = self.get(id).await?;
        let mut batch = WriteBatch::new();
        if let Some(receipt) = self.store.find_receipt_for_order(order.id).await? {
            batch.push(Write::DeleteReceipt(receipt.id));
        }
        batch.push(Write::DeleteOrder(order.id));
        self.store.commit(batch).await?;

        tracing::info!(order_id = %id, "Deleted order");
        Ok(())
    }

    /// List orders, most recently updated first
    pub async fn list(&self, filter: OrderFilter) -> AppResult<Vec<OrderSummary>> {
        let orders = self.store.find_orders(filter.statuses()).await?;
        Ok(orders
            .into_iter()
            .map(|order| OrderSummary {
                total_quantity: order.total_quantity(),
                order,
            })
            .collect())
    }

    /// Get an order with its lines sorted by item name
    pub async fn detail(&self, id: Uuid) -> AppResult<OrderDetail> {
        let order = self.get(id).await?;
        let mut lines = populate_lines(&self.store, &order.ordered_items).await?;
        sort_by_name(&mut lines);
        let receipt = self
            .store
            .find_receipt_for_order(order.id)
            .await?
            .map(|r| r.id);

        Ok(OrderDetail {
            total_quantity: order.total_quantity(),
            order,
            lines,
            receipt,
        })
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    async fn parse_items(&self, items: &[LineInput]) -> AppResult<ItemQuantities> {
        let (lines, mut errors) = reconciliation::parse_lines(items, "items", ZeroLines::Drop);
        let known: Vec<Uuid> = self
            .store
            .get_items(&lines.item_ids())
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        errors.extend(reconciliation::unknown_items(items, &lines, &known, "items"));

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(lines)
    }
}
