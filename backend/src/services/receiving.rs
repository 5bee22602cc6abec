//! Receiving: turning deliveries into stock and closing their orders

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::reconciliation::{self, ZeroLines};
use shared::{
    FieldError, ItemQuantities, LineInput, Order, OrderStatus, Receipt, ReceiptFilter,
    SubmitType, MAX_STOCK_QUANTITY,
};
use uuid::Uuid;

use super::{populate_lines, sort_by_name, AdminGuard, DeleteInput, PopulatedLine};
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, Write, WriteBatch};

/// Number of receipts in the "recent" overview
const RECENT_RECEIPTS: usize = 5;

/// Receiving service for recording deliveries
#[derive(Clone)]
pub struct ReceivingService {
    store: DynStore,
    admin: AdminGuard,
}

/// Input for creating or updating a receipt
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptInput {
    #[serde(default)]
    pub items: Vec<LineInput>,
    pub submit_type: SubmitType,
}

/// Result of starting a receipt
#[derive(Debug, Clone)]
pub enum ReceiptOutcome {
    Saved(Receipt),
    /// The order already has a receipt; edit that one instead
    Existing(Uuid),
}

/// Receipt row in the overview
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptSummary {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub total_quantity: i64,
}

/// Orders waiting for delivery plus recorded receipts
#[derive(Debug, Clone, Serialize)]
pub struct ReceivingOverview {
    pub awaiting: Vec<Order>,
    pub receipts: Vec<ReceiptSummary>,
}

/// Receipt with its lines joined to items
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub lines: Vec<PopulatedLine>,
    pub total_quantity: i64,
    pub order: Option<Order>,
}

impl ReceivingService {
    /// Create a new ReceivingService instance
    pub fn new(store: DynStore, admin: AdminGuard) -> Self {
        Self { store, admin }
    }

    /// Record a delivery, optionally against a placed order
    pub async fn create(
        &self,
        order_id: Option<Uuid>,
        input: ReceiptInput,
    ) -> AppResult<ReceiptOutcome> {
        let order = match order_id {
            Some(id) => {
                let order = self
                    .store
                    .get_order(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
                if let Some(existing) = self.store.find_receipt_for_order(id).await? {
                    return Ok(ReceiptOutcome::Existing(existing.id));
                }
                if order.status != OrderStatus::Ordered {
                    return Err(AppError::InvalidState(
                        "only placed orders can be received".to_string(),
                    ));
                }
                Some(order)
            }
            None => None,
        };

        let receipt = Receipt::new(order_id, Utc::now());
        self.save(receipt, order, input)
            .await
            .map(ReceiptOutcome::Saved)
    }

    /// Edit a draft receipt; submitted receipts are final
    pub async fn update(&self, id: Uuid, input: ReceiptInput) -> AppResult<Receipt> {
        let receipt = self.get(id).await?;
        if receipt.is_submitted() {
            return Err(AppError::InvalidState(
                "receipt has already been submitted".to_string(),
            ));
        }

        let order = match receipt.order_received {
            Some(order_id) => self.store.get_order(order_id).await?,
            None => None,
        };
        self.save(receipt, order, input).await
    }

    /// Delete a receipt and reopen its order. Stock already received stays.
    pub async fn delete(&self, id: Uuid, input: &DeleteInput) -> AppResult<()> {
        self.admin.check(input.password.as_deref())?;

        let receipt = self.get(id).await?;
        let mut batch = WriteBatch::new().with(Write::DeleteReceipt(receipt.id));
        if let Some(order_id) = receipt.order_received {
            if let Some(mut order) = self.store.get_order(order_id).await? {
                order.reopen(Utc::now());
                batch.push(Write::PutOrder(order));
            }
        }
        self.store.commit(batch).await?;

        tracing::info!(receipt_id = %id, order_id = ?receipt.order_received, "Deleted receipt");
        Ok(())
    }

    /// Orders awaiting delivery and the receipts recorded so far
    pub async fn overview(&self, filter: ReceiptFilter) -> AppResult<ReceivingOverview> {
        let mut awaiting = self.store.find_orders(&[OrderStatus::Ordered]).await?;
        awaiting.sort_by(|a, b| b.delivery_date.cmp(&a.delivery_date));

        let limit = match filter {
            ReceiptFilter::All => None,
            ReceiptFilter::Recent => Some(RECENT_RECEIPTS),
        };
        let receipts = self
            .store
            .find_receipts(limit)
            .await?
            .into_iter()
            .map(|receipt| ReceiptSummary {
                total_quantity: receipt.total_quantity(),
                receipt,
            })
            .collect();

        Ok(ReceivingOverview { awaiting, receipts })
    }

    /// Get a receipt with its lines sorted by item name
    pub async fn detail(&self, id: Uuid) -> AppResult<ReceiptDetail> {
        let receipt = self.get(id).await?;
        let mut lines = populate_lines(&self.store, &receipt.received_items).await?;
        sort_by_name(&mut lines);
        let order = match receipt.order_received {
            Some(order_id) => self.store.get_order(order_id).await?,
            None => None,
        };

        Ok(ReceiptDetail {
            total_quantity: receipt.total_quantity(),
            receipt,
            lines,
            order,
        })
    }

    async fn get(&self, id: Uuid) -> AppResult<Receipt> {
        self.store
            .get_receipt(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Receipt".to_string()))
    }

    async fn save(
        &self,
        mut receipt: Receipt,
        order: Option<Order>,
        input: ReceiptInput,
    ) -> AppResult<Receipt> {
        let mut received = self.parse_items(&input.items).await?;
        if let Some(order) = &order {
            reconciliation::zero_fill(&mut received, &order.ordered_items);
        }
        receipt.received_items = received.clone().into_lines();

        let mut batch = WriteBatch::new();
        if input.submit_type.is_submit() {
            let now = Utc::now();
            self.check_capacity(&received, &input.items).await?;

            receipt.date_submitted = Some(now);
            for line in received.iter() {
                batch.push(Write::IncrementStock {
                    item: line.item,
                    quantity: line.quantity,
                    at: now,
                });
            }
            if let Some(mut order) = order {
                order
                    .receive(now)
                    .map_err(|e| AppError::InvalidState(e.to_string()))?;
                batch.push(Write::PutOrder(order));
            }
        }
        batch.push(Write::PutReceipt(receipt.clone()));
        self.store.commit(batch).await?;

        if receipt.is_submitted() {
            tracing::info!(
                receipt_id = %receipt.id,
                order_id = ?receipt.order_received,
                total = receipt.total_quantity(),
                "Received delivery into stock"
            );
        } else {
            tracing::debug!(receipt_id = %receipt.id, "Saved draft receipt");
        }
        Ok(receipt)
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

    /// Stock on hand may not pass the item maximum once the delivery lands
    async fn check_capacity(&self, received: &ItemQuantities, rows: &[LineInput]) -> AppResult<()> {
        let items = self.store.get_items(&received.item_ids()).await?;
        let errors: Vec<FieldError> = items
            .iter()
            .filter(|item| {
                let incoming = received.get(item.id).unwrap_or(0);
                i64::from(item.quantity_in_stock) + i64::from(incoming)
                    > i64::from(MAX_STOCK_QUANTITY)
            })
            .map(|item| {
                let field = match reconciliation::row_for_item(rows, item.id) {
                    Some(index) => format!("items[{}].quantity", index),
                    None => "items".to_string(),
                };
                FieldError::new(
                    field,
                    format!("Stock of {} would exceed {}", item.name, MAX_STOCK_QUANTITY),
                )
            })
            .collect();

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(())
    }
}
