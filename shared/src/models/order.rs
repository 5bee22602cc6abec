//! Purchase order models and status transitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::LineItem;

/// Days between placing an order and its expected delivery
pub const DELIVERY_LEAD_DAYS: i64 = 7;

/// A purchase order for restocking items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub ordered_items: Vec<LineItem>,
    pub last_updated: DateTime<Utc>,
}

/// Status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being drafted; lines can still change
    #[default]
    Saved,
    /// Placed with the supplier, awaiting delivery
    Ordered,
    /// Delivery received into stock
    Received,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Saved => "saved",
            OrderStatus::Ordered => "ordered",
            OrderStatus::Received => "received",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "saved" => Some(OrderStatus::Saved),
            "ordered" => Some(OrderStatus::Ordered),
            "received" => Some(OrderStatus::Received),
            _ => None,
        }
    }

    /// Forward transitions only, one step at a time
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Saved, OrderStatus::Ordered) | (OrderStatus::Ordered, OrderStatus::Received)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Saved => write!(f, "Saved"),
            OrderStatus::Ordered => write!(f, "Ordered"),
            OrderStatus::Received => write!(f, "Received"),
        }
    }
}

/// Rejected order status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move an order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Order {
    /// New order; placed immediately when `place` is set
    pub fn new(ordered_items: Vec<LineItem>, place: bool, now: DateTime<Utc>) -> Self {
        let mut order = Self {
            id: Uuid::new_v4(),
            order_date: None,
            delivery_date: None,
            status: OrderStatus::Saved,
            ordered_items,
            last_updated: now,
        };
        if place {
            order.stamp_placed(now);
        }
        order
    }

    /// Lines can only change while the order is still Saved
    pub fn is_editable(&self) -> bool {
        self.status == OrderStatus::Saved
    }

    /// Saved -> Ordered: stamps order date and the expected delivery date
    pub fn place(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.check_transition(OrderStatus::Ordered)?;
        self.stamp_placed(now);
        Ok(())
    }

    /// Ordered -> Received: delivery date becomes the receiving time
    pub fn receive(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.check_transition(OrderStatus::Received)?;
        self.status = OrderStatus::Received;
        self.delivery_date = Some(now);
        self.last_updated = now;
        Ok(())
    }

    /// Undo receiving after its receipt was deleted
    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Ordered;
        self.delivery_date = None;
        self.last_updated = now;
    }

    pub fn total_quantity(&self) -> i64 {
        self.ordered_items.iter().map(|l| i64::from(l.quantity)).sum()
    }

    fn check_transition(&self, next: OrderStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to: next,
            })
        }
    }

    fn stamp_placed(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Ordered;
        self.order_date = Some(now);
        self.delivery_date = Some(now + Duration::days(DELIVERY_LEAD_DAYS));
        self.last_updated = now;
    }
}

/// Which orders an order listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilter {
    /// Saved and Ordered
    #[default]
    Open,
    Saved,
    Ordered,
    Received,
    All,
}

impl OrderFilter {
    pub fn statuses(&self) -> &'static [OrderStatus] {
        match self {
            OrderFilter::Open => &[OrderStatus::Saved, OrderStatus::Ordered],
            OrderFilter::Saved => &[OrderStatus::Saved],
            OrderFilter::Ordered => &[OrderStatus::Ordered],
            OrderFilter::Received => &[OrderStatus::Received],
            OrderFilter::All => &[OrderStatus::Saved, OrderStatus::Ordered, OrderStatus::Received],
        }
    }
}
