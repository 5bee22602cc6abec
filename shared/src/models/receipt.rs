//! Receiving models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::LineItem;

/// A delivery received into stock, optionally fulfilling an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub id: Uuid,
    pub date_initiated: DateTime<Utc>,
    pub date_submitted: Option<DateTime<Utc>>,
    pub received_items: Vec<LineItem>,
    pub order_received: Option<Uuid>,
}

impl Receipt {
    pub fn new(order_received: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_initiated: now,
            date_submitted: None,
            received_items: Vec::new(),
            order_received,
        }
    }

    /// Submitted receipts are final
    pub fn is_submitted(&self) -> bool {
        self.date_submitted.is_some()
    }

    pub fn total_quantity(&self) -> i64 {
        self.received_items.iter().map(|l| i64::from(l.quantity)).sum()
    }
}

/// Which receipts the receiving overview shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptFilter {
    All,
    /// The five most recent
    #[default]
    Recent,
}
