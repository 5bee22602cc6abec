//! Landing page figures

use serde::Serialize;
use shared::OrderFilter;

use crate::error::AppResult;
use crate::store::{CountQuery, DynStore, ItemQuery};

#[derive(Clone)]
pub struct DashboardService {
    store: DynStore,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Dashboard {
    pub active_items: usize,
    pub open_orders: usize,
    pub unsubmitted_counts: usize,
    pub draft_receipts: usize,
}

impl DashboardService {
    /// Create a new DashboardService instance
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn summary(&self) -> AppResult<Dashboard> {
        let active_items = self.store.find_items(&ItemQuery::active()).await?.len();
        let open_orders = self
            .store
            .find_orders(OrderFilter::Open.statuses())
            .await?
            .len();
        let unsubmitted_counts = self
            .store
            .find_counts(&CountQuery {
                unsubmitted_only: true,
                limit: None,
            })
            .await?
            .len();
        let draft_receipts = self
            .store
            .find_receipts(None)
            .await?
            .iter()
            .filter(|r| !r.is_submitted())
            .count();

        Ok(Dashboard {
            active_items,
            open_orders,
            unsubmitted_counts,
            draft_receipts,
        })
    }
}
