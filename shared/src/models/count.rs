//! Inventory count models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::LineItem;

/// Number of counts shown by the "recent" listing
pub const RECENT_LIMIT: usize = 5;

/// A snapshot of counted quantities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryCount {
    pub id: Uuid,
    pub date_initiated: DateTime<Utc>,
    pub date_submitted: Option<DateTime<Utc>>,
    pub counted_quantities: Vec<LineItem>,
    #[serde(rename = "type")]
    pub count_type: CountType,
}

/// What prompted a count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    Full,
    ByCategory,
    AdHoc,
    /// Taken automatically when an item is created
    Initial,
}

impl CountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountType::Full => "full",
            CountType::ByCategory => "by_category",
            CountType::AdHoc => "ad_hoc",
            CountType::Initial => "initial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "full" => Some(CountType::Full),
            "by_category" => Some(CountType::ByCategory),
            "ad_hoc" => Some(CountType::AdHoc),
            "initial" => Some(CountType::Initial),
            _ => None,
        }
    }
}

impl std::fmt::Display for CountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountType::Full => write!(f, "Full"),
            CountType::ByCategory => write!(f, "By Category"),
            CountType::AdHoc => write!(f, "Ad Hoc"),
            CountType::Initial => write!(f, "Initial"),
        }
    }
}

impl InventoryCount {
    /// A count that is recorded as already committed, e.g. on item create/edit
    pub fn submitted(count_type: CountType, lines: Vec<LineItem>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_initiated: now,
            date_submitted: Some(now),
            counted_quantities: lines,
            count_type,
        }
    }

    pub fn draft(count_type: CountType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_initiated: now,
            date_submitted: None,
            counted_quantities: Vec::new(),
            count_type,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.date_submitted.is_some()
    }
}

/// Which items a count sheet covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum CountFilter {
    Full,
    AdHoc,
    Category(String),
}

impl CountFilter {
    /// `Full` and `AdHoc` are keywords; anything else names a category
    pub fn parse(filter: &str) -> Option<Self> {
        match filter.trim() {
            "" => None,
            "Full" | "full" => Some(CountFilter::Full),
            "AdHoc" | "adhoc" | "ad_hoc" | "Ad Hoc" => Some(CountFilter::AdHoc),
            name => Some(CountFilter::Category(name.to_string())),
        }
    }

    pub fn count_type(&self) -> CountType {
        match self {
            CountFilter::Full => CountType::Full,
            CountFilter::AdHoc => CountType::AdHoc,
            CountFilter::Category(_) => CountType::ByCategory,
        }
    }

    pub fn category_name(&self) -> Option<&str> {
        match self {
            CountFilter::Category(name) => Some(name),
            _ => None,
        }
    }
}

/// Which counts a count listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountListFilter {
    All,
    #[default]
    Recent,
    Unsubmitted,
}
