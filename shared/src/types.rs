//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest quantity accepted on any order, receipt or count line (exclusive bound)
pub const LINE_QUANTITY_LIMIT: i64 = 10_000_000;

/// One (item, quantity) pair as stored on orders, receipts and counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub item: Uuid,
    pub quantity: i32,
}

impl LineItem {
    pub fn new(item: Uuid, quantity: i32) -> Self {
        Self { item, quantity }
    }
}

/// Typed mapping from item id to quantity.
///
/// Keeps first-insertion order for stable output. Assigning an item that is
/// already present overwrites its quantity (last assignment wins); `add`
/// accumulates instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemQuantities {
    lines: Vec<LineItem>,
}

impl ItemQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity for an item, replacing any previous value
    pub fn set(&mut self, item: Uuid, quantity: i32) {
        match self.lines.iter_mut().find(|l| l.item == item) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(LineItem::new(item, quantity)),
        }
    }

    /// Add to the quantity for an item, inserting it at zero first if absent
    pub fn add(&mut self, item: Uuid, quantity: i32) {
        match self.lines.iter_mut().find(|l| l.item == item) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(LineItem::new(item, quantity)),
        }
    }

    pub fn get(&self, item: Uuid) -> Option<i32> {
        self.lines.iter().find(|l| l.item == item).map(|l| l.quantity)
    }

    pub fn contains(&self, item: Uuid) -> bool {
        self.get(item).is_some()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_ids(&self) -> Vec<Uuid> {
        self.lines.iter().map(|l| l.item).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter()
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }
}

impl FromIterator<LineItem> for ItemQuantities {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        let mut map = Self::new();
        for line in iter {
            map.set(line.item, line.quantity);
        }
        map
    }
}

impl From<Vec<LineItem>> for ItemQuantities {
    fn from(lines: Vec<LineItem>) -> Self {
        lines.into_iter().collect()
    }
}

/// Field-level error reported back to the form that produced the input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Quantity exactly as entered on a form: a number, a string, or nothing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum RawQuantity {
    #[default]
    Blank,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl RawQuantity {
    /// Whether the field was left empty (blank lines are discarded, not rejected)
    pub fn is_blank(&self) -> bool {
        match self {
            RawQuantity::Blank => true,
            RawQuantity::Number(n) => n.is_nan(),
            RawQuantity::Text(s) => s.trim().is_empty(),
            RawQuantity::Integer(_) => false,
        }
    }

    /// Parse into an integer, or `None` when blank
    pub fn parse(&self) -> Result<Option<i64>, &'static str> {
        match self {
            _ if self.is_blank() => Ok(None),
            RawQuantity::Integer(n) => Ok(Some(*n)),
            RawQuantity::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Ok(Some(*n as i64))
                } else {
                    Err("Quantity must be an integer")
                }
            }
            RawQuantity::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| "Quantity must be an integer"),
            RawQuantity::Blank => Ok(None),
        }
    }
}

impl From<i64> for RawQuantity {
    fn from(n: i64) -> Self {
        RawQuantity::Integer(n)
    }
}

impl From<i32> for RawQuantity {
    fn from(n: i32) -> Self {
        RawQuantity::Integer(i64::from(n))
    }
}

impl From<&str> for RawQuantity {
    fn from(s: &str) -> Self {
        RawQuantity::Text(s.to_string())
    }
}

/// One submitted form line: an item id and whatever was typed as its quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineInput {
    pub item: String,
    #[serde(default)]
    pub quantity: RawQuantity,
}

impl LineInput {
    pub fn new(item: Uuid, quantity: impl Into<RawQuantity>) -> Self {
        Self {
            item: item.to_string(),
            quantity: quantity.into(),
        }
    }

    pub fn blank(item: Uuid) -> Self {
        Self {
            item: item.to_string(),
            quantity: RawQuantity::Blank,
        }
    }
}

/// How a form is being submitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmitType {
    /// Keep as an editable draft
    Save,
    /// Commit quantities and lock the record
    Submit,
}

impl SubmitType {
    pub fn is_submit(&self) -> bool {
        matches!(self, SubmitType::Submit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_is_last_assignment_wins() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut map = ItemQuantities::new();
        map.set(a, 3);
        map.set(b, 4);
        map.set(a, 9);

        assert_eq!(map.get(a), Some(9));
        assert_eq!(map.len(), 2);
        assert_eq!(map.item_ids(), vec![a, b]);
    }

    #[test]
    fn test_add_accumulates() {
        let a = Uuid::new_v4();
        let mut map = ItemQuantities::new();
        map.add(a, 3);
        map.add(a, 4);
        assert_eq!(map.get(a), Some(7));
        assert_eq!(map.total(), 7);
    }

    #[test]
    fn test_raw_quantity_parse() {
        assert_eq!(RawQuantity::Blank.parse(), Ok(None));
        assert_eq!(RawQuantity::Text("  ".into()).parse(), Ok(None));
        assert_eq!(RawQuantity::Number(f64::NAN).parse(), Ok(None));
        assert_eq!(RawQuantity::Integer(12).parse(), Ok(Some(12)));
        assert_eq!(RawQuantity::Number(5.0).parse(), Ok(Some(5)));
        assert_eq!(RawQuantity::Text(" 42 ".into()).parse(), Ok(Some(42)));
        assert!(RawQuantity::Number(2.5).parse().is_err());
        assert!(RawQuantity::Text("ten".into()).parse().is_err());
    }

    #[test]
    fn test_raw_quantity_deserializes_any_form_value() {
        let lines: Vec<LineInput> = serde_json::from_str(
            r#"[{"item":"a","quantity":3},{"item":"b","quantity":"4"},{"item":"c","quantity":null},{"item":"d"}]"#,
        )
        .unwrap();

        assert_eq!(lines[0].quantity, RawQuantity::Integer(3));
        assert_eq!(lines[1].quantity, RawQuantity::Text("4".into()));
        assert!(lines[2].quantity.is_blank());
        assert!(lines[3].quantity.is_blank());
    }
}
