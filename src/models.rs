use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filters::{FilterState, SortState};
use crate::normalizer;

/// Canonical normalized settlement record.
///
/// Rows are immutable after normalization; a mutation either removes the
/// row from a collection or is superseded by a fresh row on refetch. The
/// raw payload is retained verbatim so detail views can recover fields the
/// normalizer dropped.
///
/// Serialized field names match the normalizer's first-priority input keys,
/// which keeps normalization idempotent on its own output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    #[serde(rename = "order_id")]
    pub identifier: String,
    pub amount: f64,
    pub settlement_amount: f64,
    #[serde(rename = "order_date")]
    pub invoice_date: String,
    pub settlement_date: String,
    #[serde(rename = "diff")]
    pub difference: f64,
    pub remark: String,
    pub event_type: String,
    #[serde(skip)]
    pub original_payload: Value,
}

impl TransactionRow {
    /// Textual value of a column: canonical fields first, then a lookup
    /// into the raw payload (status, reason, platform and anything else
    /// the canonical row does not carry).
    pub fn text_value(&self, column: &str) -> Option<String> {
        match column {
            "order_id" => Some(self.identifier.clone()),
            "amount" => Some(self.amount.to_string()),
            "settlement_amount" => Some(self.settlement_amount.to_string()),
            "order_date" => Some(self.invoice_date.clone()),
            "settlement_date" => Some(self.settlement_date.clone()),
            "diff" => Some(self.difference.to_string()),
            "remark" => Some(self.remark.clone()),
            "event_type" => Some(self.event_type.clone()),
            _ => normalizer::payload_text(&self.original_payload, column),
        }
    }

    /// Numeric value of a column, or `None` when it cannot be coerced.
    /// Coercion here is strict on purpose: a row whose value is not a
    /// number must fail any bounded numeric predicate.
    pub fn number_value(&self, column: &str) -> Option<f64> {
        match column {
            "amount" => Some(self.amount),
            "settlement_amount" => Some(self.settlement_amount),
            "diff" => Some(self.difference),
            _ => match self.original_payload.get(column) {
                Some(Value::Number(n)) => n.as_f64(),
                _ => self.text_value(column)?.trim().parse::<f64>().ok(),
            },
        }
    }

    /// Date value of a column, or `None` for sentinels and invalid input.
    pub fn date_value(&self, column: &str) -> Option<NaiveDate> {
        let raw = self.text_value(column)?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The fixed, non-user-editable parameter distinguishing one tab's remote
/// query from another's. Merged into compiled parameters last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discriminant {
    pub param: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub id: String,
    pub discriminant: Discriminant,
}

impl CollectionSpec {
    pub fn new(id: &str, param: &str, value: &str) -> Self {
        CollectionSpec {
            id: id.to_string(),
            discriminant: Discriminant {
                param: param.to_string(),
                value: value.to_string(),
            },
        }
    }
}

/// One independently paginated, independently erroring category of rows.
/// All collections share the orchestrator's filter/sort/date state.
#[derive(Debug, Clone)]
pub struct Collection {
    pub spec: CollectionSpec,
    pub rows: Vec<TransactionRow>,
    pub total_count: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub page: u32,
    pub last_applied_filters: FilterState,
    pub last_applied_sort: SortState,
    pub error: Option<String>,
}

impl Collection {
    pub fn new(spec: CollectionSpec) -> Self {
        Collection {
            spec,
            rows: Vec::new(),
            total_count: 0,
            status_counts: BTreeMap::new(),
            page: 1,
            last_applied_filters: FilterState::new(),
            last_applied_sort: SortState::Unsorted,
            error: None,
        }
    }
}
