//! Maps one raw remote record into the canonical row shape.
//!
//! Remote payloads are ragged: the same concept arrives under different
//! keys depending on which remote mode produced the record, and some fields
//! live inside a nested calculation-context wrapper. Every alias list below
//! is tried in a fixed priority order, top-level keys before wrapped ones.
//! Normalization never fails; bad input degrades to a zero amount or a date
//! sentinel.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::TransactionRow;

pub const INVALID_DATE: &str = "Invalid Date";
pub const PENDING: &str = "Pending";

const ID_KEYS: &[&str] = &["order_id", "orderId", "id", "txn_id"];
const AMOUNT_KEYS: &[&str] = &["amount", "order_amount", "txn_amount", "gross_amount"];
const SETTLEMENT_AMOUNT_KEYS: &[&str] = &["settlement_amount", "settled_amount", "net_amount"];
const ORDER_DATE_KEYS: &[&str] = &["order_date", "invoice_date", "created_at"];
const SETTLEMENT_DATE_KEYS: &[&str] = &["settlement_date", "settled_on", "settled_at"];
const DIFF_KEYS: &[&str] = &["diff", "difference", "delta"];
const REMARK_KEYS: &[&str] = &["remark", "remarks", "note"];
const EVENT_TYPE_KEYS: &[&str] = &["event_type", "eventType", "type"];

/// Wrappers whose fields are flattened into canonical names.
const CONTEXT_KEYS: &[&str] = &["calculation_inputs", "context", "details"];

// ---------------------------------------------------------------------------
// Field extraction helpers
// ---------------------------------------------------------------------------

fn lookup<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(v) = raw.get(key) {
            if !v.is_null() {
                return Some(v);
            }
        }
    }
    for wrapper in CONTEXT_KEYS {
        if let Some(inner) = raw.get(wrapper) {
            for key in keys {
                if let Some(v) = inner.get(key) {
                    if !v.is_null() {
                        return Some(v);
                    }
                }
            }
        }
    }
    None
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Single-key payload lookup used by row value accessors. Tries the key at
/// top level, then inside the context wrappers.
pub(crate) fn payload_text(raw: &Value, key: &str) -> Option<String> {
    lookup(raw, &[key]).and_then(value_to_text)
}

/// Lenient monetary parse: strips currency symbols, thousands separators,
/// quotes and whitespace; `(...)` means negative; anything unparseable is
/// `0.0`, never NaN.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')'))
        .collect();
    let s = cleaned.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

fn value_to_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(d.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive())
}

fn date_or_sentinel(value: Option<&Value>, sentinel: &str) -> String {
    value
        .and_then(value_to_text)
        .and_then(|s| parse_date(&s))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| sentinel.to_string())
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Normalize one raw remote record. Non-destructive: the raw payload is
/// retained verbatim on the row.
pub fn normalize(raw: &Value) -> TransactionRow {
    let amount = lookup(raw, AMOUNT_KEYS).map(value_to_amount).unwrap_or(0.0);
    let settlement_amount = lookup(raw, SETTLEMENT_AMOUNT_KEYS)
        .map(value_to_amount)
        .unwrap_or(0.0);
    // Some remote modes omit the precomputed diff; derive it so the column
    // is always filterable.
    let difference = lookup(raw, DIFF_KEYS)
        .map(value_to_amount)
        .unwrap_or(amount - settlement_amount);

    TransactionRow {
        identifier: lookup(raw, ID_KEYS)
            .and_then(value_to_text)
            .unwrap_or_default(),
        amount,
        settlement_amount,
        invoice_date: date_or_sentinel(lookup(raw, ORDER_DATE_KEYS), INVALID_DATE),
        settlement_date: date_or_sentinel(lookup(raw, SETTLEMENT_DATE_KEYS), PENDING),
        difference,
        remark: lookup(raw, REMARK_KEYS)
            .and_then(value_to_text)
            .unwrap_or_default(),
        event_type: lookup(raw, EVENT_TYPE_KEYS)
            .and_then(value_to_text)
            .unwrap_or_default(),
        original_payload: raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("\u{20b9}1,234.50"), 1234.50);
        assert_eq!(parse_amount("$ 500.00"), 500.0);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("(500.00)"), -500.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
    }

    #[test]
    fn test_parse_amount_never_nan() {
        for garbage in ["", "abc", "--", "(", "...", "\u{20b9}"] {
            assert!(!parse_amount(garbage).is_nan(), "NaN for {garbage:?}");
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15);
        assert_eq!(parse_date("2025-01-15"), expected);
        assert_eq!(parse_date("15/01/2025"), expected);
        assert_eq!(parse_date("2025-01-15T10:30:00"), expected);
        assert_eq!(parse_date("2025-01-15 10:30:00"), expected);
        assert_eq!(parse_date("2025-01-15T10:30:00+05:30"), expected);
        assert_eq!(parse_date("Pending"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_normalize_full_payload() {
        let raw = json!({
            "order_id": "ORD-42",
            "amount": "\u{20b9}1,234.50",
            "settlement_amount": 1200.0,
            "order_date": "2025-01-15",
            "settlement_date": "2025-01-18T09:00:00",
            "diff": 34.5,
            "remark": "fee deducted",
            "event_type": "SETTLEMENT",
        });
        let row = normalize(&raw);
        assert_eq!(row.identifier, "ORD-42");
        assert_eq!(row.amount, 1234.50);
        assert_eq!(row.settlement_amount, 1200.0);
        assert_eq!(row.invoice_date, "2025-01-15");
        assert_eq!(row.settlement_date, "2025-01-18");
        assert_eq!(row.difference, 34.5);
        assert_eq!(row.original_payload, raw);
    }

    #[test]
    fn test_normalize_alternate_keys() {
        let raw = json!({
            "orderId": "ORD-7",
            "txn_amount": "750",
            "net_amount": "700",
            "invoice_date": "15/01/2025",
            "settled_on": "2025-01-20",
            "note": "partial",
            "type": "REFUND",
        });
        let row = normalize(&raw);
        assert_eq!(row.identifier, "ORD-7");
        assert_eq!(row.amount, 750.0);
        assert_eq!(row.settlement_amount, 700.0);
        assert_eq!(row.invoice_date, "2025-01-15");
        assert_eq!(row.settlement_date, "2025-01-20");
        assert_eq!(row.remark, "partial");
        assert_eq!(row.event_type, "REFUND");
    }

    #[test]
    fn test_normalize_key_priority_order() {
        // "amount" wins over "order_amount" when both are present
        let raw = json!({"amount": 10.0, "order_amount": 99.0});
        assert_eq!(normalize(&raw).amount, 10.0);
    }

    #[test]
    fn test_normalize_context_wrapper_flattened() {
        let raw = json!({
            "order_id": "ORD-9",
            "calculation_inputs": {
                "amount": "300",
                "settlement_amount": "250",
            },
        });
        let row = normalize(&raw);
        assert_eq!(row.amount, 300.0);
        assert_eq!(row.settlement_amount, 250.0);
        assert_eq!(row.difference, 50.0);
    }

    #[test]
    fn test_normalize_derives_difference() {
        let raw = json!({"amount": 100.0, "settlement_amount": 80.0});
        assert_eq!(normalize(&raw).difference, 20.0);
    }

    #[test]
    fn test_normalize_bad_amounts_are_zero() {
        for raw in [json!({"amount": ""}), json!({"amount": null}), json!({"amount": "abc"}), json!({})] {
            let row = normalize(&raw);
            assert_eq!(row.amount, 0.0);
            assert!(!row.amount.is_nan());
        }
    }

    #[test]
    fn test_normalize_date_sentinels() {
        let row = normalize(&json!({"order_date": "garbage"}));
        assert_eq!(row.invoice_date, INVALID_DATE);
        assert_eq!(row.settlement_date, PENDING);
    }

    #[test]
    fn test_normalize_idempotent_on_own_output() {
        let raw = json!({
            "order_id": "ORD-42",
            "amount": "\u{20b9}1,234.50",
            "order_date": "15/01/2025",
            "remark": "fee",
        });
        let once = normalize(&raw);
        let reencoded = serde_json::to_value(&once).unwrap();
        let twice = normalize(&reencoded);
        assert_eq!(twice.identifier, once.identifier);
        assert_eq!(twice.amount, once.amount);
        assert_eq!(twice.settlement_amount, once.settlement_amount);
        assert_eq!(twice.invoice_date, once.invoice_date);
        assert_eq!(twice.settlement_date, once.settlement_date);
        assert_eq!(twice.difference, once.difference);
        assert_eq!(twice.remark, once.remark);
        assert_eq!(twice.event_type, once.event_type);
    }

    #[test]
    fn test_payload_text_reaches_into_context() {
        let raw = json!({"context": {"reason": "FEE_MISMATCH"}, "status": "DISPUTED"});
        assert_eq!(payload_text(&raw, "status").as_deref(), Some("DISPUTED"));
        assert_eq!(payload_text(&raw, "reason").as_deref(), Some("FEE_MISMATCH"));
        assert_eq!(payload_text(&raw, "missing"), None);
    }
}
