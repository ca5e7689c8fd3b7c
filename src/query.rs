//! Compiles the applied filter/sort/date configuration into flat remote
//! query parameters.
//!
//! The compiler never errors: blank or unparseable input degrades to
//! "parameter omitted". Only non-empty values are present in the output —
//! an absent key is not the same as an empty string.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::columns::{self, IDENTIFIER_COLUMN, PRIMARY_DATE_COLUMN};
use crate::filters::{window_or_current_month, DateRangeMode, FilterState, FilterValue, SortState};
use crate::models::Discriminant;

/// Flat string-keyed parameter map handed to the remote client.
pub type QueryParams = BTreeMap<String, String>;

#[allow(clippy::too_many_arguments)]
pub fn compile(
    applied: &FilterState,
    chips: &[String],
    sort: &SortState,
    date_mode: &DateRangeMode,
    discriminant: &Discriminant,
    page: u32,
    limit: u32,
    identifier_override: Option<&str>,
) -> QueryParams {
    let mut params = QueryParams::new();

    for (column, value) in applied {
        // The identifier column bypasses the generic per-type rules
        // entirely; see below.
        if column == IDENTIFIER_COLUMN {
            continue;
        }
        let Some(desc) = columns::describe(column) else {
            continue;
        };
        if !desc.server_supported || value.is_blank() {
            continue;
        }
        match value {
            FilterValue::Text(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    params.insert(desc.remote_param.to_string(), trimmed.to_string());
                }
            }
            FilterValue::NumberRange { min, max } => {
                if min.trim().parse::<f64>().is_ok() {
                    params.insert(format!("{}_min", desc.remote_param), min.trim().to_string());
                }
                if max.trim().parse::<f64>().is_ok() {
                    params.insert(format!("{}_max", desc.remote_param), max.trim().to_string());
                }
            }
            FilterValue::DateRange { from, to } => {
                if !from.trim().is_empty() {
                    params.insert(format!("{}_from", desc.remote_param), from.trim().to_string());
                }
                if !to.trim().is_empty() {
                    params.insert(format!("{}_to", desc.remote_param), to.trim().to_string());
                }
            }
            FilterValue::EnumSet(values) => {
                let cleaned: Vec<&str> = values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .collect();
                if !cleaned.is_empty() {
                    params.insert(format!("{}_in", desc.remote_param), cleaned.join(","));
                }
            }
        }
    }

    // Identifier filter: override wins over the chip list; a generic filter
    // entry for the same column is never emitted alongside it.
    let ids: Vec<String> = match identifier_override {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => chips
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    };
    if !ids.is_empty() {
        params.insert(IDENTIFIER_COLUMN.to_string(), ids.join(","));
    }

    // Default date window: the compiled output always carries one for the
    // primary date column unless the user filtered it explicitly.
    let has_primary_date = applied
        .get(PRIMARY_DATE_COLUMN)
        .map(|v| !v.is_blank())
        .unwrap_or(false);
    if !has_primary_date {
        let today = Utc::now().date_naive();
        let (from, to) = window_or_current_month(date_mode, today);
        params.insert(
            format!("{PRIMARY_DATE_COLUMN}_from"),
            from.format("%Y-%m-%d").to_string(),
        );
        params.insert(
            format!("{PRIMARY_DATE_COLUMN}_to"),
            to.format("%Y-%m-%d").to_string(),
        );
    }

    if let Some((column, direction)) = sort.active() {
        if let Some(key) = columns::describe(column).and_then(|d| d.sort_key) {
            params.insert("sort_by".to_string(), key.to_string());
            params.insert("sort_order".to_string(), direction.as_param().to_string());
        }
    }

    params.insert("page".to_string(), page.to_string());
    params.insert("limit".to_string(), limit.to_string());

    // Merged last: the discriminant is fixed per collection and wins over
    // anything user filter state produced for the same key.
    params.insert(discriminant.param.clone(), discriminant.value.clone());

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterValue;
    use chrono::Datelike;

    fn disc() -> Discriminant {
        Discriminant {
            param: "status_in".to_string(),
            value: "UNRECONCILED".to_string(),
        }
    }

    fn compile_simple(applied: &FilterState) -> QueryParams {
        compile(
            applied,
            &[],
            &SortState::Unsorted,
            &DateRangeMode::ThisMonth,
            &disc(),
            1,
            20,
            None,
        )
    }

    #[test]
    fn test_empty_bound_never_emitted() {
        let mut applied = FilterState::new();
        applied.insert(
            "diff".into(),
            FilterValue::NumberRange { min: "".into(), max: "100".into() },
        );
        let params = compile_simple(&applied);
        assert_eq!(params.get("diff_max").map(String::as_str), Some("100"));
        assert!(!params.contains_key("diff_min"));
    }

    #[test]
    fn test_unparseable_bound_silently_dropped() {
        let mut applied = FilterState::new();
        applied.insert(
            "diff".into(),
            FilterValue::NumberRange { min: "abc".into(), max: " 33.5 ".into() },
        );
        let params = compile_simple(&applied);
        assert!(!params.contains_key("diff_min"));
        assert_eq!(params.get("diff_max").map(String::as_str), Some("33.5"));
    }

    #[test]
    fn test_text_filter_trimmed() {
        let mut applied = FilterState::new();
        applied.insert("platform".into(), FilterValue::Text("  upi  ".into()));
        let params = compile_simple(&applied);
        assert_eq!(params.get("platform").map(String::as_str), Some("upi"));
    }

    #[test]
    fn test_enum_set_emitted_as_csv() {
        let mut applied = FilterState::new();
        applied.insert(
            "event_type".into(),
            FilterValue::EnumSet(vec!["SETTLEMENT".into(), " REFUND ".into(), "".into()]),
        );
        let params = compile_simple(&applied);
        assert_eq!(
            params.get("event_type_in").map(String::as_str),
            Some("SETTLEMENT,REFUND")
        );
    }

    #[test]
    fn test_local_only_column_never_emitted() {
        let mut applied = FilterState::new();
        applied.insert(
            "reason".into(),
            FilterValue::EnumSet(vec!["FEE_MISMATCH".into()]),
        );
        applied.insert("remark".into(), FilterValue::Text("short".into()));
        let params = compile_simple(&applied);
        assert!(!params.contains_key("reason_in"));
        assert!(!params.contains_key("remark"));
    }

    #[test]
    fn test_default_date_window_this_month() {
        let params = compile_simple(&FilterState::new());
        let today = Utc::now().date_naive();
        let first = today.with_day(1).unwrap();
        assert_eq!(
            params.get("order_date_from").map(String::as_str),
            Some(first.format("%Y-%m-%d").to_string().as_str())
        );
        // the "to" bound is the last calendar day of the current month
        let to = params.get("order_date_to").unwrap();
        assert!(to.starts_with(&format!("{:04}-{:02}-", today.year(), today.month())));
        let day: u32 = to[8..].parse().unwrap();
        assert!(day >= 28);
    }

    #[test]
    fn test_explicit_date_filter_suppresses_default_window() {
        let mut applied = FilterState::new();
        applied.insert(
            "order_date".into(),
            FilterValue::DateRange { from: "2025-01-01".into(), to: "".into() },
        );
        let params = compile_simple(&applied);
        assert_eq!(
            params.get("order_date_from").map(String::as_str),
            Some("2025-01-01")
        );
        assert!(!params.contains_key("order_date_to"));
    }

    #[test]
    fn test_custom_mode_uses_explicit_bounds() {
        let mode = DateRangeMode::Custom {
            start: "2025-04-01".into(),
            end: "2025-04-15".into(),
        };
        let params = compile(
            &FilterState::new(),
            &[],
            &SortState::Unsorted,
            &mode,
            &disc(),
            1,
            20,
            None,
        );
        assert_eq!(params.get("order_date_from").map(String::as_str), Some("2025-04-01"));
        assert_eq!(params.get("order_date_to").map(String::as_str), Some("2025-04-15"));
    }

    #[test]
    fn test_identifier_chips_emitted_as_csv() {
        let chips = vec!["ORD-1".to_string(), "ORD-2".to_string()];
        let params = compile(
            &FilterState::new(),
            &chips,
            &SortState::Unsorted,
            &DateRangeMode::ThisMonth,
            &disc(),
            1,
            20,
            None,
        );
        assert_eq!(params.get("order_id").map(String::as_str), Some("ORD-1,ORD-2"));
    }

    #[test]
    fn test_identifier_override_wins_over_chips() {
        let chips = vec!["ORD-1".to_string()];
        let params = compile(
            &FilterState::new(),
            &chips,
            &SortState::Unsorted,
            &DateRangeMode::ThisMonth,
            &disc(),
            1,
            20,
            Some(" ORD-9 , ORD-10 "),
        );
        assert_eq!(params.get("order_id").map(String::as_str), Some("ORD-9,ORD-10"));
    }

    #[test]
    fn test_identifier_excludes_generic_filter() {
        let mut applied = FilterState::new();
        applied.insert("order_id".into(), FilterValue::Text("ORD-typed".into()));
        let chips = vec!["ORD-1".to_string()];
        let params = compile(
            &applied,
            &chips,
            &SortState::Unsorted,
            &DateRangeMode::ThisMonth,
            &disc(),
            1,
            20,
            None,
        );
        // only the chip-sourced CSV parameter, never the generic entry
        assert_eq!(params.get("order_id").map(String::as_str), Some("ORD-1"));
    }

    #[test]
    fn test_sort_emitted_for_server_sort_key() {
        let sort = SortState::Descending("diff".into());
        let params = compile(
            &FilterState::new(),
            &[],
            &sort,
            &DateRangeMode::ThisMonth,
            &disc(),
            1,
            20,
            None,
        );
        assert_eq!(params.get("sort_by").map(String::as_str), Some("diff"));
        assert_eq!(params.get("sort_order").map(String::as_str), Some("desc"));
    }

    #[test]
    fn test_unsorted_omits_sort_params() {
        let params = compile_simple(&FilterState::new());
        assert!(!params.contains_key("sort_by"));
        assert!(!params.contains_key("sort_order"));
    }

    #[test]
    fn test_discriminant_merged_last_and_wins() {
        let mut applied = FilterState::new();
        applied.insert(
            "status".into(),
            FilterValue::EnumSet(vec!["SETTLED".into()]),
        );
        let params = compile_simple(&applied);
        // the user's status filter compiled to status_in, but the tab
        // discriminant owns that key
        assert_eq!(params.get("status_in").map(String::as_str), Some("UNRECONCILED"));
    }

    #[test]
    fn test_page_and_limit_always_present() {
        let params = compile_simple(&FilterState::new());
        assert_eq!(params.get("page").map(String::as_str), Some("1"));
        assert_eq!(params.get("limit").map(String::as_str), Some("20"));
    }
}
