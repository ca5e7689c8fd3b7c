//! Local re-application of the filter/sort configuration over fetched rows.
//!
//! Predicate semantics must match the compiler's remote contract exactly so
//! server-side and client-side filtering never visibly disagree. This is
//! also the only place local-only columns (reason, remark) are filtered.

use std::cmp::Ordering;

use crate::columns::{self, ValueType};
use crate::filters::{FilterState, FilterValue, SortDirection, SortState};
use crate::models::TransactionRow;

/// Pure: no I/O, input order preserved unless a sort is active.
pub fn evaluate(
    rows: &[TransactionRow],
    filters: &FilterState,
    sort: &SortState,
) -> Vec<TransactionRow> {
    let mut out: Vec<TransactionRow> = rows
        .iter()
        .filter(|row| filters.iter().all(|(column, value)| row_passes(row, column, value)))
        .cloned()
        .collect();

    if let Some((column, direction)) = sort.active() {
        out.sort_by(|a, b| compare_rows(a, b, column, direction));
    }
    out
}

fn row_passes(row: &TransactionRow, column: &str, value: &FilterValue) -> bool {
    match value {
        FilterValue::Text(s) => {
            let needle = s.trim().to_lowercase();
            if needle.is_empty() {
                return true;
            }
            match row.text_value(column) {
                Some(v) => v.to_lowercase().contains(&needle),
                None => false,
            }
        }
        FilterValue::NumberRange { min, max } => {
            let min = min.trim().parse::<f64>().ok();
            let max = max.trim().parse::<f64>().ok();
            if min.is_none() && max.is_none() {
                return true;
            }
            let Some(v) = row.number_value(column) else {
                return false;
            };
            if let Some(lo) = min {
                if v < lo {
                    return false;
                }
            }
            if let Some(hi) = max {
                if v > hi {
                    return false;
                }
            }
            true
        }
        FilterValue::DateRange { from, to } => {
            let from = crate::normalizer::parse_date(from);
            let to = crate::normalizer::parse_date(to);
            if from.is_none() && to.is_none() {
                return true;
            }
            let Some(d) = row.date_value(column) else {
                return false;
            };
            if let Some(lo) = from {
                if d < lo {
                    return false;
                }
            }
            if let Some(hi) = to {
                if d > hi {
                    return false;
                }
            }
            true
        }
        FilterValue::EnumSet(values) => {
            let set: Vec<&str> = values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();
            if set.is_empty() {
                return true;
            }
            match row.text_value(column) {
                Some(v) => set.contains(&v.trim()),
                None => false,
            }
        }
    }
}

/// Missing values sort last regardless of direction; present values follow
/// the column's type ordering.
fn compare_rows(
    a: &TransactionRow,
    b: &TransactionRow,
    column: &str,
    direction: SortDirection,
) -> Ordering {
    let Some(desc) = columns::describe(column) else {
        return Ordering::Equal;
    };
    match desc.value_type {
        ValueType::NumberRange => ordered(
            a.number_value(column),
            b.number_value(column),
            direction,
            |x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal),
        ),
        ValueType::DateRange => ordered(
            a.date_value(column),
            b.date_value(column),
            direction,
            |x, y| x.cmp(y),
        ),
        ValueType::Text | ValueType::EnumSet => ordered(
            a.text_value(column).map(|v| v.to_lowercase()),
            b.text_value(column).map(|v| v.to_lowercase()),
            direction,
            |x, y| x.cmp(y),
        ),
    }
}

fn ordered<T, F>(a: Option<T>, b: Option<T>, direction: SortDirection, cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = cmp(&x, &y);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}
