use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::columns;
use crate::error::{ReconError, Result};

// ---------------------------------------------------------------------------
// Filter values
// ---------------------------------------------------------------------------

/// One per-column filter, tagged by the column's value type.
///
/// Range bounds are kept as the raw strings the user typed; parsing happens
/// at compile/evaluate time so a half-typed bound never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    NumberRange { min: String, max: String },
    DateRange { from: String, to: String },
    EnumSet(Vec<String>),
}

impl FilterValue {
    /// A present key with all-empty sub-fields is treated as absent.
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::NumberRange { min, max } => {
                min.trim().is_empty() && max.trim().is_empty()
            }
            FilterValue::DateRange { from, to } => {
                from.trim().is_empty() && to.trim().is_empty()
            }
            FilterValue::EnumSet(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }
}

/// Column name -> filter value. Absent keys mean "no filter".
pub type FilterState = BTreeMap<String, FilterValue>;

// ---------------------------------------------------------------------------
// Date-range mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateRangeMode {
    #[default]
    ThisMonth,
    LastMonth,
    ThisYear,
    Custom {
        start: String,
        end: String,
    },
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    let (year, month) = if day.month() == 12 {
        (day.year() + 1, 1)
    } else {
        (day.year(), day.month() + 1)
    };
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(next_first) => next_first - Duration::days(1),
        None => day,
    }
}

/// Calendar-day window for a date-range mode, relative to `today` (UTC).
/// `Custom` returns `None` unless both bounds parse; callers fall back to
/// the current month.
pub fn window_for(mode: &DateRangeMode, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match mode {
        DateRangeMode::ThisMonth => Some((first_of_month(today), last_of_month(today))),
        DateRangeMode::LastMonth => {
            let prev = first_of_month(today) - Duration::days(1);
            Some((first_of_month(prev), last_of_month(prev)))
        }
        DateRangeMode::ThisYear => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
            let end = NaiveDate::from_ymd_opt(today.year(), 12, 31)?;
            Some((start, end))
        }
        DateRangeMode::Custom { start, end } => {
            let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").ok()?;
            let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").ok()?;
            Some((start, end))
        }
    }
}

/// Like [`window_for`], but guaranteed to resolve: an unresolvable mode
/// falls back to the current UTC month.
pub fn window_or_current_month(mode: &DateRangeMode, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    window_for(mode, today)
        .unwrap_or_else(|| (first_of_month(today), last_of_month(today)))
}

// ---------------------------------------------------------------------------
// Sort state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// At most one active sort column. `click` is the only mutator and cycles
/// Unsorted -> Ascending -> Descending -> Unsorted for a given column;
/// clicking a different sortable column replaces the active one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortState {
    #[default]
    Unsorted,
    Ascending(String),
    Descending(String),
}

impl SortState {
    pub fn click(&mut self, column: &str) {
        if !columns::is_sortable(column) {
            return;
        }
        *self = match self {
            SortState::Ascending(c) if c == column => SortState::Descending(column.to_string()),
            SortState::Descending(c) if c == column => SortState::Unsorted,
            _ => SortState::Ascending(column.to_string()),
        };
    }

    pub fn active(&self) -> Option<(&str, SortDirection)> {
        match self {
            SortState::Unsorted => None,
            SortState::Ascending(c) => Some((c.as_str(), SortDirection::Asc)),
            SortState::Descending(c) => Some((c.as_str(), SortDirection::Desc)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pending/applied snapshots
// ---------------------------------------------------------------------------

/// One committable filter configuration: per-column filters plus the
/// date-range mode. Sort is not buffered; header clicks commit immediately.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterConfig {
    pub filters: FilterState,
    pub date_mode: DateRangeMode,
}

/// The two snapshots of filter configuration. UI edits accumulate in
/// `pending`; `apply` promotes them to `applied`, which is what the query
/// compiler reads. Identifier chips are a committed running list and are
/// not buffered.
#[derive(Debug, Clone, Default)]
pub struct FilterSnapshots {
    pub pending: FilterConfig,
    pub applied: FilterConfig,
    pub chips: Vec<String>,
}

impl FilterSnapshots {
    /// Stage a filter edit. Unknown columns are rejected; callers are
    /// expected to validate against the registry.
    pub fn set(&mut self, column: &str, value: FilterValue) -> Result<()> {
        if !columns::is_registered(column) {
            return Err(ReconError::UnknownColumn(column.to_string()));
        }
        self.pending.filters.insert(column.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, column: &str) {
        self.pending.filters.remove(column);
    }

    pub fn set_date_mode(&mut self, mode: DateRangeMode) {
        self.pending.date_mode = mode;
    }

    /// Commit pending edits. This is the only path from pending to applied.
    pub fn apply(&mut self) {
        self.applied = self.pending.clone();
    }

    pub fn clear(&mut self) {
        self.pending = FilterConfig::default();
        self.applied = FilterConfig::default();
        self.chips.clear();
    }

    pub fn add_chip(&mut self, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        if !self.chips.iter().any(|c| c == id) {
            self.chips.push(id.to_string());
        }
    }

    pub fn remove_chip(&mut self, id: &str) {
        self.chips.retain(|c| c != id);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending != self.applied
    }
}
