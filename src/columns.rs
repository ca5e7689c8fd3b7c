//! Static metadata for every filterable/sortable column.
//!
//! Other components must consult this registry instead of re-deriving
//! capabilities: `server_supported` is the single source of truth for
//! whether a filter is forwarded to the remote or evaluated locally only.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    NumberRange,
    DateRange,
    EnumSet,
}

#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub value_type: ValueType,
    pub remote_param: &'static str,
    pub sort_key: Option<&'static str>,
    pub server_supported: bool,
}

/// The identifier column bypasses the generic per-type compile rules:
/// its value comes from the chip list or an explicit caller override.
pub const IDENTIFIER_COLUMN: &str = "order_id";

/// The column whose filter, when absent, is replaced by the default
/// date window derived from the active date-range mode.
pub const PRIMARY_DATE_COLUMN: &str = "order_date";

const REGISTRY: &[ColumnDescriptor] = &[
    ColumnDescriptor {
        name: "order_id",
        value_type: ValueType::Text,
        remote_param: "order_id",
        sort_key: None,
        server_supported: true,
    },
    ColumnDescriptor {
        name: "status",
        value_type: ValueType::EnumSet,
        remote_param: "status",
        sort_key: None,
        server_supported: true,
    },
    ColumnDescriptor {
        name: "event_type",
        value_type: ValueType::EnumSet,
        remote_param: "event_type",
        sort_key: None,
        server_supported: true,
    },
    // The remote has no filter for the derived reason field; it is
    // evaluated locally only.
    ColumnDescriptor {
        name: "reason",
        value_type: ValueType::EnumSet,
        remote_param: "reason",
        sort_key: None,
        server_supported: false,
    },
    ColumnDescriptor {
        name: "platform",
        value_type: ValueType::Text,
        remote_param: "platform",
        sort_key: None,
        server_supported: true,
    },
    ColumnDescriptor {
        name: "remark",
        value_type: ValueType::Text,
        remote_param: "remark",
        sort_key: None,
        server_supported: false,
    },
    ColumnDescriptor {
        name: "order_date",
        value_type: ValueType::DateRange,
        remote_param: "order_date",
        sort_key: Some("order_date"),
        server_supported: true,
    },
    ColumnDescriptor {
        name: "settlement_date",
        value_type: ValueType::DateRange,
        remote_param: "settlement_date",
        sort_key: Some("settlement_date"),
        server_supported: true,
    },
    ColumnDescriptor {
        name: "amount",
        value_type: ValueType::NumberRange,
        remote_param: "amount",
        sort_key: Some("amount"),
        server_supported: true,
    },
    ColumnDescriptor {
        name: "settlement_amount",
        value_type: ValueType::NumberRange,
        remote_param: "settlement_amount",
        sort_key: Some("settlement_amount"),
        server_supported: true,
    },
    ColumnDescriptor {
        name: "diff",
        value_type: ValueType::NumberRange,
        remote_param: "diff",
        sort_key: Some("diff"),
        server_supported: true,
    },
];

pub fn describe(column: &str) -> Option<&'static ColumnDescriptor> {
    REGISTRY.iter().find(|d| d.name == column)
}

pub fn is_registered(column: &str) -> bool {
    describe(column).is_some()
}

pub fn is_sortable(column: &str) -> bool {
    describe(column).map(|d| d.sort_key.is_some()).unwrap_or(false)
}

pub fn all() -> &'static [ColumnDescriptor] {
    REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_column() {
        let desc = describe("diff").unwrap();
        assert_eq!(desc.value_type, ValueType::NumberRange);
        assert_eq!(desc.remote_param, "diff");
        assert!(desc.server_supported);
    }

    #[test]
    fn test_describe_unknown_column() {
        assert!(describe("nonsense").is_none());
        assert!(!is_registered("nonsense"));
    }

    #[test]
    fn test_reason_is_local_only() {
        let desc = describe("reason").unwrap();
        assert_eq!(desc.value_type, ValueType::EnumSet);
        assert!(!desc.server_supported);
    }

    #[test]
    fn test_sortable_columns() {
        assert!(is_sortable("order_date"));
        assert!(is_sortable("diff"));
        assert!(!is_sortable("status"));
        assert!(!is_sortable("order_id"));
        assert!(!is_sortable("nonsense"));
    }

    #[test]
    fn test_identifier_and_primary_date_are_registered() {
        assert!(is_registered(IDENTIFIER_COLUMN));
        assert!(is_registered(PRIMARY_DATE_COLUMN));
    }
}
