//! Interface to the remote transaction query and mutation endpoints.
//!
//! Transport, authentication and credential handling are the host's
//! concern: implementations of [`TransactionApi`] are injected into the
//! orchestrator and consumed as black boxes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::query::QueryParams;

/// Wire shape of the manual category-change mutation.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryChangeRequest {
    pub order_ids: Vec<String>,
    pub note: String,
    pub manual_override_status: String,
}

#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Fetch one page of records for the given compiled parameters.
    async fn query(&self, params: &QueryParams) -> Result<Value>;

    /// Move the given rows to another category. No response contract
    /// beyond success/failure.
    async fn change_category(&self, request: &CategoryChangeRequest) -> Result<()>;
}

#[async_trait]
impl<T: TransactionApi + ?Sized> TransactionApi for Arc<T> {
    async fn query(&self, params: &QueryParams) -> Result<Value> {
        (**self).query(params).await
    }

    async fn change_category(&self, request: &CategoryChangeRequest) -> Result<()> {
        (**self).change_category(request).await
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Row arrays arrive under one of these keys depending on the remote mode;
/// the first present key wins.
const ROW_KEYS: &[&str] = &["transactions", "orders", "data"];
const META_KEYS: &[&str] = &["meta", "pagination"];

/// Decoded query response. Decoding is tolerant: missing or misshapen
/// pieces default rather than error.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub rows: Vec<Value>,
    pub total_count: Option<u64>,
    pub status_counts: BTreeMap<String, u64>,
}

impl QueryResponse {
    pub fn from_value(value: &Value) -> Self {
        let rows = ROW_KEYS
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_else(|| {
                debug!("response carried no recognized row array key");
                Vec::new()
            });

        let meta = META_KEYS.iter().find_map(|key| value.get(key));

        let total_count = meta.and_then(|m| {
            m.get("total_count")
                .or_else(|| m.get("current_count"))
                .and_then(Value::as_u64)
        });

        let mut status_counts = BTreeMap::new();
        if let Some(counts) = meta.and_then(|m| m.get("counts")).and_then(Value::as_object) {
            for (status, count) in counts {
                if let Some(n) = count.as_u64() {
                    status_counts.insert(status.clone(), n);
                }
            }
        }

        QueryResponse { rows, total_count, status_counts }
    }
}
