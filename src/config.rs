use serde::{Deserialize, Serialize};

use crate::models::CollectionSpec;

/// In-memory orchestrator configuration. Hosts construct it directly or
/// deserialize it from their own config source; this crate never persists
/// anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionSpec>,
}

fn default_page_limit() -> u32 {
    20
}

/// The standard three tabs: unreconciled rows keyed by status, the two
/// manually-moved categories keyed by override status.
fn default_collections() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec::new("unreconciled", "status_in", "UNRECONCILED"),
        CollectionSpec::new("manually_reconciled", "manual_override_status", "RECONCILED"),
        CollectionSpec::new("disputed", "manual_override_status", "DISPUTED"),
    ]
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            page_limit: default_page_limit(),
            collections: default_collections(),
        }
    }
}
