//! Client-side data layer for settlement reconciliation dashboards.
//!
//! Turns per-column-typed filters and sort selections into exact remote
//! query parameters, evaluates the same predicates locally, normalizes
//! ragged remote payloads into canonical rows, and coordinates several
//! independently paginated collections that share one filter/sort/date
//! configuration — with per-collection failure isolation and optimistic
//! category-change mutations reconciled by authoritative refetch.

pub mod client;
pub mod columns;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod filters;
pub mod models;
pub mod mutation;
pub mod normalizer;
pub mod orchestrator;
pub mod query;

pub use client::{CategoryChangeRequest, QueryResponse, TransactionApi};
pub use config::OrchestratorConfig;
pub use error::{ReconError, Result};
pub use filters::{
    DateRangeMode, FilterSnapshots, FilterState, FilterValue, SortDirection, SortState,
};
pub use models::{Collection, CollectionSpec, Discriminant, TransactionRow};
pub use mutation::{MutationPhase, PendingMutation};
pub use orchestrator::{CollectionObserver, Orchestrator, OrchestratorEvent};
pub use query::QueryParams;
