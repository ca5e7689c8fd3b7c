//! Coordinates the named collections that share one filter/sort/date
//! configuration.
//!
//! The orchestrator is the only component that initiates fetches. Filter
//! and date edits buffer in the pending snapshot and never touch the
//! network; commit operations (apply, clear, sort click, page change, chip
//! edits) promote state and refetch. A full refetch compiles parameters
//! for every collection from one atomic read of the shared state, then
//! dispatches all requests concurrently, so total latency is bounded by
//! the slowest collection rather than the sum.

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{CategoryChangeRequest, QueryResponse, TransactionApi};
use crate::config::OrchestratorConfig;
use crate::error::{ReconError, Result};
use crate::evaluator;
use crate::filters::{DateRangeMode, FilterSnapshots, FilterValue, SortState};
use crate::models::{Collection, TransactionRow};
use crate::mutation::{MutationLedger, MutationPhase, PendingMutation};
use crate::normalizer;
use crate::query::{self, QueryParams};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Explicit subscription interface, owned by the orchestrator, in place of
/// any ambient cross-view broadcast.
pub trait CollectionObserver: Send + Sync {
    fn on_event(&self, event: &OrchestratorEvent);
}

#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A fetch settled; the named collections hold fresh rows or a fresh
    /// error.
    CollectionsRefreshed { collection_ids: Vec<String> },
    /// Rows were optimistically removed ahead of remote confirmation.
    TentativeRemoval {
        collection_id: String,
        row_ids: Vec<String>,
    },
    /// A pending mutation left the Tentative phase.
    MutationSettled { phase: MutationPhase },
}

/// Handle for one fetch dispatch. Completions are applied only while their
/// ticket is still the latest issued, so a slow response to an older query
/// can never overwrite fresher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchTicket(u64);

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<A: TransactionApi> {
    api: A,
    config: OrchestratorConfig,
    filters: FilterSnapshots,
    sort: SortState,
    collections: Vec<Collection>,
    ledger: MutationLedger,
    observers: Vec<Box<dyn CollectionObserver>>,
    issue: u64,
}

impl<A: TransactionApi> Orchestrator<A> {
    pub fn new(api: A, config: OrchestratorConfig) -> Self {
        let collections = config
            .collections
            .iter()
            .cloned()
            .map(Collection::new)
            .collect();
        Orchestrator {
            api,
            config,
            filters: FilterSnapshots::default(),
            sort: SortState::Unsorted,
            collections,
            ledger: MutationLedger::default(),
            observers: Vec::new(),
            issue: 0,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.spec.id == id)
    }

    pub fn filters(&self) -> &FilterSnapshots {
        &self.filters
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn pending_mutations(&self) -> &[PendingMutation] {
        self.ledger.entries()
    }

    /// Rows of one collection with the applied filters and sort re-applied
    /// locally. This is what presentation paginates over: it covers the
    /// local-only columns the remote cannot filter and gives instant
    /// feedback between fetches.
    pub fn visible_rows(&self, collection_id: &str) -> Vec<TransactionRow> {
        self.collection(collection_id)
            .map(|c| evaluator::evaluate(&c.rows, &self.filters.applied.filters, &self.sort))
            .unwrap_or_default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn CollectionObserver>) {
        self.observers.push(observer);
    }

    // -- buffered edits (no network) ----------------------------------------

    pub fn set_filter(&mut self, column: &str, value: FilterValue) -> Result<()> {
        self.filters.set(column, value)
    }

    pub fn remove_filter(&mut self, column: &str) {
        self.filters.remove(column);
    }

    pub fn set_date_mode(&mut self, mode: DateRangeMode) {
        self.filters.set_date_mode(mode);
    }

    // -- commit operations (refetch) ----------------------------------------

    /// Promote pending edits to applied and refetch everything. Pagination
    /// restarts because the result set changed shape.
    pub async fn apply_filters(&mut self) {
        self.filters.apply();
        for collection in &mut self.collections {
            collection.page = 1;
        }
        self.refetch_all().await;
    }

    pub async fn clear_filters(&mut self) {
        self.filters.clear();
        self.sort = SortState::Unsorted;
        for collection in &mut self.collections {
            collection.page = 1;
        }
        self.refetch_all().await;
    }

    /// Sort header click: commits immediately when it changes the state.
    pub async fn click_sort(&mut self, column: &str) {
        let before = self.sort.clone();
        self.sort.click(column);
        if self.sort != before {
            self.refetch_all().await;
        }
    }

    pub async fn set_page(&mut self, collection_id: &str, page: u32) -> Result<()> {
        let collection = self
            .collections
            .iter_mut()
            .find(|c| c.spec.id == collection_id)
            .ok_or_else(|| ReconError::UnknownCollection(collection_id.to_string()))?;
        collection.page = page.max(1);
        self.refetch_one(collection_id).await;
        Ok(())
    }

    pub async fn add_chip(&mut self, id: &str) {
        self.filters.add_chip(id);
        self.refetch_all().await;
    }

    pub async fn remove_chip(&mut self, id: &str) {
        self.filters.remove_chip(id);
        self.refetch_all().await;
    }

    /// One-shot identifier search that bypasses committed chip state, for
    /// lookups the user has not added to the running list yet.
    pub async fn search_identifiers(&mut self, ids: &str) {
        self.refetch(None, Some(ids)).await;
    }

    pub async fn refetch_all(&mut self) {
        self.refetch(None, None).await;
    }

    pub async fn refetch_one(&mut self, collection_id: &str) {
        self.refetch(Some(collection_id), None).await;
    }

    // -- mutation -----------------------------------------------------------

    /// Optimistically move rows out of `source_collection` and issue the
    /// category-change mutation. On success the orchestrator refetches
    /// everything: the authoritative response is the only thing trusted
    /// for counts and membership. On failure the tentative removal stays
    /// until the next refetch restores truth.
    pub async fn change_category(
        &mut self,
        source_collection: &str,
        request: CategoryChangeRequest,
    ) -> Result<()> {
        let collection = self
            .collections
            .iter_mut()
            .find(|c| c.spec.id == source_collection)
            .ok_or_else(|| ReconError::UnknownCollection(source_collection.to_string()))?;

        collection
            .rows
            .retain(|row| !request.order_ids.contains(&row.identifier));
        let key = self.ledger.open(&request);
        self.notify(&OrchestratorEvent::TentativeRemoval {
            collection_id: source_collection.to_string(),
            row_ids: request.order_ids.clone(),
        });

        match self.api.change_category(&request).await {
            Ok(()) => {
                self.ledger.confirm(key);
                self.notify(&OrchestratorEvent::MutationSettled {
                    phase: MutationPhase::Confirmed,
                });
                self.refetch_all().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "category change rejected; next refetch restores truth");
                Err(e)
            }
        }
    }

    // -- fetch pipeline -----------------------------------------------------

    fn compile_for(&self, collection: &Collection, identifier_override: Option<&str>) -> QueryParams {
        query::compile(
            &self.filters.applied.filters,
            &self.filters.chips,
            &self.sort,
            &self.filters.applied.date_mode,
            &collection.spec.discriminant,
            collection.page,
            self.config.page_limit,
            identifier_override,
        )
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.issue += 1;
        FetchTicket(self.issue)
    }

    async fn refetch(&mut self, target: Option<&str>, identifier_override: Option<&str>) {
        let ticket = self.begin_fetch();
        // One synchronous, atomic read of the shared configuration: every
        // request spawned below reflects the same filter state even though
        // they resolve at different times.
        let jobs: Vec<(String, QueryParams)> = self
            .collections
            .iter()
            .filter(|c| target.map_or(true, |t| c.spec.id == t))
            .map(|c| (c.spec.id.clone(), self.compile_for(c, identifier_override)))
            .collect();
        debug!(requests = jobs.len(), "dispatching concurrent refetch");

        let api = &self.api;
        let results: Vec<(String, Result<Value>)> = join_all(jobs.into_iter().map(
            |(id, params)| async move {
                let outcome = api.query(&params).await;
                (id, outcome)
            },
        ))
        .await;

        self.settle(ticket, results, target.is_none());
    }

    /// Apply fetch completions. Failure is isolated per collection: an
    /// errored collection keeps its previous rows alongside the error;
    /// siblings are unaffected.
    fn settle(&mut self, ticket: FetchTicket, results: Vec<(String, Result<Value>)>, full: bool) {
        if ticket.0 != self.issue {
            debug!(
                ticket = ticket.0,
                latest = self.issue,
                "discarding stale fetch completion"
            );
            return;
        }

        let applied_filters = self.filters.applied.filters.clone();
        let sort = self.sort.clone();
        let mut refreshed = Vec::new();
        for (id, outcome) in results {
            let Some(collection) = self.collections.iter_mut().find(|c| c.spec.id == id) else {
                continue;
            };
            match outcome {
                Ok(value) => {
                    let response = QueryResponse::from_value(&value);
                    collection.rows = response.rows.iter().map(normalizer::normalize).collect();
                    collection.total_count = response
                        .total_count
                        .unwrap_or(collection.rows.len() as u64);
                    collection.status_counts = response.status_counts;
                    collection.error = None;
                    collection.last_applied_filters = applied_filters.clone();
                    collection.last_applied_sort = sort.clone();
                }
                Err(e) => {
                    warn!(collection = %id, error = %e, "collection fetch failed; keeping previous rows");
                    collection.error = Some(e.to_string());
                }
            }
            refreshed.push(id);
        }

        if full {
            let reverted = self.ledger.revert_open();
            if reverted > 0 {
                debug!(reverted, "tentative mutations superseded by refetch");
                self.notify(&OrchestratorEvent::MutationSettled {
                    phase: MutationPhase::Reverted,
                });
            }
        }
        self.notify(&OrchestratorEvent::CollectionsRefreshed {
            collection_ids: refreshed,
        });
    }

    fn notify(&self, event: &OrchestratorEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
