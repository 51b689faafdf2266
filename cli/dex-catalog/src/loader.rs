//! Incremental, enriched loading of the catalog.
//!
//! A [CatalogLoader] pages through the relay's list endpoint and, for every
//! entry of a page, fetches the entry's detail record. All detail fetches of a
//! page run concurrently and settle before the page is published, so consumers
//! never observe a partially enriched page.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::client::ClientTrait;
use crate::error::{ErrorKind, ListError};
use crate::pipeline::ViewFilterState;
use crate::types::{CatalogEntry, CatalogItemDetail, ItemId, NamedResource};

const fn non_zero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => panic!("page size must be positive"),
    }
}

pub const DEFAULT_INITIAL_PAGE_SIZE: NonZeroU32 = non_zero(60);
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = non_zero(20);

/// Page sizes used by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Number of entries requested by [CatalogLoader::load_initial]
    pub initial_page_size: NonZeroU32,
    /// Number of entries requested by each [CatalogLoader::load_more]
    pub page_size: NonZeroU32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initial_page_size: DEFAULT_INITIAL_PAGE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Observable state of a [CatalogLoader].
///
/// `is_initial_loading` and `is_loading_more` are never both set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderState {
    pub entries: Vec<CatalogEntry>,
    pub is_initial_loading: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub last_error: Option<ErrorKind>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            is_initial_loading: false,
            is_loading_more: false,
            has_more: true,
            last_error: None,
        }
    }
}

/// What a load call did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and merged into the entries.
    Published { appended: usize },
    /// Another load was running, or there is nothing left to load.
    Skipped,
    /// The page itself could not be fetched.
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Initial,
    More,
}

impl Phase {
    fn clear(self, state: &mut LoaderState) {
        match self {
            Phase::Initial => state.is_initial_loading = false,
            Phase::More => state.is_loading_more = false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the loading flag of one load call.
///
/// The flag is cleared by [LoadingGuard::finish], or on drop if the load
/// future is abandoned before it publishes.
struct LoadingGuard<'a> {
    state: &'a Mutex<LoaderState>,
    phase: Phase,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn begin_initial(state: &'a Mutex<LoaderState>) -> Option<Self> {
        let mut locked = lock(state);
        if locked.is_initial_loading || locked.is_loading_more {
            return None;
        }
        locked.is_initial_loading = true;
        locked.last_error = None;
        Some(Self {
            state,
            phase: Phase::Initial,
            armed: true,
        })
    }

    /// Returns the guard and the offset of the next page.
    fn begin_more(state: &'a Mutex<LoaderState>) -> Option<(Self, u32)> {
        let mut locked = lock(state);
        if locked.is_loading_more || locked.is_initial_loading || !locked.has_more {
            return None;
        }
        locked.is_loading_more = true;
        let offset = u32::try_from(locked.entries.len()).unwrap_or(u32::MAX);
        let guard = Self {
            state,
            phase: Phase::More,
            armed: true,
        };
        Some((guard, offset))
    }

    /// Apply `update` and clear the flag in the same critical section.
    fn finish<R>(mut self, update: impl FnOnce(&mut LoaderState) -> R) -> R {
        let mut locked = lock(self.state);
        let result = update(&mut locked);
        self.phase.clear(&mut locked);
        self.armed = false;
        result
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(phase = ?self.phase, "load abandoned before publishing");
            self.phase.clear(&mut lock(self.state));
        }
    }
}

/// Loads the catalog page by page through a [ClientTrait].
#[derive(Debug)]
pub struct CatalogLoader<C> {
    client: C,
    config: LoaderConfig,
    state: Mutex<LoaderState>,
    /// Details fetched during this session, keyed by entry name.
    details: Mutex<HashMap<String, Arc<CatalogItemDetail>>>,
}

impl<C: ClientTrait> CatalogLoader<C> {
    pub fn new(client: C, config: LoaderConfig) -> Self {
        Self {
            client,
            config,
            state: Mutex::new(LoaderState::default()),
            details: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> LoaderConfig {
        self.config
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LoaderState {
        lock(&self.state).clone()
    }

    /// Snapshot of the loaded entries.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        lock(&self.state).entries.clone()
    }

    /// More entries are offered only for an unfiltered view.
    pub fn can_load_more(&self, filter: &ViewFilterState) -> bool {
        lock(&self.state).has_more && !filter.is_filtering()
    }

    /// Fetch the first page and replace the entries with it.
    ///
    /// On failure the entries are kept and `last_error` is set.
    /// Also used to retry after a failed initial load.
    #[instrument(skip(self), fields(limit = self.config.initial_page_size))]
    pub async fn load_initial(&self) -> LoadOutcome {
        let Some(guard) = LoadingGuard::begin_initial(&self.state) else {
            debug!("a load is already in progress");
            return LoadOutcome::Skipped;
        };

        match self
            .fetch_enriched_page(0, self.config.initial_page_size)
            .await
        {
            Ok((entries, has_more)) => guard.finish(|state| {
                let appended = entries.len();
                state.entries = entries;
                state.has_more = has_more;
                LoadOutcome::Published { appended }
            }),
            Err(err) => {
                let kind = err.kind();
                error!(%kind, error = %err, "failed to load the catalog");
                guard.finish(|state| state.last_error = Some(kind));
                LoadOutcome::Failed(kind)
            },
        }
    }

    /// Fetch the page following the loaded entries and append it.
    ///
    /// A no-op while another load runs or when the remote reported no
    /// further page. Failures are logged and leave the state untouched.
    #[instrument(skip(self), fields(limit = self.config.page_size))]
    pub async fn load_more(&self) -> LoadOutcome {
        let Some((guard, offset)) = LoadingGuard::begin_more(&self.state) else {
            debug!("not loading more entries");
            return LoadOutcome::Skipped;
        };

        match self.fetch_enriched_page(offset, self.config.page_size).await {
            Ok((entries, has_more)) => guard.finish(|state| {
                let appended = entries.len();
                state.entries.extend(entries);
                state.has_more = has_more;
                LoadOutcome::Published { appended }
            }),
            Err(err) => {
                let kind = err.kind();
                warn!(offset, %kind, error = %err, "failed to load more entries");
                guard.finish(|_| ());
                LoadOutcome::Failed(kind)
            },
        }
    }

    /// Fetch one list page and enrich every entry, keeping list order.
    async fn fetch_enriched_page(
        &self,
        offset: u32,
        limit: NonZeroU32,
    ) -> Result<(Vec<CatalogEntry>, bool), ListError> {
        let page = self.client.list(offset, limit).await?;
        let has_more = page.has_next();
        debug!(
            offset,
            count = page.count,
            fan_out = page.results.len(),
            has_more,
            "enriching catalog page"
        );

        let entries = join_all(page.results.into_iter().map(|item| self.enrich(item))).await;
        Ok((entries, has_more))
    }

    /// Attach the detail record, or leave the entry bare if it can't be fetched.
    async fn enrich(&self, item: NamedResource) -> CatalogEntry {
        let entry = CatalogEntry::from(item);

        if let Some(detail) = lock(&self.details).get(&entry.name).cloned() {
            return entry.with_detail(detail);
        }

        let id = match entry.name.parse::<ItemId>() {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    name = %entry.name,
                    kind = %ErrorKind::PartialEnrichmentFailure,
                    error = %err,
                    "not enriching entry"
                );
                return entry;
            },
        };

        match self.client.detail(&id).await {
            Ok(detail) => {
                let detail = Arc::new(detail);
                lock(&self.details).insert(entry.name.clone(), detail.clone());
                entry.with_detail(detail)
            },
            Err(err) => {
                warn!(
                    name = %entry.name,
                    kind = %ErrorKind::PartialEnrichmentFailure,
                    error = %err,
                    "failed to enrich entry"
                );
                entry
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::mock::{MockClient, MockRequest};
    use crate::test_helpers::{detail, list_page, resource, test_subscriber};

    fn small_pages(initial: u32, more: u32) -> LoaderConfig {
        LoaderConfig {
            initial_page_size: NonZeroU32::new(initial).unwrap(),
            page_size: NonZeroU32::new(more).unwrap(),
        }
    }

    /// A mock serving `n` entries named `mon-1..=mon-n`, all with details.
    fn seeded_client(n: u32) -> MockClient {
        let client = MockClient::default();
        for id in 1..=n {
            let name = format!("mon-{id}");
            client.extend_catalog([resource(&name, id)]);
            client.insert_detail(detail(id, &name, &["normal"]));
        }
        client
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn fresh_state_allows_loading_more() {
        let state = LoaderState::default();
        assert!(state.has_more);
        assert!(!state.is_initial_loading);
        assert!(!state.is_loading_more);
        assert!(state.entries.is_empty());
    }

    #[tokio::test]
    async fn initial_load_publishes_enriched_first_page() {
        let client = seeded_client(1302);
        let loader = CatalogLoader::new(client.clone(), LoaderConfig::default());

        let outcome = loader.load_initial().await;

        assert_eq!(outcome, LoadOutcome::Published { appended: 60 });
        let state = loader.state();
        assert_eq!(state.entries.len(), 60);
        assert!(state.has_more);
        assert!(!state.is_initial_loading);
        assert_eq!(state.last_error, None);
        assert!(state.entries.iter().all(|entry| entry.detail.is_some()));
        assert_eq!(client.requests()[0], MockRequest::List {
            offset: 0,
            limit: 60
        });
    }

    #[tokio::test]
    async fn missing_detail_is_isolated() {
        let client = MockClient::default();
        client.extend_catalog([
            resource("bulbasaur", 1),
            resource("missingno", 0),
            resource("ivysaur", 2),
        ]);
        client.insert_detail(detail(1, "bulbasaur", &["grass"]));
        client.insert_detail(detail(2, "ivysaur", &["grass"]));
        client.insert_detail_error("missingno", 404);

        let loader = CatalogLoader::new(client, LoaderConfig::default());
        loader.load_initial().await;

        let state = loader.state();
        assert_eq!(state.last_error, None);
        assert_eq!(names(&state.entries), vec!["bulbasaur", "missingno", "ivysaur"]);
        assert!(state.entries[0].detail.is_some());
        assert!(state.entries[1].detail.is_none());
        assert!(state.entries[2].detail.is_some());
    }

    #[tokio::test]
    async fn failed_initial_load_sets_error_and_keeps_entries() {
        let client = seeded_client(5);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));
        loader.load_initial().await;
        let before = loader.entries();

        client.push_list_error(500);
        let outcome = loader.load_initial().await;

        assert_eq!(outcome, LoadOutcome::Failed(ErrorKind::TransportFailure));
        let state = loader.state();
        assert_eq!(state.entries, before);
        assert_eq!(state.last_error, Some(ErrorKind::TransportFailure));
        assert!(!state.is_initial_loading);
    }

    #[tokio::test]
    async fn retry_clears_error_and_reuses_cached_details() {
        let client = seeded_client(3);
        client.push_list_error(503);
        let loader = CatalogLoader::new(client.clone(), small_pages(3, 2));

        loader.load_initial().await;
        assert_eq!(loader.state().last_error, Some(ErrorKind::TransportFailure));

        loader.load_initial().await;
        loader.load_initial().await;

        let state = loader.state();
        assert_eq!(state.last_error, None);
        assert_eq!(state.entries.len(), 3);
        assert_eq!(client.detail_requests("mon-1"), 1);
    }

    #[tokio::test]
    async fn load_more_appends_next_page_at_current_offset() {
        let client = seeded_client(7);
        let loader = CatalogLoader::new(client.clone(), small_pages(3, 2));

        loader.load_initial().await;
        let first_page = loader.entries();
        assert_eq!(
            loader.load_more().await,
            LoadOutcome::Published { appended: 2 }
        );

        let entries = loader.entries();
        assert_eq!(&entries[..3], &first_page[..]);
        assert_eq!(names(&entries[3..]), vec!["mon-4", "mon-5"]);
        assert!(client.requests().contains(&MockRequest::List {
            offset: 3,
            limit: 2
        }));
    }

    #[tokio::test]
    async fn load_more_stops_after_last_page() {
        let client = seeded_client(4);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));

        loader.load_initial().await;
        loader.load_more().await;
        assert!(!loader.state().has_more);

        let requests = client.requests().len();
        assert_eq!(loader.load_more().await, LoadOutcome::Skipped);
        assert_eq!(client.requests().len(), requests);
        assert_eq!(loader.entries().len(), 4);
    }

    #[tokio::test]
    async fn load_more_before_initial_load_starts_at_zero() {
        let client = seeded_client(3);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));

        loader.load_more().await;

        assert_eq!(names(&loader.entries()), vec!["mon-1", "mon-2"]);
        assert_eq!(client.requests()[0], MockRequest::List {
            offset: 0,
            limit: 2
        });
    }

    #[tokio::test]
    async fn overlapping_load_more_is_a_no_op() {
        let client = seeded_client(6);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));
        loader.load_initial().await;

        let gate = client.gate_lists();
        let (first, second) = tokio::join!(loader.load_more(), async {
            let state = loader.state();
            assert!(state.is_loading_more);
            let outcome = loader.load_more().await;
            assert_eq!(loader.state().entries, state.entries);
            gate.notify_one();
            outcome
        });

        assert_eq!(first, LoadOutcome::Published { appended: 2 });
        assert_eq!(second, LoadOutcome::Skipped);
        assert_eq!(names(&loader.entries()), vec![
            "mon-1", "mon-2", "mon-3", "mon-4"
        ]);
    }

    #[tokio::test]
    async fn initial_load_is_skipped_while_loading_more() {
        let client = seeded_client(6);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));

        let gate = client.gate_lists();
        let (first, second) = tokio::join!(loader.load_more(), async {
            let outcome = loader.load_initial().await;
            let state = loader.state();
            assert!(!(state.is_initial_loading && state.is_loading_more));
            gate.notify_one();
            outcome
        });

        assert_eq!(first, LoadOutcome::Published { appended: 2 });
        assert_eq!(second, LoadOutcome::Skipped);
    }

    #[tokio::test]
    async fn dropping_load_more_resets_flag() {
        let client = seeded_client(6);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));
        loader.load_initial().await;

        let _gate = client.gate_lists();
        assert_eq!(loader.load_more().now_or_never(), None);

        let state = loader.state();
        assert!(!state.is_loading_more);
        assert_eq!(state.entries.len(), 2);
    }

    #[tokio::test]
    async fn failed_load_more_warns_and_keeps_entries() {
        let (subscriber, writer) = test_subscriber();
        let _default = tracing::subscriber::set_default(subscriber);

        let client = seeded_client(6);
        let loader = CatalogLoader::new(client.clone(), small_pages(2, 2));
        loader.load_initial().await;
        let before = loader.entries();

        client.push_list_error(500);
        let outcome = loader.load_more().await;

        assert_eq!(outcome, LoadOutcome::Failed(ErrorKind::TransportFailure));
        let state = loader.state();
        assert_eq!(state.entries, before);
        assert_eq!(state.last_error, None);
        assert!(!state.is_loading_more);
        assert!(state.has_more);

        let logs = writer.to_string();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("failed to load more entries"), "{logs}");
    }

    #[tokio::test]
    async fn can_load_more_only_when_unfiltered() {
        let client = seeded_client(3);
        let loader = CatalogLoader::new(client, small_pages(2, 2));
        loader.load_initial().await;

        let mut filter = ViewFilterState::default();
        assert!(loader.can_load_more(&filter));
        filter.search_query = "mon".to_string();
        assert!(!loader.can_load_more(&filter));
    }

    #[tokio::test]
    async fn unexpected_list_page_is_published_as_is() {
        let client = MockClient::default();
        client.push_list_response(crate::mock::Response::Ok(list_page(1302, true, &[
            ("bulbasaur", 1),
        ])));
        let loader = CatalogLoader::new(client, LoaderConfig::default());

        loader.load_initial().await;

        let state = loader.state();
        assert_eq!(names(&state.entries), vec!["bulbasaur"]);
        // Not seeded, so enrichment failed.
        assert!(state.entries[0].detail.is_none());
        assert!(state.has_more);
    }

    proptest! {
        #[test]
        fn pages_keep_list_order_whatever_the_latency(
            latencies in prop::collection::vec(0usize..6, 6),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let client = seeded_client(6);
            for (i, yields) in latencies.iter().enumerate() {
                client.delay_detail(format!("mon-{}", i + 1), *yields);
            }
            let loader = CatalogLoader::new(client, small_pages(3, 3));

            runtime.block_on(async {
                loader.load_initial().await;
                loader.load_more().await;
            });

            let entries = loader.entries();
            prop_assert_eq!(
                names(&entries),
                vec!["mon-1", "mon-2", "mon-3", "mon-4", "mon-5", "mon-6"]
            );
            prop_assert!(entries.iter().all(|entry| entry.detail.is_some()));
        }
    }
}
