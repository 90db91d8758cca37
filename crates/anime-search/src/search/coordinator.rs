//! Search query coordinator.
//!
//! Owns the typed query, the page number and the result store. Typing goes
//! through a [`Debouncer`]; once the query settles, or the page changes, the
//! coordinator issues a search, clears results, or does nothing. Only the most
//! recently issued search may change the store: issuing one cancels its
//! predecessor through the [`RequestSlot`], and late completions whose token
//! was cancelled are dropped.
//!
//! All transitions run on the coordinator's own task, one at a time.

use super::history::History;
use super::params::SearchParams;
use super::store::{SearchResults, SearchStore};
use crate::api::{Anime, AnimeSearchResponse, CatalogApi, Pagination, SEARCH_FAILED};
use crate::debounce::Debouncer;
use crate::handle::ViewHandle;
use crate::lifecycle::Lifecycle;
use crate::request::{spawn_request, Completion, RequestSlot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// User intents the presentation layer can send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    SetQuery(String),
    SetPage(u32),
    NextPage,
    PreviousPage,
    /// Empty the input and go back to page 1
    Clear,
}

/// Everything the presentation layer needs to render the search view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    /// Text as typed
    pub query: String,
    pub page: u32,
    /// Text the current results belong to
    pub debounced_query: String,
    pub lifecycle: Lifecycle,
    pub results: Option<SearchResults>,
    pub error: Option<String>,
}

/// What the search view should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchView<'a> {
    /// Nothing searched yet
    Prompt,
    Loading,
    Failed(&'a str),
    /// The search worked and matched nothing
    Empty(&'a str),
    Results {
        items: &'a [Anime],
        pagination: &'a Pagination,
    },
}

impl SearchSnapshot {
    pub fn items(&self) -> &[Anime] {
        self.results
            .as_ref()
            .map(|results| results.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.results.as_ref().map(|results| &results.pagination)
    }

    pub fn view(&self) -> SearchView<'_> {
        match self.lifecycle {
            Lifecycle::Idle => SearchView::Prompt,
            Lifecycle::Loading => SearchView::Loading,
            Lifecycle::Failed => SearchView::Failed(self.error.as_deref().unwrap_or(SEARCH_FAILED)),
            Lifecycle::Succeeded => match &self.results {
                Some(results) if !results.items.is_empty() => SearchView::Results {
                    items: &results.items,
                    pagination: &results.pagination,
                },
                Some(_) | None => SearchView::Empty(&self.debounced_query),
            },
        }
    }
}

/// Handle to a spawned [`SearchCoordinator`]
pub type SearchHandle = ViewHandle<SearchAction, SearchSnapshot>;

impl SearchHandle {
    pub fn set_query(&self, query: impl Into<String>) -> bool {
        self.dispatch(SearchAction::SetQuery(query.into()))
    }

    pub fn set_page(&self, page: u32) -> bool {
        self.dispatch(SearchAction::SetPage(page))
    }

    pub fn next_page(&self) -> bool {
        self.dispatch(SearchAction::NextPage)
    }

    pub fn previous_page(&self) -> bool {
        self.dispatch(SearchAction::PreviousPage)
    }

    pub fn clear(&self) -> bool {
        self.dispatch(SearchAction::Clear)
    }
}

enum Event {
    Settled(String),
    Completed(Completion<AnimeSearchResponse>),
}

pub struct SearchCoordinator<C> {
    client: Arc<C>,
    history: Box<dyn History>,
    params: SearchParams,
    debouncer: Debouncer<String>,
    store: SearchStore,
    slot: RequestSlot,
    completions_tx: mpsc::UnboundedSender<Completion<AnimeSearchResponse>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<AnimeSearchResponse>>,
    /// URL state read at startup, honoured by the first settled query
    seed: Option<SearchParams>,
}

impl<C: CatalogApi + 'static> SearchCoordinator<C> {
    /// Create a coordinator, initialising `(query, page)` from the history once
    pub fn new(client: Arc<C>, history: Box<dyn History>, debounce: Duration) -> Self {
        let params = SearchParams::from_location(&history.search());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let mut debouncer = Debouncer::new(String::new(), debounce);
        let seed = if params.query.is_empty() {
            None
        } else {
            debouncer.update(params.query.clone());
            Some(params.clone())
        };

        info!(
            query = %params.query,
            page = params.page,
            "Search state initialised from location"
        );

        let mut coordinator = Self {
            client,
            history,
            params,
            debouncer,
            store: SearchStore::new(),
            slot: RequestSlot::new(),
            completions_tx,
            completions_rx,
            seed,
        };
        coordinator.sync_location();
        coordinator
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn store(&self) -> &SearchStore {
        &self.store
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.params.query.clone(),
            page: self.params.page,
            debounced_query: self.debouncer.value().clone(),
            lifecycle: self.store.lifecycle(),
            results: self.store.results().cloned(),
            error: self.store.error().map(str::to_string),
        }
    }

    pub fn dispatch(&mut self, action: SearchAction) {
        match action {
            SearchAction::SetQuery(query) => self.set_query(query),
            SearchAction::SetPage(page) => self.set_page(page),
            SearchAction::NextPage => {
                self.next_page();
            }
            SearchAction::PreviousPage => {
                self.previous_page();
            }
            SearchAction::Clear => self.clear(),
        }
    }

    /// Replace the typed text; the search itself waits for the debounce
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.params.query {
            return;
        }
        self.params.query = query.clone();
        self.debouncer.update(query);
        self.sync_location();
    }

    /// Go to `page` and search it with the settled query
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.params.page {
            return;
        }
        // Still waiting for the first settle: the chosen page wins over the URL's
        if let Some(seed) = &mut self.seed {
            seed.page = page;
        }
        self.params.page = page;
        self.sync_location();
        self.refresh();
    }

    /// Returns whether a next page existed
    pub fn next_page(&mut self) -> bool {
        let next = self.params.page.checked_add(1).filter(|next| {
            self.store
                .pagination()
                .map(|pagination| pagination.has_next_page && pagination.contains_page(*next))
                .unwrap_or(false)
        });

        let Some(next) = next else {
            debug!(page = self.params.page, "No next page");
            return false;
        };
        self.set_page(next);
        true
    }

    /// Returns whether a previous page existed
    pub fn previous_page(&mut self) -> bool {
        if self.params.page <= 1 {
            return false;
        }
        self.set_page(self.params.page - 1);
        true
    }

    /// Empty the input, go back to page 1 and drop the results right away
    pub fn clear(&mut self) {
        self.params = SearchParams::default();
        self.seed = None;
        self.debouncer.replace(String::new());
        self.clear_results();
        self.sync_location();
    }

    /// Wait for the next settled query or finished request and apply it
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    pub async fn step(&mut self) {
        let event = self.next_event().await;
        self.apply(event);
    }

    /// Cancel the in-flight search and reset to idle
    pub fn teardown(&mut self) {
        self.slot.cancel();
        self.debouncer.reset();
        self.store.clear();
        info!("Search view torn down");
    }

    /// Process actions until every handle is dropped, publishing snapshots
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<SearchAction>,
        state: watch::Sender<SearchSnapshot>,
    ) {
        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => self.dispatch(action),
                    None => break,
                },
                event = self.next_event() => self.apply(event),
            }
            self.publish(&state);
        }

        self.teardown();
        self.publish(&state);
    }

    /// Run on a new task and return the handle that drives it
    pub fn spawn(self) -> (SearchHandle, JoinHandle<()>) {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(self.snapshot());
        let task = tokio::spawn(self.run(actions_rx, state_tx));
        (SearchHandle::new(actions_tx, state_rx), task)
    }

    fn publish(&self, state: &watch::Sender<SearchSnapshot>) {
        let snapshot = self.snapshot();
        state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    async fn next_event(&mut self) -> Event {
        tokio::select! {
            query = self.debouncer.settled() => Event::Settled(query),
            Some(completion) = self.completions_rx.recv() => Event::Completed(completion),
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::Settled(query) => self.on_settled(query),
            Event::Completed(completion) => self.on_completed(completion),
        }
    }

    fn on_settled(&mut self, query: String) {
        let seed = self.seed.take();
        debug!(query = %query, "Query settled");

        if query.is_empty() {
            self.clear_results();
            return;
        }

        // The URL's page survives startup; any later query starts at page 1
        let page = match seed {
            Some(seed) if seed.query == query => seed.page,
            Some(_) | None => 1,
        };
        self.params.page = page;
        self.sync_location();

        if query.trim().is_empty() {
            self.clear_results();
        } else {
            self.issue_search(query, page);
        }
    }

    /// Search the current page with the settled query, or clear if there is none
    fn refresh(&mut self) {
        let query = self.debouncer.value().clone();
        if query.trim().is_empty() {
            self.clear_results();
        } else {
            self.issue_search(query, self.params.page);
        }
    }

    fn clear_results(&mut self) {
        if self.slot.cancel() {
            debug!("Canceled in-flight search");
        }
        self.store.clear();
    }

    fn issue_search(&mut self, query: String, page: u32) {
        let token = self.slot.issue();
        self.store.begin();
        info!(query = %query, page = page, "Issuing search");

        let client = Arc::clone(&self.client);
        let cancel = token.clone();
        spawn_request(token, self.completions_tx.clone(), async move {
            client.search_anime(&query, page, &cancel).await
        });
    }

    fn on_completed(&mut self, completion: Completion<AnimeSearchResponse>) {
        if !self.slot.complete(&completion.token) {
            debug!("Discarding response of a superseded search");
            return;
        }

        match completion.outcome {
            Ok(response) => {
                info!(
                    items = response.data.len(),
                    page = response.pagination.current_page,
                    last_page = response.pagination.last_visible_page,
                    "Search succeeded"
                );
                self.store.succeed(response);
            }
            Err(error) if error.is_canceled() => {
                debug!("Search canceled");
            }
            Err(error) => {
                warn!(error = %error, "Search failed");
                self.store.fail(error.failure_message(SEARCH_FAILED));
            }
        }
    }

    fn sync_location(&mut self) {
        let search = self.params.to_query_string();
        if search != self.history.search() {
            debug!(search = %search, "Replacing location");
            self.history.replace_search(&search);
        }
    }
}
