//! Detail lookup for a single catalog item.
//!
//! The [`DetailCoordinator`] is keyed by identifier: opening a different id
//! aborts the lookup in flight, resets the store and starts over. Closing the
//! view aborts whatever is in flight and returns to idle.

use crate::api::{AnimeFull, CatalogApi, DETAIL_FAILED};
use crate::handle::ViewHandle;
use crate::lifecycle::Lifecycle;
use crate::request::{spawn_request, Completion, RequestSlot};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailStore {
    lifecycle: Lifecycle,
    item: Option<AnimeFull>,
    error: Option<String>,
}

impl DetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.lifecycle = Lifecycle::Loading;
        self.item = None;
        self.error = None;
    }

    pub fn succeed(&mut self, item: AnimeFull) {
        self.lifecycle = Lifecycle::Succeeded;
        self.item = Some(item);
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.lifecycle = Lifecycle::Failed;
        self.item = None;
        self.error = Some(message);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn item(&self) -> Option<&AnimeFull> {
        self.item.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Open(u32),
    Close,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailSnapshot {
    /// Identifier on display, if any
    pub id: Option<u32>,
    pub lifecycle: Lifecycle,
    pub item: Option<AnimeFull>,
    pub error: Option<String>,
}

/// What the detail view should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailView<'a> {
    Idle,
    Loading,
    Failed(&'a str),
    Ready(&'a AnimeFull),
}

impl DetailSnapshot {
    pub fn view(&self) -> DetailView<'_> {
        match self.lifecycle {
            Lifecycle::Idle => DetailView::Idle,
            Lifecycle::Loading => DetailView::Loading,
            Lifecycle::Failed => DetailView::Failed(self.error.as_deref().unwrap_or(DETAIL_FAILED)),
            Lifecycle::Succeeded => match &self.item {
                Some(item) => DetailView::Ready(item),
                None => DetailView::Failed(DETAIL_FAILED),
            },
        }
    }
}

/// Handle to a spawned [`DetailCoordinator`]
pub type DetailHandle = ViewHandle<DetailAction, DetailSnapshot>;

impl DetailHandle {
    pub fn open(&self, mal_id: u32) -> bool {
        self.dispatch(DetailAction::Open(mal_id))
    }

    pub fn close(&self) -> bool {
        self.dispatch(DetailAction::Close)
    }
}

pub struct DetailCoordinator<C> {
    client: Arc<C>,
    id: Option<u32>,
    store: DetailStore,
    slot: RequestSlot,
    completions_tx: mpsc::UnboundedSender<Completion<AnimeFull>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<AnimeFull>>,
}

impl<C: CatalogApi + 'static> DetailCoordinator<C> {
    pub fn new(client: Arc<C>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            client,
            id: None,
            store: DetailStore::new(),
            slot: RequestSlot::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn store(&self) -> &DetailStore {
        &self.store
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        DetailSnapshot {
            id: self.id,
            lifecycle: self.store.lifecycle(),
            item: self.store.item().cloned(),
            error: self.store.error().map(str::to_string),
        }
    }

    pub fn dispatch(&mut self, action: DetailAction) {
        match action {
            DetailAction::Open(mal_id) => self.open(mal_id),
            DetailAction::Close => self.close(),
        }
    }

    /// Show `mal_id`, replacing whatever was shown or loading before
    pub fn open(&mut self, mal_id: u32) {
        if self.id == Some(mal_id) {
            return;
        }
        if self.slot.cancel() {
            debug!(previous = ?self.id, "Canceled in-flight lookup");
        }
        self.id = Some(mal_id);
        self.store.clear();
        self.store.begin();

        let token = self.slot.issue();
        info!(mal_id = mal_id, "Fetching anime details");

        let client = Arc::clone(&self.client);
        let cancel = token.clone();
        spawn_request(token, self.completions_tx.clone(), async move {
            client.anime_full(mal_id, &cancel).await
        });
    }

    /// Leave the detail view: abort the lookup and reset to idle
    pub fn close(&mut self) {
        self.slot.cancel();
        self.store.clear();
        if let Some(mal_id) = self.id.take() {
            info!(mal_id = mal_id, "Detail view closed");
        }
    }

    /// Wait for the lookup in flight to finish and apply it
    pub async fn step(&mut self) {
        if let Some(completion) = self.completions_rx.recv().await {
            self.on_completed(completion);
        }
    }

    /// Process actions until every handle is dropped, publishing snapshots
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<DetailAction>,
        state: watch::Sender<DetailSnapshot>,
    ) {
        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => self.dispatch(action),
                    None => break,
                },
                Some(completion) = self.completions_rx.recv() => self.on_completed(completion),
            }

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

        self.close();
        state.send_replace(self.snapshot());
    }

    pub fn spawn(self) -> (DetailHandle, JoinHandle<()>) {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(self.snapshot());
        let task = tokio::spawn(self.run(actions_rx, state_tx));
        (DetailHandle::new(actions_tx, state_rx), task)
    }

    fn on_completed(&mut self, completion: Completion<AnimeFull>) {
        if !self.slot.complete(&completion.token) {
            debug!("Discarding response of a superseded lookup");
            return;
        }

        match completion.outcome {
            Ok(item) => {
                info!(mal_id = item.anime.mal_id, title = %item.anime.title, "Detail loaded");
                self.store.succeed(item);
            }
            Err(error) if error.is_canceled() => {
                debug!("Lookup canceled");
            }
            Err(error) => {
                warn!(mal_id = ?self.id, error = %error, "Detail lookup failed");
                self.store.fail(error.failure_message(DETAIL_FAILED));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anime_full, Call, FakeCatalog, Reply};
    use std::time::Duration;
    use tokio::time::timeout;

    fn coordinator() -> (DetailCoordinator<FakeCatalog>, Arc<FakeCatalog>) {
        let catalog = Arc::new(FakeCatalog::new());
        (DetailCoordinator::new(Arc::clone(&catalog)), catalog)
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_succeeds() {
        let (mut coordinator, catalog) = coordinator();
        catalog.on_detail(
            1,
            Duration::from_millis(30),
            Reply::Data(anime_full(1, "Cowboy Bebop")),
        );

        coordinator.open(1);
        assert_eq!(coordinator.store().lifecycle(), Lifecycle::Loading);
        coordinator.step().await;

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.id, Some(1));
        match snapshot.view() {
            DetailView::Ready(item) => {
                assert_eq!(item.anime.title, "Cowboy Bebop");
                assert_eq!(item.studios[0].name, "Bones");
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_resource_shows_service_message() {
        let (mut coordinator, catalog) = coordinator();
        catalog.on_detail(
            5114,
            Duration::from_millis(30),
            Reply::Service(404, Some("Resource does not exist".into())),
        );

        coordinator.open(5114);
        coordinator.step().await;

        assert_eq!(coordinator.store().lifecycle(), Lifecycle::Failed);
        assert_eq!(
            coordinator.snapshot().view(),
            DetailView::Failed("Resource does not exist")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_message_uses_fallback() {
        let (mut coordinator, catalog) = coordinator();
        catalog.on_detail(9, Duration::from_millis(30), Reply::Service(503, None));

        coordinator.open(9);
        coordinator.step().await;

        assert_eq!(coordinator.store().error(), Some(DETAIL_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_id_supersedes_previous_lookup() {
        let (mut coordinator, catalog) = coordinator();
        catalog.ignore_cancel();
        catalog.on_detail(1, Duration::from_millis(500), Reply::Data(anime_full(1, "Slow")));
        catalog.on_detail(2, Duration::from_millis(50), Reply::Data(anime_full(2, "Fast")));

        coordinator.open(1);
        coordinator.open(2);

        coordinator.step().await;
        assert_eq!(coordinator.store().item().unwrap().anime.title, "Fast");

        // The slow lookup completes later and is discarded
        coordinator.step().await;
        assert_eq!(coordinator.store().item().unwrap().anime.title, "Fast");
        assert_eq!(coordinator.id(), Some(2));
        assert_eq!(catalog.calls(), vec![Call::Detail(1), Call::Detail(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_mid_flight_discards_late_response() {
        let (mut coordinator, catalog) = coordinator();
        catalog.on_detail(
            3,
            Duration::from_millis(200),
            Reply::Service(500, Some("never shown".into())),
        );

        coordinator.open(3);
        coordinator.close();
        assert_eq!(coordinator.snapshot(), DetailSnapshot::default());

        coordinator.step().await;
        assert_eq!(coordinator.snapshot(), DetailSnapshot::default());
        assert_eq!(coordinator.snapshot().view(), DetailView::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_close_starts_clean() {
        let (mut coordinator, catalog) = coordinator();
        catalog.on_detail(4, Duration::from_millis(30), Reply::Service(500, None));

        coordinator.open(4);
        coordinator.step().await;
        assert_eq!(coordinator.store().lifecycle(), Lifecycle::Failed);

        coordinator.close();
        catalog.on_detail(4, Duration::from_millis(30), Reply::Data(anime_full(4, "Trigun")));
        coordinator.open(4);
        assert_eq!(coordinator.store().error(), None);
        coordinator.step().await;

        assert_eq!(coordinator.store().lifecycle(), Lifecycle::Succeeded);
        assert_eq!(catalog.calls(), vec![Call::Detail(4), Call::Detail(4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opening_same_id_twice_fetches_once() {
        let (mut coordinator, catalog) = coordinator();

        coordinator.open(7);
        coordinator.open(7);
        coordinator.step().await;

        assert_eq!(catalog.calls(), vec![Call::Detail(7)]);
        assert!(timeout(Duration::from_secs(1), coordinator.step()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_detail_view() {
        let (coordinator, catalog) = coordinator();
        catalog.on_detail(
            5114,
            Duration::from_millis(30),
            Reply::Service(404, Some("Resource does not exist".into())),
        );
        let (mut handle, task) = coordinator.spawn();

        assert!(handle.open(5114));
        let snapshot = handle
            .wait_for(|snapshot| snapshot.lifecycle.is_settled())
            .await
            .unwrap();
        assert_eq!(snapshot.error.as_deref(), Some("Resource does not exist"));

        assert!(handle.close());
        let snapshot = handle
            .wait_for(|snapshot| snapshot.id.is_none())
            .await
            .unwrap();
        assert_eq!(snapshot.lifecycle, Lifecycle::Idle);

        drop(handle);
        task.await.unwrap();
    }
}
