//! Scripted catalog and fixtures for exercising the coordinators offline.

use crate::api::*;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const DEFAULT_LATENCY: Duration = Duration::from_millis(20);

pub fn anime(mal_id: u32, title: &str) -> Anime {
    serde_json::from_value(json!({ "mal_id": mal_id, "title": title })).unwrap()
}

pub fn anime_full(mal_id: u32, title: &str) -> AnimeFull {
    serde_json::from_value(json!({
        "mal_id": mal_id,
        "title": title,
        "studios": [{ "mal_id": 4, "type": "anime", "name": "Bones", "url": "u" }],
    }))
    .unwrap()
}

/// One page of results titled after `titles`
pub fn search_page(titles: &[&str], page: u32, last_page: u32) -> AnimeSearchResponse {
    AnimeSearchResponse {
        data: titles
            .iter()
            .enumerate()
            .map(|(idx, title)| anime(idx as u32 + 1, title))
            .collect(),
        pagination: Pagination {
            last_visible_page: last_page,
            has_next_page: page < last_page,
            current_page: page,
            items: Some(PaginationItems {
                count: titles.len() as u32,
                total: titles.len() as u32 * last_page,
                per_page: 25,
            }),
        },
    }
}

/// What the catalog was asked for, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(String, u32),
    Detail(u32),
}

#[derive(Debug, Clone)]
pub enum Reply<T> {
    Data(T),
    Service(u16, Option<String>),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, CatalogError> {
        match self {
            Reply::Data(data) => Ok(data),
            Reply::Service(status, message) => Err(CatalogError::Service {
                status: StatusCode::from_u16(status).unwrap(),
                message,
            }),
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    searches: HashMap<String, (Duration, Reply<AnimeSearchResponse>)>,
    details: HashMap<u32, (Duration, Reply<AnimeFull>)>,
    ignore_cancel: bool,
}

/// Catalog that replays scripted replies after scripted delays
///
/// Unscripted searches answer with a single item named `"{query} #{page}"`
/// out of three pages; unscripted lookups answer with `"Anime {id}"`.
#[derive(Default)]
pub struct FakeCatalog {
    state: Mutex<State>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(&self, query: &str, delay: Duration, reply: Reply<AnimeSearchResponse>) {
        self.state
            .lock()
            .unwrap()
            .searches
            .insert(query.to_string(), (delay, reply));
    }

    pub fn on_detail(&self, mal_id: u32, delay: Duration, reply: Reply<AnimeFull>) {
        self.state
            .lock()
            .unwrap()
            .details
            .insert(mal_id, (delay, reply));
    }

    /// Behave like a transport that cannot abort: replies arrive regardless
    pub fn ignore_cancel(&self) {
        self.state.lock().unwrap().ignore_cancel = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    async fn respond<T>(
        &self,
        cancel: &CancellationToken,
        delay: Duration,
        reply: Reply<T>,
        ignore_cancel: bool,
    ) -> Result<T, CatalogError> {
        if ignore_cancel {
            sleep(delay).await;
            return reply.into_result();
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(CatalogError::Canceled),
            _ = sleep(delay) => reply.into_result(),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search_anime(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeSearchResponse, CatalogError> {
        let (delay, reply, ignore_cancel) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Search(query.to_string(), page));
            let (delay, reply) = state.searches.get(query).cloned().unwrap_or_else(|| {
                let title = format!("{} #{}", query, page);
                (DEFAULT_LATENCY, Reply::Data(search_page(&[title.as_str()], page, 3)))
            });
            (delay, reply, state.ignore_cancel)
        };
        self.respond(cancel, delay, reply, ignore_cancel).await
    }

    async fn anime_full(
        &self,
        mal_id: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeFull, CatalogError> {
        let (delay, reply, ignore_cancel) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Detail(mal_id));
            let (delay, reply) = state.details.get(&mal_id).cloned().unwrap_or_else(|| {
                let title = format!("Anime {}", mal_id);
                (DEFAULT_LATENCY, Reply::Data(anime_full(mal_id, &title)))
            });
            (delay, reply, state.ignore_cancel)
        };
        self.respond(cancel, delay, reply, ignore_cancel).await
    }
}
