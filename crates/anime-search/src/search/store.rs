//! Search result store.
//!
//! Holds the lifecycle and payload of the last search. Items and pagination
//! travel together in [`SearchResults`] and only exist while the lifecycle is
//! [`Lifecycle::Succeeded`].

use crate::api::{Anime, AnimeSearchResponse, Pagination};
use crate::lifecycle::Lifecycle;

/// One page of results, as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// Relevance order, never re-sorted locally
    pub items: Vec<Anime>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStore {
    lifecycle: Lifecycle,
    results: Option<SearchResults>,
    error: Option<String>,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new search started; whatever was shown before is dropped
    pub fn begin(&mut self) {
        self.lifecycle = Lifecycle::Loading;
        self.results = None;
        self.error = None;
    }

    pub fn succeed(&mut self, response: AnimeSearchResponse) {
        self.lifecycle = Lifecycle::Succeeded;
        self.results = Some(SearchResults {
            items: response.data,
            pagination: response.pagination,
        });
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.lifecycle = Lifecycle::Failed;
        self.results = None;
        self.error = Some(message);
    }

    /// Back to idle with nothing to show, from any state
    pub fn clear(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.results = None;
        self.error = None;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn results(&self) -> Option<&SearchResults> {
        self.results.as_ref()
    }

    pub fn items(&self) -> &[Anime] {
        self.results
            .as_ref()
            .map(|results| results.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.results.as_ref().map(|results| &results.pagination)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
