//! Anime catalog search and detail viewer core
//!
//! Debounced, URL-synchronized search over the Jikan API with race-free
//! result handling, plus a detail lookup keyed by identifier.

pub mod api;
pub mod debounce;
pub mod detail;
pub mod display;
pub mod handle;
pub mod lifecycle;
pub mod request;
pub mod search;

#[cfg(test)]
mod testing;

pub use api::{CatalogApi, CatalogError, JikanClient};
pub use detail::{DetailAction, DetailCoordinator, DetailHandle, DetailSnapshot, DetailView};
pub use handle::ViewHandle;
pub use lifecycle::Lifecycle;
pub use search::{
    History, MemoryHistory, SearchAction, SearchCoordinator, SearchHandle, SearchParams,
    SearchSnapshot, SearchView,
};
