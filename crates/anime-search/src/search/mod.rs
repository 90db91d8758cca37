//! Search view: URL-synchronized query, debounced searching and results.

pub mod coordinator;
pub mod history;
pub mod params;
pub mod store;

pub use coordinator::{SearchAction, SearchCoordinator, SearchHandle, SearchSnapshot, SearchView};
pub use history::{History, MemoryHistory};
pub use params::SearchParams;
pub use store::{SearchResults, SearchStore};
