//! Jikan API v4 client implementation.
//!
//! This module provides a cancellable, read-only client for the Jikan API
//! (MyAnimeList unofficial API) and the failure taxonomy the stores consume.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogApi, JikanClient};
pub use error::{CatalogError, DETAIL_FAILED, SEARCH_FAILED};
pub use types::*;
