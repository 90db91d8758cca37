//! Failure taxonomy for catalog requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Fallback shown when a search fails without a service message
pub const SEARCH_FAILED: &str = "Failed to fetch anime";

/// Fallback shown when a detail lookup fails without a service message
pub const DETAIL_FAILED: &str = "Failed to fetch anime details";

/// Outcome of a catalog request that did not produce data
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request was superseded or its view went away.
    ///
    /// Never surfaced to the user and never stored as a failure.
    #[error("request canceled")]
    Canceled,

    /// The service answered with a non-success status
    #[error("catalog service returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Service {
        status: StatusCode,
        message: Option<String>,
    },

    /// The request never got a usable response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered 2xx with a body we could not read
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, CatalogError::Canceled)
    }

    /// Human-readable message for a failed lifecycle
    ///
    /// Uses the service's own message when it sent one, `fallback` otherwise.
    pub fn failure_message(&self, fallback: &str) -> String {
        match self {
            CatalogError::Service {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            CatalogError::Service { .. }
            | CatalogError::Transport(_)
            | CatalogError::Decode(_)
            | CatalogError::Canceled => fallback.to_string(),
        }
    }
}
