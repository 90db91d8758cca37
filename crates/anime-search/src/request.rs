//! Single-slot request tracking built on cancellation tokens.
//!
//! A store owns one [`RequestSlot`]. Issuing a request cancels whatever the
//! slot held before, and a finished request may only touch state if its token
//! is still live.

use crate::api::CatalogError;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The one request a store may have in flight
#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous request and hand out a token for the next one
    pub fn issue(&mut self) -> CancellationToken {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }

    /// Cancel the request in flight; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Release the slot for a finished request
    ///
    /// Returns `false` when the request was canceled or superseded; its
    /// result must then be dropped without touching state. A live token is
    /// always the current one because [`RequestSlot::issue`] cancels its
    /// predecessor.
    pub fn complete(&mut self, token: &CancellationToken) -> bool {
        if token.is_cancelled() || self.current.is_none() {
            return false;
        }
        self.current = None;
        true
    }
}

impl Drop for RequestSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A finished request, reported back to the task that owns the store
#[derive(Debug)]
pub struct Completion<T> {
    pub token: CancellationToken,
    pub outcome: Result<T, CatalogError>,
}

/// Run `request` in the background and report its outcome on `completions`
pub fn spawn_request<T, F>(
    token: CancellationToken,
    completions: mpsc::UnboundedSender<Completion<T>>,
    request: F,
) where
    T: Send + 'static,
    F: Future<Output = Result<T, CatalogError>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = request.await;
        // Receiver gone means the owning view was torn down
        let _ = completions.send(Completion { token, outcome });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_cancels_previous() {
        let mut slot = RequestSlot::new();
        let first = slot.issue();
        let second = slot.issue();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!slot.complete(&first));
        assert!(slot.complete(&second));
        // Released: completing again is refused
        assert!(!slot.complete(&second));
        assert!(!slot.cancel());
    }

    #[test]
    fn test_cancel_and_drop() {
        let mut slot = RequestSlot::new();
        assert!(!slot.cancel());

        let token = slot.issue();
        assert!(slot.cancel());
        assert!(token.is_cancelled());
        assert!(!slot.complete(&token));

        let token = {
            let mut slot = RequestSlot::new();
            slot.issue()
        };
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_spawn_request_reports_outcome() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        spawn_request(token.clone(), tx, async { Ok::<_, CatalogError>(42u32) });

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.outcome.unwrap(), 42);
        assert!(!completion.token.is_cancelled());
    }
}
