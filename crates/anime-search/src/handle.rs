//! Channel pair connecting a presentation layer to a running coordinator.

use tokio::sync::{mpsc, watch};

/// Sends actions to a coordinator task and watches its snapshots
///
/// Dropping every handle stops the coordinator, which cancels whatever it
/// still had in flight.
#[derive(Debug)]
pub struct ViewHandle<A, S> {
    actions: mpsc::UnboundedSender<A>,
    state: watch::Receiver<S>,
}

impl<A, S> Clone for ViewHandle<A, S> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            state: self.state.clone(),
        }
    }
}

impl<A, S: Clone> ViewHandle<A, S> {
    pub(crate) fn new(actions: mpsc::UnboundedSender<A>, state: watch::Receiver<S>) -> Self {
        Self { actions, state }
    }

    /// Queue an action; `false` once the coordinator has stopped
    pub fn dispatch(&self, action: A) -> bool {
        self.actions.send(action).is_ok()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    /// Wait for the next snapshot; `None` once the coordinator has stopped
    pub async fn changed(&mut self) -> Option<S> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one first
    pub async fn wait_for(&mut self, predicate: impl FnMut(&S) -> bool) -> Option<S> {
        let snapshot = self.state.wait_for(predicate).await.ok()?;
        Some((*snapshot).clone())
    }
}
