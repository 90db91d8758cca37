//! Request lifecycle shared by the search and detail stores.

use serde::{Deserialize, Serialize};

/// Where a store is in its fetch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl Lifecycle {
    /// A request finished and its outcome is on display
    pub fn is_settled(self) -> bool {
        match self {
            Lifecycle::Succeeded | Lifecycle::Failed => true,
            Lifecycle::Idle | Lifecycle::Loading => false,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Idle => write!(f, "idle"),
            Lifecycle::Loading => write!(f, "loading"),
            Lifecycle::Succeeded => write!(f, "succeeded"),
            Lifecycle::Failed => write!(f, "failed"),
        }
    }
}
