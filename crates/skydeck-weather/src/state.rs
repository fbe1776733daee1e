//! Load state machine for the city store.
//!
//! `Idle -> Loading -> {Ready, Failed}`; a new refresh may start from any
//! state except `Loading`, so at most one fetch is in flight.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl LoadState {
    /// True if a new refresh can be started.
    pub fn can_start_refresh(self) -> bool {
        !matches!(self, LoadState::Loading)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// State after a refresh completes.
    pub fn on_refresh_done(self, succeeded: bool) -> Self {
        if succeeded {
            LoadState::Ready
        } else {
            LoadState::Failed
        }
    }
}
