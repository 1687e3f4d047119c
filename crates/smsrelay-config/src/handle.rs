// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot-swappable configuration handle.
//!
//! The backend base URL is user-editable at any time, while sync attempts
//! may already be in flight. Attempts take an immutable snapshot at start
//! and keep it for their whole invocation; writers swap in a complete new
//! config atomically, so no attempt ever observes a torn value.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::model::RelayConfig;

/// Shared, atomically-swappable view of the relay configuration.
///
/// Cloning the handle is cheap; all clones observe the same underlying
/// storage. `snapshot()` is lock-free on the read path.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<RelayConfig>>,
}

impl ConfigHandle {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Returns the current configuration as an immutable snapshot.
    ///
    /// Each pipeline invocation calls this exactly once, at attempt start,
    /// and is not required to react to a concurrent update.
    pub fn snapshot(&self) -> Arc<RelayConfig> {
        self.inner.load_full()
    }

    /// Atomically replaces the whole configuration.
    ///
    /// In-flight attempts keep the snapshot they started with.
    pub fn update(&self, config: RelayConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Convenience for the settings boundary: replaces only the backend
    /// base URL, keeping everything else.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let mut next = (*self.inner.load_full()).clone();
        next.backend.base_url = base_url.into();
        self.inner.store(Arc::new(next));
    }

    /// Convenience for the settings boundary: the current base URL.
    pub fn base_url(&self) -> String {
        self.inner.load().backend.base_url.clone()
    }
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("base_url", &self.inner.load().backend.base_url)
            .finish()
    }
}
