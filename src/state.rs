//! Session state container.
//!
//! One `SessionState` per active session, built from injected provider
//! ports and threaded through the call graph, not an ambient singleton, so
//! tests (and a second window, if it ever comes) instantiate independent
//! instances. State is scoped to the session and never persisted.

use std::sync::Arc;

use crate::contacts::ContactCache;
use crate::drafts::DraftManager;
use crate::navigation::ToolNavigator;
use crate::provider::{ContactSource, DraftTransport};

/// Owns the three single-owner state instances of a session. Each field is
/// the only writer of its own state; callers go through the documented
/// operations.
pub struct SessionState {
    pub navigation: ToolNavigator,
    pub drafts: DraftManager,
    pub contacts: ContactCache,
}

impl SessionState {
    /// Build a session around the provider ports supplied by the (out of
    /// scope) provider API layer. The ports arrive already scoped to the
    /// signed-in account.
    pub fn new(transport: Arc<dyn DraftTransport>, contacts: Arc<dyn ContactSource>) -> Self {
        Self {
            navigation: ToolNavigator::new(),
            drafts: DraftManager::new(transport),
            contacts: ContactCache::new(contacts),
        }
    }
}
