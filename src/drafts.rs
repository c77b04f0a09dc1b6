//! Draft lifecycle manager.
//!
//! Owns every in-progress outbound artifact for the session. Mutation is
//! permitted only while a draft is in `draft` status; terminal actions
//! (`send`/`discard`) apply their status transition optimistically, run the
//! provider call under the retry policy, and roll the transition back if the
//! call ultimately fails, so the user never observes a draft stuck in a
//! transitional status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::error::ClassifiedError;
use crate::provider::DraftTransport;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::types::{Draft, DraftAction, DraftStatus, DraftType};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft not found: {0}")]
    NotFound(String),

    #[error("draft {id} is {status} and can no longer be modified")]
    InvalidState { id: String, status: DraftStatus },

    /// The provider call behind an action failed after retry was exhausted
    /// or refused.
    #[error(transparent)]
    Action(#[from] ClassifiedError),
}

/// Result of a successfully executed draft action: the draft as it stands
/// afterwards plus whatever payload the provider returned (meaningful for
/// non-terminal actions like a preview).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub draft: Draft,
    pub payload: serde_json::Value,
}

/// Single owner of the session's drafts. Editor/metadata/action panes get
/// clones and callback hooks, never authoritative state.
pub struct DraftManager {
    transport: Arc<dyn DraftTransport>,
    retry: RetryPolicy,
    drafts: RwLock<HashMap<String, Draft>>,
}

impl DraftManager {
    pub fn new(transport: Arc<dyn DraftTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            drafts: RwLock::new(HashMap::new()),
        }
    }

    /// Allocate a new draft in `draft` status. The only creation path.
    pub fn create(
        &self,
        draft_type: DraftType,
        initial_metadata: HashMap<String, serde_json::Value>,
    ) -> Draft {
        let now = Utc::now();
        let draft = Draft {
            id: uuid::Uuid::new_v4().to_string(),
            draft_type,
            content: String::new(),
            metadata: initial_metadata,
            status: DraftStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        log::debug!("drafts: created {} ({})", draft.id, draft_type);
        self.drafts.write().insert(draft.id.clone(), draft.clone());
        draft
    }

    /// Snapshot of one draft.
    pub fn get(&self, id: &str) -> Option<Draft> {
        self.drafts.read().get(id).cloned()
    }

    /// Snapshots of all open drafts.
    pub fn list(&self) -> Vec<Draft> {
        self.drafts.read().values().cloned().collect()
    }

    /// Replace the draft's content. Permitted only in `draft` status.
    pub fn update_content(&self, id: &str, content: &str) -> Result<Draft, DraftError> {
        self.mutate(id, |draft| {
            draft.content = content.to_string();
        })
    }

    /// Shallow-merge fields into the draft's metadata. Permitted only in
    /// `draft` status; existing keys not named in `partial` are kept.
    pub fn update_metadata(
        &self,
        id: &str,
        partial: HashMap<String, serde_json::Value>,
    ) -> Result<Draft, DraftError> {
        self.mutate(id, |draft| {
            draft.metadata.extend(partial);
        })
    }

    /// Execute an action against the draft through the provider layer.
    ///
    /// Terminal actions transition the status optimistically before the
    /// call and roll back to `draft` if it fails; non-terminal actions
    /// never change the status. Retry eligibility is governed by the retry
    /// policy; the surfaced failure is always classified.
    pub async fn execute_action(
        &self,
        id: &str,
        action: DraftAction,
    ) -> Result<ActionOutcome, DraftError> {
        let terminal = action.terminal_status();

        // Phase 1: optimistic transition, snapshot for the call.
        let snapshot = {
            let mut drafts = self.drafts.write();
            let draft = drafts
                .get_mut(id)
                .ok_or_else(|| DraftError::NotFound(id.to_string()))?;
            if draft.status != DraftStatus::Draft {
                return Err(DraftError::InvalidState {
                    id: id.to_string(),
                    status: draft.status,
                });
            }
            if let Some(status) = terminal {
                draft.status = status;
                log::debug!("drafts: {} optimistically {}", id, status);
            }
            draft.clone()
        };

        // Phase 2: provider call under the retry policy. The lock is
        // released here, so this is the only interleaving point.
        let result = call_with_retry(&self.retry, || {
            let transport = Arc::clone(&self.transport);
            let draft = snapshot.clone();
            let action = action.clone();
            async move { transport.execute(&draft, &action).await }
        })
        .await;

        // Phase 3: commit or roll back.
        let mut drafts = self.drafts.write();
        match result {
            Ok(payload) => {
                let draft = match drafts.get(id) {
                    Some(draft) => draft.clone(),
                    // Closed while in flight; the result applies to nothing,
                    // return the snapshot that was acted on.
                    None => snapshot,
                };
                Ok(ActionOutcome { draft, payload })
            }
            Err(classified) => {
                if terminal.is_some() {
                    if let Some(draft) = drafts.get_mut(id) {
                        if draft.status != DraftStatus::Draft {
                            draft.status = DraftStatus::Draft;
                            log::warn!(
                                "drafts: {} action {} failed, rolled back to draft ({})",
                                id,
                                action,
                                classified
                            );
                        }
                    }
                }
                Err(DraftError::Action(classified))
            }
        }
    }

    /// Release the manager's handle on a draft. Does not touch anything
    /// persisted elsewhere; an in-flight action's late result is ignored.
    pub fn close(&self, id: &str) -> Result<(), DraftError> {
        match self.drafts.write().remove(id) {
            Some(draft) => {
                log::debug!("drafts: closed {} ({})", id, draft.status);
                Ok(())
            }
            None => Err(DraftError::NotFound(id.to_string())),
        }
    }

    /// Apply `f` to a draft that must still be editable, refreshing
    /// `updated_at`.
    fn mutate(&self, id: &str, f: impl FnOnce(&mut Draft)) -> Result<Draft, DraftError> {
        let mut drafts = self.drafts.write();
        let draft = drafts
            .get_mut(id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))?;
        if draft.status != DraftStatus::Draft {
            return Err(DraftError::InvalidState {
                id: id.to_string(),
                status: draft.status,
            });
        }
        f(draft);
        draft.updated_at = Utc::now();
        Ok(draft.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::ProviderFailure;

    /// Scripted transport: pops the next result per call (defaulting to
    /// success), counts calls, optionally holds each call open.
    struct FakeTransport {
        calls: AtomicUsize,
        results: Mutex<Vec<Result<serde_json::Value, ProviderFailure>>>,
        delay_ms: u64,
    }

    impl FakeTransport {
        fn succeeding() -> Self {
            Self::returning(Vec::new())
        }

        fn returning(results: Vec<Result<serde_json::Value, ProviderFailure>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results),
                delay_ms: 0,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DraftTransport for FakeTransport {
        async fn execute(
            &self,
            _draft: &Draft,
            _action: &DraftAction,
        ) -> Result<serde_json::Value, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            let mut results = self.results.lock();
            if results.is_empty() {
                Ok(json!({"ok": true}))
            } else {
                results.remove(0)
            }
        }
    }

    fn manager(transport: FakeTransport) -> (Arc<FakeTransport>, DraftManager) {
        let transport = Arc::new(transport);
        let manager = DraftManager::new(Arc::clone(&transport) as Arc<dyn DraftTransport>);
        (transport, manager)
    }

    #[test]
    fn test_create_starts_in_draft_status() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        assert_eq!(draft.status, DraftStatus::Draft);
        assert!(draft.content.is_empty());
        assert_eq!(draft.created_at, draft.updated_at);
        assert!(manager.get(&draft.id).is_some());
    }

    #[test]
    fn test_update_content_refreshes_updated_at() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        let updated = manager.update_content(&draft.id, "Thanks!").unwrap();
        assert_eq!(updated.content, "Thanks!");
        assert!(updated.updated_at >= draft.updated_at);
    }

    #[test]
    fn test_update_metadata_merges_not_replaces() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(
            DraftType::EmailReply,
            [("subject".to_string(), json!("Re: sync"))].into(),
        );
        let updated = manager
            .update_metadata(&draft.id, [("to".to_string(), json!("jane@acme.com"))].into())
            .unwrap();
        assert_eq!(updated.metadata["subject"], json!("Re: sync"));
        assert_eq!(updated.metadata["to"], json!("jane@acme.com"));
    }

    #[test]
    fn test_update_unknown_draft_not_found() {
        let (_, manager) = manager(FakeTransport::succeeding());
        assert!(matches!(
            manager.update_content("nope", "x"),
            Err(DraftError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sent_draft_rejects_further_mutation() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        manager
            .execute_action(&draft.id, DraftAction::Send)
            .await
            .unwrap();

        let err = manager.update_content(&draft.id, "too late").unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidState {
                status: DraftStatus::Sent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_failure_rolls_back_to_draft() {
        let (_, manager) = manager(FakeTransport::returning(vec![Err(ProviderFailure::new(
            "validation failed: empty recipient",
        ))]));
        let draft = manager.create(DraftType::EmailReply, HashMap::new());

        let err = manager
            .execute_action(&draft.id, DraftAction::Send)
            .await
            .unwrap_err();
        match err {
            DraftError::Action(classified) => {
                assert_eq!(classified.kind, ErrorKind::Validation);
                assert_eq!(
                    classified.user_friendly_message,
                    ErrorKind::Validation.user_message()
                );
            }
            other => panic!("expected action error, got {other:?}"),
        }
        assert_eq!(manager.get(&draft.id).unwrap().status, DraftStatus::Draft);
    }

    #[tokio::test]
    async fn test_discard_transitions_to_discarded() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::CalendarChange, HashMap::new());
        let outcome = manager
            .execute_action(&draft.id, DraftAction::Discard)
            .await
            .unwrap();
        assert_eq!(outcome.draft.status, DraftStatus::Discarded);
    }

    #[tokio::test]
    async fn test_non_terminal_action_leaves_status_alone() {
        let (transport, manager) = manager(FakeTransport::returning(vec![Ok(
            json!({"rendered": "<p>Thanks!</p>"}),
        )]));
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        let outcome = manager
            .execute_action(&draft.id, DraftAction::Provider("preview".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome.draft.status, DraftStatus::Draft);
        assert_eq!(outcome.payload["rendered"], json!("<p>Thanks!</p>"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_retries_transient_failures_then_commits() {
        let (transport, manager) = manager(FakeTransport::returning(vec![
            Err(ProviderFailure::new("network hiccup")),
            Err(ProviderFailure::new("upstream 503").with_status(503)),
        ]));
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        let outcome = manager
            .execute_action(&draft.id, DraftAction::Send)
            .await
            .unwrap();
        assert_eq!(outcome.draft.status, DraftStatus::Sent);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_terminal_action_while_in_flight_is_invalid_state() {
        let (transport, manager) = manager(FakeTransport {
            calls: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
            delay_ms: 1_000,
        });
        let manager = Arc::new(manager);
        let draft = manager.create(DraftType::EmailReply, HashMap::new());

        let first = {
            let manager = Arc::clone(&manager);
            let id = draft.id.clone();
            tokio::spawn(async move { manager.execute_action(&id, DraftAction::Send).await })
        };
        tokio::task::yield_now().await;

        // The optimistic transition doubles as a double-send guard.
        let err = manager
            .execute_action(&draft.id, DraftAction::Send)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidState { .. }));

        first.await.unwrap().unwrap();
        assert_eq!(transport.call_count(), 1);
        assert_eq!(manager.get(&draft.id).unwrap().status, DraftStatus::Sent);
    }

    #[tokio::test]
    async fn test_close_releases_handle() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::MeetingPoll, HashMap::new());
        manager.close(&draft.id).unwrap();
        assert!(manager.get(&draft.id).is_none());
        assert!(matches!(
            manager.close(&draft.id),
            Err(DraftError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_action_in_flight_ignores_late_result() {
        let (transport, manager) = manager(FakeTransport {
            calls: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
            delay_ms: 1_000,
        });
        let manager = Arc::new(manager);
        let draft = manager.create(DraftType::EmailReply, HashMap::new());

        let action = {
            let manager = Arc::clone(&manager);
            let id = draft.id.clone();
            tokio::spawn(async move { manager.execute_action(&id, DraftAction::Send).await })
        };
        tokio::task::yield_now().await;
        manager.close(&draft.id).unwrap();

        // Late success resolves against the snapshot; nothing reappears.
        let outcome = action.await.unwrap().unwrap();
        assert_eq!(outcome.draft.status, DraftStatus::Sent);
        assert!(manager.get(&draft.id).is_none());
        assert_eq!(transport.call_count(), 1);
    }

    // Full editing pass: create → edit → send → frozen.
    #[tokio::test]
    async fn test_email_reply_lifecycle() {
        let (_, manager) = manager(FakeTransport::succeeding());
        let draft = manager.create(DraftType::EmailReply, HashMap::new());
        assert!(draft.content.is_empty());

        manager
            .update_content(&draft.id, "Thanks, confirmed.")
            .unwrap();
        let outcome = manager
            .execute_action(&draft.id, DraftAction::Send)
            .await
            .unwrap();

        assert_eq!(outcome.draft.status, DraftStatus::Sent);
        assert_eq!(outcome.draft.content, "Thanks, confirmed.");
        assert!(manager.update_content(&draft.id, "more").is_err());
    }
}
