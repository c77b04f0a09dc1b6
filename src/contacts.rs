//! Contact refresh cache.
//!
//! Holds the session's contact list and the state of the refresh that
//! produced it. A refresh records its request fingerprint before issuing the
//! fetch; a request whose fingerprint matches the in-flight or most recent
//! successful one is redundant and skipped (bypass with `no_cache`).
//! Concurrent non-identical refreshes are neither queued nor cancelled;
//! each sets `loading` independently and the last one to resolve wins.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ClassifiedError;
use crate::provider::ContactSource;
use crate::types::{Contact, ContactQuery};
use crate::util::{derive_company, name_from_email};

/// Normalized identity of a refresh request, used for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RefreshFingerprint {
    providers: Vec<&'static str>,
    query: String,
    company: String,
    limit: Option<u32>,
}

impl RefreshFingerprint {
    fn of(query: &ContactQuery) -> Self {
        let mut providers: Vec<&'static str> = query
            .effective_providers()
            .iter()
            .map(|p| p.as_str())
            .collect();
        providers.sort_unstable();
        providers.dedup();
        Self {
            providers,
            query: query.query.as_deref().unwrap_or("").trim().to_lowercase(),
            company: query.company.as_deref().unwrap_or("").trim().to_lowercase(),
            limit: query.limit,
        }
    }
}

#[derive(Default)]
struct CacheInner {
    contacts: Vec<Contact>,
    loading: bool,
    error: Option<ClassifiedError>,
    in_flight: Option<RefreshFingerprint>,
    last_completed: Option<RefreshFingerprint>,
}

/// Session-scoped contact cache. The cache is the only writer of its state;
/// callers observe it through the read accessors.
pub struct ContactCache {
    source: Arc<dyn ContactSource>,
    inner: Mutex<CacheInner>,
}

impl ContactCache {
    pub fn new(source: Arc<dyn ContactSource>) -> Self {
        Self {
            source,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Trigger a contact-list fetch.
    ///
    /// Returns the refreshed (or still-current, when deduplicated) contact
    /// list; failures are classified, stored for the observers, and
    /// returned. No automatic retry on this path; the classified error's
    /// `retryable` flag tells the caller whether re-invoking is worthwhile.
    pub async fn refresh(&self, query: ContactQuery) -> Result<Vec<Contact>, ClassifiedError> {
        let fingerprint = RefreshFingerprint::of(&query);

        {
            let mut inner = self.inner.lock();
            if !query.no_cache && is_redundant(&inner, &fingerprint) {
                log::debug!("contacts: refresh deduped (fingerprint unchanged)");
                return Ok(inner.contacts.clone());
            }
            inner.loading = true;
            inner.error = None;
            inner.in_flight = Some(fingerprint.clone());
        }

        // Lock released across the provider call; interleaving happens here.
        let result = self.source.search(&query).await;

        let mut inner = self.inner.lock();
        if inner.in_flight.as_ref() == Some(&fingerprint) {
            inner.in_flight = None;
        }
        inner.loading = false;

        match result {
            Ok(mut contacts) => {
                for contact in &mut contacts {
                    backfill(contact);
                }
                log::debug!("contacts: refresh resolved with {} contacts", contacts.len());
                inner.contacts = contacts.clone();
                inner.error = None;
                inner.last_completed = Some(fingerprint);
                Ok(contacts)
            }
            Err(failure) => {
                let classified = failure.classify();
                log::warn!("contacts: refresh failed: {}", classified);
                inner.error = Some(classified.clone());
                Err(classified)
            }
        }
    }

    /// Current contact list snapshot.
    pub fn contacts(&self) -> Vec<Contact> {
        self.inner.lock().contacts.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    pub fn last_error(&self) -> Option<ClassifiedError> {
        self.inner.lock().error.clone()
    }

    /// Display string for the last failure, if any.
    pub fn error_message(&self) -> Option<String> {
        self.inner
            .lock()
            .error
            .as_ref()
            .map(|e| e.user_friendly_message.clone())
    }
}

/// A request is redundant when its fingerprint matches the in-flight one or
/// the most recent successful one.
fn is_redundant(inner: &CacheInner, fingerprint: &RefreshFingerprint) -> bool {
    if inner.in_flight.as_ref() == Some(fingerprint) {
        return true;
    }
    inner.error.is_none() && inner.last_completed.as_ref() == Some(fingerprint)
}

/// Fill in fields a provider omitted, derived from the email address.
fn backfill(contact: &mut Contact) {
    if contact.name.trim().is_empty() {
        contact.name = name_from_email(&contact.email);
    }
    if contact.company.is_none() {
        contact.company = derive_company(&contact.email);
    }
}
