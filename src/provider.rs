//! Provider port: the seam between this core and the (out of scope)
//! provider API layer.
//!
//! The transport's contract toward the core is `call(..) ->
//! success(payload) | failure(reason)`; the reason is a `ProviderFailure`
//! fed into the classifier unmodified. Session scoping happens at port
//! construction: an injected transport is already bound to one account, so
//! the core never inspects an identifier.

use async_trait::async_trait;

use crate::error::{classify_failure, ClassifiedError};
use crate::types::{Contact, ContactQuery, Draft, DraftAction, Provider};

/// The error-like value a provider call fails with. Carried into
/// classification unmodified.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub message: String,
    pub provider: Option<Provider>,
    pub status_code: Option<u16>,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: None,
            status_code: None,
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Run this failure through the classifier.
    pub fn classify(&self) -> ClassifiedError {
        classify_failure(&self.message, self.provider, self.status_code)
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.provider, self.status_code) {
            (Some(provider), Some(status)) => {
                write!(f, "{} ({}): {}", provider, status, self.message)
            }
            (Some(provider), None) => write!(f, "{}: {}", provider, self.message),
            (None, Some(status)) => write!(f, "({}): {}", status, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderFailure {}

/// Executes draft actions against the owning provider (send an email reply,
/// apply a calendar change, …). Implemented by the provider API layer.
#[async_trait]
pub trait DraftTransport: Send + Sync {
    async fn execute(
        &self,
        draft: &Draft,
        action: &DraftAction,
    ) -> Result<serde_json::Value, ProviderFailure>;
}

/// Fetches contact lists across providers. Implemented by the provider API
/// layer.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn search(&self, query: &ContactQuery) -> Result<Vec<Contact>, ProviderFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_failure_classification_carries_context() {
        let failure = ProviderFailure::new("Unauthorized")
            .with_provider(Provider::Google)
            .with_status(401);
        let classified = failure.classify();
        assert_eq!(classified.kind, ErrorKind::Auth);
        assert_eq!(classified.provider, Some(Provider::Google));
        assert_eq!(classified.status_code, Some(401));
    }

    #[test]
    fn test_failure_display() {
        let failure = ProviderFailure::new("rate limited").with_provider(Provider::Notion);
        assert_eq!(failure.to_string(), "notion: rate limited");
    }
}
