//! Error classification for provider-calling operations.
//!
//! Every failure coming back through a provider port is normalized into a
//! closed taxonomy before anything else looks at it:
//! - Retryable: network, api, provider, unknown
//! - Non-retryable: auth (credentials won't heal themselves), validation
//!
//! Classification is a pure mapping over the failure's text; the raw
//! diagnostic is kept for logs but never shown to the user.

use serde::Serialize;

use crate::types::Provider;

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Connectivity failure between the client and anything upstream.
    Network,
    /// Unauthorized / expired credentials. Remediation is re-authentication.
    Auth,
    /// 5xx-class upstream failure.
    Api,
    /// A named provider is having trouble.
    Provider,
    /// Malformed input; retrying the same request cannot succeed.
    Validation,
    /// Anything else. Assumed transient.
    Unknown,
}

impl ErrorKind {
    /// Whether failures of this kind are worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Network | ErrorKind::Api | ErrorKind::Provider | ErrorKind::Unknown => true,
            ErrorKind::Auth | ErrorKind::Validation => false,
        }
    }

    /// Stable human-readable message for this kind. This is the only text
    /// the presentation layer shows.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Connection problem. Check your internet connection and try again.",
            ErrorKind::Auth => "Your session has expired. Please sign in again.",
            ErrorKind::Api => "The service hit a temporary problem. Please try again.",
            ErrorKind::Provider => "A connected service is having trouble. Please try again shortly.",
            ErrorKind::Validation => "Something about this request looks invalid. Please review and try again.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::Api => "api",
            ErrorKind::Provider => "provider",
            ErrorKind::Validation => "validation",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure normalized into the fixed taxonomy, ready for the retry policy
/// and for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Raw diagnostic text. Logged, never rendered.
    pub message: String,
    #[serde(rename = "userFriendlyMessage")]
    pub user_friendly_message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "{} error ({}): {}", self.kind, status, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClassifiedError {}

// Auth and validation wording is checked ahead of the network catch-all so
// non-retryable failures are never masked as retryable network noise
// ("invalid token" is auth, not network and not validation).
const AUTH_WORDING: &[&str] = &["401", "unauthorized", "token", "credential"];
const VALIDATION_WORDING: &[&str] = &["validation", "invalid"];
const NETWORK_WORDING: &[&str] = &["network", "fetch", "connection", "offline"];
const API_WORDING: &[&str] = &["500", "502", "503", "server error", "bad gateway", "service unavailable"];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// Classify an arbitrary failure into exactly one `ClassifiedError`.
///
/// Pure pattern match over the lowercased failure text, first match wins:
/// auth, validation, network, known provider name, upstream 5xx, unknown.
/// `provider` and `status_code` context is carried through unchanged; when
/// no provider context is given but the text names one, the match is kept.
pub fn classify_failure(
    message: &str,
    provider: Option<Provider>,
    status_code: Option<u16>,
) -> ClassifiedError {
    let lowered = message.to_lowercase();

    let (kind, matched_provider) = if contains_any(&lowered, AUTH_WORDING) {
        (ErrorKind::Auth, None)
    } else if contains_any(&lowered, VALIDATION_WORDING) {
        (ErrorKind::Validation, None)
    } else if contains_any(&lowered, NETWORK_WORDING) {
        (ErrorKind::Network, None)
    } else if let Some(named) = provider_named_in(&lowered) {
        (ErrorKind::Provider, Some(named))
    } else if contains_any(&lowered, API_WORDING) {
        (ErrorKind::Api, None)
    } else {
        (ErrorKind::Unknown, None)
    };

    ClassifiedError {
        kind,
        message: message.to_string(),
        user_friendly_message: kind.user_message().to_string(),
        retryable: kind.is_retryable(),
        provider: provider.or(matched_provider),
        status_code,
    }
}

/// First known provider whose name (or product alias) appears in the text.
fn provider_named_in(lowered: &str) -> Option<Provider> {
    Provider::ALL
        .into_iter()
        .find(|p| contains_any(lowered, p.text_aliases()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_network() {
        let err = classify_failure("Failed to fetch", None, None);
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.retryable);
    }

    #[test]
    fn test_classify_401_wins_over_network_wording() {
        // Explicit 401 must classify as auth even alongside network wording.
        let err = classify_failure("network request failed with 401", None, None);
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(!err.retryable);
    }

    #[test]
    fn test_classify_invalid_token_is_auth_not_validation() {
        let err = classify_failure("invalid token", None, None);
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(!err.retryable);
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify_failure("Unauthorized", None, Some(401));
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.status_code, Some(401));
    }

    #[test]
    fn test_classify_validation_not_retryable() {
        let err = classify_failure("validation failed: missing subject", None, None);
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.retryable);
    }

    #[test]
    fn test_classify_validation_wins_over_network_wording() {
        let err = classify_failure("invalid response from network layer", None, None);
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_classify_provider_by_name() {
        let err = classify_failure("Gmail quota exceeded for today", None, None);
        assert_eq!(err.kind, ErrorKind::Provider);
        assert_eq!(err.provider, Some(Provider::Google));
        assert!(err.retryable);
    }

    #[test]
    fn test_classify_keeps_provider_context() {
        // Context wins over the text match.
        let err = classify_failure("notion sync stalled", Some(Provider::Microsoft), None);
        assert_eq!(err.kind, ErrorKind::Provider);
        assert_eq!(err.provider, Some(Provider::Microsoft));
    }

    #[test]
    fn test_classify_api_5xx() {
        let err = classify_failure("upstream returned 502 Bad Gateway", None, Some(502));
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.retryable);
    }

    #[test]
    fn test_classify_unknown_is_conservative_retryable() {
        let err = classify_failure("something odd happened", None, None);
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.retryable);
    }

    #[test]
    fn test_user_message_is_per_kind_not_raw() {
        let err = classify_failure("ECONNRESET while reading from network socket", None, None);
        assert_eq!(err.user_friendly_message, ErrorKind::Network.user_message());
        assert_ne!(err.user_friendly_message, err.message);
    }

    #[test]
    fn test_serializes_camel_case_for_ui() {
        let err = classify_failure("invalid token", None, Some(401));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "auth");
        assert_eq!(json["statusCode"], 401);
        assert!(json["userFriendlyMessage"].is_string());
    }
}
