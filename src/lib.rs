//! Client-side state and resilience core for the DayHub assistant.
//!
//! Three coupled subsystems carry the session's non-trivial logic:
//! - [`drafts::DraftManager`]: lifecycle of in-progress outbound artifacts,
//!   with optimistic terminal transitions rolled back on failure.
//! - [`navigation::ToolNavigator`]: active tool, per-tool recency, and the
//!   meetings tool's one-slot sub-view back memory.
//! - [`error`] + [`retry`]: failure classification into a closed taxonomy
//!   and bounded deterministic backoff, consumed by every provider-calling
//!   path (including [`contacts::ContactCache`]).
//!
//! Rendering, auth, and HTTP transport live outside; the provider layer is
//! injected through the port traits in [`provider`].

pub mod contacts;
pub mod drafts;
pub mod error;
pub mod navigation;
pub mod provider;
pub mod retry;
pub mod state;
pub mod types;
pub mod util;

pub use error::{classify_failure, ClassifiedError, ErrorKind};
pub use provider::{ContactSource, DraftTransport, ProviderFailure};
pub use retry::{call_with_retry, RetryPolicy};
pub use state::SessionState;
