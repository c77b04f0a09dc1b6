use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Providers and tools
// =============================================================================

/// External services the assistant aggregates data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Calendar + Gmail.
    Google,
    /// Outlook calendar + mail.
    Microsoft,
    /// Documents.
    Notion,
    /// Package tracking.
    Aftership,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Google,
        Provider::Microsoft,
        Provider::Notion,
        Provider::Aftership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Microsoft => "microsoft",
            Provider::Notion => "notion",
            Provider::Aftership => "aftership",
        }
    }

    /// Lowercase substrings that identify this provider in diagnostic text.
    /// Product names count: a Gmail failure is a Google failure.
    pub fn text_aliases(&self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["google", "gmail"],
            Provider::Microsoft => &["microsoft", "outlook"],
            Provider::Notion => &["notion"],
            Provider::Aftership => &["aftership"],
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level functional areas of the assistant. Closed set; these are the
/// keys of every per-tool map in `ToolState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Calendar,
    Email,
    Documents,
    Packages,
    Meetings,
    Drafts,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Calendar,
        Tool::Email,
        Tool::Documents,
        Tool::Packages,
        Tool::Meetings,
        Tool::Drafts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Calendar => "calendar",
            Tool::Email => "email",
            Tool::Documents => "documents",
            Tool::Packages => "packages",
            Tool::Meetings => "meetings",
            Tool::Drafts => "drafts",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Drafts
// =============================================================================

/// Kinds of outbound artifacts a draft can hold. The lifecycle manager is
/// type-agnostic; the kind only selects which metadata fields and actions the
/// editor panes offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftType {
    EmailReply,
    CalendarChange,
    MeetingPoll,
    DocumentShare,
}

impl DraftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftType::EmailReply => "email-reply",
            DraftType::CalendarChange => "calendar-change",
            DraftType::MeetingPoll => "meeting-poll",
            DraftType::DocumentShare => "document-share",
        }
    }

    /// Metadata keys that are meaningful for this kind. The editor renders
    /// inputs for these; the manager merges whatever it is given.
    pub fn metadata_fields(&self) -> &'static [&'static str] {
        match self {
            DraftType::EmailReply => &["to", "cc", "subject", "threadId"],
            DraftType::CalendarChange => &["eventId", "title", "start", "end", "attendees"],
            DraftType::MeetingPoll => &["title", "slots", "participants"],
            DraftType::DocumentShare => &["documentId", "recipients", "permission"],
        }
    }

    /// Action names the action pane offers for this kind. `send` and
    /// `discard` are terminal; the rest are provider-specific pass-throughs.
    pub fn supported_actions(&self) -> &'static [&'static str] {
        match self {
            DraftType::EmailReply => &["send", "discard", "preview"],
            DraftType::CalendarChange => &["send", "discard"],
            DraftType::MeetingPoll => &["send", "discard", "preview"],
            DraftType::DocumentShare => &["send", "discard"],
        }
    }
}

impl std::fmt::Display for DraftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draft lifecycle status. `Sent` and `Discarded` are terminal: once
/// reached, no further mutation is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Sent,
    Discarded,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Sent => "sent",
            DraftStatus::Discarded => "discarded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Sent | DraftStatus::Discarded)
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action executed against a draft through the provider layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAction {
    Send,
    Discard,
    /// Provider-specific action (e.g. "preview"). Passed through opaquely;
    /// never changes the draft's status.
    Provider(String),
}

impl DraftAction {
    pub fn name(&self) -> &str {
        match self {
            DraftAction::Send => "send",
            DraftAction::Discard => "discard",
            DraftAction::Provider(name) => name,
        }
    }

    /// The terminal status this action transitions to, if any.
    pub fn terminal_status(&self) -> Option<DraftStatus> {
        match self {
            DraftAction::Send => Some(DraftStatus::Sent),
            DraftAction::Discard => Some(DraftStatus::Discarded),
            DraftAction::Provider(_) => None,
        }
    }
}

impl std::fmt::Display for DraftAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-progress outbound artifact. Exclusively owned by the
/// `DraftManager` for the duration of an editing session; everything else
/// gets clones of this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    #[serde(rename = "type")]
    pub draft_type: DraftType,
    pub content: String,
    /// Kind-specific fields (participants, subject, timing, …). Merged, not
    /// replaced, on partial update.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Tool navigation state
// =============================================================================

/// Per-tool enabled flag plus a free-form preference mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub preferences: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            preferences: HashMap::new(),
        }
    }
}

/// Partial update for `ToolSettings`: unset fields are left alone,
/// preferences merge per key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettingsUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub preferences: HashMap<String, serde_json::Value>,
}

/// Secondary navigation state within the meetings tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingSubView {
    List,
    View,
    Edit,
    New,
}

impl MeetingSubView {
    /// Only `view` and `edit` address a specific poll.
    pub fn addresses_poll(&self) -> bool {
        matches!(self, MeetingSubView::View | MeetingSubView::Edit)
    }
}

/// Full navigation state snapshot, serialized to the presentation layer.
///
/// `previous_meeting_*` is a single-slot memory of the immediately preceding
/// sub-view: one "go back" step, not a history stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub active_tool: Option<Tool>,
    #[serde(default)]
    pub tool_settings: HashMap<Tool, ToolSettings>,
    #[serde(default)]
    pub last_visited: HashMap<Tool, String>,
    #[serde(default)]
    pub visit_timestamps: HashMap<Tool, DateTime<Utc>>,
    pub meeting_sub_view: MeetingSubView,
    pub meeting_poll_id: Option<String>,
    pub previous_meeting_sub_view: MeetingSubView,
    pub previous_meeting_poll_id: Option<String>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active_tool: None,
            tool_settings: HashMap::new(),
            last_visited: HashMap::new(),
            visit_timestamps: HashMap::new(),
            meeting_sub_view: MeetingSubView::List,
            meeting_poll_id: None,
            previous_meeting_sub_view: MeetingSubView::List,
            previous_meeting_poll_id: None,
        }
    }
}

// =============================================================================
// Contacts
// =============================================================================

/// A contact as surfaced to the assistant UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Which provider this contact came from.
    pub provider: Provider,
}

/// Parameters for a contact refresh. The normalized form of these fields is
/// the request fingerprint used for de-duplication.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQuery {
    /// Providers to query. Empty means all providers.
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Bypass fingerprint de-duplication and force a fetch.
    #[serde(default)]
    pub no_cache: bool,
}

impl ContactQuery {
    /// The providers this query actually targets (empty list = all).
    pub fn effective_providers(&self) -> Vec<Provider> {
        if self.providers.is_empty() {
            Provider::ALL.to_vec()
        } else {
            self.providers.clone()
        }
    }
}
