//! Tool navigation controller.
//!
//! State machine over `ToolState`: which top-level tool is active, per-tool
//! last-visited location and recency, and the one-slot back memory for the
//! meetings tool's sub-views. No tool is active until the caller activates
//! one, and there is no terminal state; the controller runs for the
//! lifetime of a session.

use chrono::Utc;
use parking_lot::RwLock;

use crate::types::{MeetingSubView, Tool, ToolSettings, ToolSettingsUpdate, ToolState};

/// Single owner of the session's `ToolState`. All mutation goes through the
/// operations below; the presentation layer renders from `snapshot()`.
#[derive(Default)]
pub struct ToolNavigator {
    state: RwLock<ToolState>,
}

impl ToolNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tool` the active tool and record the visit time.
    pub fn set_active_tool(&self, tool: Tool) {
        let mut state = self.state.write();
        state.active_tool = Some(tool);
        state.visit_timestamps.insert(tool, Utc::now());
        log::debug!("navigation: active tool -> {}", tool);
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.state.read().active_tool
    }

    /// Record a tool's last path without switching focus to it.
    pub fn set_last_visited(&self, tool: Tool, path: impl Into<String>) {
        self.state.write().last_visited.insert(tool, path.into());
    }

    /// Last recorded path for `tool`, or `None` if it was never visited.
    pub fn get_last_visited(&self, tool: Tool) -> Option<String> {
        self.state.read().last_visited.get(&tool).cloned()
    }

    /// Merge a partial update into one tool's settings. Other tools'
    /// settings are untouched; preferences merge per key.
    pub fn update_tool_settings(&self, tool: Tool, update: ToolSettingsUpdate) {
        let mut state = self.state.write();
        let settings = state.tool_settings.entry(tool).or_default();
        if let Some(enabled) = update.enabled {
            settings.enabled = enabled;
        }
        settings.preferences.extend(update.preferences);
    }

    /// Effective settings for `tool` (defaults when never configured).
    pub fn tool_settings(&self, tool: Tool) -> ToolSettings {
        self.state
            .read()
            .tool_settings
            .get(&tool)
            .cloned()
            .unwrap_or_default()
    }

    /// Switch the meetings tool's sub-view.
    ///
    /// The current sub-view and poll id move into the one-slot previous
    /// memory first. The poll id is kept only for sub-views that address a
    /// specific poll (`view`/`edit`); it is cleared for `list`/`new`.
    pub fn set_meeting_sub_view(&self, sub_view: MeetingSubView, poll_id: Option<&str>) {
        let mut state = self.state.write();
        state.previous_meeting_sub_view = state.meeting_sub_view;
        state.previous_meeting_poll_id = state.meeting_poll_id.take();
        state.meeting_sub_view = sub_view;
        state.meeting_poll_id = if sub_view.addresses_poll() {
            poll_id.map(str::to_string)
        } else {
            None
        };
    }

    /// Restore the previous meeting sub-view.
    ///
    /// True swap of the current and previous slots: one call goes back one
    /// step, a second call returns to where the first started. The back
    /// memory is intentionally one entry deep, not a history stack.
    pub fn go_back_to_previous_meeting_view(&self) {
        let mut state = self.state.write();
        let state = &mut *state;
        std::mem::swap(
            &mut state.meeting_sub_view,
            &mut state.previous_meeting_sub_view,
        );
        std::mem::swap(
            &mut state.meeting_poll_id,
            &mut state.previous_meeting_poll_id,
        );
    }

    /// Visited tools ranked by last visit, most recent first.
    pub fn tools_by_recency(&self) -> Vec<Tool> {
        let state = self.state.read();
        let mut visited: Vec<_> = state
            .visit_timestamps
            .iter()
            .map(|(tool, ts)| (*tool, *ts))
            .collect();
        visited.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        visited.into_iter().map(|(tool, _)| tool).collect()
    }

    /// Full state snapshot for the presentation layer.
    pub fn snapshot(&self) -> ToolState {
        self.state.read().clone()
    }
}
