//! Application state management for Chemdraft
//!
//! This module defines the central `AppState` struct holding the formula
//! text, the export-in-progress flag and the transient status message. All
//! changes go through [`AppState::apply`], which returns the side effect the
//! shell has to carry out.

use crate::export::{ExportError, ExportFormat};
use crate::presets;
use log::{debug, info, warn};

/// Guidance shown when an export is requested with no formula.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a chemical formula first";

/// Shown after any failed export.
pub const EXPORT_FAILED_MESSAGE: &str = "❌ Export failed, please try again";

// ─────────────────────────────────────────────────────────────────────────────
// Status Message
// ─────────────────────────────────────────────────────────────────────────────

/// Tone of a status message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

/// A transient message shown in the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    /// When the message should disappear (as seconds since app start)
    pub expires_at: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions and Effects
// ─────────────────────────────────────────────────────────────────────────────

/// Everything that can change the application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user edited the formula input
    SetFormula(String),
    /// The user picked a preset by id
    SelectPreset(String),
    /// The user pressed an export button
    RequestExport(ExportFormat),
    /// An export reached a terminal state
    ExportFinished {
        format: ExportFormat,
        result: Result<(), ExportError>,
    },
    /// Time passed
    Tick,
}

/// Work the shell performs after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Re-render the preview for the current formula
    RenderPreview,
    /// Run an export of the given format
    StartExport(ExportFormat),
}

/// Result of checking whether an export may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportGate {
    /// The export may start
    Open,
    /// The formula is empty
    EmptyInputRejected,
    /// Another export is still running
    Busy,
}

// ─────────────────────────────────────────────────────────────────────────────
// App State
// ─────────────────────────────────────────────────────────────────────────────

/// Single source of truth for the editor.
#[derive(Debug, Clone)]
pub struct AppState {
    formula: String,
    in_progress: bool,
    message: Option<StatusMessage>,
    /// How long status messages stay visible, in seconds
    message_duration: f64,
}

impl AppState {
    pub fn new(message_duration: f64) -> Self {
        Self {
            formula: String::new(),
            in_progress: false,
            message: None,
            message_duration,
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Whether an export is in flight.
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    /// Check whether an export request would be accepted right now.
    pub fn export_gate(&self) -> ExportGate {
        if self.formula.is_empty() {
            ExportGate::EmptyInputRejected
        } else if self.in_progress {
            ExportGate::Busy
        } else {
            ExportGate::Open
        }
    }

    /// Apply `action` at app time `now`.
    pub fn apply(&mut self, action: Action, now: f64) -> Option<Effect> {
        match action {
            Action::SetFormula(formula) => {
                self.formula = formula;
                Some(Effect::RenderPreview)
            }
            Action::SelectPreset(id) => match presets::find(&id) {
                Some(preset) => {
                    debug!("Preset selected: {}", preset.id);
                    self.formula = preset.formula.to_string();
                    Some(Effect::RenderPreview)
                }
                None => {
                    warn!("Unknown preset: {}", id);
                    None
                }
            },
            Action::RequestExport(format) => match self.export_gate() {
                ExportGate::EmptyInputRejected => {
                    self.show_message(EMPTY_INPUT_MESSAGE, MessageKind::Info, now);
                    None
                }
                ExportGate::Busy => {
                    debug!("Ignoring {:?} export request, export in progress", format);
                    None
                }
                ExportGate::Open => {
                    self.in_progress = true;
                    self.message = None;
                    Some(Effect::StartExport(format))
                }
            },
            Action::ExportFinished { format, result } => {
                self.in_progress = false;
                match result {
                    Ok(()) => {
                        info!("{:?} export succeeded", format);
                        self.show_message(format.success_message(), MessageKind::Success, now);
                    }
                    Err(err) => {
                        warn!("{:?} export failed: {}", format, err);
                        self.show_message(EXPORT_FAILED_MESSAGE, MessageKind::Error, now);
                    }
                }
                None
            }
            Action::Tick => {
                self.expire_message(now);
                None
            }
        }
    }

    /// Show a status message that disappears after the configured duration.
    fn show_message(&mut self, text: impl Into<String>, kind: MessageKind, now: f64) {
        self.message = Some(StatusMessage {
            text: text.into(),
            kind,
            expires_at: now + self.message_duration,
        });
    }

    /// Clear the message once its own expiry has passed.
    fn expire_message(&mut self, now: f64) {
        if matches!(&self.message, Some(message) if now >= message.expires_at) {
            self.message = None;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(3.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ClipboardError;

    fn with_formula(formula: &str) -> AppState {
        let mut state = AppState::default();
        state.apply(Action::SetFormula(formula.to_string()), 0.0);
        state
    }

    #[test]
    fn test_set_formula_requests_render() {
        let mut state = AppState::default();
        let effect = state.apply(Action::SetFormula("H2O".into()), 0.0);

        assert_eq!(effect, Some(Effect::RenderPreview));
        assert_eq!(state.formula(), "H2O");
    }

    #[test]
    fn test_select_preset_sets_formula() {
        let mut state = AppState::default();
        let preset = &presets::MOLECULAR_FORMULAS[0];

        let effect = state.apply(Action::SelectPreset(preset.id.to_string()), 0.0);

        assert_eq!(effect, Some(Effect::RenderPreview));
        assert_eq!(state.formula(), preset.formula);
    }

    #[test]
    fn test_unknown_preset_is_ignored() {
        let mut state = with_formula("NaCl");
        assert_eq!(state.apply(Action::SelectPreset("nope".into()), 0.0), None);
        assert_eq!(state.formula(), "NaCl");
    }

    #[test]
    fn test_export_with_empty_input_shows_guidance() {
        let mut state = with_formula("");

        let effect = state.apply(Action::RequestExport(ExportFormat::Image), 1.0);

        assert_eq!(effect, None);
        assert!(!state.in_progress());
        let message = state.message().unwrap();
        assert_eq!(message.text, EMPTY_INPUT_MESSAGE);
        assert_eq!(message.kind, MessageKind::Info);
    }

    #[test]
    fn test_whitespace_formula_is_exportable() {
        let mut state = with_formula(" ");

        assert_eq!(state.export_gate(), ExportGate::Open);
        let effect = state.apply(Action::RequestExport(ExportFormat::Html), 1.0);

        assert_eq!(effect, Some(Effect::StartExport(ExportFormat::Html)));
        assert!(state.in_progress());
    }

    #[test]
    fn test_export_request_enters_exporting() {
        let mut state = with_formula("H2O");
        state.apply(Action::RequestExport(ExportFormat::Html), 0.0);
        state.apply(
            Action::ExportFinished {
                format: ExportFormat::Html,
                result: Ok(()),
            },
            0.5,
        );
        assert!(state.message().is_some());

        let effect = state.apply(Action::RequestExport(ExportFormat::Image), 1.0);

        assert_eq!(effect, Some(Effect::StartExport(ExportFormat::Image)));
        assert!(state.in_progress());
        assert!(state.message().is_none());
    }

    #[test]
    fn test_second_request_is_gated() {
        let mut state = with_formula("H2O");
        state.apply(Action::RequestExport(ExportFormat::Image), 0.0);

        assert_eq!(state.export_gate(), ExportGate::Busy);
        assert_eq!(state.apply(Action::RequestExport(ExportFormat::Image), 0.0), None);
        assert_eq!(state.apply(Action::RequestExport(ExportFormat::Html), 0.0), None);
        assert!(state.in_progress());
    }

    #[test]
    fn test_success_message_expires() {
        let mut state = with_formula("H2O");
        state.apply(Action::RequestExport(ExportFormat::Html), 0.0);
        state.apply(
            Action::ExportFinished {
                format: ExportFormat::Html,
                result: Ok(()),
            },
            1.0,
        );

        assert!(!state.in_progress());
        let message = state.message().unwrap();
        assert_eq!(message.kind, MessageKind::Success);
        assert_eq!(message.text, ExportFormat::Html.success_message());

        state.apply(Action::Tick, 3.5);
        assert!(state.message().is_some());
        state.apply(Action::Tick, 4.0);
        assert!(state.message().is_none());
    }

    #[test]
    fn test_failure_message() {
        let mut state = with_formula("H2O");
        state.apply(Action::RequestExport(ExportFormat::Html), 0.0);
        state.apply(
            Action::ExportFinished {
                format: ExportFormat::Html,
                result: Err(ExportError::Clipboard(ClipboardError::WriteError(
                    "denied".into(),
                ))),
            },
            2.0,
        );

        assert!(!state.in_progress());
        let message = state.message().unwrap();
        assert_eq!(message.text, EXPORT_FAILED_MESSAGE);
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.expires_at, 5.0);
    }

    #[test]
    fn test_newer_message_outlives_older_expiry() {
        let mut state = AppState::default();
        state.apply(Action::RequestExport(ExportFormat::Html), 0.0);
        state.apply(Action::RequestExport(ExportFormat::Html), 2.0);

        state.apply(Action::Tick, 3.0);
        assert_eq!(state.message().unwrap().expires_at, 5.0);

        state.apply(Action::Tick, 5.0);
        assert!(state.message().is_none());
    }

    #[test]
    fn test_custom_message_duration() {
        let mut state = AppState::new(1.0);
        state.apply(Action::RequestExport(ExportFormat::Image), 0.0);
        state.apply(Action::Tick, 1.0);
        assert!(state.message().is_none());
    }
}
