//! Live Preview for Chemdraft
//!
//! Keeps the on-screen render target in step with the formula input. The
//! preview target is also what image export captures, so whatever the user
//! sees here is what lands on the clipboard.

use crate::render::{
    chemistry_markup, PlaceholderKind, RenderOptions, RenderOutcome, RenderTarget,
    RendererAdapter,
};
use log::debug;

/// Hint shown while the formula input is empty.
pub const EMPTY_PREVIEW_HINT: &str = "Enter a chemical formula to see the preview";

/// Owns the preview target and re-renders it on demand.
#[derive(Debug, Default)]
pub struct PreviewController {
    target: RenderTarget,
    formula: String,
}

impl PreviewController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-render the preview for `formula`.
    ///
    /// Empty input shows the hint without touching the engine. Anything else
    /// is rendered as display-mode chemistry markup; engine failures end up
    /// as a placeholder in the target.
    pub fn sync(&mut self, adapter: &RendererAdapter, formula: &str) -> RenderOutcome {
        self.formula = formula.to_string();

        if formula.is_empty() {
            self.target
                .show_placeholder(PlaceholderKind::Hint, EMPTY_PREVIEW_HINT);
            return RenderOutcome::Empty;
        }

        let outcome = adapter.render(
            &mut self.target,
            &chemistry_markup(formula),
            RenderOptions::block(),
        );
        debug!("Preview synced: {:?}", outcome);
        outcome
    }

    /// The target currently on screen.
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Formula the preview was last synced to.
    pub fn formula(&self) -> &str {
        &self.formula
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
