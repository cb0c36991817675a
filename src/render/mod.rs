//! Rendering Adapter for Chemdraft
//!
//! This module wraps the typesetting capability behind a single adapter so
//! that the live preview and the detached export target go through one code
//! path.
//!
//! # Architecture
//!
//! - `target.rs` - Render containers and detached-target bookkeeping
//! - `katex_engine.rs` - Production engine backed by the `katex` crate
//! - `mathml.rs` - Formula structure read from the engine's MathML output
//! - `text.rs` - Text extraction and escaping on rendered markup

mod katex_engine;
mod mathml;
mod target;
mod text;

pub use katex_engine::KatexEngine;
pub use mathml::{MathNode, TokenKind};
pub use target::{Document, ElementKind, PlaceholderKind, RenderTarget, TargetContent};
pub use text::escape_html;

use log::{debug, warn};
use std::fmt;
use std::rc::Rc;

/// Placeholder shown when no rendering engine is available.
pub const RENDERER_UNAVAILABLE_TEXT: &str = "Renderer not loaded";

/// Placeholder shown when the engine rejects the markup.
pub const RENDER_ERROR_TEXT: &str = "Render error";

/// Wrap raw formula text as mhchem chemistry markup.
pub fn chemistry_markup(formula: &str) -> String {
    format!("\\ce{{{}}}", formula)
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Per-call options for [`RendererAdapter::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Render as a centered block rather than inline
    pub display_mode: bool,
}

impl RenderOptions {
    pub fn block() -> Self {
        Self { display_mode: true }
    }
}

/// Options handed to the engine on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub display_mode: bool,
    pub throw_on_error: bool,
    pub trust: bool,
    pub strict: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            display_mode: false,
            throw_on_error: false,
            trust: true,
            strict: false,
        }
    }
}

impl From<RenderOptions> for EngineOptions {
    fn from(options: RenderOptions) -> Self {
        Self {
            display_mode: options.display_mode,
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reported by a rendering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be started
    Unavailable(String),
    /// The engine rejected the markup
    Markup(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Unavailable(msg) => write!(f, "Rendering engine unavailable: {}", msg),
            EngineError::Markup(msg) => write!(f, "Markup rejected: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

/// A typesetting capability turning markup into an HTML fragment.
pub trait RenderEngine {
    fn render_to_string(&self, markup: &str, options: &EngineOptions) -> Result<String, EngineError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Render Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Errors the adapter absorbs into a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No engine was provided, or it failed to start
    RendererUnavailable,
    /// The engine raised while parsing or drawing the markup
    Markup(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::RendererUnavailable => write!(f, "Renderer unavailable"),
            RenderError::Markup(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// Completion signal of a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Engine output was written to the target
    Rendered,
    /// Nothing to render; a hint placeholder was written
    Empty,
    /// An error placeholder was written
    Failed(RenderError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────────────────────────

/// Writes engine output into render targets.
///
/// Never fails: every call leaves the target showing either the rendered
/// markup or an error placeholder.
#[derive(Clone)]
pub struct RendererAdapter {
    engine: Option<Rc<dyn RenderEngine>>,
}

impl RendererAdapter {
    pub fn new(engine: impl RenderEngine + 'static) -> Self {
        Self {
            engine: Some(Rc::new(engine)),
        }
    }

    /// An adapter with no engine behind it.
    pub fn unavailable() -> Self {
        Self { engine: None }
    }

    /// Replace the contents of `target` with the rendering of `markup`.
    pub fn render(
        &self,
        target: &mut RenderTarget,
        markup: &str,
        options: RenderOptions,
    ) -> RenderOutcome {
        target.clear();

        let Some(engine) = &self.engine else {
            warn!("No rendering engine loaded");
            target.show_placeholder(PlaceholderKind::Error, RENDERER_UNAVAILABLE_TEXT);
            return RenderOutcome::Failed(RenderError::RendererUnavailable);
        };

        match engine.render_to_string(markup, &options.into()) {
            Ok(html) => {
                debug!("Rendered markup ({} bytes of html)", html.len());
                target.set_formula(html, options.display_mode);
                RenderOutcome::Rendered
            }
            Err(EngineError::Unavailable(reason)) => {
                warn!("Rendering engine unavailable: {}", reason);
                target.show_placeholder(PlaceholderKind::Error, RENDERER_UNAVAILABLE_TEXT);
                RenderOutcome::Failed(RenderError::RendererUnavailable)
            }
            Err(EngineError::Markup(reason)) => {
                warn!("Failed to render markup: {}", reason);
                target.show_placeholder(PlaceholderKind::Error, RENDER_ERROR_TEXT);
                RenderOutcome::Failed(RenderError::Markup(reason))
            }
        }
    }
}

impl fmt::Debug for RendererAdapter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RendererAdapter")
            .field("engine", &self.engine.as_ref().map(|_| "(dyn RenderEngine)"))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;

    #[test]
    fn test_chemistry_markup_wraps_formula() {
        assert_eq!(chemistry_markup("H2O"), "\\ce{H2O}");
        assert_eq!(chemistry_markup(""), "\\ce{}");
    }

    #[test]
    fn test_engine_options_from_render_options() {
        let options = EngineOptions::from(RenderOptions::block());
        assert!(options.display_mode);
        assert!(!options.throw_on_error);
        assert!(options.trust);
        assert!(!options.strict);
    }

    #[test]
    fn test_render_writes_engine_output() {
        let engine = FakeEngine::new();
        let adapter = RendererAdapter::new(engine.clone());
        let mut target = RenderTarget::new();

        let outcome = adapter.render(&mut target, "\\ce{H2O}", RenderOptions::block());

        assert_eq!(outcome, RenderOutcome::Rendered);
        assert!(matches!(
            target.content(),
            TargetContent::Formula { display: true, .. }
        ));
        assert_eq!(engine.calls().len(), 1);
        assert_eq!(engine.calls()[0].0, "\\ce{H2O}");
    }

    #[test]
    fn test_render_is_idempotent() {
        let adapter = RendererAdapter::new(FakeEngine::new());
        let mut target = RenderTarget::new();

        adapter.render(&mut target, "\\ce{NaCl}", RenderOptions::block());
        let first = target.inner_html();
        adapter.render(&mut target, "\\ce{NaCl}", RenderOptions::block());

        assert_eq!(target.inner_html(), first);
    }

    #[test]
    fn test_missing_engine_shows_placeholder() {
        let adapter = RendererAdapter::unavailable();
        let mut target = RenderTarget::new();
        target.set_formula("<span>old</span>".to_string(), true);

        let outcome = adapter.render(&mut target, "\\ce{NaCl}", RenderOptions::block());

        assert_eq!(
            outcome,
            RenderOutcome::Failed(RenderError::RendererUnavailable)
        );
        assert_eq!(
            target.content(),
            &TargetContent::Placeholder {
                kind: PlaceholderKind::Error,
                text: RENDERER_UNAVAILABLE_TEXT.to_string(),
            }
        );
    }

    #[test]
    fn test_engine_failing_to_start_shows_placeholder() {
        let engine = FakeEngine::failing(EngineError::Unavailable("no js runtime".into()));
        let adapter = RendererAdapter::new(engine);
        let mut target = RenderTarget::new();

        let outcome = adapter.render(&mut target, "\\ce{NaCl}", RenderOptions::block());

        assert_eq!(
            outcome,
            RenderOutcome::Failed(RenderError::RendererUnavailable)
        );
        assert_eq!(target.text_content(), RENDERER_UNAVAILABLE_TEXT);
    }

    #[test]
    fn test_markup_error_shows_placeholder() {
        let engine = FakeEngine::failing(EngineError::Markup("unexpected }".into()));
        let adapter = RendererAdapter::new(engine);
        let mut target = RenderTarget::new();

        let outcome = adapter.render(&mut target, "\\ce{H2O", RenderOptions::block());

        assert!(matches!(outcome, RenderOutcome::Failed(RenderError::Markup(_))));
        assert_eq!(target.text_content(), RENDER_ERROR_TEXT);
    }
}
