//! KaTeX-backed render engine.
//!
//! The `katex` crate runs the KaTeX bundle (with the mhchem extension) in an
//! embedded JavaScript engine, so `\ce{...}` markup renders without a browser.

use super::{EngineError, EngineOptions, RenderEngine};
use log::debug;

/// Render engine using the [`katex`] crate.
///
/// Output carries both HTML and MathML. The MathML twin is what the preview
/// lays out and what plain text is read from; arrows only exist there as
/// characters, the HTML draws them as SVG.
#[derive(Debug, Default, Clone, Copy)]
pub struct KatexEngine;

impl KatexEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for KatexEngine {
    fn render_to_string(&self, markup: &str, options: &EngineOptions) -> Result<String, EngineError> {
        // `strict` has no counterpart in the crate's options; KaTeX's default
        // only warns, which matches a non-strict run.
        let opts = ::katex::Opts::builder()
            .display_mode(options.display_mode)
            .throw_on_error(options.throw_on_error)
            .trust(options.trust)
            .output_type(::katex::OutputType::HtmlAndMathml)
            .build()
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        debug!("KaTeX rendering {} bytes of markup", markup.len());

        ::katex::render_with_opts(markup, &opts).map_err(|e| match e {
            ::katex::Error::JsInitError(msg) => EngineError::Unavailable(msg),
            other => EngineError::Markup(other.to_string()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
