//! HTML Export Generation
//!
//! This module re-renders the formula into a detached target and wraps the
//! result in a complete HTML document for rich-text paste targets.

use super::clipboard::{Clipboard, ExportPayload};
use super::error::ExportError;
use crate::render::{
    chemistry_markup, escape_html, Document, RenderError, RenderOptions, RenderOutcome,
    RendererAdapter,
};
use log::{info, warn};

/// Document-level settings for HTML export.
#[derive(Debug, Clone, Copy)]
pub struct HtmlDocumentOptions<'a> {
    /// Title and heading of the document
    pub title: &'a str,
    /// Stylesheet carrying the rendering engine's font rules
    pub stylesheet_href: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Generate a complete HTML document around rendered formula markup.
///
/// # Arguments
///
/// * `rendered` - Markup read back from the render target
/// * `options` - Title and stylesheet link
///
/// # Returns
///
/// A complete HTML document as a string.
pub fn generate_html_document(rendered: &str, options: &HtmlDocumentOptions<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="Chemdraft">
    <title>{title}</title>
    <link rel="stylesheet" href="{stylesheet}">
    <style>
{base_css}
    </style>
</head>
<body>
    <div class="formula-container">
        <h1>{title}</h1>
        <div class="formula">
            {body}
        </div>
    </div>
</body>
</html>"#,
        title = escape_html(options.title),
        stylesheet = escape_html(options.stylesheet_href),
        base_css = BASE_CSS,
        body = rendered,
    )
}

/// Base CSS for the exported card layout.
const BASE_CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    max-width: 800px;
    margin: 0 auto;
    padding: 20px;
    background: #f8f9fa;
}

.formula-container {
    background: white;
    padding: 30px;
    border-radius: 8px;
    box-shadow: 0 2px 10px rgba(0, 0, 0, 0.1);
    text-align: center;
}

.formula {
    font-size: 24px;
    color: #2c3e50;
    margin: 20px 0;
}

.katex,
.katex .mord {
    font-family: KaTeX_Main, 'Noto Sans', Helvetica, Arial, sans-serif;
}
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Export
// ─────────────────────────────────────────────────────────────────────────────

/// Render `formula` off-screen and copy it as HTML plus plain text.
///
/// The detached target is unmounted on every exit path. A markup error
/// still exports the error placeholder; only a missing engine aborts
/// before the clipboard is touched.
pub fn export_html(
    formula: &str,
    document: &Document,
    adapter: &RendererAdapter,
    clipboard: &mut dyn Clipboard,
    options: &HtmlDocumentOptions<'_>,
) -> Result<(), ExportError> {
    let mut detached = document.mount_detached();

    let outcome = adapter.render(
        detached.target_mut(),
        &chemistry_markup(formula),
        RenderOptions::block(),
    );

    match outcome {
        RenderOutcome::Failed(RenderError::RendererUnavailable) => {
            return Err(ExportError::RendererUnavailable)
        }
        RenderOutcome::Failed(err) => warn!("Exporting placeholder for '{}': {}", formula, err),
        RenderOutcome::Rendered | RenderOutcome::Empty => {}
    }

    let rendered = detached.target().inner_html();
    let text = match detached.target().text_content() {
        t if t.is_empty() => formula.to_string(),
        t => t,
    };

    let html = generate_html_document(&rendered, options);
    clipboard.write(&ExportPayload::Html { html, text })?;

    info!("Copied HTML and plain text to clipboard");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
