//! Render targets: the containers the renderer adapter writes into.
//!
//! A [`RenderTarget`] plays the role of a DOM container. The preview owns
//! one for the lifetime of the app; the HTML exporter mounts a detached one
//! on a [`Document`] for the duration of a single export.

use super::mathml::{parse_mathml, MathNode};
use super::text::{escape_html, has_class, visible_text};
use log::debug;
use std::cell::Cell;

/// Class KaTeX puts on the wrapper of display-mode output.
pub const DISPLAY_FORMULA_CLASS: &str = "katex-display";
/// Class KaTeX puts on every rendered formula.
pub const FORMULA_CLASS: &str = "katex";

// ─────────────────────────────────────────────────────────────────────────────
// Target Content
// ─────────────────────────────────────────────────────────────────────────────

/// Why a placeholder is shown instead of rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Neutral guidance (e.g. nothing typed yet)
    Hint,
    /// The renderer could not produce output
    Error,
}

impl PlaceholderKind {
    fn css_class(&self) -> &'static str {
        match self {
            PlaceholderKind::Hint => "placeholder",
            PlaceholderKind::Error => "error-message",
        }
    }
}

/// What a target currently displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TargetContent {
    /// Nothing has been written yet
    #[default]
    Empty,
    /// A text placeholder
    Placeholder { kind: PlaceholderKind, text: String },
    /// Markup produced by the rendering engine, with its MathML structure
    /// when the engine emitted one
    Formula {
        html: String,
        display: bool,
        math: Option<MathNode>,
    },
}

/// The element an image capture should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `.katex-display` wrapper of block output
    DisplayFormula,
    /// Bare `.katex` element of inline output
    InlineFormula,
    /// The container itself (no formula element inside)
    Container,
}

// ─────────────────────────────────────────────────────────────────────────────
// Render Target
// ─────────────────────────────────────────────────────────────────────────────

/// A container whose contents are fully replaced on every render.
#[derive(Debug, Clone, Default)]
pub struct RenderTarget {
    content: TargetContent,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &TargetContent {
        &self.content
    }

    pub fn clear(&mut self) {
        self.content = TargetContent::Empty;
    }

    pub fn set_formula(&mut self, html: String, display: bool) {
        let math = parse_mathml(&html);
        self.content = TargetContent::Formula {
            html,
            display,
            math,
        };
    }

    /// Structure of the rendered formula, if any.
    pub fn math(&self) -> Option<&MathNode> {
        match &self.content {
            TargetContent::Formula { math, .. } => math.as_ref(),
            _ => None,
        }
    }

    pub fn show_placeholder(&mut self, kind: PlaceholderKind, text: impl Into<String>) {
        self.content = TargetContent::Placeholder {
            kind,
            text: text.into(),
        };
    }

    /// The markup currently held, as a browser would report `innerHTML`.
    pub fn inner_html(&self) -> String {
        match &self.content {
            TargetContent::Empty => String::new(),
            TargetContent::Placeholder { kind, text } => format!(
                r#"<div class="{}">{}</div>"#,
                kind.css_class(),
                escape_html(text)
            ),
            TargetContent::Formula { html, .. } => html.clone(),
        }
    }

    /// The readable text of the current content.
    ///
    /// Formulas are read from their MathML structure, which keeps arrows
    /// that the HTML output only draws.
    pub fn text_content(&self) -> String {
        match &self.content {
            TargetContent::Empty => String::new(),
            TargetContent::Placeholder { text, .. } => text.clone(),
            TargetContent::Formula {
                math: Some(math), ..
            } => math.text(),
            TargetContent::Formula { html, .. } => visible_text(html),
        }
    }

    /// Locate the innermost rendered-formula element.
    ///
    /// Falls back to the container when it holds something other than a
    /// formula; returns `None` only when nothing has been rendered.
    pub fn find_formula_element(&self) -> Option<ElementKind> {
        let kind = match &self.content {
            TargetContent::Empty => return None,
            TargetContent::Formula { html, .. } if has_class(html, DISPLAY_FORMULA_CLASS) => {
                ElementKind::DisplayFormula
            }
            TargetContent::Formula { html, .. } if has_class(html, FORMULA_CLASS) => {
                ElementKind::InlineFormula
            }
            _ => ElementKind::Container,
        };
        Some(kind)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detached Targets
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks off-screen targets mounted for exports.
#[derive(Debug, Default)]
pub struct Document {
    mounted: Cell<usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a fresh, empty off-screen target.
    ///
    /// The target is unmounted when the returned guard is dropped.
    pub fn mount_detached(&self) -> DetachedTarget<'_> {
        self.mounted.set(self.mounted.get() + 1);
        debug!("Mounted detached render target ({} live)", self.mounted.get());
        DetachedTarget {
            document: self,
            target: RenderTarget::new(),
        }
    }

    /// Number of detached targets currently mounted.
    #[cfg(test)]
    pub fn detached_count(&self) -> usize {
        self.mounted.get()
    }
}

/// A detached target, unmounted from its [`Document`] on drop.
#[derive(Debug)]
pub struct DetachedTarget<'a> {
    document: &'a Document,
    target: RenderTarget,
}

impl DetachedTarget<'_> {
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut RenderTarget {
        &mut self.target
    }
}

impl Drop for DetachedTarget<'_> {
    fn drop(&mut self) {
        let mounted = &self.document.mounted;
        mounted.set(mounted.get().saturating_sub(1));
        debug!("Unmounted detached render target ({} live)", mounted.get());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY_HTML: &str =
        r#"<span class="katex-display"><span class="katex"><span class="katex-html">H2O</span></span></span>"#;

    #[test]
    fn test_new_target_is_empty() {
        let target = RenderTarget::new();
        assert_eq!(target.content(), &TargetContent::Empty);
        assert_eq!(target.inner_html(), "");
        assert_eq!(target.text_content(), "");
    }

    #[test]
    fn test_placeholder_markup_is_escaped() {
        let mut target = RenderTarget::new();
        target.show_placeholder(PlaceholderKind::Error, "bad <input>");

        assert_eq!(
            target.inner_html(),
            r#"<div class="error-message">bad &lt;input&gt;</div>"#
        );
        assert_eq!(target.text_content(), "bad <input>");
    }

    #[test]
    fn test_set_formula_replaces_placeholder() {
        let mut target = RenderTarget::new();
        target.show_placeholder(PlaceholderKind::Hint, "type something");
        target.set_formula(DISPLAY_HTML.to_string(), true);

        assert_eq!(target.inner_html(), DISPLAY_HTML);
        assert_eq!(target.text_content(), "H2O");
    }

    #[test]
    fn test_find_display_formula_element() {
        let mut target = RenderTarget::new();
        target.set_formula(DISPLAY_HTML.to_string(), true);

        assert_eq!(
            target.find_formula_element(),
            Some(ElementKind::DisplayFormula)
        );
    }

    #[test]
    fn test_find_inline_formula_element() {
        let mut target = RenderTarget::new();
        target.set_formula(r#"<span class="katex">x</span>"#.to_string(), false);

        assert_eq!(
            target.find_formula_element(),
            Some(ElementKind::InlineFormula)
        );
    }

    #[test]
    fn test_find_element_falls_back_to_container() {
        let mut target = RenderTarget::new();
        target.show_placeholder(PlaceholderKind::Error, "Render error");

        assert_eq!(target.find_formula_element(), Some(ElementKind::Container));
    }

    #[test]
    fn test_formula_text_prefers_mathml() {
        let html = r#"<span class="katex"><span class="katex-mathml"><math><semantics><mrow><mi>A</mi><mo>→</mo><mi>B</mi></mrow><annotation encoding="application/x-tex">\ce{A -> B}</annotation></semantics></math></span><span class="katex-html" aria-hidden="true"><span class="mord">A</span><svg></svg><span class="mord">B</span></span></span>"#;
        let mut target = RenderTarget::new();
        target.set_formula(html.to_string(), false);

        assert!(target.math().is_some());
        assert_eq!(target.text_content(), "A→B");
    }

    #[test]
    fn test_find_element_in_empty_target() {
        assert!(RenderTarget::new().find_formula_element().is_none());
    }

    #[test]
    fn test_detached_target_unmounts_on_drop() {
        let document = Document::new();
        {
            let mut detached = document.mount_detached();
            detached.target_mut().show_placeholder(PlaceholderKind::Hint, "x");
            assert_eq!(document.detached_count(), 1);

            let _second = document.mount_detached();
            assert_eq!(document.detached_count(), 2);
        }
        assert_eq!(document.detached_count(), 0);
    }
}
