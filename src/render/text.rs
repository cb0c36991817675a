//! Markup helpers shared by render targets and the HTML exporter.
//!
//! Rendered output is kept as an HTML string, so reading back the visible
//! text or checking for a class works on the markup itself.

use super::mathml::math_element;
use regex::{Captures, Regex};
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static HIDDEN_SPAN: OnceLock<Regex> = OnceLock::new();
static TAG: OnceLock<Regex> = OnceLock::new();
static ENTITY: OnceLock<Regex> = OnceLock::new();
static CLASS_ATTR: OnceLock<Regex> = OnceLock::new();

/// Leaf spans painted with a transparent color (phantoms used for spacing).
fn hidden_span() -> &'static Regex {
    HIDDEN_SPAN.get_or_init(|| {
        Regex::new(r#"<span[^>]*style="[^"]*color:\s*transparent[^"]*"[^>]*>[^<]*</span>"#)
            .expect("hidden span pattern is valid")
    })
}

fn tag() -> &'static Regex {
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn entity() -> &'static Regex {
    ENTITY.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
    })
}

fn class_attr() -> &'static Regex {
    CLASS_ATTR.get_or_init(|| Regex::new(r#"class="([^"]*)""#).expect("class pattern is valid"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the visible text of an HTML fragment.
///
/// Tags are dropped, entities decoded, and zero-width spaces (which KaTeX
/// inserts between atoms) removed. Spans painted transparent and MathML
/// twins are skipped.
pub fn visible_text(html: &str) -> String {
    let without_math = math_element().replace_all(html, "");
    let without_phantoms = hidden_span().replace_all(&without_math, "");
    let stripped = tag().replace_all(&without_phantoms, "");

    decode_entities(&stripped)
        .chars()
        .filter(|c| *c != '\u{200b}')
        .collect()
}

/// Decode named and numeric character references.
///
/// Unknown named entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    entity()
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Whether any element in `html` carries `class` as one of its classes.
pub fn has_class(html: &str, class: &str) -> bool {
    class_attr()
        .captures_iter(html)
        .any(|caps| caps[1].split_whitespace().any(|c| c == class))
}

/// HTML-escape a string.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
