//! MathML reading for rendered formulas.
//!
//! KaTeX emits a MathML twin next to its HTML output. The twin keeps the
//! structure of a formula (scripts, labels stacked on arrows, fractions) and
//! carries arrows as plain characters, so both the plain-text extraction and
//! the preview layout are driven from it.

use super::text::decode_entities;
use regex::Regex;
use std::sync::OnceLock;

static MATH_ELEMENT: OnceLock<Regex> = OnceLock::new();
static MARKUP_TOKEN: OnceLock<Regex> = OnceLock::new();
static EM_WIDTH: OnceLock<Regex> = OnceLock::new();

/// The first `<math>` element of a fragment, annotation included.
pub(super) fn math_element() -> &'static Regex {
    MATH_ELEMENT.get_or_init(|| {
        Regex::new(r"(?s)<math[\s>].*?</math>").expect("math element pattern is valid")
    })
}

fn markup_token() -> &'static Regex {
    MARKUP_TOKEN.get_or_init(|| {
        Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*?)(/?)>|([^<]+)")
            .expect("markup token pattern is valid")
    })
}

fn em_width() -> &'static Regex {
    EM_WIDTH.get_or_init(|| {
        Regex::new(r#"width="(-?[0-9]*\.?[0-9]+)em""#).expect("width pattern is valid")
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Math Tree
// ─────────────────────────────────────────────────────────────────────────────

/// Flavor of a MathML token element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<mi>`
    Identifier,
    /// `<mn>`
    Number,
    /// `<mo>`
    Operator,
    /// `<mtext>` and `<ms>`
    Text,
}

/// Layout-relevant structure of a rendered formula.
#[derive(Debug, Clone, PartialEq)]
pub enum MathNode {
    Token {
        kind: TokenKind,
        text: String,
        /// Set by `mathvariant="normal"` and for multi-letter identifiers
        upright: bool,
    },
    Row(Vec<MathNode>),
    /// `msub`, `msup` and `msubsup`
    Scripts {
        base: Box<MathNode>,
        sub: Option<Box<MathNode>>,
        sup: Option<Box<MathNode>>,
    },
    /// `munder`, `mover` and `munderover`; reaction conditions end up here
    Stack {
        base: Box<MathNode>,
        under: Option<Box<MathNode>>,
        over: Option<Box<MathNode>>,
    },
    Fraction {
        numerator: Box<MathNode>,
        denominator: Box<MathNode>,
    },
    /// Horizontal space in em
    Space(f32),
    /// Invisible content, used by mhchem to align script heights
    Phantom,
}

impl MathNode {
    /// Readable text of the formula, in reading order.
    ///
    /// Stacked labels follow their arrow, the upper one first. Phantoms
    /// contribute nothing.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            MathNode::Token { text, .. } => out.push_str(text),
            MathNode::Row(children) => children.iter().for_each(|c| c.push_text(out)),
            MathNode::Scripts { base, sub, sup } => {
                base.push_text(out);
                for script in [sub, sup].into_iter().flatten() {
                    script.push_text(out);
                }
            }
            MathNode::Stack { base, under, over } => {
                base.push_text(out);
                for label in [over, under].into_iter().flatten() {
                    label.push_text(out);
                }
            }
            MathNode::Fraction {
                numerator,
                denominator,
            } => {
                numerator.push_text(out);
                out.push('/');
                denominator.push_text(out);
            }
            MathNode::Space(_) | MathNode::Phantom => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RawElement {
    name: String,
    attrs: String,
    children: Vec<RawNode>,
}

#[derive(Debug)]
enum RawNode {
    Element(RawElement),
    Text(String),
}

impl RawElement {
    fn text(&self) -> String {
        self.children
            .iter()
            .map(|child| match child {
                RawNode::Text(text) => text.clone(),
                RawNode::Element(el) => el.text(),
            })
            .collect()
    }

    fn elements(&self) -> impl Iterator<Item = &RawElement> {
        self.children.iter().filter_map(|child| match child {
            RawNode::Element(el) => Some(el),
            RawNode::Text(_) => None,
        })
    }
}

/// Parse the MathML twin of KaTeX output.
///
/// Returns `None` when `html` carries no `<math>` element.
pub fn parse_mathml(html: &str) -> Option<MathNode> {
    let math = math_element().find(html)?;
    let root = parse_elements(math.as_str());
    let math = root.elements().find(|el| el.name == "math")?;
    Some(convert(math).unwrap_or(MathNode::Row(Vec::new())))
}

/// Build an element tree. Unbalanced closing tags close the innermost
/// element, and anything left open at the end is closed implicitly.
fn parse_elements(markup: &str) -> RawElement {
    let mut stack = vec![RawElement::default()];

    for caps in markup_token().captures_iter(markup) {
        if let Some(text) = caps.get(5) {
            if let Some(top) = stack.last_mut() {
                top.children
                    .push(RawNode::Text(decode_entities(text.as_str())));
            }
            continue;
        }

        let closing = &caps[1] == "/";
        let self_closing = &caps[4] == "/";
        if closing {
            if stack.len() > 1 {
                close_top(&mut stack);
            }
            continue;
        }

        let element = RawElement {
            name: caps[2].to_ascii_lowercase(),
            attrs: caps[3].to_string(),
            children: Vec::new(),
        };
        if self_closing {
            if let Some(top) = stack.last_mut() {
                top.children.push(RawNode::Element(element));
            }
        } else {
            stack.push(element);
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().unwrap_or_default()
}

fn close_top(stack: &mut Vec<RawElement>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(RawNode::Element(done));
        }
    }
}

fn convert(el: &RawElement) -> Option<MathNode> {
    let token = |kind: TokenKind| MathNode::Token {
        kind,
        text: el.text(),
        upright: kind != TokenKind::Identifier
            || el.attrs.contains(r#"mathvariant="normal""#)
            || el.text().chars().count() > 1,
    };
    let children: Vec<MathNode> = el.elements().filter_map(convert).collect();
    let mut slots = children.into_iter();
    let mut next = || slots.next().map(Box::new);

    let node = match el.name.as_str() {
        "annotation" | "annotation-xml" => return None,
        "mi" => token(TokenKind::Identifier),
        "mn" => token(TokenKind::Number),
        "mo" => token(TokenKind::Operator),
        "mtext" | "ms" => token(TokenKind::Text),
        "mphantom" => MathNode::Phantom,
        "mspace" => {
            let width = em_width()
                .captures(&el.attrs)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0.0);
            MathNode::Space(width)
        }
        "msub" => MathNode::Scripts {
            base: next().unwrap_or_else(empty),
            sub: next(),
            sup: None,
        },
        "msup" => MathNode::Scripts {
            base: next().unwrap_or_else(empty),
            sub: None,
            sup: next(),
        },
        "msubsup" => MathNode::Scripts {
            base: next().unwrap_or_else(empty),
            sub: next(),
            sup: next(),
        },
        "munder" => MathNode::Stack {
            base: next().unwrap_or_else(empty),
            under: next(),
            over: None,
        },
        "mover" => MathNode::Stack {
            base: next().unwrap_or_else(empty),
            under: None,
            over: next(),
        },
        "munderover" => MathNode::Stack {
            base: next().unwrap_or_else(empty),
            under: next(),
            over: next(),
        },
        "mfrac" => MathNode::Fraction {
            numerator: next().unwrap_or_else(empty),
            denominator: next().unwrap_or_else(empty),
        },
        _ => {
            let mut rest: Vec<MathNode> = std::iter::from_fn(|| next().map(|b| *b)).collect();
            if rest.len() == 1 {
                rest.remove(0)
            } else {
                MathNode::Row(rest)
            }
        }
    };
    Some(node)
}

fn empty() -> Box<MathNode> {
    Box::new(MathNode::Row(Vec::new()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
