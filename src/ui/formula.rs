//! Formula typesetting for the preview pane.
//!
//! Lays out the MathML structure of a rendered formula as nested boxes:
//! scripts are set smaller and shifted off the baseline, reaction
//! conditions are stacked over and under their arrow, and the arrow is
//! stretched to fit them. Boxes are measured against the baseline, so
//! `ascent` is the extent above it and `descent` the extent below.

use crate::render::{MathNode, TokenKind};
use eframe::egui::epaint::text::{Fonts, Galley, LayoutJob, TextFormat};
use eframe::egui::{pos2, vec2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use std::sync::Arc;

/// Size of scripts and stacked labels relative to their base.
const SCRIPT_SCALE: f32 = 0.7;
/// Smallest script size relative to the formula's font size.
const MIN_SCRIPT_RATIO: f32 = 0.5;
/// Share of a line's height above the baseline.
const ASCENT_RATIO: f32 = 0.78;
/// Height of the math axis (arrows, fraction bars) above the baseline, in em.
const AXIS_EM: f32 = 0.25;
/// Space on each side of relations and binary operators, in em.
const OPERATOR_SPACE_EM: f32 = 0.22;
/// Length of an arrow without labels, in em.
const ARROW_MIN_EM: f32 = 2.0;

// ─────────────────────────────────────────────────────────────────────────────
// Boxes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrowKind {
    Right,
    Left,
    Both,
    /// Two harpoons, forward on top
    Equilibrium,
}

impl ArrowKind {
    fn from_operator(text: &str) -> Option<Self> {
        match text.trim() {
            "\u{2192}" | "\u{27f6}" | "\u{21d2}" | "\u{27f9}" => Some(ArrowKind::Right),
            "\u{2190}" | "\u{27f5}" => Some(ArrowKind::Left),
            "\u{2194}" | "\u{27f7}" => Some(ArrowKind::Both),
            "\u{21cc}" | "\u{21cb}" | "\u{21c4}" | "\u{21c6}" => Some(ArrowKind::Equilibrium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Piece {
    /// Text whose top-left corner sits at `offset`
    Glyphs { offset: Vec2, galley: Arc<Galley> },
    /// Arrow whose tail sits at `offset` on the math axis
    Arrow {
        offset: Vec2,
        width: f32,
        kind: ArrowKind,
        size: f32,
    },
    /// Filled bar whose top-left corner sits at `offset`
    Rule {
        offset: Vec2,
        width: f32,
        thickness: f32,
    },
}

impl Piece {
    fn shifted(mut self, by: Vec2) -> Self {
        match &mut self {
            Piece::Glyphs { offset, .. }
            | Piece::Arrow { offset, .. }
            | Piece::Rule { offset, .. } => *offset += by,
        }
        self
    }
}

/// A laid out formula, positioned relative to its left end on the baseline.
#[derive(Debug, Clone, Default)]
pub struct FormulaBox {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pieces: Vec<Piece>,
}

impl FormulaBox {
    fn space(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Place `other` with its origin at `(dx, dy)`; positive `dy` is down.
    fn place(&mut self, other: FormulaBox, dx: f32, dy: f32) {
        self.width = self.width.max(dx + other.width);
        self.ascent = self.ascent.max(other.ascent - dy);
        self.descent = self.descent.max(other.descent + dy);
        let by = vec2(dx, dy);
        self.pieces
            .extend(other.pieces.into_iter().map(|piece| piece.shifted(by)));
    }

    fn padded(other: FormulaBox, left: f32, right: f32) -> Self {
        let mut out = Self::space(left + other.width + right);
        out.place(other, left, 0.0);
        out
    }

    /// Paint with the left end of the baseline at `origin`.
    pub fn paint(&self, painter: &Painter, origin: Pos2, color: Color32) {
        for piece in &self.pieces {
            match piece {
                Piece::Glyphs { offset, galley } => {
                    painter.galley(origin + *offset, galley.clone(), color);
                }
                Piece::Rule {
                    offset,
                    width,
                    thickness,
                } => {
                    let rect = Rect::from_min_size(origin + *offset, vec2(*width, *thickness));
                    painter.rect_filled(rect, 0.0, color);
                }
                Piece::Arrow {
                    offset,
                    width,
                    kind,
                    size,
                } => paint_arrow(painter, origin + *offset, *width, *kind, *size, color),
            }
        }
    }
}

fn paint_arrow(painter: &Painter, tail: Pos2, width: f32, kind: ArrowKind, size: f32, color: Color32) {
    let stroke = Stroke::new((size * 0.05).max(1.0), color);
    let head = vec2(size * 0.22, size * 0.13);
    let tip = tail + vec2(width, 0.0);

    let line = |a: Pos2, b: Pos2| {
        painter.line_segment([a, b], stroke);
    };
    match kind {
        ArrowKind::Right | ArrowKind::Left | ArrowKind::Both => {
            line(tail, tip);
            if kind != ArrowKind::Left {
                line(tip, tip + vec2(-head.x, -head.y));
                line(tip, tip + vec2(-head.x, head.y));
            }
            if kind != ArrowKind::Right {
                line(tail, tail + vec2(head.x, -head.y));
                line(tail, tail + vec2(head.x, head.y));
            }
        }
        ArrowKind::Equilibrium => {
            let gap = vec2(0.0, size * 0.08);
            let (top_tail, top_tip) = (tail - gap, tip - gap);
            let (low_tail, low_tip) = (tail + gap, tip + gap);
            line(top_tail, top_tip);
            line(top_tip, top_tip + vec2(-head.x, -head.y));
            line(low_tail, low_tip);
            line(low_tail, low_tail + vec2(head.x, head.y));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────────────

/// Lay out `math` at `font_size`.
pub fn layout_formula(fonts: &Fonts, math: &MathNode, font_size: f32) -> FormulaBox {
    Layouter {
        fonts,
        font_size,
    }
    .node(math, font_size)
}

struct Layouter<'a> {
    fonts: &'a Fonts,
    font_size: f32,
}

impl Layouter<'_> {
    fn script_size(&self, size: f32) -> f32 {
        (size * SCRIPT_SCALE).max(self.font_size * MIN_SCRIPT_RATIO)
    }

    fn node(&self, node: &MathNode, size: f32) -> FormulaBox {
        match node {
            MathNode::Token { kind, text, upright } => self.token(*kind, text, *upright, size),
            MathNode::Row(children) => self.row(children, size),
            MathNode::Scripts { base, sub, sup } => {
                self.scripts(base, sub.as_deref(), sup.as_deref(), size)
            }
            MathNode::Stack { base, under, over } => {
                self.stack(base, under.as_deref(), over.as_deref(), size)
            }
            MathNode::Fraction {
                numerator,
                denominator,
            } => self.fraction(numerator, denominator, size),
            MathNode::Space(em) => FormulaBox::space(em * size),
            MathNode::Phantom => FormulaBox::default(),
        }
    }

    fn token(&self, kind: TokenKind, text: &str, upright: bool, size: f32) -> FormulaBox {
        let at_base_size = size >= self.font_size;
        if kind == TokenKind::Operator {
            if let Some(arrow) = ArrowKind::from_operator(text) {
                let pad = if at_base_size { OPERATOR_SPACE_EM * size } else { 0.0 };
                return FormulaBox::padded(self.arrow(arrow, ARROW_MIN_EM * size, size), pad, pad);
            }
        }

        let glyphs = self.glyphs(text, !upright, size);
        if kind == TokenKind::Operator && at_base_size && is_spaced_operator(text) {
            let pad = OPERATOR_SPACE_EM * size;
            FormulaBox::padded(glyphs, pad, pad)
        } else {
            glyphs
        }
    }

    fn glyphs(&self, text: &str, italics: bool, size: f32) -> FormulaBox {
        let mut job = LayoutJob::default();
        job.append(
            text,
            0.0,
            TextFormat {
                font_id: FontId::proportional(size),
                color: Color32::PLACEHOLDER,
                italics,
                ..Default::default()
            },
        );
        let galley = self.fonts.layout_job(job);
        let extent = galley.size();
        let ascent = extent.y * ASCENT_RATIO;

        FormulaBox {
            width: extent.x,
            ascent,
            descent: extent.y - ascent,
            pieces: vec![Piece::Glyphs {
                offset: vec2(0.0, -ascent),
                galley,
            }],
        }
    }

    fn arrow(&self, kind: ArrowKind, width: f32, size: f32) -> FormulaBox {
        let axis = AXIS_EM * size;
        FormulaBox {
            width,
            ascent: axis + size * 0.2,
            descent: 0.0,
            pieces: vec![Piece::Arrow {
                offset: vec2(0.0, -axis),
                width,
                kind,
                size,
            }],
        }
    }

    fn row(&self, children: &[MathNode], size: f32) -> FormulaBox {
        let mut out = FormulaBox::default();
        let mut x = 0.0;
        for child in children {
            let laid = self.node(child, size);
            let width = laid.width;
            out.place(laid, x, 0.0);
            x += width;
        }
        out.width = x;
        out
    }

    fn scripts(
        &self,
        base: &MathNode,
        sub: Option<&MathNode>,
        sup: Option<&MathNode>,
        size: f32,
    ) -> FormulaBox {
        let script_size = self.script_size(size);
        let mut out = self.node(base, size);
        let x = out.width;

        let sub_shift = (if sup.is_some() { 0.3 } else { 0.22 }) * size;
        if let Some(sub) = sub {
            out.place(self.node(sub, script_size), x, sub_shift);
        }
        if let Some(sup) = sup {
            out.place(self.node(sup, script_size), x, -0.42 * size);
        }
        out
    }

    fn stack(
        &self,
        base: &MathNode,
        under: Option<&MathNode>,
        over: Option<&MathNode>,
        size: f32,
    ) -> FormulaBox {
        let label_size = self.script_size(size);
        let over = over.map(|n| self.node(n, label_size));
        let under = under.map(|n| self.node(n, label_size));
        let label_width = over
            .iter()
            .chain(under.iter())
            .map(|b| b.width)
            .fold(0.0, f32::max);

        let arrow = match base {
            MathNode::Token {
                kind: TokenKind::Operator,
                text,
                ..
            } => ArrowKind::from_operator(text),
            _ => None,
        };
        let base = match arrow {
            Some(kind) => {
                let width = (label_width + 0.6 * size).max(ARROW_MIN_EM * size);
                self.arrow(kind, width, size)
            }
            None => self.node(base, size),
        };

        let width = base.width.max(label_width);
        let gap = 0.12 * size;
        let (base_ascent, base_descent) = (base.ascent, base.descent);

        let mut out = FormulaBox::space(width);
        let base_dx = (width - base.width) / 2.0;
        out.place(base, base_dx, 0.0);
        if let Some(over) = over {
            let dy = -(base_ascent + gap + over.descent);
            let dx = (width - over.width) / 2.0;
            out.place(over, dx, dy);
        }
        if let Some(under) = under {
            let dy = base_descent + gap + under.ascent;
            let dx = (width - under.width) / 2.0;
            out.place(under, dx, dy);
        }

        if arrow.is_some() && size >= self.font_size {
            let pad = OPERATOR_SPACE_EM * size;
            FormulaBox::padded(out, pad, pad)
        } else {
            out
        }
    }

    fn fraction(&self, numerator: &MathNode, denominator: &MathNode, size: f32) -> FormulaBox {
        let numerator = self.node(numerator, size);
        let denominator = self.node(denominator, size);
        let axis = AXIS_EM * size;
        let thickness = (0.05 * size).max(1.0);
        let gap = 0.15 * size;
        let margin = 0.1 * size;
        let width = numerator.width.max(denominator.width) + 2.0 * margin;

        let mut out = FormulaBox::space(width);
        let num_dy = -(axis + thickness / 2.0 + gap + numerator.descent);
        let den_dy = -axis + thickness / 2.0 + gap + denominator.ascent;
        let (num_dx, den_dx) = (
            (width - numerator.width) / 2.0,
            (width - denominator.width) / 2.0,
        );
        out.place(numerator, num_dx, num_dy);
        out.place(denominator, den_dx, den_dy);
        out.pieces.push(Piece::Rule {
            offset: vec2(0.0, -axis - thickness / 2.0),
            width,
            thickness,
        });
        out
    }
}

fn is_spaced_operator(text: &str) -> bool {
    matches!(
        text.trim(),
        "+" | "\u{2212}" | "-" | "=" | "\u{00b1}" | "\u{00d7}" | "\u{2261}" | "\u{2248}"
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Widget
// ─────────────────────────────────────────────────────────────────────────────

/// Typeset `math` in the space `ui` offers and return the formula's rect.
pub fn show_formula(ui: &mut Ui, math: &MathNode, font_size: f32, color: Color32) -> Rect {
    let formula = ui.fonts(|fonts| layout_formula(fonts, math, font_size));
    let (rect, _) = ui.allocate_exact_size(vec2(formula.width, formula.height()), Sense::hover());
    formula.paint(
        ui.painter(),
        pos2(rect.left(), rect.top() + formula.ascent),
        color,
    );
    rect
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
