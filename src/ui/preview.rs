//! Preview pane drawing.
//!
//! Formulas are typeset from their MathML structure; output without one
//! (an engine that only emits HTML) falls back to its visible text.
//! Placeholders get their own styling: hints are weak and italic, errors red.

use super::formula::show_formula;
use crate::export::{CloneStyle, Color};
use crate::render::{PlaceholderKind, RenderTarget, TargetContent};
use eframe::egui::{self, Color32, Rect, RichText, Ui};

/// Minimum height of the preview pane.
const PREVIEW_MIN_HEIGHT: f32 = 120.0;

/// Where the preview landed on screen in the last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewArea {
    /// The whole pane
    pub pane: Rect,
    /// The typeset formula, when one is shown
    pub formula: Option<Rect>,
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

/// Draw the preview for `target` and report where it was drawn.
///
/// With a `clone_style` the pane is painted in fixed colors so a capture
/// comes out the same in light and dark mode.
pub fn show_preview(
    ui: &mut Ui,
    target: &RenderTarget,
    font_size: f32,
    clone_style: Option<CloneStyle>,
) -> PreviewArea {
    let is_dark = ui.visuals().dark_mode;
    let (fill, text_color) = match clone_style {
        Some(style) => (to_color32(style.background), to_color32(style.text)),
        None => (ui.visuals().extreme_bg_color, ui.visuals().text_color()),
    };
    let border_color = if is_dark {
        Color32::from_rgb(60, 60, 60)
    } else {
        Color32::from_rgb(220, 220, 220)
    };

    let shown = egui::Frame::none()
        .fill(fill)
        .stroke(egui::Stroke::new(1.0, border_color))
        .rounding(8.0)
        .inner_margin(20.0)
        .show(ui, |ui| {
            ui.set_min_size(egui::vec2(ui.available_width(), PREVIEW_MIN_HEIGHT));
            ui.centered_and_justified(|ui| match target.math() {
                Some(math) => Some(show_formula(ui, math, font_size, text_color)),
                None => {
                    ui.label(content_text(target, font_size, text_color, is_dark));
                    None
                }
            })
            .inner
        });

    PreviewArea {
        pane: shown.response.rect,
        formula: shown.inner,
    }
}

fn content_text(target: &RenderTarget, font_size: f32, text_color: Color32, is_dark: bool) -> RichText {
    match target.content() {
        TargetContent::Empty => RichText::new(""),
        TargetContent::Placeholder {
            kind: PlaceholderKind::Hint,
            text,
        } => RichText::new(text).italics().weak(),
        TargetContent::Placeholder {
            kind: PlaceholderKind::Error,
            ..
        } => {
            let error_color = if is_dark {
                Color32::from_rgb(255, 120, 120)
            } else {
                Color32::from_rgb(200, 40, 40)
            };
            RichText::new(target.text_content()).color(error_color)
        }
        TargetContent::Formula { .. } => RichText::new(target.text_content())
            .size(font_size)
            .color(text_color),
    }
}
