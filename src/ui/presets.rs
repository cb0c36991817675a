//! Quick-test preset panel.

use crate::presets::{Preset, MOLECULAR_FORMULAS, REACTION_EQUATIONS};
use eframe::egui::{self, RichText, Ui};

/// Columns of the molecular formula grid.
const MOLECULAR_COLUMNS: usize = 3;
const MOLECULAR_BUTTON_WIDTH: f32 = 72.0;

/// Draw both preset grids; returns the id of the clicked preset, if any.
pub fn show_presets(ui: &mut Ui) -> Option<&'static str> {
    let mut selected = None;

    ui.add_space(8.0);
    ui.label(RichText::new("Quick test").strong().size(16.0));
    ui.add_space(8.0);

    ui.label(RichText::new("Molecular formulas").weak());
    egui::Grid::new("molecular_presets")
        .num_columns(MOLECULAR_COLUMNS)
        .spacing([6.0, 6.0])
        .show(ui, |ui| {
            for (i, preset) in MOLECULAR_FORMULAS.iter().enumerate() {
                if preset_button(ui, preset, MOLECULAR_BUTTON_WIDTH) {
                    selected = Some(preset.id);
                }
                if (i + 1) % MOLECULAR_COLUMNS == 0 {
                    ui.end_row();
                }
            }
        });

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.label(RichText::new("Reaction equations").weak());
    let width = ui.available_width();
    for preset in REACTION_EQUATIONS.iter() {
        if preset_button(ui, preset, width) {
            selected = Some(preset.id);
        }
    }

    selected
}

fn preset_button(ui: &mut Ui, preset: &Preset, width: f32) -> bool {
    ui.add_sized([width, 24.0], egui::Button::new(preset.label))
        .on_hover_text(preset.formula)
        .clicked()
}
