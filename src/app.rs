//! Main application module for Chemdraft
//!
//! This module implements the eframe App trait for the formula editor,
//! forwarding user input to the shell and drawing its state every frame.

use crate::config::{save_config_silent, Settings, Theme, WindowSize};
use crate::export::{ArboardClipboard, ExportFormat};
use crate::render::{KatexEngine, RendererAdapter};
use crate::shell::{Capabilities, Shell};
use crate::state::{Action, MessageKind};
use crate::ui::{show_presets, show_preview, CaptureHandle, PreviewArea, ScreenshotRasterizer};
use eframe::egui::{self, Color32, RichText};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Window heading, also used as the native window title.
pub const WINDOW_TITLE: &str = "Chemical Formula Editor";

/// Repaint interval while an export or status message is pending.
const PENDING_REPAINT_INTERVAL: Duration = Duration::from_millis(50);

/// The main application struct that holds all state and implements eframe::App.
pub struct ChemdraftApp {
    shell: Shell,
    /// Frame-loop side of the screenshot rasterizer
    capture: CaptureHandle,
    settings: Settings,
    /// Text edit buffer, mirrored into the shell on every change
    input: String,
    /// Where the preview was painted in the last frame
    preview_area: Option<PreviewArea>,
    /// Last known window size (for detecting changes)
    last_window_size: Option<egui::Vec2>,
    /// Last known window position (for detecting changes)
    last_window_pos: Option<egui::Pos2>,
    /// Application start time, the clock of the shell
    start_time: Instant,
}

impl ChemdraftApp {
    /// Create a new app with production capabilities.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        info!("Initializing {}", WINDOW_TITLE);

        apply_theme(&cc.egui_ctx, settings.theme);

        let capture = CaptureHandle::new();
        let capabilities = Capabilities {
            renderer: RendererAdapter::new(KatexEngine::new()),
            rasterizer: Box::new(ScreenshotRasterizer::new(capture.clone())),
            clipboard: Box::new(ArboardClipboard::new()),
        };

        Self {
            shell: Shell::new(capabilities, settings.export.clone()),
            capture,
            settings,
            input: String::new(),
            preview_area: None,
            last_window_size: None,
            last_window_pos: None,
            start_time: Instant::now(),
        }
    }

    /// Get elapsed time since app start in seconds.
    fn get_app_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Hand a pending viewport screenshot to the rasterizer.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if !self.capture.is_awaiting_screenshot() {
            return;
        }

        let screenshot = ctx.input(|i| {
            i.raw.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });

        if let (Some(image), Some(area)) = (screenshot, self.preview_area) {
            debug!("Screenshot event: {}x{}", image.size[0], image.size[1]);
            self.capture.finish(&image, area, ctx.pixels_per_point());
        }
    }

    fn dispatch(&mut self, action: Action) {
        let now = self.get_app_time();
        self.shell.dispatch(action, now);
    }

    /// Update window size in settings if changed.
    fn update_window_state(&mut self, ctx: &egui::Context) {
        let Some(rect) = ctx.input(|i| i.viewport().outer_rect) else {
            return;
        };
        let (current_size, current_pos) = (rect.size(), rect.min);

        let size_changed = self
            .last_window_size
            .map(|s| (s - current_size).length() > 1.0)
            .unwrap_or(true);
        let pos_changed = self
            .last_window_pos
            .map(|p| (p - current_pos).length() > 1.0)
            .unwrap_or(true);

        if size_changed || pos_changed {
            self.last_window_size = Some(current_size);
            self.last_window_pos = Some(current_pos);

            let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
            self.settings.window_size = WindowSize {
                width: current_size.x,
                height: current_size.y,
                x: Some(current_pos.x),
                y: Some(current_pos.y),
                maximized,
            };
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Panels
    // ─────────────────────────────────────────────────────────────────────────

    fn render_presets_panel(&mut self, ctx: &egui::Context) {
        let selected = egui::SidePanel::left("presets_panel")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| show_presets(ui))
                    .inner
            })
            .inner;

        if let Some(id) = selected {
            self.dispatch(Action::SelectPreset(id.to_string()));
            self.input = self.shell.state().formula().to_string();
        }
    }

    fn render_main_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            ui.heading(RichText::new(WINDOW_TITLE).size(24.0).strong());
            ui.add_space(12.0);

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Enter a formula, e.g. H2SO4 + Cu -> CuSO4 + SO2 + H2O")
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace),
            );
            if response.changed() {
                let formula = self.input.clone();
                self.dispatch(Action::SetFormula(formula));
            }

            ui.add_space(12.0);
            let area = show_preview(
                ui,
                self.shell.preview().target(),
                self.settings.preview_font_size,
                self.capture.clone_style(),
            );
            self.preview_area = Some(area);

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                for format in ExportFormat::all() {
                    if ui.button(format.label()).clicked() {
                        self.dispatch(Action::RequestExport(*format));
                    }
                }
            });

            ui.add_space(8.0);
            if self.shell.state().in_progress() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("Exporting...").weak());
                });
            }

            if let Some(message) = self.shell.state().message() {
                let is_dark = ui.visuals().dark_mode;
                ui.label(RichText::new(&message.text).color(message_color(message.kind, is_dark)));
            }
        });
    }
}

impl eframe::App for ChemdraftApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshot(ctx);

        let now = self.get_app_time();
        self.shell.tick(now);

        self.render_presets_panel(ctx);
        self.render_main_panel(ctx);

        if self.capture.take_screenshot_request() {
            debug!("Requesting viewport screenshot");
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot);
        }

        if self.capture.is_awaiting_screenshot() {
            ctx.request_repaint();
        } else if self.shell.has_pending_work() {
            ctx.request_repaint_after(PENDING_REPAINT_INTERVAL);
        }

        self.update_window_state(ctx);
    }

    /// Called when the application is about to close.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application exiting");
        save_config_silent(&self.settings);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    match theme {
        Theme::Light => ctx.set_visuals(egui::Visuals::light()),
        Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        Theme::System => {}
    }
}

fn message_color(kind: MessageKind, is_dark: bool) -> Color32 {
    match (kind, is_dark) {
        (MessageKind::Error, true) => Color32::from_rgb(255, 120, 120),
        (MessageKind::Error, false) => Color32::from_rgb(200, 40, 40),
        (MessageKind::Success | MessageKind::Info, true) => Color32::from_rgb(120, 220, 140),
        (MessageKind::Success | MessageKind::Info, false) => Color32::from_rgb(30, 130, 60),
    }
}
