//! Application shell: wires state changes to the preview and export pipeline.
//!
//! The shell owns the [`AppState`] together with every capability (renderer,
//! rasterizer, clipboard) and runs the effects the reducer asks for. It is
//! driven by the frame loop: [`Shell::dispatch`] for user input and
//! [`Shell::tick`] once per frame to advance an in-flight image capture and
//! expire status messages.

use crate::export::{
    export_html, Clipboard, ExportFormat, ExportSettings, HtmlDocumentOptions, ImageExport,
    RasterOptions, Rasterizer,
};
use crate::preview::PreviewController;
use crate::render::{Document, RendererAdapter};
use crate::state::{Action, AppState, Effect};
use log::debug;
use std::task::Poll;

/// The side-effecting capabilities the shell drives.
pub struct Capabilities {
    pub renderer: RendererAdapter,
    pub rasterizer: Box<dyn Rasterizer>,
    pub clipboard: Box<dyn Clipboard>,
}

pub struct Shell {
    state: AppState,
    preview: PreviewController,
    /// Hosts the detached targets of HTML exports
    document: Document,
    renderer: RendererAdapter,
    rasterizer: Box<dyn Rasterizer>,
    clipboard: Box<dyn Clipboard>,
    export_settings: ExportSettings,
    /// Image export in flight, if any
    job: Option<ImageExport>,
}

impl Shell {
    /// Create the shell and render the initial (empty) preview.
    pub fn new(capabilities: Capabilities, export_settings: ExportSettings) -> Self {
        let Capabilities {
            renderer,
            rasterizer,
            clipboard,
        } = capabilities;

        let mut preview = PreviewController::new();
        preview.sync(&renderer, "");

        Self {
            state: AppState::new(export_settings.message_duration_secs),
            preview,
            document: Document::new(),
            renderer,
            rasterizer,
            clipboard,
            export_settings,
            job: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    /// Whether the frame loop should keep ticking without input.
    pub fn has_pending_work(&self) -> bool {
        self.job.is_some() || self.state.message().is_some()
    }

    /// Apply `action` and run every effect it leads to.
    pub fn dispatch(&mut self, action: Action, now: f64) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            if let Some(effect) = self.state.apply(action, now) {
                next = self.run(effect, now);
            }
        }
    }

    /// Advance time: poll the image export and expire status messages.
    pub fn tick(&mut self, now: f64) {
        if let Some(finished) = self.advance(now) {
            self.dispatch(finished, now);
        }
        self.dispatch(Action::Tick, now);
    }

    fn run(&mut self, effect: Effect, now: f64) -> Option<Action> {
        match effect {
            Effect::RenderPreview => {
                self.preview.sync(&self.renderer, self.state.formula());
                None
            }
            Effect::StartExport(ExportFormat::Html) => {
                let options = HtmlDocumentOptions {
                    title: &self.export_settings.document_title,
                    stylesheet_href: &self.export_settings.stylesheet_href,
                };
                let result = export_html(
                    self.state.formula(),
                    &self.document,
                    &self.renderer,
                    self.clipboard.as_mut(),
                    &options,
                );
                Some(Action::ExportFinished {
                    format: ExportFormat::Html,
                    result,
                })
            }
            Effect::StartExport(ExportFormat::Image) => {
                let started = ImageExport::start(
                    self.preview.target(),
                    RasterOptions::for_export(&self.export_settings),
                    self.export_settings.settle_delay_secs(),
                    now,
                );
                match started {
                    Ok(job) => {
                        self.job = Some(job);
                        self.advance(now)
                    }
                    Err(err) => Some(Action::ExportFinished {
                        format: ExportFormat::Image,
                        result: Err(err),
                    }),
                }
            }
        }
    }

    fn advance(&mut self, now: f64) -> Option<Action> {
        let job = self.job.as_mut()?;
        match job.poll(now, self.rasterizer.as_mut(), self.clipboard.as_mut()) {
            Poll::Pending => None,
            Poll::Ready(result) => {
                debug!("Image export finished");
                self.job = None;
                Some(Action::ExportFinished {
                    format: ExportFormat::Image,
                    result,
                })
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
