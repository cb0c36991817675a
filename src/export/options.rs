//! Export Options and Configuration
//!
//! This module defines the export formats offered by the editor and the
//! persisted settings that tune the export pipeline.

use serde::{Deserialize, Serialize};

/// Stylesheet carrying KaTeX's font rules, linked from exported documents.
pub const DEFAULT_STYLESHEET_HREF: &str =
    "https://cdn.jsdelivr.net/npm/katex@0.16.22/dist/katex.min.css";

/// Title and heading of exported documents.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Chemical Formula";

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Clipboard encodings the editor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Full HTML document plus a plain-text alternative
    #[default]
    Html,
    /// PNG snapshot of the rendered preview
    Image,
}

impl ExportFormat {
    /// Get the button label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Html => "Copy HTML",
            ExportFormat::Image => "Copy image",
        }
    }

    /// Status message shown after a successful export.
    pub fn success_message(&self) -> &'static str {
        match self {
            ExportFormat::Html => "✅ HTML and plain text copied to clipboard!",
            ExportFormat::Image => "✅ Image copied to clipboard!",
        }
    }

    /// Get all available export formats.
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Html, ExportFormat::Image]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Settings (for persistence)
// ─────────────────────────────────────────────────────────────────────────────

/// Persistent export settings stored in user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Minimum wait before capturing the preview, in milliseconds
    pub settle_delay_ms: u64,

    /// How long status messages stay visible, in seconds
    pub message_duration_secs: f64,

    /// Pixel density of captured images (at least 2)
    pub raster_scale: f32,

    /// Background of captured images as `#rrggbb`
    pub background_color: String,

    /// Stylesheet linked from exported HTML documents
    pub stylesheet_href: String,

    /// Title and heading of exported HTML documents
    pub document_title: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            message_duration_secs: 3.0,
            raster_scale: 2.0,
            background_color: String::from("#ffffff"),
            stylesheet_href: String::from(DEFAULT_STYLESHEET_HREF),
            document_title: String::from(DEFAULT_DOCUMENT_TITLE),
        }
    }
}

impl ExportSettings {
    /// Minimum pixel density of captured images.
    pub const MIN_RASTER_SCALE: f32 = 2.0;
    /// Maximum pixel density of captured images.
    pub const MAX_RASTER_SCALE: f32 = 8.0;
    /// Maximum settling delay.
    pub const MAX_SETTLE_DELAY_MS: u64 = 2000;
    /// Minimum status message duration.
    pub const MIN_MESSAGE_SECS: f64 = 0.5;
    /// Maximum status message duration.
    pub const MAX_MESSAGE_SECS: f64 = 30.0;

    /// Clamp values to valid ranges.
    pub fn sanitize(&mut self) {
        self.raster_scale = if self.raster_scale.is_finite() {
            self.raster_scale
                .clamp(Self::MIN_RASTER_SCALE, Self::MAX_RASTER_SCALE)
        } else {
            Self::MIN_RASTER_SCALE
        };

        self.settle_delay_ms = self.settle_delay_ms.min(Self::MAX_SETTLE_DELAY_MS);

        self.message_duration_secs = if self.message_duration_secs.is_finite() {
            self.message_duration_secs
                .clamp(Self::MIN_MESSAGE_SECS, Self::MAX_MESSAGE_SECS)
        } else {
            Self::default().message_duration_secs
        };

        if super::image::Color::from_hex(&self.background_color).is_none() {
            self.background_color = Self::default().background_color;
        }
    }

    /// Settling delay in seconds, as used by the shell clock.
    pub fn settle_delay_secs(&self) -> f64 {
        self.settle_delay_ms as f64 / 1000.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
