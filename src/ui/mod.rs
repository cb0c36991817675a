//! UI components for Chemdraft
//!
//! This module contains the widgets of the editor window, the formula
//! typesetter behind the preview, and the screenshot-based rasterizer that
//! captures it.

mod capture;
mod formula;
mod presets;
mod preview;

pub use capture::{CaptureHandle, ScreenshotRasterizer};
pub use presets::show_presets;
pub use preview::{show_preview, PreviewArea};
