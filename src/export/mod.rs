//! Clipboard Export Pipeline for Chemdraft
//!
//! This module turns a rendered formula into clipboard content, either as a
//! PNG snapshot of the preview or as an HTML document with a plain-text
//! alternative.
//!
//! # Supported Export Formats
//!
//! - **Image**: PNG capture of the preview, written as the sole payload
//! - **HTML**: Off-screen re-render wrapped in a styled document, written
//!   together with its plain text
//!
//! # Architecture
//!
//! - `options.rs` - Export formats and persisted export settings
//! - `html.rs` - HTML document generation and the HTML export
//! - `image.rs` - Rasterizer capability, PNG encoding and the image export job
//! - `clipboard.rs` - Payloads and platform clipboard operations
//! - `error.rs` - Export failure taxonomy

pub mod clipboard;
pub mod error;
pub mod html;
pub mod image;
pub mod options;

pub use clipboard::{ArboardClipboard, Clipboard, ClipboardError, ExportPayload};
pub use error::ExportError;
pub use html::{export_html, HtmlDocumentOptions};
pub use image::{
    encode_png, Bitmap, CloneStyle, Color, ImageExport, RasterError, RasterOptions, Rasterizer,
};
pub use options::{ExportFormat, ExportSettings};
