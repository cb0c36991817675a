//! Clipboard Operations for Export
//!
//! This module defines the payloads the export pipeline produces and the
//! clipboard capability they are written through. The production
//! implementation uses the arboard crate.

// - enum_variant_names: Error variants follow standard naming convention
#![allow(clippy::enum_variant_names)]

use log::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// MIME type of image payloads.
pub const MIME_PNG: &str = "image/png";
/// MIME type of the rich half of HTML payloads.
pub const MIME_HTML: &str = "text/html";
/// MIME type of the plain half of HTML payloads.
pub const MIME_TEXT: &str = "text/plain";

/// What a single clipboard write carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPayload {
    /// PNG-encoded image, the sole representation
    Image { png: Vec<u8> },
    /// HTML document with a plain-text alternative, written together
    Html { html: String, text: String },
}

impl ExportPayload {
    /// MIME types carried by this payload, in write order.
    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            ExportPayload::Image { .. } => &[MIME_PNG],
            ExportPayload::Html { .. } => &[MIME_HTML, MIME_TEXT],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during clipboard operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// Failed to access clipboard
    AccessError(String),
    /// Failed to set clipboard content
    WriteError(String),
    /// Payload could not be converted for the platform clipboard
    EncodingError(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::AccessError(msg) => write!(f, "Clipboard access error: {}", msg),
            ClipboardError::WriteError(msg) => write!(f, "Clipboard write error: {}", msg),
            ClipboardError::EncodingError(msg) => write!(f, "Clipboard encoding error: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        ClipboardError::WriteError(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Capability
// ─────────────────────────────────────────────────────────────────────────────

/// A system clipboard accepting one payload per write.
///
/// Every representation of the payload is written in a single call, so
/// paste targets see either all of them or none.
pub trait Clipboard {
    fn write(&mut self, payload: &ExportPayload) -> Result<(), ClipboardError>;
}

/// System clipboard backed by arboard.
///
/// The handle is opened lazily and kept alive, since some platforms drop
/// clipboard contents together with their owner.
#[derive(Default)]
pub struct ArboardClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::AccessError(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::AccessError("clipboard handle missing".to_string()))
    }
}

impl Clipboard for ArboardClipboard {
    fn write(&mut self, payload: &ExportPayload) -> Result<(), ClipboardError> {
        let result = match payload {
            ExportPayload::Html { html, text } => self
                .handle()?
                .set_html(html.as_str(), Some(text.as_str()))
                .map_err(ClipboardError::from),
            ExportPayload::Image { png } => {
                let image = png_to_image_data(png)?;
                self.handle()?
                    .set_image(image)
                    .map_err(ClipboardError::from)
            }
        };

        if result.is_err() {
            // Reopen on the next write; the platform handle may be stale.
            self.inner = None;
        } else {
            debug!("Clipboard written ({:?})", payload.mime_types());
        }

        result
    }
}

/// Decode a PNG into the raw RGBA buffer arboard expects.
fn png_to_image_data(png: &[u8]) -> Result<arboard::ImageData<'static>, ClipboardError> {
    let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| ClipboardError::EncodingError(e.to_string()))?
        .to_rgba8();

    Ok(arboard::ImageData {
        width: decoded.width() as usize,
        height: decoded.height() as usize,
        bytes: decoded.into_raw().into(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
