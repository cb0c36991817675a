//! Image Export
//!
//! Captures the rendered preview through an injected [`Rasterizer`], encodes
//! the bitmap as PNG and writes it to the clipboard as the only payload.
//!
//! The capture runs as a job driven by the shell clock: it first waits for a
//! settling delay, then starts the rasterizer and polls it on every tick
//! until the bitmap is ready. Nothing blocks in between, so input keeps
//! being processed while a capture is in flight.

use super::clipboard::{Clipboard, ExportPayload};
use super::error::ExportError;
use super::options::ExportSettings;
use crate::render::{ElementKind, RenderTarget};
use log::{debug, info};
use std::fmt;
use std::io::Cursor;
use std::task::Poll;

// ─────────────────────────────────────────────────────────────────────────────
// Colors
// ─────────────────────────────────────────────────────────────────────────────

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Colors forced onto the captured subtree so the result is legible
/// regardless of the on-screen theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneStyle {
    pub text: Color,
    pub background: Color,
}

impl Default for CloneStyle {
    fn default() -> Self {
        Self {
            text: Color::BLACK,
            background: Color::WHITE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rasterizer Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Options handed to the rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Solid background behind the element
    pub background: Color,
    /// Output pixels per logical pixel (at least 2)
    pub scale: f32,
    /// Allow content from other origins to be drawn
    pub cross_origin_permissive: bool,
    /// Styling applied to the captured copy before drawing
    pub clone_style: Option<CloneStyle>,
}

impl RasterOptions {
    /// Options for clipboard image export.
    pub fn for_export(settings: &ExportSettings) -> Self {
        Self {
            background: Color::from_hex(&settings.background_color).unwrap_or(Color::WHITE),
            scale: settings.raster_scale.max(ExportSettings::MIN_RASTER_SCALE),
            cross_origin_permissive: true,
            clone_style: Some(CloneStyle::default()),
        }
    }
}

/// A captured RGBA bitmap (non-premultiplied, row-major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Errors reported by a rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// The rasterizer is already busy with another capture
    Busy,
    /// Capturing the element failed
    Capture(String),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::Busy => write!(f, "Another capture is in progress"),
            RasterError::Capture(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RasterError {}

/// Turns a rendered element into a bitmap.
///
/// `begin` starts a capture; `poll` is called on later ticks until it yields
/// the bitmap. Implementations must not block in either call.
pub trait Rasterizer {
    fn begin(&mut self, element: ElementKind, options: &RasterOptions) -> Result<(), RasterError>;

    fn poll(&mut self) -> Poll<Result<Bitmap, RasterError>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// PNG Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Flatten `bitmap` onto `background` and encode it as PNG.
pub fn encode_png(bitmap: &Bitmap, background: Color) -> Result<Vec<u8>, ExportError> {
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(ExportError::Encode("bitmap is empty".to_string()));
    }

    let expected = bitmap.width as usize * bitmap.height as usize * 4;
    if bitmap.rgba.len() != expected {
        return Err(ExportError::Encode(format!(
            "expected {} bytes of RGBA data, got {}",
            expected,
            bitmap.rgba.len()
        )));
    }

    let flattened: Vec<u8> = bitmap
        .rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let alpha = px[3] as u32;
            let blend = |fg: u8, bg: u8| {
                ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
            };
            [
                blend(px[0], background.r),
                blend(px[1], background.g),
                blend(px[2], background.b),
                255,
            ]
        })
        .collect();

    let buffer = image::RgbaImage::from_raw(bitmap.width, bitmap.height, flattened)
        .ok_or_else(|| ExportError::Encode("bitmap dimensions do not match".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(buffer)
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    Ok(png.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Job
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Waiting for pending paints to land
    Settling { until: f64 },
    /// Rasterizer started, waiting for the bitmap
    Capturing,
}

/// An image export in flight.
#[derive(Debug)]
pub struct ImageExport {
    element: ElementKind,
    options: RasterOptions,
    phase: Phase,
}

impl ImageExport {
    /// Start capturing the formula shown in `target`.
    ///
    /// Fails immediately when the target holds nothing to capture.
    pub fn start(
        target: &RenderTarget,
        options: RasterOptions,
        settle_delay: f64,
        now: f64,
    ) -> Result<Self, ExportError> {
        let element = target
            .find_formula_element()
            .ok_or(ExportError::ElementNotFound)?;

        debug!("Image export targets {:?} element", element);

        Ok(Self {
            element,
            options,
            phase: Phase::Settling {
                until: now + settle_delay.max(0.0),
            },
        })
    }

    /// Advance the job; `Ready` once the clipboard was written or the
    /// export failed.
    pub fn poll(
        &mut self,
        now: f64,
        rasterizer: &mut dyn Rasterizer,
        clipboard: &mut dyn Clipboard,
    ) -> Poll<Result<(), ExportError>> {
        if let Phase::Settling { until } = self.phase {
            if now < until {
                return Poll::Pending;
            }

            if let Err(err) = rasterizer.begin(self.element, &self.options) {
                return Poll::Ready(Err(err.into()));
            }
            debug!("Capture started at scale {}", self.options.scale);
            self.phase = Phase::Capturing;
        }

        match rasterizer.poll() {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
            Poll::Ready(Ok(bitmap)) => Poll::Ready(self.deliver(&bitmap, clipboard)),
        }
    }

    fn deliver(&self, bitmap: &Bitmap, clipboard: &mut dyn Clipboard) -> Result<(), ExportError> {
        let png = encode_png(bitmap, self.options.background)?;
        let size = png.len();

        clipboard.write(&ExportPayload::Image { png })?;

        info!(
            "Copied {}x{} image ({} bytes) to clipboard",
            bitmap.width, bitmap.height, size
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ClipboardError;
    use crate::render::{ElementKind, PlaceholderKind};
    use crate::testing::{solid_bitmap, FakeClipboard, FakeRasterizer};

    fn rendered_target() -> RenderTarget {
        let mut target = RenderTarget::new();
        target.set_formula(
            r#"<span class="katex-display"><span class="katex">H2O</span></span>"#.to_string(),
            true,
        );
        target
    }

    fn options() -> RasterOptions {
        RasterOptions::for_export(&ExportSettings::default())
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("000000"), Some(Color::BLACK));
        assert_eq!(Color::from_hex("#12ab9F"), Some(Color::rgb(0x12, 0xab, 0x9f)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gggggg"), None);
    }

    #[test]
    fn test_raster_options_for_export() {
        let settings = ExportSettings {
            raster_scale: 1.0,
            ..ExportSettings::default()
        };
        let options = RasterOptions::for_export(&settings);

        assert_eq!(options.scale, 2.0);
        assert_eq!(options.background, Color::WHITE);
        assert!(options.cross_origin_permissive);
        assert_eq!(
            options.clone_style,
            Some(CloneStyle {
                text: Color::BLACK,
                background: Color::WHITE,
            })
        );
    }

    #[test]
    fn test_encode_png_produces_png() {
        let png = encode_png(&solid_bitmap(4, 3, [255, 0, 0, 255]), Color::WHITE).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_png_flattens_transparency() {
        let png = encode_png(&solid_bitmap(1, 1, [0, 0, 0, 0]), Color::WHITE).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_encode_png_rejects_bad_bitmaps() {
        let empty = Bitmap {
            width: 0,
            height: 0,
            rgba: vec![],
        };
        assert!(matches!(encode_png(&empty, Color::WHITE), Err(ExportError::Encode(_))));

        let short = Bitmap {
            width: 2,
            height: 2,
            rgba: vec![0; 4],
        };
        assert!(matches!(encode_png(&short, Color::WHITE), Err(ExportError::Encode(_))));
    }

    #[test]
    fn test_start_without_element_fails() {
        let result = ImageExport::start(&RenderTarget::new(), options(), 0.1, 0.0);
        assert!(matches!(result, Err(ExportError::ElementNotFound)));
    }

    #[test]
    fn test_start_falls_back_to_container() {
        let mut target = RenderTarget::new();
        target.show_placeholder(PlaceholderKind::Error, "Render error");

        let mut job = ImageExport::start(&target, options(), 0.0, 0.0).unwrap();
        let mut rasterizer = FakeRasterizer::immediate();
        let mut clipboard = FakeClipboard::new();

        assert!(job.poll(0.0, &mut rasterizer, &mut clipboard).is_ready());
        assert_eq!(rasterizer.begun()[0].0, ElementKind::Container);
    }

    #[test]
    fn test_waits_for_settling_delay() {
        let mut job = ImageExport::start(&rendered_target(), options(), 0.1, 10.0).unwrap();
        let mut rasterizer = FakeRasterizer::immediate();
        let mut clipboard = FakeClipboard::new();

        assert!(job.poll(10.05, &mut rasterizer, &mut clipboard).is_pending());
        assert!(rasterizer.begun().is_empty());

        let result = job.poll(10.2, &mut rasterizer, &mut clipboard);
        assert_eq!(result, Poll::Ready(Ok(())));

        let (element, options) = &rasterizer.begun()[0];
        assert_eq!(*element, ElementKind::DisplayFormula);
        assert!(options.scale >= 2.0);
    }

    #[test]
    fn test_writes_png_as_sole_payload() {
        let mut job = ImageExport::start(&rendered_target(), options(), 0.0, 0.0).unwrap();
        let mut rasterizer = FakeRasterizer::immediate();
        let mut clipboard = FakeClipboard::new();

        let _ = job.poll(0.0, &mut rasterizer, &mut clipboard);

        let writes = clipboard.writes();
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            ExportPayload::Image { png } => assert_eq!(&png[1..4], b"PNG"),
            other => panic!("Expected image payload, got {:?}", other),
        }
    }

    #[test]
    fn test_pending_capture_keeps_job_alive() {
        let mut job = ImageExport::start(&rendered_target(), options(), 0.0, 0.0).unwrap();
        let mut rasterizer = FakeRasterizer::manual();
        let mut clipboard = FakeClipboard::new();

        assert!(job.poll(0.0, &mut rasterizer, &mut clipboard).is_pending());
        assert!(job.poll(1.0, &mut rasterizer, &mut clipboard).is_pending());
        assert_eq!(rasterizer.begun().len(), 1);

        rasterizer.complete();
        assert_eq!(
            job.poll(2.0, &mut rasterizer, &mut clipboard),
            Poll::Ready(Ok(()))
        );
        assert_eq!(clipboard.writes().len(), 1);
    }

    #[test]
    fn test_capture_failure_skips_clipboard() {
        let mut job = ImageExport::start(&rendered_target(), options(), 0.0, 0.0).unwrap();
        let mut rasterizer = FakeRasterizer::failing();
        let mut clipboard = FakeClipboard::new();

        let result = job.poll(0.0, &mut rasterizer, &mut clipboard);

        assert!(matches!(result, Poll::Ready(Err(ExportError::Rasterize(_)))));
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn test_clipboard_rejection_fails_export() {
        let mut job = ImageExport::start(&rendered_target(), options(), 0.0, 0.0).unwrap();
        let mut rasterizer = FakeRasterizer::immediate();
        let mut clipboard = FakeClipboard::rejecting("permission denied");

        let result = job.poll(0.0, &mut rasterizer, &mut clipboard);

        assert_eq!(
            result,
            Poll::Ready(Err(ExportError::Clipboard(ClipboardError::WriteError(
                "permission denied".to_string()
            ))))
        );
    }
}
