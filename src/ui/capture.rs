//! Screenshot-based rasterizer.
//!
//! egui cannot render an arbitrary widget off-screen, so the preview is
//! captured from a viewport screenshot instead. A capture takes a few frames:
//!
//! 1. `begin` records the request; the preview is painted with the clone
//!    style from the next frame on.
//! 2. The app asks for a screenshot once that frame has been painted.
//! 3. The screenshot event arrives; the captured element's rect is cropped
//!    out, upscaled to the requested scale and handed back through `poll`.

use super::preview::PreviewArea;
use crate::export::{Bitmap, CloneStyle, RasterError, RasterOptions, Rasterizer};
use crate::render::ElementKind;
use eframe::egui::{ColorImage, Rect};
use image::imageops::{self, FilterType};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use std::task::Poll;

#[derive(Debug, Default)]
enum CapturePhase {
    #[default]
    Idle,
    /// Preview is being painted with the clone style
    Styling(RasterOptions, ElementKind),
    /// Screenshot requested, waiting for the event
    Awaiting(RasterOptions, ElementKind),
    /// Bitmap (or failure) ready to be polled
    Done(Result<Bitmap, RasterError>),
}

/// Frame-loop side of a capture, shared with [`ScreenshotRasterizer`].
#[derive(Debug, Clone, Default)]
pub struct CaptureHandle {
    phase: Rc<RefCell<CapturePhase>>,
}

impl CaptureHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Styling the preview should use while a capture is running.
    pub fn clone_style(&self) -> Option<CloneStyle> {
        match &*self.phase.borrow() {
            CapturePhase::Styling(options, _) | CapturePhase::Awaiting(options, _) => {
                options.clone_style
            }
            _ => None,
        }
    }

    /// Returns `true` exactly once per capture, after the styled preview
    /// has been painted. The caller must then request a screenshot.
    pub fn take_screenshot_request(&self) -> bool {
        let mut phase = self.phase.borrow_mut();
        match std::mem::take(&mut *phase) {
            CapturePhase::Styling(options, element) => {
                *phase = CapturePhase::Awaiting(options, element);
                true
            }
            other => {
                *phase = other;
                false
            }
        }
    }

    pub fn is_awaiting_screenshot(&self) -> bool {
        matches!(&*self.phase.borrow(), CapturePhase::Awaiting(..))
    }

    /// Feed a viewport screenshot together with where the preview was drawn.
    pub fn finish(&self, screenshot: &ColorImage, area: PreviewArea, pixels_per_point: f32) {
        let mut phase = self.phase.borrow_mut();
        if let CapturePhase::Awaiting(options, element) = &*phase {
            let rect = capture_rect(*element, area);
            let result = crop_and_scale(screenshot, rect, pixels_per_point, options.scale);
            debug!("Screenshot received, capture ok: {}", result.is_ok());
            *phase = CapturePhase::Done(result);
        }
    }
}

/// [`Rasterizer`] capturing the on-screen preview.
#[derive(Debug, Clone)]
pub struct ScreenshotRasterizer {
    handle: CaptureHandle,
}

impl ScreenshotRasterizer {
    pub fn new(handle: CaptureHandle) -> Self {
        Self { handle }
    }
}

impl Rasterizer for ScreenshotRasterizer {
    fn begin(&mut self, element: ElementKind, options: &RasterOptions) -> Result<(), RasterError> {
        let mut phase = self.handle.phase.borrow_mut();
        if !matches!(*phase, CapturePhase::Idle) {
            return Err(RasterError::Busy);
        }

        debug!("Capturing {:?} element", element);
        *phase = CapturePhase::Styling(options.clone(), element);
        Ok(())
    }

    fn poll(&mut self) -> Poll<Result<Bitmap, RasterError>> {
        let mut phase = self.handle.phase.borrow_mut();
        match std::mem::take(&mut *phase) {
            CapturePhase::Done(result) => Poll::Ready(result),
            other => {
                *phase = other;
                Poll::Pending
            }
        }
    }
}

/// Margin kept around a typeset formula, in points.
const FORMULA_MARGIN: f32 = 12.0;

/// Screen rect covering `element`: the typeset formula plus a margin when
/// there is one, the whole pane otherwise.
fn capture_rect(element: ElementKind, area: PreviewArea) -> Rect {
    match (element, area.formula) {
        (ElementKind::DisplayFormula | ElementKind::InlineFormula, Some(formula)) => formula
            .expand(FORMULA_MARGIN)
            .intersect(area.pane),
        _ => area.pane,
    }
}

/// Cut `rect` (in points) out of a screenshot and upscale it so one point
/// maps to `scale` output pixels.
pub fn crop_and_scale(
    screenshot: &ColorImage,
    rect: Rect,
    pixels_per_point: f32,
    scale: f32,
) -> Result<Bitmap, RasterError> {
    let [width, height] = screenshot.size;
    let to_px = |v: f32, max: usize| ((v * pixels_per_point).round().max(0.0) as usize).min(max);

    let (x0, x1) = (to_px(rect.min.x, width), to_px(rect.max.x, width));
    let (y0, y1) = (to_px(rect.min.y, height), to_px(rect.max.y, height));
    if x1 <= x0 || y1 <= y0 {
        return Err(RasterError::Capture(
            "preview is outside the screenshot".to_string(),
        ));
    }

    let mut rgba = Vec::with_capacity((x1 - x0) * (y1 - y0) * 4);
    for y in y0..y1 {
        for pixel in &screenshot.pixels[y * width + x0..y * width + x1] {
            rgba.extend_from_slice(&pixel.to_srgba_unmultiplied());
        }
    }

    let (crop_w, crop_h) = ((x1 - x0) as u32, (y1 - y0) as u32);
    if scale <= pixels_per_point {
        return Ok(Bitmap {
            width: crop_w,
            height: crop_h,
            rgba,
        });
    }

    let buffer = image::RgbaImage::from_raw(crop_w, crop_h, rgba)
        .ok_or_else(|| RasterError::Capture("screenshot buffer size mismatch".to_string()))?;
    let factor = scale / pixels_per_point;
    let resized = imageops::resize(
        &buffer,
        (crop_w as f32 * factor).round() as u32,
        (crop_h as f32 * factor).round() as u32,
        FilterType::Lanczos3,
    );

    Ok(Bitmap {
        width: resized.width(),
        height: resized.height(),
        rgba: resized.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportSettings;
    use eframe::egui::{pos2, Color32};

    const ELEMENT: ElementKind = ElementKind::DisplayFormula;

    fn area(pane: Rect, formula: Option<Rect>) -> PreviewArea {
        PreviewArea { pane, formula }
    }

    #[test]
    fn test_capture_rect_prefers_formula() {
        let pane = Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 200.0));
        let formula = Rect::from_min_max(pos2(100.0, 80.0), pos2(300.0, 120.0));

        assert_eq!(
            capture_rect(ElementKind::DisplayFormula, area(pane, Some(formula))),
            Rect::from_min_max(pos2(88.0, 68.0), pos2(312.0, 132.0))
        );
        assert_eq!(capture_rect(ElementKind::Container, area(pane, Some(formula))), pane);
        assert_eq!(capture_rect(ElementKind::DisplayFormula, area(pane, None)), pane);
    }

    #[test]
    fn test_capture_rect_stays_inside_pane() {
        let pane = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 50.0));
        let formula = Rect::from_min_max(pos2(-20.0, 5.0), pos2(90.0, 45.0));

        assert_eq!(
            capture_rect(ElementKind::InlineFormula, area(pane, Some(formula))),
            pane
        );
    }

    #[test]
    fn test_crop_without_upscale() {
        let mut screenshot = ColorImage::new([4, 4], Color32::WHITE);
        screenshot.pixels[4 + 1] = Color32::BLACK;

        let rect = Rect::from_min_max(pos2(1.0, 1.0), pos2(3.0, 3.0));
        let bitmap = crop_and_scale(&screenshot, rect, 1.0, 1.0).unwrap();

        assert_eq!((bitmap.width, bitmap.height), (2, 2));
        assert_eq!(&bitmap.rgba[..4], &[0, 0, 0, 255]);
        assert_eq!(&bitmap.rgba[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_crop_upscales_to_requested_scale() {
        let screenshot = ColorImage::new([10, 10], Color32::WHITE);
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(5.0, 4.0));

        let bitmap = crop_and_scale(&screenshot, rect, 1.0, 2.0).unwrap();

        assert_eq!((bitmap.width, bitmap.height), (10, 8));
        assert_eq!(bitmap.rgba.len(), 10 * 8 * 4);
    }

    #[test]
    fn test_crop_respects_pixels_per_point() {
        let screenshot = ColorImage::new([20, 20], Color32::WHITE);
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(5.0, 5.0));

        let bitmap = crop_and_scale(&screenshot, rect, 2.0, 2.0).unwrap();

        assert_eq!((bitmap.width, bitmap.height), (10, 10));
    }

    #[test]
    fn test_crop_outside_fails() {
        let screenshot = ColorImage::new([4, 4], Color32::WHITE);
        let rect = Rect::from_min_max(pos2(10.0, 10.0), pos2(20.0, 20.0));

        assert!(crop_and_scale(&screenshot, rect, 1.0, 2.0).is_err());
    }

    #[test]
    fn test_capture_cycle() {
        let handle = CaptureHandle::new();
        let mut rasterizer = ScreenshotRasterizer::new(handle.clone());
        let options = RasterOptions::for_export(&ExportSettings::default());

        assert!(handle.clone_style().is_none());
        rasterizer.begin(ELEMENT, &options).unwrap();
        assert_eq!(rasterizer.begin(ELEMENT, &options), Err(RasterError::Busy));
        assert!(handle.clone_style().is_some());
        assert!(rasterizer.poll().is_pending());

        assert!(handle.take_screenshot_request());
        assert!(!handle.take_screenshot_request());
        assert!(handle.is_awaiting_screenshot());

        let screenshot = ColorImage::new([8, 8], Color32::WHITE);
        let pane = Rect::from_min_max(pos2(0.0, 0.0), pos2(8.0, 8.0));
        let formula = Rect::from_min_max(pos2(3.0, 3.0), pos2(4.0, 4.0));
        handle.finish(&screenshot, area(pane, Some(formula)), 1.0);

        match rasterizer.poll() {
            Poll::Ready(Ok(bitmap)) => assert_eq!(bitmap.width, 16),
            other => panic!("Expected bitmap, got {:?}", other),
        }
        assert!(handle.clone_style().is_none());
        assert!(rasterizer.begin(ELEMENT, &options).is_ok());
    }

    #[test]
    fn test_finish_without_request_is_ignored() {
        let handle = CaptureHandle::new();
        let mut rasterizer = ScreenshotRasterizer::new(handle.clone());

        handle.finish(
            &ColorImage::new([2, 2], Color32::WHITE),
            area(Rect::NOTHING, None),
            1.0,
        );

        assert!(rasterizer.poll().is_pending());
    }
}
