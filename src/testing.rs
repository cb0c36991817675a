//! In-memory capabilities for unit tests.
//!
//! Each fake keeps its state behind an `Rc<RefCell<..>>` so a test can hand a
//! clone to the code under test and still inspect what happened.

use crate::export::{
    Bitmap, Clipboard, ClipboardError, ExportPayload, RasterError, RasterOptions, Rasterizer,
};
use crate::render::{escape_html, ElementKind, EngineError, EngineOptions, RenderEngine};
use std::cell::RefCell;
use std::rc::Rc;
use std::task::Poll;

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct EngineState {
    calls: Vec<(String, EngineOptions)>,
    failure: Option<EngineError>,
}

/// Engine producing KaTeX-shaped markup around the raw markup text.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Rc<RefCell<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: EngineError) -> Self {
        let engine = Self::default();
        engine.state.borrow_mut().failure = Some(error);
        engine
    }

    pub fn calls(&self) -> Vec<(String, EngineOptions)> {
        self.state.borrow().calls.clone()
    }
}

impl RenderEngine for FakeEngine {
    fn render_to_string(&self, markup: &str, options: &EngineOptions) -> Result<String, EngineError> {
        let mut state = self.state.borrow_mut();
        state.calls.push((markup.to_string(), *options));

        if let Some(err) = &state.failure {
            return Err(err.clone());
        }

        let body = markup
            .strip_prefix("\\ce{")
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(markup);
        let inner = format!(
            r#"<span class="katex"><span class="katex-html">{}</span></span>"#,
            escape_html(body)
        );

        Ok(if options.display_mode {
            format!(r#"<span class="katex-display">{}</span>"#, inner)
        } else {
            inner
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ClipboardState {
    writes: Vec<ExportPayload>,
    rejection: Option<String>,
}

/// Clipboard recording every write.
#[derive(Clone, Default)]
pub struct FakeClipboard {
    state: Rc<RefCell<ClipboardState>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that denies every write.
    pub fn rejecting(reason: &str) -> Self {
        let clipboard = Self::default();
        clipboard.state.borrow_mut().rejection = Some(reason.to_string());
        clipboard
    }

    pub fn writes(&self) -> Vec<ExportPayload> {
        self.state.borrow().writes.clone()
    }
}

impl Clipboard for FakeClipboard {
    fn write(&mut self, payload: &ExportPayload) -> Result<(), ClipboardError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.rejection {
            return Err(ClipboardError::WriteError(reason.clone()));
        }
        state.writes.push(payload.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rasterizer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RasterMode {
    /// Bitmap is ready on the first poll
    Immediate,
    /// Bitmap is delivered when the test calls `complete`
    Manual,
    /// Capture fails on the first poll
    Fail,
}

struct RasterState {
    mode: RasterMode,
    begun: Vec<(ElementKind, RasterOptions)>,
    result: Option<Result<Bitmap, RasterError>>,
}

/// Rasterizer producing a small solid bitmap.
#[derive(Clone)]
pub struct FakeRasterizer {
    state: Rc<RefCell<RasterState>>,
}

impl FakeRasterizer {
    fn with_mode(mode: RasterMode) -> Self {
        Self {
            state: Rc::new(RefCell::new(RasterState {
                mode,
                begun: Vec::new(),
                result: None,
            })),
        }
    }

    pub fn immediate() -> Self {
        Self::with_mode(RasterMode::Immediate)
    }

    pub fn manual() -> Self {
        Self::with_mode(RasterMode::Manual)
    }

    pub fn failing() -> Self {
        Self::with_mode(RasterMode::Fail)
    }

    /// Captures started so far.
    pub fn begun(&self) -> Vec<(ElementKind, RasterOptions)> {
        self.state.borrow().begun.clone()
    }

    /// Deliver the bitmap of a manual capture.
    pub fn complete(&self) {
        self.state.borrow_mut().result = Some(Ok(solid_bitmap(2, 2, [0, 0, 0, 255])));
    }
}

impl Rasterizer for FakeRasterizer {
    fn begin(&mut self, element: ElementKind, options: &RasterOptions) -> Result<(), RasterError> {
        let mut state = self.state.borrow_mut();
        state.begun.push((element, options.clone()));
        state.result = match state.mode {
            RasterMode::Immediate => Some(Ok(solid_bitmap(2, 2, [0, 0, 0, 255]))),
            RasterMode::Fail => Some(Err(RasterError::Capture("capture failed".into()))),
            RasterMode::Manual => None,
        };
        Ok(())
    }

    fn poll(&mut self) -> Poll<Result<Bitmap, RasterError>> {
        match self.state.borrow_mut().result.take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

pub fn solid_bitmap(width: u32, height: u32, rgba: [u8; 4]) -> Bitmap {
    Bitmap {
        width,
        height,
        rgba: rgba.repeat((width * height) as usize),
    }
}
