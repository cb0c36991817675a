//! Export failure taxonomy.

use super::clipboard::ClipboardError;
use super::image::RasterError;
use std::fmt;

/// Why an export attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The preview holds nothing that could be captured
    ElementNotFound,
    /// The rendering engine is missing
    RendererUnavailable,
    /// The rasterizer could not capture the element
    Rasterize(RasterError),
    /// The captured bitmap could not be encoded
    Encode(String),
    /// The clipboard rejected the write
    Clipboard(ClipboardError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::ElementNotFound => write!(f, "No rendered formula element found"),
            ExportError::RendererUnavailable => write!(f, "Rendering engine not loaded"),
            ExportError::Rasterize(err) => write!(f, "Image capture failed: {}", err),
            ExportError::Encode(msg) => write!(f, "PNG encoding failed: {}", msg),
            ExportError::Clipboard(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Rasterize(err) => Some(err),
            ExportError::Clipboard(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClipboardError> for ExportError {
    fn from(err: ClipboardError) -> Self {
        ExportError::Clipboard(err)
    }
}

impl From<RasterError> for ExportError {
    fn from(err: RasterError) -> Self {
        ExportError::Rasterize(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_clipboard_error_conversion() {
        let err: ExportError = ClipboardError::WriteError("denied".into()).into();
        assert!(matches!(err, ExportError::Clipboard(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_simple_variants_have_no_source() {
        assert!(ExportError::ElementNotFound.source().is_none());
        assert!(ExportError::RendererUnavailable.source().is_none());
    }
}
