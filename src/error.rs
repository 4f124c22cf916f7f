//! Error types shared by every stage of the rendering pipeline.

use thiserror::Error;

/// Boxed cause carried by [`QrError::Render`] and [`QrError::Asset`].
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Failure modes of a render call.
///
/// Configuration problems are reported before any pixel work starts. Anything
/// that goes wrong while the pipeline is running is folded into
/// [`QrError::Render`], so callers only have one failure type to handle.
/// Cancellation is kept apart so it can be told from a genuine failure.
#[derive(Error, Debug)]
pub enum QrError {
    /// The caller supplied something unusable: empty payload, non-square
    /// matrix, out-of-range style parameter, or data that does not fit.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An internal stage failed while rendering.
    #[error("rendering failed during {stage}: {source}")]
    Render {
        stage: &'static str,
        #[source]
        source: Cause,
    },

    /// A logo or background image could not be loaded or decoded.
    #[error("failed to load image: {0}")]
    Asset(#[source] Cause),

    /// The render was cancelled through its [`crate::cancel::CancellationToken`].
    #[error("rendering cancelled")]
    Cancelled,
}

impl QrError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        QrError::Configuration(message.into())
    }

    pub(crate) fn render(stage: &'static str, source: impl Into<Cause>) -> Self {
        QrError::Render { stage, source: source.into() }
    }

    /// Returns `true` for [`QrError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QrError::Cancelled)
    }
}

impl From<image::ImageError> for QrError {
    fn from(err: image::ImageError) -> Self {
        QrError::Asset(Box::new(err))
    }
}

impl From<std::io::Error> for QrError {
    fn from(err: std::io::Error) -> Self {
        QrError::Asset(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, QrError>;

/// Runs `f`, turning a panic (typically from a user shape or color callback)
/// into [`QrError::Render`] for `stage`.
pub(crate) fn catch_panic<T>(stage: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with a non-string payload".to_string());
        tracing::warn!(stage, %message, "render stage panicked");
        Err(QrError::render(stage, message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_keeps_stage_and_cause() {
        let err = QrError::render("raster", "boom");
        assert_eq!(err.to_string(), "rendering failed during raster: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_catch_panic_wraps_message() {
        let err = catch_panic::<()>("shapes", || panic!("bad callback")).unwrap_err();
        assert!(matches!(err, QrError::Render { stage: "shapes", .. }));
        assert!(err.to_string().contains("bad callback"));
        assert!(catch_panic("shapes", || Err::<(), _>(QrError::Cancelled)).unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(QrError::Cancelled.is_cancelled());
        assert!(!QrError::config("x").is_cancelled());
    }
}
