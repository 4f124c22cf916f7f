//! Render configuration.
//!
//! [`RenderOptions`] is a plain value. Every setter consumes it and returns a
//! new one, so a configuration can be shared, cloned and tweaked without any
//! aliasing between callers:
//!
//! ```rust
//! use qrstyle::color::{QrColor, QrColors};
//! use qrstyle::options::{QrShapes, RenderOptions};
//! use qrstyle::shapes::{PixelShape, RoundCorners};
//!
//! let options = RenderOptions::new(512)
//!     .padding(0.1)
//!     .shapes(QrShapes::default().dark(PixelShape::RoundCorners(RoundCorners::new(0.5))))
//!     .colors(QrColors::default().dark(QrColor::Solid(0xFF1A_237E)));
//! assert!(options.validate().is_ok());
//! ```

use crate::builder::CodeShape;
use crate::color::{QrColor, QrColors, WHITE};
use crate::encoder::ErrorCorrectionLevel;
use crate::error::{QrError, Result};
use crate::image_source::{ImageHandle, ScaleMode};
use crate::logo::Logo;
use crate::shapes::{BallShape, FrameShape, PixelShape};

/// Shapes of every stylable region.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct QrShapes {
    pub dark: PixelShape,
    pub light: PixelShape,
    pub ball: BallShape,
    pub frame: FrameShape,
    /// Outline of the highlighting fill behind the code.
    pub highlighting: PixelShape,
    /// Outline of the background over the whole image.
    pub background: PixelShape,
    /// Rotate eyes so one authored eye shape appears point-symmetric around the code.
    pub central_symmetry: bool,
}

impl QrShapes {
    pub fn dark(self, dark: PixelShape) -> Self {
        QrShapes { dark, ..self }
    }

    pub fn light(self, light: PixelShape) -> Self {
        QrShapes { light, ..self }
    }

    pub fn ball(self, ball: BallShape) -> Self {
        QrShapes { ball, ..self }
    }

    pub fn frame(self, frame: FrameShape) -> Self {
        QrShapes { frame, ..self }
    }

    pub fn highlighting(self, highlighting: PixelShape) -> Self {
        QrShapes { highlighting, ..self }
    }

    pub fn background(self, background: PixelShape) -> Self {
        QrShapes { background, ..self }
    }

    pub fn central_symmetry(self, central_symmetry: bool) -> Self {
        QrShapes { central_symmetry, ..self }
    }

    fn validate(&self) -> Result<()> {
        self.dark.validate()?;
        self.light.validate()?;
        self.ball.validate()?;
        self.frame.validate()?;
        self.highlighting.validate()?;
        self.background.validate()
    }
}

/// Whole-image backdrop: a color over an optional image.
#[derive(Clone, PartialEq, Debug)]
pub struct Background {
    pub image: ImageHandle,
    pub scale: ScaleMode,
    pub color: QrColor,
}

impl Default for Background {
    fn default() -> Self {
        Background {
            image: ImageHandle::empty(),
            scale: ScaleMode::CenterCrop,
            color: QrColor::Solid(WHITE),
        }
    }
}

impl Background {
    pub fn image(self, image: ImageHandle) -> Self {
        Background { image, ..self }
    }

    pub fn scale(self, scale: ScaleMode) -> Self {
        Background { scale, ..self }
    }

    pub fn color(self, color: QrColor) -> Self {
        Background { color, ..self }
    }
}

/// Everything a render needs besides the payload.
#[derive(Clone, PartialEq, Debug)]
pub struct RenderOptions {
    /// Width and height of the output in pixels.
    pub size: u32,
    /// Fraction of `size` left empty on each side, in `[0, 0.5)`.
    pub padding: f32,
    /// Shift of the code inside the padding, each axis in `[-1, 1]`.
    pub offset: (f32, f32),
    pub shapes: QrShapes,
    pub colors: QrColors,
    pub logo: Option<Logo>,
    pub background: Background,
    pub code_shape: CodeShape,
    pub error_correction: ErrorCorrectionLevel,
    /// Draw a stylistic fourth eye in the bottom-right corner.
    pub fourth_eye: bool,
    /// Keep alignment patterns as plain squares.
    pub highlight_alignment: bool,
    /// Keep timing lines as plain squares.
    pub highlight_timing: bool,
    /// Number of horizontal bands rendered in parallel: 1, 2 or 4.
    pub partitions: usize,
}

impl RenderOptions {
    /// Defaults for a `size x size` image: 10% padding, square black modules on white.
    pub fn new(size: u32) -> Self {
        RenderOptions {
            size,
            padding: 0.1,
            offset: (0.0, 0.0),
            shapes: QrShapes::default(),
            colors: QrColors::default(),
            logo: None,
            background: Background::default(),
            code_shape: CodeShape::Default,
            error_correction: ErrorCorrectionLevel::Auto,
            fourth_eye: false,
            highlight_alignment: false,
            highlight_timing: false,
            partitions: 4,
        }
    }

    pub fn size(self, size: u32) -> Self {
        RenderOptions { size, ..self }
    }

    pub fn padding(self, padding: f32) -> Self {
        RenderOptions { padding, ..self }
    }

    pub fn offset(self, x: f32, y: f32) -> Self {
        RenderOptions { offset: (x, y), ..self }
    }

    pub fn shapes(self, shapes: QrShapes) -> Self {
        RenderOptions { shapes, ..self }
    }

    pub fn colors(self, colors: QrColors) -> Self {
        RenderOptions { colors, ..self }
    }

    pub fn logo(self, logo: Logo) -> Self {
        RenderOptions { logo: Some(logo), ..self }
    }

    pub fn without_logo(self) -> Self {
        RenderOptions { logo: None, ..self }
    }

    pub fn background(self, background: Background) -> Self {
        RenderOptions { background, ..self }
    }

    pub fn code_shape(self, code_shape: CodeShape) -> Self {
        RenderOptions { code_shape, ..self }
    }

    pub fn error_correction(self, error_correction: ErrorCorrectionLevel) -> Self {
        RenderOptions { error_correction, ..self }
    }

    pub fn fourth_eye(self, fourth_eye: bool) -> Self {
        RenderOptions { fourth_eye, ..self }
    }

    pub fn highlight_alignment(self, highlight_alignment: bool) -> Self {
        RenderOptions { highlight_alignment, ..self }
    }

    pub fn highlight_timing(self, highlight_timing: bool) -> Self {
        RenderOptions { highlight_timing, ..self }
    }

    pub fn partitions(self, partitions: usize) -> Self {
        RenderOptions { partitions, ..self }
    }

    /// Fraction of the code covered by the logo and its padding, 0 without a logo.
    pub fn logo_coverage(&self) -> f32 {
        self.logo.as_ref().map_or(0.0, Logo::coverage)
    }

    /// Checks every parameter range.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::Configuration`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(QrError::config("size must be positive"));
        }
        if !(0.0..0.5).contains(&self.padding) {
            return Err(QrError::config(format!("padding must be in [0, 0.5), got {}", self.padding)));
        }
        let (x, y) = self.offset;
        if !(-1.0..=1.0).contains(&x) || !(-1.0..=1.0).contains(&y) {
            return Err(QrError::config(format!("offset must be in [-1, 1], got ({}, {})", x, y)));
        }
        if ![1, 2, 4].contains(&self.partitions) {
            return Err(QrError::config(format!("partitions must be 1, 2 or 4, got {}", self.partitions)));
        }
        self.shapes.validate()?;
        self.code_shape.validate()?;
        if let Some(logo) = &self.logo {
            logo.validate()?;
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo::LogoPadding;

    #[test]
    fn test_setters_do_not_alias() {
        let base = RenderOptions::new(256);
        let shifted = base.clone().offset(0.5, -0.5);
        assert_eq!(base.offset, (0.0, 0.0));
        assert_eq!(shifted.offset, (0.5, -0.5));
        assert_eq!(shifted.size, 256);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(RenderOptions::new(0).validate().is_err());
        assert!(RenderOptions::new(100).padding(0.5).validate().is_err());
        assert!(RenderOptions::new(100).offset(1.5, 0.0).validate().is_err());
        assert!(RenderOptions::new(100).partitions(3).validate().is_err());
        assert!(RenderOptions::new(100)
            .shapes(QrShapes::default().dark(PixelShape::Circle(1.2)))
            .validate()
            .is_err());
        assert!(RenderOptions::new(100)
            .logo(Logo::new(ImageHandle::empty()).size(0.0))
            .validate()
            .is_err());
        assert!(RenderOptions::new(100).padding(0.0).partitions(1).validate().is_ok());
    }

    #[test]
    fn test_logo_coverage() {
        let options = RenderOptions::new(100)
            .logo(Logo::new(ImageHandle::empty()).size(0.2).padding(LogoPadding::Natural(0.5)));
        assert!((options.logo_coverage() - 0.3).abs() < 1e-6);
        assert_eq!(options.without_logo().logo_coverage(), 0.0);
    }
}
