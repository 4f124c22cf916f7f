//! A live, restylable QR image.

use image::RgbaImage;

use crate::color::QrColors;
use crate::error::Result;
use crate::logo::Logo;
use crate::options::{Background, RenderOptions};

struct State {
    payload: String,
    options: RenderOptions,
    image: RgbaImage,
    renders: u64,
}

/// A rendered code whose pixels are recomposed in place when its colors,
/// logo or background change.
///
/// Setters skip the work when the new value equals the one already applied.
/// [`QrDrawable::recycle`] drops the pixel buffer; after that the handle is
/// inert and every setter is a no-op.
///
/// # Example
///
/// ```rust
/// use qrstyle::color::{QrColor, QrColors};
/// use qrstyle::drawable::QrDrawable;
/// use qrstyle::RenderOptions;
///
/// let mut drawable = QrDrawable::new("https://example.com", RenderOptions::new(128)).unwrap();
/// let red = QrColors::default().dark(QrColor::Solid(0xFFFF_0000));
/// assert!(drawable.set_colors(red.clone()).unwrap());
/// assert!(!drawable.set_colors(red).unwrap());
/// drawable.recycle();
/// assert!(drawable.image().is_none());
/// ```
pub struct QrDrawable {
    state: Option<State>,
}

impl QrDrawable {
    /// Renders `payload` once with `options`.
    pub fn new(payload: impl Into<String>, options: RenderOptions) -> Result<Self> {
        let payload = payload.into();
        let image = crate::render(&payload, &options)?;
        Ok(QrDrawable { state: Some(State { payload, options, image, renders: 1 }) })
    }

    /// Current pixels, `None` once recycled.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.state.as_ref().map(|s| &s.image)
    }

    pub fn options(&self) -> Option<&RenderOptions> {
        self.state.as_ref().map(|s| &s.options)
    }

    /// Number of times the pixels have been composed.
    pub fn renders(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.renders)
    }

    /// Returns `true` if the image was recomposed.
    pub fn set_colors(&mut self, colors: QrColors) -> Result<bool> {
        self.update(|options| (options.colors != colors).then(|| options.clone().colors(colors)))
    }

    /// Returns `true` if the image was recomposed.
    pub fn set_logo(&mut self, logo: Option<Logo>) -> Result<bool> {
        self.update(|options| {
            (options.logo != logo).then(|| RenderOptions { logo, ..options.clone() })
        })
    }

    /// Returns `true` if the image was recomposed.
    pub fn set_background(&mut self, background: Background) -> Result<bool> {
        self.update(|options| (options.background != background).then(|| options.clone().background(background)))
    }

    /// Releases the pixel buffer. Safe to call more than once.
    pub fn recycle(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!("recycled drawable");
        }
    }

    pub fn is_recycled(&self) -> bool {
        self.state.is_none()
    }

    fn update(&mut self, apply: impl FnOnce(&RenderOptions) -> Option<RenderOptions>) -> Result<bool> {
        let Some(state) = self.state.as_mut() else {
            return Ok(false);
        };
        let Some(options) = apply(&state.options) else {
            return Ok(false);
        };
        let image = crate::render(&state.payload, &options)?;
        if image.dimensions() == state.image.dimensions() {
            state.image.copy_from_slice(&image);
        } else {
            state.image = image;
        }
        state.options = options;
        state.renders += 1;
        Ok(true)
    }
}
