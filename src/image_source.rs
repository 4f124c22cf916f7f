//! Loading and scaling of logo and background images.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::color::{from_rgba, Argb, TRANSPARENT};
use crate::error::{QrError, Result};

/// Where an image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// No image. Loads as an empty, fully transparent handle.
    Empty,
    /// An encoded image on disk.
    File(PathBuf),
    /// Encoded image bytes held in memory.
    Memory(Arc<[u8]>),
}

/// How an image is fitted into a target box.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum ScaleMode {
    /// Scale to fit inside, keep aspect, centre on transparent.
    #[default]
    FitCenter,
    /// Scale to cover, keep aspect, crop the overflow around the centre.
    CenterCrop,
    /// Stretch to the exact target size.
    FitXY,
}

/// Decoded, immutable image shared between renders.
///
/// Handles compare by identity: two handles are equal when they share the
/// same decoded buffer.
#[derive(Clone)]
pub struct ImageHandle(Arc<RgbaImage>);

impl ImageHandle {
    pub fn new(image: RgbaImage) -> Self {
        ImageHandle(Arc::new(image))
    }

    /// The empty handle: zero pixels, reads as transparent everywhere.
    pub fn empty() -> Self {
        ImageHandle::new(RgbaImage::new(0, 0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.width() == 0 || self.0.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Nearest-neighbour sample at normalized coordinates `(u, v)` in `[0, 1)`.
    pub fn sample(&self, u: f32, v: f32) -> Argb {
        if self.is_empty() {
            return TRANSPARENT;
        }
        let (w, h) = self.0.dimensions();
        let x = ((u.clamp(0.0, 1.0) * w as f32) as u32).min(w - 1);
        let y = ((v.clamp(0.0, 1.0) * h as f32) as u32).min(h - 1);
        from_rgba(self.0.get_pixel(x, y).0)
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImageHandle({}x{})", self.0.width(), self.0.height())
    }
}

impl From<RgbaImage> for ImageHandle {
    fn from(image: RgbaImage) -> Self {
        ImageHandle::new(image)
    }
}

/// Loads and decodes an image.
///
/// # Errors
///
/// Returns [`QrError::Asset`] if the file cannot be read or decoded.
/// [`ImageSource::Empty`] always succeeds.
pub fn load_image(source: &ImageSource) -> Result<ImageHandle> {
    match source {
        ImageSource::Empty => Ok(ImageHandle::empty()),
        ImageSource::File(path) => {
            let image = image::open(path)?;
            tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
            Ok(ImageHandle::new(image.to_rgba8()))
        }
        ImageSource::Memory(bytes) => decode(bytes),
    }
}

/// Async variant of [`load_image`]: file reads go through `tokio::fs`, decoding
/// runs on the blocking pool.
pub async fn load_image_async(source: ImageSource) -> Result<ImageHandle> {
    let bytes: Arc<[u8]> = match source {
        ImageSource::Empty => return Ok(ImageHandle::empty()),
        ImageSource::File(path) => tokio::fs::read(&path).await?.into(),
        ImageSource::Memory(bytes) => bytes,
    };
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| QrError::Asset(Box::new(e)))?
}

fn decode(bytes: &[u8]) -> Result<ImageHandle> {
    let image = image::load_from_memory(bytes)?;
    Ok(ImageHandle::new(image.to_rgba8()))
}

/// Fits an image into a `width x height` buffer.
pub fn scale_image(handle: &ImageHandle, width: u32, height: u32, mode: ScaleMode) -> RgbaImage {
    let mut target = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    if handle.is_empty() || width == 0 || height == 0 {
        return target;
    }
    let source = handle.image();
    let (sw, sh) = (source.width() as f32, source.height() as f32);
    match mode {
        ScaleMode::FitXY => imageops::resize(source, width, height, FilterType::Triangle),
        ScaleMode::FitCenter => {
            let scale = (width as f32 / sw).min(height as f32 / sh);
            let (w, h) = (((sw * scale).round() as u32).max(1), ((sh * scale).round() as u32).max(1));
            let resized = imageops::resize(source, w, h, FilterType::Triangle);
            let (x, y) = ((width as i64 - w as i64) / 2, (height as i64 - h as i64) / 2);
            imageops::overlay(&mut target, &resized, x, y);
            target
        }
        ScaleMode::CenterCrop => {
            let scale = (width as f32 / sw).max(height as f32 / sh);
            let (w, h) = (((sw * scale).ceil() as u32).max(width), ((sh * scale).ceil() as u32).max(height));
            let resized = imageops::resize(source, w, h, FilterType::Triangle);
            let (x, y) = ((w - width) / 2, (h - height) / 2);
            imageops::crop_imm(&resized, x, y, width, height).to_image()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> ImageHandle {
        // Left half red, right half blue, 4x2.
        ImageHandle::new(RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        }))
    }

    #[test]
    fn test_empty_source_loads() {
        let handle = load_image(&ImageSource::Empty).unwrap();
        assert!(handle.is_empty());
        assert_eq!(handle.sample(0.5, 0.5), TRANSPARENT);
        let scaled = scale_image(&handle, 3, 3, ScaleMode::FitXY);
        assert!(scaled.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_missing_file_propagates() {
        let err = load_image(&ImageSource::File("/definitely/not/here.png".into())).unwrap_err();
        assert!(matches!(err, QrError::Asset(_)));
    }

    #[test]
    fn test_bad_bytes_propagate() {
        let err = load_image(&ImageSource::Memory(Arc::from(&b"nope"[..]))).unwrap_err();
        assert!(matches!(err, QrError::Asset(_)));
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a = two_tone();
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, two_tone());
    }

    #[test]
    fn test_scale_modes() {
        let img = two_tone();
        let fit = scale_image(&img, 8, 8, ScaleMode::FitCenter);
        assert_eq!(fit.get_pixel(4, 0).0[3], 0);
        assert_eq!(fit.get_pixel(0, 4).0[3], 255);
        let crop = scale_image(&img, 4, 4, ScaleMode::CenterCrop);
        assert_eq!(crop.dimensions(), (4, 4));
        assert!(crop.pixels().all(|p| p.0[3] == 255));
        let xy = scale_image(&img, 2, 6, ScaleMode::FitXY);
        assert_eq!(xy.dimensions(), (2, 6));
    }

    #[test]
    fn test_sample() {
        let img = two_tone();
        assert_eq!(img.sample(0.1, 0.5), 0xFFFF_0000);
        assert_eq!(img.sample(0.9, 0.5), 0xFF00_00FF);
    }

    #[tokio::test]
    async fn test_async_load_matches_sync() {
        let mut bytes = Vec::new();
        two_tone()
            .image()
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let source = ImageSource::Memory(bytes.into());
        let handle = load_image_async(source).await.unwrap();
        assert_eq!(handle.image().as_raw(), two_tone().image().as_raw());
    }
}
