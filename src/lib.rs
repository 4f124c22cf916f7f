//! # qrstyle
//!
//! A Rust library for rendering styled QR codes.
//!
//! `qrstyle` turns a payload (or an already encoded module matrix) into an image
//! whose modules, finder eyes, background and logo are individually shaped and
//! colored, while the code stays scannable. Output is either an RGBA raster
//! composed in parallel bands, or a layered vector image that serializes to SVG.
//!
//! ## Features
//!
//! - Module shapes: squares, circles, rhombi, stars, neighbor-aware rounded corners,
//!   and custom shapes defined by a pixel predicate.
//! - Eyes with independent frame and ball shapes, optional fourth eye and central symmetry.
//! - Solid, linear, radial, sweep and custom colors for every part of the code.
//! - Logos with plain, accurate or natural (module-aware) clearing.
//! - Circular code envelope filled with random decorative modules.
//! - Error correction raised automatically for large logos.
//! - Cancellation, blocking and async entry points.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrstyle = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Render a code with round modules and a gradient:
//!
//! ```rust
//! use qrstyle::color::{GradientOrientation, QrColor, QrColors, BLACK};
//! use qrstyle::options::QrShapes;
//! use qrstyle::shapes::PixelShape;
//! use qrstyle::RenderOptions;
//!
//! let options = RenderOptions::new(256)
//!     .shapes(QrShapes::default().dark(PixelShape::Circle(0.9)))
//!     .colors(QrColors::default().dark(QrColor::LinearGradient {
//!         start: BLACK,
//!         end: 0xFF33_00AA,
//!         orientation: GradientOrientation::LeftDiagonal,
//!     }));
//!
//! let img = qrstyle::render("https://example.com", &options).unwrap();
//! assert_eq!(img.dimensions(), (256, 256));
//! ```
//!
//! Produce SVG markup:
//!
//! ```rust
//! use qrstyle::RenderOptions;
//!
//! let svg = qrstyle::render_vector("Hello, World!", &RenderOptions::new(300))
//!     .unwrap()
//!     .to_svg_string();
//! assert!(svg.starts_with("<?xml"));
//! ```
//!
//! ## Modules
//!
//! - [`encoder`]: Payload to module matrix, error correction levels.
//! - [`matrix`]: Styled matrix of classified modules.
//! - [`builder`]: Eyes, highlighted patterns, code envelope and pixel layout.
//! - [`shapes`]: Module, eye and background shapes.
//! - [`color`]: Colors, gradients and compositing.
//! - [`options`]: Render configuration.
//! - [`logo`]: Logo placement and masking.
//! - [`raster`] / [`vector`]: The two compositors.
//! - [`drawable`]: A restylable rendered image.
//! - [`helper`]: One-call rendering and saving utilities.

#![forbid(unsafe_code)]

pub mod builder;
pub mod cancel;
pub mod color;
pub mod drawable;
pub mod encoder;
pub mod error;
pub mod helper;
pub mod image_source;
pub mod logo;
pub mod matrix;
pub mod options;
pub mod path;
pub mod raster;
pub mod shapes;
pub mod vector;

use image::RgbaImage;

pub use cancel::CancellationToken;
pub use encoder::{BitMatrix, ErrorCorrectionLevel};
pub use error::{QrError, Result};
pub use options::RenderOptions;
pub use vector::VectorImage;

use builder::Scene;
use error::catch_panic;

/// Renders `payload` into an RGBA image.
///
/// # Errors
///
/// [`QrError::Configuration`] for invalid options or a payload that cannot be
/// encoded, [`QrError::Render`] if a stage fails.
pub fn render(payload: &str, options: &RenderOptions) -> Result<RgbaImage> {
    render_with_cancel(payload, options, &CancellationToken::new())
}

/// Like [`render`], observing `cancel` between rows.
pub fn render_with_cancel(payload: &str, options: &RenderOptions, cancel: &CancellationToken) -> Result<RgbaImage> {
    let bits = encode_for(payload, options)?;
    cancel.check()?;
    render_matrix(&bits, options, cancel)
}

/// Renders an already encoded matrix. The matrix is used as given; the
/// options' error correction level is ignored.
pub fn render_matrix(bits: &BitMatrix, options: &RenderOptions, cancel: &CancellationToken) -> Result<RgbaImage> {
    options.validate()?;
    let scene = catch_panic("structure", || Scene::prepare(bits, options))?;
    let image = raster::render_raster(&scene, cancel)?;
    tracing::debug!(modules = bits.size(), size = options.size, "rendered raster");
    Ok(image)
}

/// Renders `payload` into a layered vector image.
pub fn render_vector(payload: &str, options: &RenderOptions) -> Result<VectorImage> {
    let bits = encode_for(payload, options)?;
    let scene = catch_panic("structure", || Scene::prepare(&bits, options))?;
    catch_panic("vector", || vector::render_vector(&scene))
}

/// Renders on the blocking pool of the current tokio runtime.
///
/// Dropping the returned future cancels the render.
///
/// # Example
///
/// ```rust
/// use qrstyle::{CancellationToken, RenderOptions};
///
/// #[tokio::main]
/// async fn main() {
///     let token = CancellationToken::new();
///     let img = qrstyle::render_async("async".to_string(), RenderOptions::new(128), token)
///         .await
///         .unwrap();
///     assert_eq!(img.width(), 128);
/// }
/// ```
pub async fn render_async(payload: String, options: RenderOptions, cancel: CancellationToken) -> Result<RgbaImage> {
    let guard = cancel.drop_guard();
    let worker = cancel.clone();
    let joined = tokio::task::spawn_blocking(move || render_with_cancel(&payload, &options, &worker)).await;
    guard.disarm();
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(QrError::Cancelled),
        Err(e) => Err(QrError::render("worker", e)),
    }
}

/// Validates `options` and encodes `payload` at the level its logo requires.
fn encode_for(payload: &str, options: &RenderOptions) -> Result<BitMatrix> {
    options.validate()?;
    let requested = options.error_correction.resolve(0.0);
    let level = options.error_correction.resolve(options.logo_coverage());
    if level != requested {
        tracing::info!(from = ?requested, to = ?level, "raised error correction for logo");
    }
    encoder::encode(payload, level)
}
