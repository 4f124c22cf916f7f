//! Raster compositor.
//!
//! Every output pixel is resolved independently: module paint first, then
//! the highlighting fill, then the background. The image is cut into 1, 2 or
//! 4 horizontal bands painted in parallel; the logo is laid over the joined
//! result.

use image::RgbaImage;
use rayon::prelude::*;

use crate::builder::{Scene, BALL_OFFSET, BALL_SIZE, EYE_SIZE};
use crate::cancel::CancellationToken;
use crate::color::{alpha, from_rgba, over, to_rgba, Argb, QrColor, TRANSPARENT};
use crate::error::{catch_panic, Result};
use crate::image_source::scale_image;
use crate::logo::LogoPadding;
use crate::matrix::{Neighbors, PixelType};
use crate::path::Affine;

const BYTES_PER_PIXEL: usize = 4;

/// Renders `scene` into an RGBA image.
///
/// # Errors
///
/// [`crate::QrError::Cancelled`] if `cancel` fires before the last row is
/// painted; [`crate::QrError::Render`] if a shape or color callback panics.
pub fn render_raster(scene: &Scene, cancel: &CancellationToken) -> Result<RgbaImage> {
    let size = scene.layout.size;
    let background = &scene.options.background;
    let backdrop_image =
        (!background.image.is_empty()).then(|| scale_image(&background.image, size, size, background.scale));
    let painter = Painter { scene, backdrop_image: backdrop_image.as_ref() };

    let mut image = RgbaImage::new(size, size);
    let partitions = scene.options.partitions.max(1);
    let band_rows = (size as usize + partitions - 1) / partitions;
    let row_bytes = size as usize * BYTES_PER_PIXEL;
    tracing::debug!(partitions, band_rows, "painting modules");

    let results: Vec<Result<()>> = image
        .par_chunks_mut(band_rows * row_bytes)
        .enumerate()
        .map(|(band, pixels)| catch_panic("raster", || painter.paint_band(band * band_rows, pixels, cancel)))
        .collect();
    cancel.check()?;
    results.into_iter().collect::<Result<Vec<()>>>()?;

    catch_panic("logo", || {
        painter.overlay_logo(&mut image);
        Ok(())
    })?;
    Ok(image)
}

struct Painter<'s, 'a> {
    scene: &'s Scene<'a>,
    backdrop_image: Option<&'s RgbaImage>,
}

impl Painter<'_, '_> {
    fn paint_band(&self, first_row: usize, pixels: &mut [u8], cancel: &CancellationToken) -> Result<()> {
        let row_bytes = self.scene.layout.size as usize * BYTES_PER_PIXEL;
        for (i, row) in pixels.chunks_mut(row_bytes).enumerate() {
            cancel.check()?;
            let y = (first_row + i) as u32;
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                px.copy_from_slice(&to_rgba(self.pixel(x as u32, y)));
            }
        }
        Ok(())
    }

    fn pixel(&self, x: u32, y: u32) -> Argb {
        let under = self.highlighting(x, y, self.backdrop(x, y));
        match self.module_color(x, y) {
            Some(color) if alpha(color) > 0 => over(color, under),
            _ => under,
        }
    }

    /// Background image over the background color, clipped by the background shape.
    fn backdrop(&self, x: u32, y: u32) -> Argb {
        let options = self.scene.options;
        let s = self.scene.layout.size as f32;
        let (fx, fy) = (x as f32, y as f32);
        if !options.shapes.background.contains(fx + 0.5, fy + 0.5, s, &Neighbors::default(), &self.scene.cache) {
            return TRANSPARENT;
        }
        let color = options.background.color.at_or_transparent(fx, fy, s, s);
        match self.backdrop_image {
            Some(image) => over(from_rgba(image.get_pixel(x, y).0), color),
            None => color,
        }
    }

    fn highlighting(&self, x: u32, y: u32, backdrop: Argb) -> Argb {
        let layout = &self.scene.layout;
        let options = self.scene.options;
        let (ax, ay) = (x as i64 - layout.area_x, y as i64 - layout.area_y);
        let area = layout.area_size as i64;
        if ax < 0 || ay < 0 || ax >= area || ay >= area {
            return backdrop;
        }
        let (ax, ay, s) = (ax as f32, ay as f32, area as f32);
        if !options.shapes.highlighting.contains(ax + 0.5, ay + 0.5, s, &Neighbors::default(), &self.scene.cache) {
            return backdrop;
        }
        match options.colors.highlighting.at(ax, ay, s, s) {
            Some(color) => over(color, backdrop),
            None => backdrop,
        }
    }

    /// Paint of the module under `(x, y)`, `None` to fall through.
    fn module_color(&self, x: u32, y: u32) -> Option<Argb> {
        let Scene { options, code, layout, cache, .. } = self.scene;
        let (row, col) = layout.module_at(x, y)?;
        let module = code.matrix.module(row, col);
        let colors = &options.colors;
        let shapes = &options.shapes;

        let code_px = layout.code_px() as f32;
        let (cx, cy) = ((x as i64 - layout.code_x) as f32, (y as i64 - layout.code_y) as f32);
        let paint = |color: &QrColor| color.at(cx, cy, code_px, code_px);

        let (ox, oy) = layout.module_origin(row, col);
        let (lx, ly) = ((x as i64 - ox) as f32 + 0.5, (y as i64 - oy) as f32 + 0.5);
        let m = layout.module_px as f32;

        match module.kind {
            PixelType::DarkPixel => shapes
                .dark
                .contains(lx, ly, m, &code.matrix.neighbors(row, col), cache)
                .then(|| paint(&colors.dark))
                .flatten(),
            PixelType::LightPixel => shapes
                .light
                .contains(lx, ly, m, &code.matrix.neighbors(row, col), cache)
                .then(|| paint(&colors.light))
                .flatten(),
            PixelType::VersionEye | PixelType::TimingLine => {
                paint(if module.dark { &colors.dark } else { &colors.light })
            }
            PixelType::EyeBall | PixelType::EyeFrame => {
                let eye = code.eye_at(row, col)?;
                let (ex, ey) = layout.module_origin(eye.frame.row, eye.frame.col);
                let s = EYE_SIZE as f32 * m;
                let local = ((x as i64 - ex) as f32 + 0.5, (y as i64 - ey) as f32 + 0.5);
                let (px, py) = match Affine::rotate_about(eye.rotation, s / 2.0, s / 2.0).invert() {
                    Some(inverse) => inverse.apply(local.0, local.1),
                    None => local,
                };
                // Eye colors are addressed in the unrotated eye box; unspecified ones
                // defer to the dark color over the whole code.
                let (ux, uy) = (local.0 - 0.5, local.1 - 0.5);
                let (b, bs) = (BALL_OFFSET as f32 * m, BALL_SIZE as f32 * m);
                if shapes.ball.contains(px - b, py - b, bs, cache) {
                    match colors.ball {
                        QrColor::Unspecified => paint(&colors.dark),
                        ref ball => ball.at(ux - b, uy - b, bs, bs),
                    }
                } else if shapes.frame.contains(px, py, s, cache) {
                    match colors.frame {
                        QrColor::Unspecified => paint(&colors.dark),
                        ref frame => frame.at(ux, uy, s, s),
                    }
                } else {
                    paint(&colors.light)
                }
            }
            PixelType::Background | PixelType::Logo => None,
        }
    }

    fn overlay_logo(&self, image: &mut RgbaImage) {
        let (Some(logo), Some(place)) = (&self.scene.options.logo, &self.scene.logo) else {
            return;
        };
        let cache = &self.scene.cache;
        let none = Neighbors::default();
        let (w, h) = image.dimensions();

        if logo.padding != LogoPadding::None {
            let s = place.padded_size;
            let x0 = place.padded_x.floor().max(0.0) as u32;
            let y0 = place.padded_y.floor().max(0.0) as u32;
            let x1 = ((place.padded_x + s).ceil().max(0.0) as u32).min(w);
            let y1 = ((place.padded_y + s).ceil().max(0.0) as u32).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    let (lx, ly) = (x as f32 - place.padded_x, y as f32 - place.padded_y);
                    if !logo.shape.contains(lx + 0.5, ly + 0.5, s, &none, cache) {
                        continue;
                    }
                    let backdrop = self.backdrop(x, y);
                    let fill = logo.color.at(lx, ly, s, s).map_or(backdrop, |c| over(c, backdrop));
                    image.put_pixel(x, y, image::Rgba(to_rgba(fill)));
                }
            }
        }

        let (bx, by, side) = place.pixel_box();
        let scaled = scale_image(&logo.image, side, side, logo.scale);
        for (i, j, px) in scaled.enumerate_pixels() {
            let (x, y) = (bx + i as i64, by + j as i64);
            if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                continue;
            }
            let color = from_rgba(px.0);
            if alpha(color) == 0 || !logo.shape.is_on(i, j, side, &none, cache) {
                continue;
            }
            let (x, y) = (x as u32, y as u32);
            let under = from_rgba(image.get_pixel(x, y).0);
            image.put_pixel(x, y, image::Rgba(to_rgba(over(color, under))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Scene;
    use crate::color::{QrColors, BLACK, WHITE};
    use crate::encoder::{encode, ErrorCorrectionLevel};
    use crate::error::QrError;
    use crate::image_source::ImageHandle;
    use crate::logo::Logo;
    use crate::options::{QrShapes, RenderOptions};
    use crate::shapes::{CustomShape, PixelShape};

    const RED: Argb = 0xFFFF_0000;

    fn render(options: &RenderOptions) -> Result<RgbaImage> {
        let bits = encode("HELLO", ErrorCorrectionLevel::Low)?;
        let scene = Scene::prepare(&bits, options)?;
        render_raster(&scene, &CancellationToken::new())
    }

    fn argb_at(image: &RgbaImage, x: u32, y: u32) -> Argb {
        from_rgba(image.get_pixel(x, y).0)
    }

    #[test]
    fn test_partitions_agree() {
        let base = RenderOptions::new(100).shapes(QrShapes::default().dark(PixelShape::Circle(0.8)));
        let one = render(&base.clone().partitions(1)).unwrap();
        let two = render(&base.clone().partitions(2)).unwrap();
        let four = render(&base.partitions(4)).unwrap();
        assert_eq!(one.as_raw(), two.as_raw());
        assert_eq!(one.as_raw(), four.as_raw());
    }

    #[test]
    fn test_eye_colors_fall_back_to_dark() {
        let options = RenderOptions::new(210).padding(0.0);
        let image = render(&options).unwrap();
        // 10px modules: frame corner, gap ring, ball centre.
        assert_eq!(argb_at(&image, 5, 5), BLACK);
        assert_eq!(argb_at(&image, 15, 15), WHITE);
        assert_eq!(argb_at(&image, 35, 35), BLACK);

        let colored = render(&options.colors(QrColors::default().ball(QrColor::Solid(RED)))).unwrap();
        assert_eq!(argb_at(&colored, 35, 35), RED);
        assert_eq!(argb_at(&colored, 5, 5), BLACK);
    }

    #[test]
    fn test_highlighting_sits_between_modules_and_background() {
        // 25px padding leaves a 210px area of 10px modules.
        let options = RenderOptions::new(260)
            .padding(25.0 / 260.0)
            .colors(QrColors::default().highlighting(QrColor::Solid(RED)));
        let image = render(&options).unwrap();
        assert_eq!(argb_at(&image, 2, 2), WHITE);
        // Light module of the eye gap ring shows the highlighting.
        let m = 10;
        assert_eq!(argb_at(&image, 25 + m + m / 2, 25 + m + m / 2), RED);
        assert_eq!(argb_at(&image, 25 + m / 2, 25 + m / 2), BLACK);
    }

    #[test]
    fn test_cancelled_before_start() {
        let bits = encode("HELLO", ErrorCorrectionLevel::Low).unwrap();
        let options = RenderOptions::new(64);
        let scene = Scene::prepare(&bits, &options).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(render_raster(&scene, &token), Err(QrError::Cancelled)));
    }

    #[test]
    fn test_panicking_shape_is_a_render_failure() {
        let shape = PixelShape::Custom(CustomShape::new(|_| panic!("shape exploded")));
        let options = RenderOptions::new(64).shapes(QrShapes::default().dark(shape));
        let err = render(&options).unwrap_err();
        assert!(matches!(err, QrError::Render { .. }), "{:?}", err);
    }

    #[test]
    fn test_logo_overlay() {
        let logo_image = ImageHandle::new(RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255])));
        let options = RenderOptions::new(210)
            .padding(0.0)
            .logo(Logo::new(logo_image).size(0.2).padding(LogoPadding::Accurate(0.5)));
        let image = render(&options).unwrap();
        assert_eq!(argb_at(&image, 105, 105), RED);
        // Padding ring around the 42px logo is background white.
        assert_eq!(argb_at(&image, 105 - 21 - 5, 105), WHITE);
    }
}
