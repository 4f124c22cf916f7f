//! Vector path compositor.
//!
//! Instead of resolving pixels, this backend builds one path per role and
//! fills each once: all dark modules go into one accumulated path, all light
//! modules into another, and the eyes either join the dark path or get their
//! own layers when they carry their own colors. The result is a
//! [`VectorImage`] that can be written as SVG or rasterized with `tiny-skia`.

use std::fmt::Write as _;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use tiny_skia::{ColorU8, Paint, Pixmap, PixmapPaint, Transform};

use crate::builder::{Scene, BALL_OFFSET, BALL_SIZE, EYE_SIZE};
use crate::color::{channels, QrColor};
use crate::error::{QrError, Result};
use crate::image_source::scale_image;
use crate::logo::LogoPadding;
use crate::matrix::{Neighbors, PixelType};
use crate::path::{fmt_num, Affine, Path, SvgDocument};

/// Box a layer's color is evaluated in.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn square(x: f32, y: f32, size: f32) -> Self {
        Region { x, y, width: size, height: size }
    }
}

/// One drawing operation.
#[derive(Clone, Debug)]
pub enum Layer {
    /// Fills `path` with `color` evaluated over `region`.
    Fill { path: Path, color: QrColor, region: Region },
    /// Draws a bitmap with its top-left corner at `(x, y)`, clipped to `clip`.
    Image { image: RgbaImage, x: i64, y: i64, clip: Path },
}

/// Resolution-independent render result: layers painted in order.
#[derive(Clone, Debug)]
pub struct VectorImage {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

/// Builds the layers for `scene`.
///
/// Draw order: background, highlighting, dark modules, light modules, eye
/// frames, eye balls, logo background, logo.
pub fn render_vector(scene: &Scene) -> Result<VectorImage> {
    let Scene { options, code, layout, cache, logo: placement } = scene;
    let shapes = &options.shapes;
    let colors = &options.colors;
    let background = &options.background;
    let none = Neighbors::default();
    let s = layout.size as f32;
    let whole = Region::square(0.0, 0.0, s);
    let mut layers = Vec::new();

    let background_clip = shapes.background.path(s, &none, cache);
    if !background.color.is_unspecified() {
        layers.push(Layer::Fill { path: background_clip.clone(), color: background.color.clone(), region: whole });
    }
    if !background.image.is_empty() {
        let image = scale_image(&background.image, layout.size, layout.size, background.scale);
        layers.push(Layer::Image { image, x: 0, y: 0, clip: background_clip.clone() });
    }

    if !colors.highlighting.is_unspecified() {
        let area = layout.area_size as f32;
        let path = shapes
            .highlighting
            .path(area, &none, cache)
            .translated(layout.area_x as f32, layout.area_y as f32);
        let region = Region::square(layout.area_x as f32, layout.area_y as f32, area);
        layers.push(Layer::Fill { path, color: colors.highlighting.clone(), region });
    }

    let m = layout.module_px as f32;
    let mut dark = Vec::new();
    let mut light = Vec::new();
    for module in code.matrix.modules() {
        let (ox, oy) = layout.module_origin(module.row, module.col);
        let (ox, oy) = (ox as f32, oy as f32);
        match module.kind {
            PixelType::DarkPixel => {
                let n = code.matrix.neighbors(module.row, module.col);
                dark.push(shapes.dark.path(m, &n, cache).translated(ox, oy));
            }
            PixelType::LightPixel => {
                let n = code.matrix.neighbors(module.row, module.col);
                light.push(shapes.light.path(m, &n, cache).translated(ox, oy));
            }
            PixelType::VersionEye | PixelType::TimingLine => {
                let target = if module.dark { &mut dark } else { &mut light };
                target.push(Path::rect(ox, oy, m, m));
            }
            _ => {}
        }
    }

    let mut frames = Vec::new();
    let mut balls = Vec::new();
    let eye_size = EYE_SIZE as f32 * m;
    let ball_size = BALL_SIZE as f32 * m;
    let ball_offset = BALL_OFFSET as f32 * m;
    let frame_path = shapes.frame.path(eye_size, cache);
    let ball_path = shapes.ball.path(ball_size, cache).translated(ball_offset, ball_offset);
    for eye in &code.eyes {
        let (ex, ey) = layout.module_origin(eye.frame.row, eye.frame.col);
        let (ex, ey) = (ex as f32, ey as f32);
        let c = eye_size / 2.0;
        let frame = frame_path.clone().rotated(eye.rotation, c, c).translated(ex, ey);
        let ball = ball_path.clone().rotated(eye.rotation, c, c).translated(ex, ey);
        light.push(Path::rect(ex, ey, eye_size, eye_size).difference(Path::union(vec![frame.clone(), ball.clone()])));

        if colors.frame.is_unspecified() {
            dark.push(frame);
        } else {
            let region = Region::square(ex, ey, eye_size);
            frames.push(Layer::Fill { path: frame, color: colors.frame.clone(), region });
        }
        if colors.ball.is_unspecified() {
            dark.push(ball);
        } else {
            let region = Region::square(ex + ball_offset, ey + ball_offset, ball_size);
            balls.push(Layer::Fill { path: ball, color: colors.ball.clone(), region });
        }
    }

    let code_region = Region::square(layout.code_x as f32, layout.code_y as f32, layout.code_px() as f32);
    if !colors.dark.is_unspecified() {
        layers.push(Layer::Fill { path: Path::union(dark), color: colors.dark.clone(), region: code_region });
    }
    if !colors.light.is_unspecified() {
        layers.push(Layer::Fill { path: Path::union(light), color: colors.light.clone(), region: code_region });
    }
    layers.extend(frames);
    layers.extend(balls);

    if let (Some(logo), Some(place)) = (&options.logo, placement) {
        if logo.padding != LogoPadding::None {
            let padded = place.padded_path(&logo.shape, cache);
            if logo.color.is_unspecified() {
                // Repaint the backdrop under the padded logo.
                if !background.color.is_unspecified() {
                    let path = padded.clone().intersect(background_clip.clone());
                    layers.push(Layer::Fill { path, color: background.color.clone(), region: whole });
                }
                if !background.image.is_empty() {
                    let image = scale_image(&background.image, layout.size, layout.size, background.scale);
                    let clip = padded.intersect(background_clip);
                    layers.push(Layer::Image { image, x: 0, y: 0, clip });
                }
            } else {
                let region = Region::square(place.padded_x, place.padded_y, place.padded_size);
                layers.push(Layer::Fill { path: padded, color: logo.color.clone(), region });
            }
        }
        let (x, y, side) = place.pixel_box();
        let image = scale_image(&logo.image, side, side, logo.scale);
        layers.push(Layer::Image { image, x, y, clip: place.logo_path(&logo.shape, cache) });
    }

    tracing::debug!(layers = layers.len(), "built vector layers");
    Ok(VectorImage { width: layout.size, height: layout.size, layers })
}

impl VectorImage {
    /// Returns a string of SVG code for the image.
    ///
    /// Solid fills, linear and radial gradients map to native SVG paint.
    /// Other colors are sampled into an embedded PNG masked by the layer path.
    /// The string always uses Unix newlines (\n), regardless of the platform.
    pub fn to_svg_string(&self) -> String {
        let mut svg = SvgDocument::default();
        let mut body = String::new();
        for layer in &self.layers {
            let markup = match layer {
                Layer::Fill { path, color, region } => fill_svg(path, color, region, &mut svg),
                Layer::Image { image, x, y, clip } => image_svg(image, *x as f32, *y as f32, clip, &mut svg),
            };
            if !markup.is_empty() {
                body += "\t";
                body += &markup;
                body += "\n";
            }
        }

        let mut result = String::new();
        result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
        result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
        result += &format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" \
             width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\" stroke=\"none\">\n",
            self.width, self.height
        );
        if !svg.defs.is_empty() {
            result += &format!("\t<defs>{}</defs>\n", svg.defs);
        }
        result += &body;
        result += "</svg>\n";
        result
    }

    /// Rasterizes every layer with `tiny-skia`, anti-aliasing path edges.
    pub fn rasterize(&self) -> Result<RgbaImage> {
        let mut pixmap = Pixmap::new(self.width, self.height)
            .ok_or_else(|| QrError::render("vector", "canvas has no pixels"))?;
        for layer in &self.layers {
            match layer {
                Layer::Fill { path, color, region } => {
                    let Some(mask) = path.to_mask(self.width, self.height, Affine::IDENTITY) else {
                        continue;
                    };
                    if let Some(c) = color.solid() {
                        let [a, r, g, b] = channels(c);
                        let mut paint = Paint::default();
                        paint.set_color_rgba8(r, g, b, a);
                        if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32) {
                            pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&mask));
                        }
                    } else if let Some(field) = color_field(color, region).as_ref().and_then(to_pixmap) {
                        pixmap.draw_pixmap(
                            region.x.floor() as i32,
                            region.y.floor() as i32,
                            field.as_ref(),
                            &PixmapPaint::default(),
                            Transform::identity(),
                            Some(&mask),
                        );
                    }
                }
                Layer::Image { image, x, y, clip } => {
                    let (Some(mask), Some(source)) = (clip.to_mask(self.width, self.height, Affine::IDENTITY), to_pixmap(image))
                    else {
                        continue;
                    };
                    pixmap.draw_pixmap(
                        *x as i32,
                        *y as i32,
                        source.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        Some(&mask),
                    );
                }
            }
        }

        let mut image = RgbaImage::new(self.width, self.height);
        for (px, out) in pixmap.pixels().iter().zip(image.pixels_mut()) {
            let c = px.demultiply();
            *out = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(image)
    }
}

/// `fill="#rrggbb"`, with `fill-opacity` when not opaque.
fn svg_fill(c: u32) -> String {
    let [a, r, g, b] = channels(c);
    let mut out = format!("fill=\"#{:02x}{:02x}{:02x}\"", r, g, b);
    if a != 255 {
        let _ = write!(out, " fill-opacity=\"{}\"", fmt_num(a as f32 / 255.0));
    }
    out
}

fn gradient_stop(offset: u8, c: u32) -> String {
    let [a, r, g, b] = channels(c);
    format!(
        "<stop offset=\"{}\" stop-color=\"#{:02x}{:02x}{:02x}\" stop-opacity=\"{}\"/>",
        offset,
        r,
        g,
        b,
        fmt_num(a as f32 / 255.0)
    )
}

fn gradient_stops(start: u32, end: u32) -> String {
    gradient_stop(0, start) + &gradient_stop(1, end)
}

/// Native SVG paint for `color`, or `None` when it has to be sampled.
fn native_paint(color: &QrColor, region: &Region, svg: &mut SvgDocument) -> Option<String> {
    match color {
        QrColor::Solid(c) => Some(svg_fill(*c)),
        QrColor::LinearGradient { start, end, orientation } => {
            let ((x1, y1), (x2, y2)) = orientation.endpoints(region.width, region.height);
            let id = svg.id("g");
            let _ = write!(
                svg.defs,
                "<linearGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">{}</linearGradient>",
                id,
                fmt_num(region.x + x1),
                fmt_num(region.y + y1),
                fmt_num(region.x + x2),
                fmt_num(region.y + y2),
                gradient_stops(*start, *end)
            );
            Some(format!("fill=\"url(#{})\"", id))
        }
        QrColor::RadialGradient { start, end, radius } => {
            let id = svg.id("g");
            let _ = write!(
                svg.defs,
                "<radialGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" cx=\"{}\" cy=\"{}\" r=\"{}\">{}</radialGradient>",
                id,
                fmt_num(region.x + region.width / 2.0),
                fmt_num(region.y + region.height / 2.0),
                fmt_num(radius * region.width.min(region.height) / 2.0),
                gradient_stops(*start, *end)
            );
            Some(format!("fill=\"url(#{})\"", id))
        }
        _ => None,
    }
}

fn fill_svg(path: &Path, color: &QrColor, region: &Region, svg: &mut SvgDocument) -> String {
    if let Some(paint) = native_paint(color, region, svg) {
        return path.write_svg(&paint, Affine::IDENTITY, svg);
    }
    match color_field(color, region) {
        Some(field) => image_svg(&field, region.x.floor(), region.y.floor(), path, svg),
        None => String::new(),
    }
}

fn image_svg(image: &RgbaImage, x: f32, y: f32, clip: &Path, svg: &mut SvgDocument) -> String {
    let mut png = Vec::new();
    if let Err(err) = image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        tracing::warn!(%err, "skipping layer that failed to encode");
        return String::new();
    }
    let mask = svg.mask(|svg| clip.write_svg("fill=\"#fff\"", Affine::IDENTITY, svg));
    format!(
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" mask=\"url(#{})\" xlink:href=\"data:image/png;base64,{}\"/>",
        fmt_num(x),
        fmt_num(y),
        image.width(),
        image.height(),
        mask,
        BASE64.encode(&png)
    )
}

/// Samples `color` over its region into a bitmap.
fn color_field(color: &QrColor, region: &Region) -> Option<RgbaImage> {
    let (w, h) = (region.width.ceil() as u32, region.height.ceil() as u32);
    if w == 0 || h == 0 || color.is_unspecified() {
        return None;
    }
    Some(RgbaImage::from_fn(w, h, |i, j| {
        let c = color.at_or_transparent(i as f32, j as f32, region.width, region.height);
        image::Rgba(crate::color::to_rgba(c))
    }))
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Scene;
    use crate::color::{from_rgba, GradientOrientation, QrColors, BLACK, WHITE};
    use crate::encoder::{encode, ErrorCorrectionLevel};
    use crate::options::{QrShapes, RenderOptions};
    use crate::shapes::{FrameShape, PixelShape, RoundCorners};

    const RED: u32 = 0xFFFF_0000;

    fn vector(options: &RenderOptions) -> VectorImage {
        let bits = encode("HELLO", ErrorCorrectionLevel::Low).unwrap();
        let scene = Scene::prepare(&bits, options).unwrap();
        render_vector(&scene).unwrap()
    }

    #[test]
    fn test_default_layers() {
        let image = vector(&RenderOptions::new(210).padding(0.0));
        // Background and the dark accumulator; light is unspecified.
        assert_eq!(image.layers.len(), 2);
        assert!(matches!(&image.layers[1], Layer::Fill { color: QrColor::Solid(BLACK), .. }));
    }

    #[test]
    fn test_eye_layers_when_colored() {
        let options = RenderOptions::new(210)
            .padding(0.0)
            .fourth_eye(true)
            .colors(QrColors::default().frame(QrColor::Solid(RED)).ball(QrColor::Solid(RED)));
        let image = vector(&options);
        assert_eq!(image.layers.len(), 2 + 4 + 4);
    }

    #[test]
    fn test_rasterize_matches_modules() {
        let options = RenderOptions::new(210).padding(0.0);
        let bits = encode("HELLO", ErrorCorrectionLevel::Low).unwrap();
        let image = vector(&options).rasterize().unwrap();
        for row in 0..21 {
            for col in 0..21 {
                let px = from_rgba(image.get_pixel(col * 10 + 5, row * 10 + 5).0);
                let expected = if bits.get(row as usize, col as usize) { BLACK } else { WHITE };
                assert_eq!(px, expected, "module {},{}", row, col);
            }
        }
    }

    #[test]
    fn test_svg_output() {
        let options = RenderOptions::new(210)
            .shapes(
                QrShapes::default()
                    .dark(PixelShape::RoundCorners(RoundCorners::new(0.5)))
                    .frame(FrameShape::Circle),
            )
            .colors(QrColors::default().dark(QrColor::LinearGradient {
                start: BLACK,
                end: RED,
                orientation: GradientOrientation::Vertical,
            }));
        let svg = vector(&options).to_svg_string();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("<linearGradient"));
        assert!(svg.contains("<mask"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_sampled_paint_is_embedded() {
        let options = RenderOptions::new(105).colors(
            QrColors::default().dark(QrColor::SweepGradient { stops: vec![(0.0, BLACK), (1.0, RED)] }),
        );
        let svg = vector(&options).to_svg_string();
        assert!(svg.contains("data:image/png;base64,"));
    }
}
