//! Logo placement and masking.
//!
//! The logo is sized relative to the code, not the image, and centred on it.
//! [`LogoPadding`] decides how the modules under it make room:
//!
//! - `None`: the logo is drawn over finished modules.
//! - `Accurate(p)`: a background of the logo shape, grown by `p`, is painted
//!   under the logo and over the modules.
//! - `Natural(p)`: every data module whose own shape touches that grown
//!   logo shape is suppressed as a whole, see [`mask_natural`].

use crate::builder::{Layout, StyledCode};
use crate::color::QrColor;
use crate::error::{QrError, Result};
use crate::image_source::{ImageHandle, ScaleMode};
use crate::matrix::{Neighbors, PixelType};
use crate::options::QrShapes;
use crate::path::{paths_intersect, Path};
use crate::shapes::{PixelShape, ShapeCache};

/// Pixels per module used when a module/logo collision has to be rasterized.
const COLLISION_RESOLUTION: f32 = 64.0;

/// How the area under the logo is cleared. Values are the padding fraction in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum LogoPadding {
    #[default]
    None,
    Accurate(f32),
    Natural(f32),
}

impl LogoPadding {
    pub fn value(&self) -> f32 {
        match self {
            LogoPadding::None => 0.0,
            LogoPadding::Accurate(p) | LogoPadding::Natural(p) => *p,
        }
    }
}

/// A logo drawn in the middle of the code.
#[derive(Clone, PartialEq, Debug)]
pub struct Logo {
    pub image: ImageHandle,
    /// Logo side as a fraction of the code side, in `(0, 1]`.
    pub size: f32,
    pub padding: LogoPadding,
    /// Outline of the logo and of its padded background.
    pub shape: PixelShape,
    /// Fill behind the logo; unspecified uses the image background.
    pub color: QrColor,
    pub scale: ScaleMode,
}

impl Logo {
    pub fn new(image: ImageHandle) -> Self {
        Logo {
            image,
            size: 0.25,
            padding: LogoPadding::None,
            shape: PixelShape::Default,
            color: QrColor::Unspecified,
            scale: ScaleMode::FitCenter,
        }
    }

    pub fn size(self, size: f32) -> Self {
        Logo { size, ..self }
    }

    pub fn padding(self, padding: LogoPadding) -> Self {
        Logo { padding, ..self }
    }

    pub fn shape(self, shape: PixelShape) -> Self {
        Logo { shape, ..self }
    }

    pub fn color(self, color: QrColor) -> Self {
        Logo { color, ..self }
    }

    pub fn scale(self, scale: ScaleMode) -> Self {
        Logo { scale, ..self }
    }

    /// Fraction of the code side taken by the logo and its padding.
    pub fn coverage(&self) -> f32 {
        self.size * (1.0 + self.padding.value())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.size > 0.0 && self.size <= 1.0) {
            return Err(QrError::config(format!("logo size must be in (0, 1], got {}", self.size)));
        }
        let p = self.padding.value();
        if !(0.0..=1.0).contains(&p) {
            return Err(QrError::config(format!("logo padding must be in [0, 1], got {}", p)));
        }
        self.shape.validate()
    }
}

/// Where the logo lands, in pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LogoPlacement {
    /// Logo box.
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Logo box grown by the padding, same centre.
    pub padded_x: f32,
    pub padded_y: f32,
    pub padded_size: f32,
}

impl LogoPlacement {
    pub fn new(logo: &Logo, layout: &Layout, size_increase: f32) -> Self {
        let code = layout.code_px() as f32;
        let size = code * logo.size / size_increase;
        let padded_size = size * (1.0 + logo.padding.value());
        let cx = layout.code_x as f32 + code / 2.0;
        let cy = layout.code_y as f32 + code / 2.0;
        LogoPlacement {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            size,
            padded_x: cx - padded_size / 2.0,
            padded_y: cy - padded_size / 2.0,
            padded_size,
        }
    }

    /// Integer logo box `(x, y, side)` the logo bitmap is scaled into.
    pub fn pixel_box(&self) -> (i64, i64, u32) {
        (self.x.round() as i64, self.y.round() as i64, self.size.round().max(1.0) as u32)
    }

    /// Padded background outline in image coordinates.
    pub fn padded_path(&self, shape: &PixelShape, cache: &ShapeCache) -> Path {
        shape
            .path(self.padded_size, &Neighbors::default(), cache)
            .translated(self.padded_x, self.padded_y)
    }

    /// Logo outline in image coordinates.
    pub fn logo_path(&self, shape: &PixelShape, cache: &ShapeCache) -> Path {
        let (x, y, side) = self.pixel_box();
        shape.path(side as f32, &Neighbors::default(), cache).translated(x as f32, y as f32)
    }
}

/// Reclassifies every dark or light module whose shape intersects the padded
/// logo shape as [`PixelType::Logo`]. Works in module units; returns the
/// number of modules suppressed.
pub fn mask_natural(code: &mut StyledCode, logo: &Logo, shapes: &QrShapes, cache: &ShapeCache) -> usize {
    let n = code.matrix.size() as f32;
    let padded = n * logo.size / code.size_increase * (1.0 + logo.padding.value());
    let origin = (n - padded) / 2.0;
    let logo_path = logo.shape.path(padded, &Neighbors::default(), cache).translated(origin, origin);
    let Some((x0, y0, x1, y1)) = logo_path.bounds() else {
        return 0;
    };

    let matrix = &code.matrix;
    let mut hits = Vec::new();
    for module in matrix.modules() {
        let shape = match module.kind {
            PixelType::DarkPixel => &shapes.dark,
            PixelType::LightPixel => &shapes.light,
            _ => continue,
        };
        let (col, row) = (module.col as f32, module.row as f32);
        if col + 1.0 <= x0 || col >= x1 || row + 1.0 <= y0 || row >= y1 {
            continue;
        }
        let neighbors = matrix.neighbors(module.row, module.col);
        let module_path = shape.path(1.0, &neighbors, cache).translated(col, row);
        if paths_intersect(&module_path, &logo_path, COLLISION_RESOLUTION) {
            hits.push((module.row, module.col));
        }
    }

    let marked = hits.into_iter().filter(|&(row, col)| code.matrix.mark_logo(row, col)).count();
    tracing::debug!(marked, padded_modules = padded, "masked modules under logo");
    marked
}
