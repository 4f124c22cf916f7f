//! Structural matrix builder.
//!
//! Turns the encoder's [`BitMatrix`] into a [`StyledCode`]: a typed module
//! grid with the eyes located, optionally grown by a code-shape envelope, plus
//! the pixel [`Layout`] both compositors place modules with.

use std::f32::consts::SQRT_2;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encoder::{alignment_pattern_positions, BitMatrix};
use crate::error::{QrError, Result};
use crate::logo::{mask_natural, LogoPadding, LogoPlacement};
use crate::matrix::{PixelType, StyledMatrix};
use crate::options::RenderOptions;
use crate::shapes::ShapeCache;

/// Side of an eye frame, in modules.
pub const EYE_SIZE: usize = 7;
/// Side of an eye ball, in modules.
pub const BALL_SIZE: usize = 3;
/// Inset of the ball from the frame origin, in modules.
pub const BALL_OFFSET: usize = 2;

/// Seed of [`CodeShape::circle`].
pub const DEFAULT_ENVELOPE_SEED: u64 = 233;

/// Outer silhouette of the code.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum CodeShape {
    /// The plain square symbol.
    #[default]
    Default,
    /// Grows the square and scatters random modules inside the circle around
    /// it. `padding` in `[1, 2]` scales the circle; `seed` makes the scatter
    /// reproducible.
    Circle { padding: f32, seed: u64 },
}

impl CodeShape {
    pub fn circle() -> Self {
        CodeShape::Circle { padding: 1.1, seed: DEFAULT_ENVELOPE_SEED }
    }

    /// Factor by which the envelope enlarges the code.
    pub fn size_increase(&self) -> f32 {
        match self {
            CodeShape::Default => 1.0,
            CodeShape::Circle { padding, .. } => padding * SQRT_2,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CodeShape::Circle { padding, .. } if !(1.0..=2.0).contains(padding) => Err(QrError::config(
                format!("circle envelope padding must be in [1, 2], got {}", padding),
            )),
            _ => Ok(()),
        }
    }

    /// Modules added on each side of a symbol of side `size`.
    fn growth(&self, size: usize) -> usize {
        match self {
            CodeShape::Default => 0,
            CodeShape::Circle { padding, .. } => {
                let m = size as f32;
                ((m * padding * SQRT_2 - m) / 2.0).round().max(0.0) as usize
            }
        }
    }

    fn apply(&self, bits: &BitMatrix) -> (StyledMatrix, usize) {
        let m = bits.size();
        let growth = self.growth(m);
        let n = m + 2 * growth;
        let mut matrix = StyledMatrix::new(n);

        if let CodeShape::Circle { seed, .. } = self {
            let mut rng = StdRng::seed_from_u64(*seed);
            let c = n as f32 / 2.0;
            let footprint = growth..growth + m;
            for row in 0..n {
                for col in 0..n {
                    if footprint.contains(&row) && footprint.contains(&col) {
                        continue;
                    }
                    let (dx, dy) = (col as f32 + 0.5 - c, row as f32 + 0.5 - c);
                    if (dx * dx + dy * dy).sqrt() <= c {
                        let dark = rng.gen_bool(0.5);
                        matrix.set(row, col, data_kind(dark), dark);
                    }
                }
            }
        }

        for row in 0..m {
            for col in 0..m {
                let dark = bits.get(row, col);
                matrix.set(row + growth, col + growth, data_kind(dark), dark);
            }
        }
        (matrix, growth)
    }
}

fn data_kind(dark: bool) -> PixelType {
    if dark {
        PixelType::DarkPixel
    } else {
        PixelType::LightPixel
    }
}

/// Square block of modules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub row: usize,
    pub col: usize,
    pub size: usize,
}

impl Rect {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row..self.row + self.size).contains(&row) && (self.col..self.col + self.size).contains(&col)
    }
}

/// One finder eye: the outer frame, the ball inside it, and the rotation its
/// shapes are drawn with (degrees, clockwise).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Eye {
    pub frame: Rect,
    pub ball: Rect,
    pub rotation: f32,
}

/// Eye placements for a matrix of side `size` grown by `growth`, in the order
/// top-left, bottom-left, top-right and, when enabled, bottom-right.
///
/// With `symmetric` the eyes are rotated by 0, -90, 90 and 180 degrees so
/// that a single authored eye faces outward in every corner.
pub fn eye_regions(size: usize, growth: usize, fourth_eye: bool, symmetric: bool) -> Vec<Eye> {
    if size < EYE_SIZE + 2 * growth {
        return Vec::new();
    }
    let far = size - EYE_SIZE - growth;
    let mut anchors = vec![(growth, growth, 0.0), (far, growth, -90.0), (growth, far, 90.0)];
    if fourth_eye {
        anchors.push((far, far, 180.0));
    }
    anchors
        .into_iter()
        .map(|(row, col, rotation)| Eye {
            frame: Rect { row, col, size: EYE_SIZE },
            ball: Rect { row: row + BALL_OFFSET, col: col + BALL_OFFSET, size: BALL_SIZE },
            rotation: if symmetric { rotation } else { 0.0 },
        })
        .collect()
}

/// The typed matrix a render works from.
#[derive(Clone, Debug)]
pub struct StyledCode {
    pub matrix: StyledMatrix,
    /// Modules added on each side by the envelope.
    pub growth: usize,
    /// See [`CodeShape::size_increase`].
    pub size_increase: f32,
    pub eyes: Vec<Eye>,
}

impl StyledCode {
    /// The eye whose frame covers `(row, col)`.
    pub fn eye_at(&self, row: usize, col: usize) -> Option<&Eye> {
        self.eyes.iter().find(|eye| eye.frame.contains(row, col))
    }
}

/// Classifies every module of `bits`.
///
/// Data modules keep their encoder bit as [`PixelType::DarkPixel`] or
/// [`PixelType::LightPixel`]; alignment patterns and timing lines are split
/// out when highlighted; eye frames and balls are marked last.
pub fn build(bits: &BitMatrix, options: &RenderOptions) -> StyledCode {
    let (mut matrix, growth) = options.code_shape.apply(bits);
    let m = bits.size();
    let n = matrix.size();

    if options.highlight_timing && m > 16 {
        for i in 8..m - 8 {
            matrix.set_kind(growth + 6, growth + i, PixelType::TimingLine);
            matrix.set_kind(growth + i, growth + 6, PixelType::TimingLine);
        }
    }

    if options.highlight_alignment {
        if let Some(version) = bits.version() {
            let positions = alignment_pattern_positions(version);
            let (first, last) = (positions.first().copied(), positions.last().copied());
            for &r in &positions {
                for &c in &positions {
                    let overlaps_finder = (Some(r) == first && (Some(c) == first || Some(c) == last))
                        || (Some(r) == last && Some(c) == first);
                    if overlaps_finder {
                        continue;
                    }
                    for row in r - 2..=r + 2 {
                        for col in c - 2..=c + 2 {
                            matrix.set_kind(growth + row, growth + col, PixelType::VersionEye);
                        }
                    }
                }
            }
        }
    }

    if options.fourth_eye && m > EYE_SIZE {
        // Eye plus its separator, taken out of the data area.
        let start = growth + m - (EYE_SIZE + 1);
        for row in start..growth + m {
            for col in start..growth + m {
                matrix.set(row, col, PixelType::LightPixel, false);
            }
        }
    }

    let eyes = eye_regions(n, growth, options.fourth_eye, options.shapes.central_symmetry);
    for (index, eye) in eyes.iter().enumerate() {
        let f = eye.frame;
        // The fourth eye has no encoder pattern behind it.
        let synthetic = index == 3;
        for row in f.row..f.row + f.size {
            for col in f.col..f.col + f.size {
                let kind = if eye.ball.contains(row, col) { PixelType::EyeBall } else { PixelType::EyeFrame };
                let dark = if synthetic {
                    finder_bit(row - f.row, col - f.col)
                } else {
                    matrix.module(row, col).dark
                };
                matrix.set(row, col, kind, dark);
            }
        }
    }

    tracing::debug!(
        modules = n,
        growth,
        eyes = eyes.len(),
        data_modules = matrix.count(PixelType::DarkPixel) + matrix.count(PixelType::LightPixel),
        "built styled matrix"
    );
    StyledCode { matrix, growth, size_increase: options.code_shape.size_increase(), eyes }
}

/// Module value of a standard finder pattern at `(row, col)` inside its 7x7 box.
fn finder_bit(row: usize, col: usize) -> bool {
    let ring = row.min(col).min(EYE_SIZE - 1 - row).min(EYE_SIZE - 1 - col);
    ring != 1
}

/// Pixel placement of the module grid inside the output image.
///
/// The image is `size` pixels square. `padding * size` pixels (rounded) are
/// reserved on each side; the remaining highlighting area holds the code,
/// whose modules are `module_px` pixels wide. Pixels left over because the
/// area is not a multiple of the module count are split evenly around the
/// code, so every module and eye stays pixel-aligned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
    pub size: u32,
    pub modules: usize,
    pub module_px: u32,
    pub area_x: i64,
    pub area_y: i64,
    pub area_size: u32,
    pub code_x: i64,
    pub code_y: i64,
}

impl Layout {
    /// # Errors
    ///
    /// Returns [`QrError::Configuration`] if a module would be narrower than one pixel.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::builder::Layout;
    ///
    /// let layout = Layout::new(512, 0.1, (0.0, 0.0), 21).unwrap();
    /// assert_eq!(layout.module_px, 19);
    /// assert_eq!(layout.code_x, 56);
    /// ```
    pub fn new(size: u32, padding: f32, offset: (f32, f32), modules: usize) -> Result<Layout> {
        let pad = (size as f32 * padding).round() as i64;
        let area = (size as i64 - 2 * pad).max(0);
        let module_px = if modules == 0 { 0 } else { area / modules as i64 };
        if module_px == 0 {
            return Err(QrError::config(format!(
                "{}px image with padding {} cannot hold {} modules",
                size, padding, modules
            )));
        }
        let slack = area - module_px * modules as i64;
        let area_x = pad + (offset.0 * pad as f32).round() as i64;
        let area_y = pad + (offset.1 * pad as f32).round() as i64;
        Ok(Layout {
            size,
            modules,
            module_px: module_px as u32,
            area_x,
            area_y,
            area_size: area as u32,
            code_x: area_x + slack / 2,
            code_y: area_y + slack / 2,
        })
    }

    /// Width of the module grid in pixels.
    pub fn code_px(&self) -> u32 {
        self.module_px * self.modules as u32
    }

    /// Top-left pixel of a module.
    pub fn module_origin(&self, row: usize, col: usize) -> (i64, i64) {
        let m = self.module_px as i64;
        (self.code_x + col as i64 * m, self.code_y + row as i64 * m)
    }

    /// The `(row, col)` of the module covering pixel `(x, y)`.
    pub fn module_at(&self, x: u32, y: u32) -> Option<(usize, usize)> {
        let (dx, dy) = (x as i64 - self.code_x, y as i64 - self.code_y);
        let code = self.code_px() as i64;
        if dx < 0 || dy < 0 || dx >= code || dy >= code {
            return None;
        }
        let m = self.module_px as i64;
        Some(((dy / m) as usize, (dx / m) as usize))
    }
}

/// Everything the compositors read for one render.
pub struct Scene<'a> {
    pub options: &'a RenderOptions,
    pub code: StyledCode,
    pub layout: Layout,
    pub logo: Option<LogoPlacement>,
    /// Rasterized custom shapes, scoped to this render.
    pub cache: ShapeCache,
}

impl<'a> Scene<'a> {
    /// Builds the styled matrix, lays it out and makes room for the logo.
    pub fn prepare(bits: &BitMatrix, options: &'a RenderOptions) -> Result<Scene<'a>> {
        let cache = ShapeCache::new();
        let mut code = build(bits, options);
        let layout = Layout::new(options.size, options.padding, options.offset, code.matrix.size())?;
        let logo = match &options.logo {
            Some(logo) => {
                if let LogoPadding::Natural(_) = logo.padding {
                    mask_natural(&mut code, logo, &options.shapes, &cache);
                }
                Some(LogoPlacement::new(logo, &layout, code.size_increase))
            }
            None => None,
        };
        tracing::debug!(
            size = layout.size,
            module_px = layout.module_px,
            code_x = layout.code_x,
            code_y = layout.code_y,
            "laid out code"
        );
        Ok(Scene { options, code, layout, logo, cache })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, ErrorCorrectionLevel};

    fn hello() -> BitMatrix {
        encode("HELLO", ErrorCorrectionLevel::Low).unwrap()
    }

    #[test]
    fn test_three_eyes() {
        let code = build(&hello(), &RenderOptions::new(210));
        let m = &code.matrix;
        assert_eq!(m.size(), 21);
        assert_eq!(m.count(PixelType::EyeBall), 3 * 9);
        assert_eq!(m.count(PixelType::EyeFrame), 3 * 40);
        assert_eq!(m.kind(0, 0), PixelType::EyeFrame);
        assert_eq!(m.kind(3, 3), PixelType::EyeBall);
        assert_eq!(m.kind(17, 3), PixelType::EyeBall);
        assert_eq!(m.kind(3, 17), PixelType::EyeBall);
        assert_ne!(m.kind(17, 17), PixelType::EyeBall);
    }

    #[test]
    fn test_data_bits_preserved() {
        let bits = hello();
        let code = build(&bits, &RenderOptions::new(210));
        for module in code.matrix.modules() {
            assert_eq!(module.dark, bits.get(module.row, module.col));
            match module.kind {
                PixelType::DarkPixel => assert!(module.dark),
                PixelType::LightPixel => assert!(!module.dark),
                PixelType::EyeBall | PixelType::EyeFrame => assert!(code.eye_at(module.row, module.col).is_some()),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_fourth_eye() {
        let bits = hello();
        let code = build(&bits, &RenderOptions::new(210).fourth_eye(true));
        assert_eq!(code.eyes.len(), 4);
        assert_eq!(code.matrix.count(PixelType::EyeBall), 4 * 9);
        assert_eq!(code.matrix.kind(13, 13), PixelType::LightPixel);
        assert!(code.matrix.module(14, 14).dark);
        assert!(!code.matrix.module(15, 15).dark);
        assert!(code.matrix.module(17, 17).dark);
    }

    #[test]
    fn test_symmetric_rotations() {
        let eyes = eye_regions(21, 0, true, true);
        let rotations: Vec<f32> = eyes.iter().map(|e| e.rotation).collect();
        assert_eq!(rotations, vec![0.0, -90.0, 90.0, 180.0]);
        assert_eq!(eyes[1].frame, Rect { row: 14, col: 0, size: 7 });
        assert_eq!(eyes[2].frame, Rect { row: 0, col: 14, size: 7 });
        assert!(eye_regions(21, 0, false, false).iter().all(|e| e.rotation == 0.0));
    }

    #[test]
    fn test_circle_envelope() {
        let bits = hello();
        let options = RenderOptions::new(330).code_shape(CodeShape::circle());
        let a = build(&bits, &options);
        let b = build(&bits, &options);
        assert_eq!(a.growth, 6);
        assert_eq!(a.matrix.size(), 33);
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(a.matrix.kind(0, 0), PixelType::Background);
        assert_eq!(a.eyes[0].frame, Rect { row: 6, col: 6, size: 7 });
        for row in 7..20 {
            assert_eq!(a.matrix.module(row + 6, 10 + 6).dark, bits.get(row, 10));
        }
        assert!((a.size_increase - 1.1 * SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_highlighted_patterns_keep_bits() {
        let bits = BitMatrix::new(25, (0..625).map(|i| i % 3 == 0).collect()).unwrap();
        let options = RenderOptions::new(250).highlight_alignment(true).highlight_timing(true);
        let code = build(&bits, &options);
        assert_eq!(code.matrix.count(PixelType::VersionEye), 25);
        assert_eq!(code.matrix.count(PixelType::TimingLine), 18);
        assert_eq!(code.matrix.kind(18, 18), PixelType::VersionEye);
        assert_eq!(code.matrix.module(18, 18).dark, bits.get(18, 18));
    }

    #[test]
    fn test_layout() {
        let layout = Layout::new(512, 0.1, (0.0, 0.0), 21).unwrap();
        assert_eq!(layout.area_size, 410);
        assert_eq!(layout.code_px(), 399);
        assert_eq!(layout.module_at(56, 56), Some((0, 0)));
        assert_eq!(layout.module_at(55, 56), None);
        assert_eq!(layout.module_at(56 + 19 * 3, 56 + 19), Some((1, 3)));
        assert_eq!(layout.module_origin(20, 20), (56 + 380, 56 + 380));

        let shifted = Layout::new(512, 0.1, (1.0, -1.0), 21).unwrap();
        assert_eq!(shifted.code_x, 56 + 51);
        assert_eq!(shifted.code_y, 56 - 51);

        assert!(Layout::new(20, 0.1, (0.0, 0.0), 21).is_err());
    }
}
