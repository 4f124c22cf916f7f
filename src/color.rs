//! Colors and gradients.
//!
//! Every stylable region gets a [`QrColor`], evaluated in that region's own
//! coordinate frame as `(x, y, width, height) -> ARGB`. Colors are packed
//! `0xAARRGGBB` values.

use std::fmt;
use std::sync::Arc;

use crate::image_source::ImageHandle;

/// Packed `0xAARRGGBB` color.
pub type Argb = u32;

pub const TRANSPARENT: Argb = 0x0000_0000;
pub const BLACK: Argb = 0xFF00_0000;
pub const WHITE: Argb = 0xFFFF_FFFF;

pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Argb {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub const fn alpha(c: Argb) -> u8 {
    (c >> 24) as u8
}

/// Channels in `[a, r, g, b]` order.
pub const fn channels(c: Argb) -> [u8; 4] {
    [(c >> 24) as u8, (c >> 16) as u8, (c >> 8) as u8, c as u8]
}

/// Converts to `[r, g, b, a]`, the layout of `image::Rgba`.
pub const fn to_rgba(c: Argb) -> [u8; 4] {
    let [a, r, g, b] = channels(c);
    [r, g, b, a]
}

pub const fn from_rgba(p: [u8; 4]) -> Argb {
    argb(p[3], p[0], p[1], p[2])
}

/// Linear per-channel blend: `c1 * p + c2 * (1 - p)`.
///
/// A fully transparent side yields the other color unchanged.
///
/// # Example
///
/// ```rust
/// use qrstyle::color::{mix, BLACK, WHITE};
///
/// assert_eq!(mix(BLACK, WHITE, 1.0), BLACK);
/// assert_eq!(mix(BLACK, WHITE, 0.0), WHITE);
/// assert_eq!(mix(WHITE, WHITE, 0.3), WHITE);
/// ```
pub fn mix(c1: Argb, c2: Argb, p: f32) -> Argb {
    if alpha(c1) == 0 {
        return c2;
    }
    if alpha(c2) == 0 {
        return c1;
    }
    let (a, b) = (channels(c1), channels(c2));
    let ch = |i: usize| (a[i] as f32 * p + b[i] as f32 * (1.0 - p)).round().clamp(0.0, 255.0) as u8;
    argb(ch(0), ch(1), ch(2), ch(3))
}

/// Composites `fg` over `bg`, weighting by the foreground alpha.
pub fn over(fg: Argb, bg: Argb) -> Argb {
    mix(fg, bg, alpha(fg) as f32 / 255.0)
}

/// Axis of a [`QrColor::LinearGradient`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum GradientOrientation {
    /// Top to bottom.
    #[default]
    Vertical,
    /// Left to right.
    Horizontal,
    /// Top-left to bottom-right.
    LeftDiagonal,
    /// Top-right to bottom-left.
    RightDiagonal,
}

impl GradientOrientation {
    fn proportion(self, x: f32, y: f32, w: f32, h: f32) -> f32 {
        match self {
            GradientOrientation::Vertical => y / h,
            GradientOrientation::Horizontal => x / w,
            GradientOrientation::LeftDiagonal => (x + y) / (w + h),
            GradientOrientation::RightDiagonal => ((w - x) + y) / (w + h),
        }
    }

    /// Start and end points of the axis inside a `w x h` box.
    pub fn endpoints(self, w: f32, h: f32) -> ((f32, f32), (f32, f32)) {
        match self {
            GradientOrientation::Vertical => ((0.0, 0.0), (0.0, h)),
            GradientOrientation::Horizontal => ((0.0, 0.0), (w, 0.0)),
            GradientOrientation::LeftDiagonal => ((0.0, 0.0), (w, h)),
            GradientOrientation::RightDiagonal => ((w, 0.0), (0.0, h)),
        }
    }
}

/// User color callback, `(x, y, width, height) -> ARGB`.
pub type ColorFn = dyn Fn(f32, f32, f32, f32) -> Argb + Send + Sync;

/// Fill of one region.
#[derive(Clone, Default)]
pub enum QrColor {
    /// Defer to the next applicable region. Not the same as transparent.
    #[default]
    Unspecified,
    Solid(Argb),
    LinearGradient { start: Argb, end: Argb, orientation: GradientOrientation },
    /// `radius` scales the half of the shorter side; 1.0 reaches the edge.
    RadialGradient { start: Argb, end: Argb, radius: f32 },
    SquareGradient { start: Argb, end: Argb },
    RhombusGradient { start: Argb, end: Argb },
    /// Color stops `(position in [0, 1], color)` swept clockwise from 3 o'clock.
    SweepGradient { stops: Vec<(f32, Argb)> },
    /// Diagonal quadrants alternate between two colors that fade toward their
    /// midpoint away from the centre.
    CrossingGradient { first: Argb, second: Argb },
    /// Samples an image stretched over the region.
    Bitmap(ImageHandle),
    Custom(Arc<ColorFn>),
}

impl QrColor {
    pub fn custom(f: impl Fn(f32, f32, f32, f32) -> Argb + Send + Sync + 'static) -> Self {
        QrColor::Custom(Arc::new(f))
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, QrColor::Unspecified)
    }

    /// Evaluates the color at `(x, y)` of a `w x h` region, `None` when unspecified.
    pub fn at(&self, x: f32, y: f32, w: f32, h: f32) -> Option<Argb> {
        let w = w.max(1.0);
        let h = h.max(1.0);
        let color = match self {
            QrColor::Unspecified => return None,
            QrColor::Solid(c) => *c,
            QrColor::LinearGradient { start, end, orientation } => {
                let p = orientation.proportion(x, y, w, h).clamp(0.0, 1.0);
                mix(*end, *start, p)
            }
            QrColor::RadialGradient { start, end, radius } => {
                let (dx, dy) = (x - w / 2.0, y - h / 2.0);
                let reach = (radius * w.min(h) / 2.0).max(f32::EPSILON);
                let p = ((dx * dx + dy * dy).sqrt() / reach).clamp(0.0, 1.0);
                mix(*end, *start, p)
            }
            QrColor::SquareGradient { start, end } => {
                let d = x.min(w - x).min(y).min(h - y).max(0.0);
                let p = (1.0 - d / (w.min(h) / 2.0)).clamp(0.0, 1.0);
                mix(*end, *start, p)
            }
            QrColor::RhombusGradient { start, end } => {
                let d = (x.min(w - x) + y.min(h - y)).max(0.0);
                let p = (1.0 - d / ((w + h) / 2.0)).clamp(0.0, 1.0);
                mix(*end, *start, p)
            }
            QrColor::SweepGradient { stops } => sweep(stops, x, y, w, h),
            QrColor::CrossingGradient { first, second } => crossing(*first, *second, x, y, w, h),
            QrColor::Bitmap(image) => image.sample(x / w, y / h),
            QrColor::Custom(f) => f(x, y, w, h),
        };
        Some(color)
    }

    /// Like [`QrColor::at`], but unspecified reads as transparent.
    pub fn at_or_transparent(&self, x: f32, y: f32, w: f32, h: f32) -> Argb {
        self.at(x, y, w, h).unwrap_or(TRANSPARENT)
    }

    /// The color when it is the same everywhere.
    pub fn solid(&self) -> Option<Argb> {
        match self {
            QrColor::Solid(c) => Some(*c),
            _ => None,
        }
    }
}

fn sweep(stops: &[(f32, Argb)], x: f32, y: f32, w: f32, h: f32) -> Argb {
    match stops {
        [] => TRANSPARENT,
        [(_, only)] => *only,
        _ => {
            let angle = (y - h / 2.0).atan2(x - w / 2.0);
            let t = (angle / std::f32::consts::TAU).rem_euclid(1.0);
            let after = stops.iter().position(|(pos, _)| *pos >= t);
            match after {
                Some(0) => stops[0].1,
                None => stops[stops.len() - 1].1,
                Some(i) => {
                    let (p0, c0) = stops[i - 1];
                    let (p1, c1) = stops[i];
                    let span = (p1 - p0).max(f32::EPSILON);
                    mix(c1, c0, ((t - p0) / span).clamp(0.0, 1.0))
                }
            }
        }
    }
}

fn crossing(first: Argb, second: Argb, x: f32, y: f32, w: f32, h: f32) -> Argb {
    let dx = (x - w / 2.0) / (w / 2.0);
    let dy = (y - h / 2.0) / (h / 2.0);
    let base = if (dx >= 0.0) == (dy >= 0.0) { first } else { second };
    // Order the pair so the midpoint does not depend on argument order.
    let (lo, hi) = (first.min(second), first.max(second));
    let midpoint = mix(hi, lo, 0.5);
    let t = ((dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2).clamp(0.0, 1.0);
    mix(midpoint, base, t)
}

impl PartialEq for QrColor {
    fn eq(&self, other: &Self) -> bool {
        use QrColor::*;
        match (self, other) {
            (Unspecified, Unspecified) => true,
            (Solid(a), Solid(b)) => a == b,
            (
                LinearGradient { start: s1, end: e1, orientation: o1 },
                LinearGradient { start: s2, end: e2, orientation: o2 },
            ) => s1 == s2 && e1 == e2 && o1 == o2,
            (
                RadialGradient { start: s1, end: e1, radius: r1 },
                RadialGradient { start: s2, end: e2, radius: r2 },
            ) => s1 == s2 && e1 == e2 && r1 == r2,
            (SquareGradient { start: s1, end: e1 }, SquareGradient { start: s2, end: e2 }) => s1 == s2 && e1 == e2,
            (RhombusGradient { start: s1, end: e1 }, RhombusGradient { start: s2, end: e2 }) => s1 == s2 && e1 == e2,
            (SweepGradient { stops: a }, SweepGradient { stops: b }) => a == b,
            (CrossingGradient { first: f1, second: s1 }, CrossingGradient { first: f2, second: s2 }) => {
                f1 == f2 && s1 == s2
            }
            (Bitmap(a), Bitmap(b)) => a == b,
            (Custom(a), Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for QrColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QrColor::Unspecified => write!(f, "Unspecified"),
            QrColor::Solid(c) => write!(f, "Solid({:#010x})", c),
            QrColor::LinearGradient { start, end, orientation } => {
                write!(f, "LinearGradient({:#010x} -> {:#010x}, {:?})", start, end, orientation)
            }
            QrColor::RadialGradient { start, end, radius } => {
                write!(f, "RadialGradient({:#010x} -> {:#010x}, r={})", start, end, radius)
            }
            QrColor::SquareGradient { start, end } => write!(f, "SquareGradient({:#010x} -> {:#010x})", start, end),
            QrColor::RhombusGradient { start, end } => write!(f, "RhombusGradient({:#010x} -> {:#010x})", start, end),
            QrColor::SweepGradient { stops } => write!(f, "SweepGradient({} stops)", stops.len()),
            QrColor::CrossingGradient { first, second } => {
                write!(f, "CrossingGradient({:#010x}, {:#010x})", first, second)
            }
            QrColor::Bitmap(image) => write!(f, "Bitmap({:?})", image),
            QrColor::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Colors of the code regions. Background color lives with the background.
#[derive(Clone, PartialEq, Debug)]
pub struct QrColors {
    pub dark: QrColor,
    pub light: QrColor,
    /// Eye ball; unspecified falls back to `dark`.
    pub ball: QrColor,
    /// Eye frame; unspecified falls back to `dark`.
    pub frame: QrColor,
    /// Fill behind the code modules, inside the padding.
    pub highlighting: QrColor,
}

impl Default for QrColors {
    fn default() -> Self {
        QrColors {
            dark: QrColor::Solid(BLACK),
            light: QrColor::Unspecified,
            ball: QrColor::Unspecified,
            frame: QrColor::Unspecified,
            highlighting: QrColor::Unspecified,
        }
    }
}

impl QrColors {
    pub fn dark(self, dark: QrColor) -> Self {
        QrColors { dark, ..self }
    }

    pub fn light(self, light: QrColor) -> Self {
        QrColors { light, ..self }
    }

    pub fn ball(self, ball: QrColor) -> Self {
        QrColors { ball, ..self }
    }

    pub fn frame(self, frame: QrColor) -> Self {
        QrColors { frame, ..self }
    }

    pub fn highlighting(self, highlighting: QrColor) -> Self {
        QrColors { highlighting, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Argb = 0xFFFF_0000;
    const BLUE: Argb = 0xFF00_00FF;

    #[test]
    fn test_mix_identities() {
        for &c in &[RED, BLUE, 0x8012_3456] {
            for p in [0.0, 0.25, 0.5, 1.0] {
                assert_eq!(mix(c, c, p), c);
            }
        }
        assert_eq!(mix(RED, BLUE, 1.0), RED);
        assert_eq!(mix(RED, BLUE, 0.0), BLUE);
        assert_eq!(mix(TRANSPARENT, BLUE, 0.9), BLUE);
        assert_eq!(mix(RED, TRANSPARENT, 0.1), RED);
        assert_eq!(mix(RED, BLUE, 0.5), 0xFF80_0080);
    }

    #[test]
    fn test_linear_gradient() {
        let g = QrColor::LinearGradient { start: RED, end: BLUE, orientation: GradientOrientation::Horizontal };
        assert_eq!(g.at(0.0, 5.0, 10.0, 10.0), Some(RED));
        assert_eq!(g.at(10.0, 5.0, 10.0, 10.0), Some(BLUE));
        assert_eq!(g.at(50.0, 5.0, 10.0, 10.0), Some(BLUE));
        assert_eq!(g.at(5.0, 0.0, 10.0, 10.0), Some(0xFF80_0080));
    }

    #[test]
    fn test_radial_square_rhombus_centre_is_start() {
        let colors = [
            QrColor::RadialGradient { start: RED, end: BLUE, radius: 1.0 },
            QrColor::SquareGradient { start: RED, end: BLUE },
            QrColor::RhombusGradient { start: RED, end: BLUE },
        ];
        for c in &colors {
            assert_eq!(c.at(5.0, 5.0, 10.0, 10.0), Some(RED), "{:?}", c);
            assert_eq!(c.at(0.0, 0.0, 10.0, 10.0), Some(BLUE), "{:?}", c);
        }
    }

    #[test]
    fn test_sweep_stops() {
        let g = QrColor::SweepGradient { stops: vec![(0.0, RED), (0.5, BLUE), (1.0, RED)] };
        // Directly right of the centre is angle 0, directly left is half a turn.
        assert_eq!(g.at(10.0, 5.0, 10.0, 10.0), Some(RED));
        assert_eq!(g.at(0.0, 5.0 + 1e-3, 10.0, 10.0).map(|c| c & 0xFF), Some(0xFF));
    }

    #[test]
    fn test_crossing_is_symmetric() {
        let a = QrColor::CrossingGradient { first: RED, second: BLUE };
        let b = QrColor::CrossingGradient { first: BLUE, second: RED };
        // Quadrant colors swap with argument order; the far-corner midpoint does not.
        assert_eq!(a.at(5.0, 5.0, 10.0, 10.0), Some(RED));
        assert_eq!(a.at(5.1, 4.9, 10.0, 10.0), b.at(4.9, 4.9, 10.0, 10.0));
        assert_eq!(a.at(0.0, 0.0, 10.0, 10.0), b.at(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_unspecified_defers() {
        assert_eq!(QrColor::Unspecified.at(0.0, 0.0, 1.0, 1.0), None);
        assert!(QrColor::Unspecified.is_unspecified());
        assert_eq!(QrColor::Solid(TRANSPARENT).at(0.0, 0.0, 1.0, 1.0), Some(TRANSPARENT));
    }
}
