//! Resolution-independent geometry used by the vector backend and by logo masking.
//!
//! A [`Path`] is a small tree: primitive leaves (rectangles, rounded rectangles,
//! circles, polygons) combined with boolean operations and affine transforms.
//! Every path can answer point containment exactly, be rasterized to a
//! `tiny_skia::Mask`, and be written out as SVG.

use std::fmt::Write as _;

use tiny_skia::{FillRule, Mask, PathBuilder};

/// Circle-to-cubic control point factor.
const KAPPA: f32 = 0.552_284_8;

/// 2D affine transform, `x' = sx*x + kx*y + tx`, `y' = ky*x + sy*y + ty`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Affine {
    pub sx: f32,
    pub ky: f32,
    pub kx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Affine::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { sx: 1.0, ky: 0.0, kx: 0.0, sy: 1.0, tx: 0.0, ty: 0.0 };

    pub fn translate(dx: f32, dy: f32) -> Affine {
        Affine { tx: dx, ty: dy, ..Affine::IDENTITY }
    }

    pub fn scale(s: f32) -> Affine {
        Affine { sx: s, sy: s, ..Affine::IDENTITY }
    }

    /// Rotation by `degrees` (clockwise on a y-down canvas) about `(cx, cy)`.
    pub fn rotate_about(degrees: f32, cx: f32, cy: f32) -> Affine {
        let (sin, cos) = degrees.to_radians().sin_cos();
        // Snap quarter turns so rotated eyes stay pixel-exact.
        let snap = |v: f32| if v.abs() < 1e-6 { 0.0 } else { v };
        let (sin, cos) = (snap(sin), snap(cos));
        Affine {
            sx: cos,
            ky: sin,
            kx: -sin,
            sy: cos,
            tx: cx - cos * cx + sin * cy,
            ty: cy - sin * cx - cos * cy,
        }
    }

    /// Applies `self` first, then `next`.
    pub fn then(self, next: Affine) -> Affine {
        Affine {
            sx: next.sx * self.sx + next.kx * self.ky,
            ky: next.ky * self.sx + next.sy * self.ky,
            kx: next.sx * self.kx + next.kx * self.sy,
            sy: next.ky * self.kx + next.sy * self.sy,
            tx: next.sx * self.tx + next.kx * self.ty + next.tx,
            ty: next.ky * self.tx + next.sy * self.ty + next.ty,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.sx * x + self.kx * y + self.tx, self.ky * x + self.sy * y + self.ty)
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.sx * self.sy - self.kx * self.ky;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            sx: self.sy * inv,
            ky: -self.ky * inv,
            kx: -self.kx * inv,
            sy: self.sx * inv,
            tx: (self.kx * self.ty - self.sy * self.tx) * inv,
            ty: (self.ky * self.tx - self.sx * self.ty) * inv,
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Affine::IDENTITY
    }
}

/// Vector geometry.
#[derive(Clone, PartialEq, Debug)]
pub enum Path {
    Empty,
    Rect { x: f32, y: f32, w: f32, h: f32 },
    /// Rectangle with per-corner radii: top-left, top-right, bottom-right, bottom-left.
    RoundRect { x: f32, y: f32, w: f32, h: f32, radii: [f32; 4] },
    Circle { cx: f32, cy: f32, r: f32 },
    /// Closed polygon, points in clockwise order.
    Polygon(Vec<(f32, f32)>),
    Union(Vec<Path>),
    Difference(Box<Path>, Box<Path>),
    Intersect(Box<Path>, Box<Path>),
    Xor(Box<Path>, Box<Path>),
    Transformed(Box<Path>, Affine),
}

impl Path {
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Path {
        Path::Rect { x, y, w, h }
    }

    /// Rounded rectangle. Radii are clamped to half the shorter side.
    pub fn round_rect(x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> Path {
        let max = w.min(h) / 2.0;
        let radii = radii.map(|r| r.clamp(0.0, max));
        if radii.iter().all(|&r| r == 0.0) {
            Path::Rect { x, y, w, h }
        } else {
            Path::RoundRect { x, y, w, h, radii }
        }
    }

    pub fn circle(cx: f32, cy: f32, r: f32) -> Path {
        if r <= 0.0 {
            Path::Empty
        } else {
            Path::Circle { cx, cy, r }
        }
    }

    pub fn union(parts: Vec<Path>) -> Path {
        let parts: Vec<Path> = parts.into_iter().filter(|p| *p != Path::Empty).collect();
        match parts.len() {
            0 => Path::Empty,
            1 => parts.into_iter().next().unwrap_or(Path::Empty),
            _ => Path::Union(parts),
        }
    }

    pub fn difference(self, other: Path) -> Path {
        if self == Path::Empty || other == Path::Empty {
            self
        } else {
            Path::Difference(Box::new(self), Box::new(other))
        }
    }

    pub fn intersect(self, other: Path) -> Path {
        if self == Path::Empty || other == Path::Empty {
            Path::Empty
        } else {
            Path::Intersect(Box::new(self), Box::new(other))
        }
    }

    pub fn xor(self, other: Path) -> Path {
        if self == Path::Empty {
            other
        } else if other == Path::Empty {
            self
        } else {
            Path::Xor(Box::new(self), Box::new(other))
        }
    }

    pub fn transformed(self, transform: Affine) -> Path {
        if transform.is_identity() || self == Path::Empty {
            return self;
        }
        match self {
            Path::Transformed(inner, t) => Path::Transformed(inner, t.then(transform)),
            path => Path::Transformed(Box::new(path), transform),
        }
    }

    pub fn translated(self, dx: f32, dy: f32) -> Path {
        self.transformed(Affine::translate(dx, dy))
    }

    /// Rotation by `degrees` about `(cx, cy)`.
    pub fn rotated(self, degrees: f32, cx: f32, cy: f32) -> Path {
        if degrees % 360.0 == 0.0 {
            self
        } else {
            self.transformed(Affine::rotate_about(degrees, cx, cy))
        }
    }

    /// Point containment test.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        match self {
            Path::Empty => false,
            Path::Rect { x, y, w, h } => px >= *x && px < x + w && py >= *y && py < y + h,
            Path::RoundRect { x, y, w, h, radii } => {
                round_rect_contains(px - x, py - y, *w, *h, radii)
            }
            Path::Circle { cx, cy, r } => {
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy < r * r
            }
            Path::Polygon(points) => polygon_contains(points, px, py),
            Path::Union(parts) => parts.iter().any(|p| p.contains(px, py)),
            Path::Difference(a, b) => a.contains(px, py) && !b.contains(px, py),
            Path::Intersect(a, b) => a.contains(px, py) && b.contains(px, py),
            Path::Xor(a, b) => a.contains(px, py) != b.contains(px, py),
            Path::Transformed(inner, t) => match t.invert() {
                Some(inv) => {
                    let (x, y) = inv.apply(px, py);
                    inner.contains(x, y)
                }
                None => false,
            },
        }
    }

    /// Axis-aligned bounds as `(x0, y0, x1, y1)`, or `None` for an empty path.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        match self {
            Path::Empty => None,
            Path::Rect { x, y, w, h } | Path::RoundRect { x, y, w, h, .. } => {
                Some((*x, *y, x + w, y + h))
            }
            Path::Circle { cx, cy, r } => Some((cx - r, cy - r, cx + r, cy + r)),
            Path::Polygon(points) => bounds_of(points.iter().copied()),
            Path::Union(parts) => parts
                .iter()
                .filter_map(Path::bounds)
                .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))),
            Path::Difference(a, _) => a.bounds(),
            Path::Intersect(a, b) => {
                let (a, b) = (a.bounds()?, b.bounds()?);
                let r = (a.0.max(b.0), a.1.max(b.1), a.2.min(b.2), a.3.min(b.3));
                if r.0 < r.2 && r.1 < r.3 {
                    Some(r)
                } else {
                    None
                }
            }
            Path::Xor(a, b) => Path::Union(vec![(**a).clone(), (**b).clone()]).bounds(),
            Path::Transformed(inner, t) => {
                let (x0, y0, x1, y1) = inner.bounds()?;
                bounds_of([(x0, y0), (x1, y0), (x1, y1), (x0, y1)].into_iter().map(|(x, y)| t.apply(x, y)))
            }
        }
    }

    /// Whether the path can be drawn as one nonzero-filled contour set.
    pub fn is_simple(&self) -> bool {
        match self {
            Path::Union(parts) => parts.iter().all(Path::is_simple),
            Path::Transformed(inner, _) => inner.is_simple(),
            Path::Difference(..) | Path::Intersect(..) | Path::Xor(..) => false,
            _ => true,
        }
    }

    /// Emits the contours of a simple path into `sink`, transformed by `t`.
    /// Boolean nodes are skipped; callers check [`Path::is_simple`] first.
    fn emit(&self, t: Affine, sink: &mut dyn ContourSink) {
        match self {
            Path::Empty | Path::Difference(..) | Path::Intersect(..) | Path::Xor(..) => {}
            Path::Rect { x, y, w, h } => {
                emit_polygon(&[(*x, *y), (x + w, *y), (x + w, y + h), (*x, y + h)], t, sink)
            }
            Path::RoundRect { x, y, w, h, radii } => emit_round_rect(*x, *y, *w, *h, radii, t, sink),
            Path::Circle { cx, cy, r } => emit_round_rect(cx - r, cy - r, 2.0 * r, 2.0 * r, &[*r; 4], t, sink),
            Path::Polygon(points) => emit_polygon(points, t, sink),
            Path::Union(parts) => parts.iter().for_each(|p| p.emit(t, sink)),
            Path::Transformed(inner, inner_t) => inner.emit(inner_t.then(t), sink),
        }
    }

    /// Builds a `tiny_skia::Path` for a simple path.
    pub fn to_skia(&self, t: Affine) -> Option<tiny_skia::Path> {
        let mut sink = SkiaSink(PathBuilder::new());
        self.emit(t, &mut sink);
        sink.0.finish()
    }

    /// SVG path data (`d` attribute) for a simple path.
    pub fn svg_data(&self, t: Affine) -> String {
        let mut sink = SvgSink(String::new());
        self.emit(t, &mut sink);
        sink.0
    }

    /// Rasterizes the path into an anti-aliased coverage mask.
    pub fn to_mask(&self, width: u32, height: u32, t: Affine) -> Option<Mask> {
        let mut mask = Mask::new(width, height)?;
        self.fill_mask(&mut mask, t);
        Some(mask)
    }

    fn fill_mask(&self, mask: &mut Mask, t: Affine) {
        if self.is_simple() {
            if let Some(path) = self.to_skia(t) {
                mask.fill_path(&path, FillRule::Winding, true, tiny_skia::Transform::identity());
            }
            return;
        }
        let (w, h) = (mask.width(), mask.height());
        match self {
            Path::Union(parts) => {
                for part in parts {
                    part.fill_mask(mask, t);
                }
            }
            Path::Transformed(inner, inner_t) => inner.fill_mask(mask, inner_t.then(t)),
            Path::Difference(a, b) | Path::Intersect(a, b) | Path::Xor(a, b) => {
                let (Some(ma), Some(mb)) = (a.to_mask(w, h, t), b.to_mask(w, h, t)) else {
                    return;
                };
                let op: fn(u8, u8) -> u8 = match self {
                    Path::Difference(..) => |a, b| a.min(255 - b),
                    Path::Intersect(..) => |a, b| a.min(b),
                    _ => |a, b| a.abs_diff(b),
                };
                for ((dst, &a), &b) in mask.data_mut().iter_mut().zip(ma.data()).zip(mb.data()) {
                    *dst = (*dst).max(op(a, b));
                }
            }
            _ => {}
        }
    }

    /// Writes the path as SVG markup filled with `fill`. Boolean operations are
    /// expressed as masks appended to `defs`.
    pub fn write_svg(&self, fill: &str, t: Affine, svg: &mut SvgDocument) -> String {
        if self.is_simple() {
            let d = self.svg_data(t);
            if d.is_empty() {
                return String::new();
            }
            return format!("<path d=\"{}\" {}/>", d, fill);
        }
        match self {
            Path::Union(parts) => parts.iter().map(|p| p.write_svg(fill, t, svg)).collect(),
            Path::Transformed(inner, inner_t) => inner.write_svg(fill, inner_t.then(t), svg),
            Path::Difference(a, b) => {
                let id = svg.mask(|svg| {
                    format!(
                        "<rect x=\"-1e5\" y=\"-1e5\" width=\"2e5\" height=\"2e5\" fill=\"#fff\"/>{}",
                        b.write_svg("fill=\"#000\"", t, svg)
                    )
                });
                format!("<g mask=\"url(#{})\">{}</g>", id, a.write_svg(fill, t, svg))
            }
            Path::Intersect(a, b) => {
                let id = svg.mask(|svg| b.write_svg("fill=\"#fff\"", t, svg));
                format!("<g mask=\"url(#{})\">{}</g>", id, a.write_svg(fill, t, svg))
            }
            Path::Xor(a, b) => {
                let left = (**a).clone().difference((**b).clone());
                let right = (**b).clone().difference((**a).clone());
                format!("{}{}", left.write_svg(fill, t, svg), right.write_svg(fill, t, svg))
            }
            _ => String::new(),
        }
    }
}

/// Returns whether two paths overlap with nonzero area.
///
/// Rectangles and circles under axis-aligned transforms are tested exactly.
/// Anything else is rasterized over the overlap of both bounds at `resolution`
/// pixels per unit, and any pixel covered by both masks counts as a hit.
pub fn paths_intersect(a: &Path, b: &Path, resolution: f32) -> bool {
    let (Some(ba), Some(bb)) = (a.bounds(), b.bounds()) else {
        return false;
    };
    let (x0, y0, x1, y1) = (ba.0.max(bb.0), ba.1.max(bb.1), ba.2.min(bb.2), ba.3.min(bb.3));
    if x0 >= x1 || y0 >= y1 {
        return false;
    }
    if let (Some(pa), Some(pb)) = (a.primitive(), b.primitive()) {
        return pa.overlaps(pb);
    }

    let resolution = resolution.max(1.0);
    let w = ((x1 - x0) * resolution).ceil().max(1.0) as u32;
    let h = ((y1 - y0) * resolution).ceil().max(1.0) as u32;
    let t = Affine::translate(-x0, -y0).then(Affine::scale(resolution));
    let (Some(ma), Some(mb)) = (a.to_mask(w, h, t), b.to_mask(w, h, t)) else {
        return false;
    };
    ma.data().iter().zip(mb.data()).any(|(&ca, &cb)| ca > 0 && cb > 0)
}

/// Leaf geometry with a closed-form overlap test.
#[derive(Clone, Copy, Debug)]
enum Primitive {
    /// `(x0, y0, x1, y1)`
    Rect(f32, f32, f32, f32),
    /// `(cx, cy, r)`
    Circle(f32, f32, f32),
}

impl Primitive {
    fn overlaps(self, other: Primitive) -> bool {
        match (self, other) {
            (Primitive::Rect(ax0, ay0, ax1, ay1), Primitive::Rect(bx0, by0, bx1, by1)) => {
                ax0 < bx1 && bx0 < ax1 && ay0 < by1 && by0 < ay1
            }
            (Primitive::Rect(x0, y0, x1, y1), Primitive::Circle(cx, cy, r))
            | (Primitive::Circle(cx, cy, r), Primitive::Rect(x0, y0, x1, y1)) => {
                if x0 >= x1 || y0 >= y1 {
                    return false;
                }
                let (dx, dy) = (cx.clamp(x0, x1) - cx, cy.clamp(y0, y1) - cy);
                dx * dx + dy * dy < r * r
            }
            (Primitive::Circle(ax, ay, ar), Primitive::Circle(bx, by, br)) => {
                let (dx, dy) = (ax - bx, ay - by);
                dx * dx + dy * dy < (ar + br) * (ar + br)
            }
        }
    }
}

impl Path {
    fn primitive(&self) -> Option<Primitive> {
        match self {
            Path::Rect { x, y, w, h } => Some(Primitive::Rect(*x, *y, x + w, y + h)),
            Path::Circle { cx, cy, r } => Some(Primitive::Circle(*cx, *cy, *r)),
            Path::Transformed(inner, t) if t.kx == 0.0 && t.ky == 0.0 && t.sx > 0.0 && t.sy > 0.0 => {
                match inner.primitive()? {
                    Primitive::Rect(x0, y0, x1, y1) => {
                        let (x0, y0) = t.apply(x0, y0);
                        let (x1, y1) = t.apply(x1, y1);
                        Some(Primitive::Rect(x0, y0, x1, y1))
                    }
                    Primitive::Circle(cx, cy, r) if t.sx == t.sy => {
                        let (cx, cy) = t.apply(cx, cy);
                        Some(Primitive::Circle(cx, cy, r * t.sx))
                    }
                    Primitive::Circle(..) => None,
                }
            }
            _ => None,
        }
    }
}

/// Collects `<defs>` while a document body is being written.
#[derive(Default, Debug)]
pub struct SvgDocument {
    pub defs: String,
    next_id: usize,
}

impl SvgDocument {
    /// Allocates a fresh element id with the given prefix.
    pub fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    pub(crate) fn mask(&mut self, content: impl FnOnce(&mut SvgDocument) -> String) -> String {
        let id = self.id("m");
        let body = content(self);
        let _ = write!(self.defs, "<mask id=\"{}\" maskUnits=\"userSpaceOnUse\">{}</mask>", id, body);
        id
    }
}

trait ContourSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn close(&mut self);
}

struct SkiaSink(PathBuilder);

impl ContourSink for SkiaSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }
    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }
    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }
    fn close(&mut self) {
        self.0.close();
    }
}

struct SvgSink(String);

impl ContourSink for SvgSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.0, "M{},{}", fmt_num(x), fmt_num(y));
    }
    fn line_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.0, "L{},{}", fmt_num(x), fmt_num(y));
    }
    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let _ = write!(
            self.0,
            "C{},{} {},{} {},{}",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2),
            fmt_num(x),
            fmt_num(y)
        );
    }
    fn close(&mut self) {
        self.0.push('Z');
    }
}

/// Formats a coordinate with at most three decimals and no trailing zeros.
pub fn fmt_num(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn emit_polygon(points: &[(f32, f32)], t: Affine, sink: &mut dyn ContourSink) {
    let mut iter = points.iter().map(|&(x, y)| t.apply(x, y));
    let Some((x, y)) = iter.next() else {
        return;
    };
    sink.move_to(x, y);
    for (x, y) in iter {
        sink.line_to(x, y);
    }
    sink.close();
}

fn emit_round_rect(x: f32, y: f32, w: f32, h: f32, radii: &[f32; 4], t: Affine, sink: &mut dyn ContourSink) {
    let [tl, tr, br, bl] = *radii;
    let (sx, sy) = t.apply(x + tl, y);
    sink.move_to(sx, sy);
    line(sink, t, (x + w - tr, y));
    if tr > 0.0 {
        arc(sink, t, (x + w - tr + tr * KAPPA, y), (x + w, y + tr - tr * KAPPA), (x + w, y + tr));
    }
    line(sink, t, (x + w, y + h - br));
    if br > 0.0 {
        arc(sink, t, (x + w, y + h - br + br * KAPPA), (x + w - br + br * KAPPA, y + h), (x + w - br, y + h));
    }
    line(sink, t, (x + bl, y + h));
    if bl > 0.0 {
        arc(sink, t, (x + bl - bl * KAPPA, y + h), (x, y + h - bl + bl * KAPPA), (x, y + h - bl));
    }
    line(sink, t, (x, y + tl));
    if tl > 0.0 {
        arc(sink, t, (x, y + tl - tl * KAPPA), (x + tl - tl * KAPPA, y), (x + tl, y));
    }
    sink.close();
}

fn line(sink: &mut dyn ContourSink, t: Affine, to: (f32, f32)) {
    let (x, y) = t.apply(to.0, to.1);
    sink.line_to(x, y);
}

fn arc(sink: &mut dyn ContourSink, t: Affine, c1: (f32, f32), c2: (f32, f32), to: (f32, f32)) {
    let (c1, c2, to) = (t.apply(c1.0, c1.1), t.apply(c2.0, c2.1), t.apply(to.0, to.1));
    sink.cubic_to(c1.0, c1.1, c2.0, c2.1, to.0, to.1);
}

pub(crate) fn round_rect_contains(px: f32, py: f32, w: f32, h: f32, radii: &[f32; 4]) -> bool {
    if px < 0.0 || py < 0.0 || px >= w || py >= h {
        return false;
    }
    let [tl, tr, br, bl] = *radii;
    let corner = |cx: f32, cy: f32, r: f32| {
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy < r * r
    };
    if px < tl && py < tl {
        return corner(tl, tl, tl);
    }
    if px > w - tr && py < tr {
        return corner(w - tr, tr, tr);
    }
    if px > w - br && py > h - br {
        return corner(w - br, h - br, br);
    }
    if px < bl && py > h - bl {
        return corner(bl, h - bl, bl);
    }
    true
}

fn polygon_contains(points: &[(f32, f32)], px: f32, py: f32) -> bool {
    let mut inside = false;
    let n = points.len();
    for i in 0..n {
        let (xi, yi) = points[i];
        let (xj, yj) = points[(i + n - 1) % n];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
    }
    inside
}

fn bounds_of(points: impl Iterator<Item = (f32, f32)>) -> Option<(f32, f32, f32, f32)> {
    points.fold(None, |acc, (x, y)| match acc {
        None => Some((x, y, x, y)),
        Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
    })
}
