//! Shape modifiers.
//!
//! Every stylable region has its own shape type. Each shape answers two
//! questions that must agree with each other at the same nominal size:
//!
//! - `contains(x, y, size, ..)`: is the point `(x, y)` of a `size x size`
//!   element painted? Used by the raster compositor, sampling pixel centres.
//! - `path(size, ..)`: the same region as vector geometry, for the vector
//!   compositor and for logo collision tests.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tiny_skia::Pixmap;

use crate::error::{QrError, Result};
use crate::matrix::Neighbors;
use crate::path::{round_rect_contains, Path};

/// Smallest off-screen buffer a custom shape is rasterized into.
pub const MIN_CUSTOM_RESOLUTION: u32 = 64;

/// Arcs of the star outline are flattened into this many segments.
const STAR_ARC_SEGMENTS: usize = 16;

/// Draw callback for [`CustomShape`]. Paint the shape opaquely into the
/// supplied pixmap, scaled to its full width and height.
pub type DrawFn = dyn Fn(&mut Pixmap) + Send + Sync;

/// A user-drawn shape, rasterized once per resolution and sampled afterwards.
#[derive(Clone)]
pub struct CustomShape {
    draw: Arc<DrawFn>,
}

impl CustomShape {
    pub fn new(draw: impl Fn(&mut Pixmap) + Send + Sync + 'static) -> Self {
        CustomShape { draw: Arc::new(draw) }
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.draw) as *const () as usize
    }
}

impl PartialEq for CustomShape {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.draw, &other.draw)
    }
}

impl fmt::Debug for CustomShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CustomShape({:#x})", self.key())
    }
}

/// Rasterized custom shapes for one render call.
///
/// Entries are keyed by callback identity and buffer resolution, so each
/// callback runs at most once per resolution. The cache is created by the
/// render entry point and dropped with it.
#[derive(Default)]
pub struct ShapeCache {
    entries: RwLock<HashMap<(usize, u32), Arc<Vec<bool>>>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        ShapeCache::default()
    }

    /// Number of rasterized buffers held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolution(size: f32) -> u32 {
        (size.ceil() as u32).max(MIN_CUSTOM_RESOLUTION)
    }

    fn buffer(&self, shape: &CustomShape, res: u32) -> Arc<Vec<bool>> {
        let key = (shape.key(), res);
        if let Some(found) = self.entries.read().get(&key) {
            return Arc::clone(found);
        }
        let rendered = Arc::new(rasterize_custom(shape, res));
        Arc::clone(self.entries.write().entry(key).or_insert(rendered))
    }

    /// Samples a custom shape by nearest-neighbour lookup.
    fn contains(&self, shape: &CustomShape, x: f32, y: f32, size: f32) -> bool {
        if x < 0.0 || y < 0.0 || x >= size || y >= size {
            return false;
        }
        let res = ShapeCache::resolution(size);
        let buffer = self.buffer(shape, res);
        let scale = res as f32 / size;
        let ix = ((x * scale) as u32).min(res - 1);
        let iy = ((y * scale) as u32).min(res - 1);
        buffer[(iy * res + ix) as usize]
    }

    /// Converts the rasterized buffer into horizontal runs of rectangles.
    fn path(&self, shape: &CustomShape, size: f32) -> Path {
        let res = ShapeCache::resolution(size);
        let buffer = self.buffer(shape, res);
        let cell = size / res as f32;
        let mut runs = Vec::new();
        for row in 0..res {
            let line = &buffer[(row * res) as usize..((row + 1) * res) as usize];
            let mut col = 0usize;
            while col < line.len() {
                if !line[col] {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < line.len() && line[col] {
                    col += 1;
                }
                runs.push(Path::rect(start as f32 * cell, row as f32 * cell, (col - start) as f32 * cell, cell));
            }
        }
        Path::union(runs)
    }
}

fn rasterize_custom(shape: &CustomShape, res: u32) -> Vec<bool> {
    match Pixmap::new(res, res) {
        Some(mut pixmap) => {
            (shape.draw)(&mut pixmap);
            pixmap.pixels().iter().map(|p| p.alpha() > 127).collect()
        }
        None => vec![false; (res * res) as usize],
    }
}

/// Rounded corners with independent per-corner switches.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RoundCorners {
    /// Corner radius as a fraction of the element size, in `[0, 0.5]`.
    pub corner: f32,
    /// Square off a corner when a same-type neighbour touches either of its edges.
    pub use_neighbors: bool,
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl RoundCorners {
    /// All four corners rounded, neighbour-aware.
    pub fn new(corner: f32) -> Self {
        RoundCorners {
            corner,
            use_neighbors: true,
            top_left: true,
            top_right: true,
            bottom_left: true,
            bottom_right: true,
        }
    }

    pub fn use_neighbors(self, use_neighbors: bool) -> Self {
        RoundCorners { use_neighbors, ..self }
    }

    /// Selects which corners may be rounded.
    pub fn corners(self, top_left: bool, top_right: bool, bottom_left: bool, bottom_right: bool) -> Self {
        RoundCorners { top_left, top_right, bottom_left, bottom_right, ..self }
    }

    fn all_corners(&self) -> bool {
        self.top_left && self.top_right && self.bottom_left && self.bottom_right
    }

    /// Radii in path order: top-left, top-right, bottom-right, bottom-left.
    pub fn radii(&self, size: f32, n: &Neighbors) -> [f32; 4] {
        let r = self.corner.clamp(0.0, 0.5) * size;
        let round = |enabled: bool, a: bool, b: bool| {
            if enabled && !(self.use_neighbors && (a || b)) {
                r
            } else {
                0.0
            }
        };
        [
            round(self.top_left, n.top, n.left),
            round(self.top_right, n.top, n.right),
            round(self.bottom_right, n.bottom, n.right),
            round(self.bottom_left, n.bottom, n.left),
        ]
    }

    /// Shape this modifier reduces to for the given neighbours, if any.
    fn fallback(&self, n: &Neighbors) -> Option<PixelShape> {
        if self.use_neighbors && n.has_all_nearest() {
            Some(PixelShape::Default)
        } else if self.corner >= 0.5 && self.all_corners() && !(self.use_neighbors && n.has_any()) {
            Some(PixelShape::Circle(1.0))
        } else {
            None
        }
    }

    fn validate(&self) -> Result<()> {
        check_range("corner", self.corner, 0.0, 0.5)
    }
}

/// Shape of a single module. Also used for the logo, highlighting and background.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum PixelShape {
    /// The full square.
    #[default]
    Default,
    /// Centred disk; the parameter is the diameter fraction in `[0.5, 1]`.
    Circle(f32),
    /// Square rotated by 45 degrees, inscribed in the element. Pixels are tested
    /// at their centres.
    Rhombus,
    RoundCorners(RoundCorners),
    /// Square with a quarter disk cut from each corner.
    Star,
    Custom(CustomShape),
}

impl PixelShape {
    /// Tests the pixel at integer coordinates `(i, j)` of a `size x size` element.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::matrix::Neighbors;
    /// use qrstyle::shapes::{PixelShape, ShapeCache};
    ///
    /// let cache = ShapeCache::new();
    /// let n = Neighbors::default();
    /// assert!(PixelShape::Circle(1.0).is_on(5, 5, 10, &n, &cache));
    /// assert!(!PixelShape::Circle(1.0).is_on(0, 0, 10, &n, &cache));
    /// ```
    pub fn is_on(&self, i: u32, j: u32, size: u32, n: &Neighbors, cache: &ShapeCache) -> bool {
        self.contains(i as f32 + 0.5, j as f32 + 0.5, size as f32, n, cache)
    }

    /// Tests the point `(x, y)` of a `size x size` element.
    pub fn contains(&self, x: f32, y: f32, size: f32, n: &Neighbors, cache: &ShapeCache) -> bool {
        if x < 0.0 || y < 0.0 || x >= size || y >= size {
            return false;
        }
        let c = size / 2.0;
        match self {
            PixelShape::Default => true,
            PixelShape::Circle(fraction) => {
                let (dx, dy) = (x - c, y - c);
                (dx * dx + dy * dy).sqrt() < c * fraction
            }
            PixelShape::Rhombus => !(x + y <= c || (x - y).abs() >= c || x + y >= 3.0 * c),
            PixelShape::RoundCorners(rc) => match rc.fallback(n) {
                Some(shape) => shape.contains(x, y, size, n, cache),
                None => round_rect_contains(x, y, size, size, &rc.radii(size, n)),
            },
            PixelShape::Star => {
                let mx = x.min(size - x);
                let my = y.min(size - y);
                mx * mx + my * my > c * c
            }
            PixelShape::Custom(shape) => cache.contains(shape, x, y, size),
        }
    }

    /// The same region as a path in element-local coordinates.
    pub fn path(&self, size: f32, n: &Neighbors, cache: &ShapeCache) -> Path {
        let c = size / 2.0;
        match self {
            PixelShape::Default => Path::rect(0.0, 0.0, size, size),
            PixelShape::Circle(fraction) => Path::circle(c, c, c * fraction),
            PixelShape::Rhombus => Path::Polygon(vec![(c, 0.0), (size, c), (c, size), (0.0, c)]),
            PixelShape::RoundCorners(rc) => match rc.fallback(n) {
                Some(shape) => shape.path(size, n, cache),
                None => Path::round_rect(0.0, 0.0, size, size, rc.radii(size, n)),
            },
            PixelShape::Star => star_path(size),
            PixelShape::Custom(shape) => cache.path(shape, size),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            PixelShape::Circle(fraction) => check_range("circle size", *fraction, 0.5, 1.0),
            PixelShape::RoundCorners(rc) => rc.validate(),
            _ => Ok(()),
        }
    }
}

/// Outline of the region outside four corner quarter-disks of radius `size / 2`.
fn star_path(size: f32) -> Path {
    let r = size / 2.0;
    // (arc centre, start angle, end angle), walking clockwise from the top midpoint.
    let arcs = [
        ((size, 0.0), PI, PI / 2.0),
        ((size, size), 3.0 * PI / 2.0, PI),
        ((0.0, size), 0.0, -PI / 2.0),
        ((0.0, 0.0), PI / 2.0, 0.0),
    ];
    let mut points = Vec::with_capacity(arcs.len() * STAR_ARC_SEGMENTS);
    for ((cx, cy), start, end) in arcs {
        for k in 0..STAR_ARC_SEGMENTS {
            let a = start + (end - start) * k as f32 / STAR_ARC_SEGMENTS as f32;
            points.push((cx + r * a.cos(), cy + r * a.sin()));
        }
    }
    Path::Polygon(points)
}

/// Splits a point of a `cells x cells` grid element into `(col, row, local x, local y, cell size)`.
fn grid_cell(x: f32, y: f32, size: f32, cells: usize) -> (usize, usize, f32, f32, f32) {
    let cell = size / cells as f32;
    let col = ((x / cell) as usize).min(cells - 1);
    let row = ((y / cell) as usize).min(cells - 1);
    (col, row, x - col as f32 * cell, y - row as f32 * cell, cell)
}

/// Shape of an eye's inner 3x3 ball.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum BallShape {
    #[default]
    Default,
    Circle(f32),
    Rhombus,
    RoundCorners(RoundCorners),
    /// The ball drawn as a 3x3 tile of the given pixel shape.
    AsPixelShape(PixelShape),
    Custom(CustomShape),
}

const BALL_CELLS: usize = 3;

impl BallShape {
    fn as_pixel(&self) -> Option<PixelShape> {
        match self {
            BallShape::Default => Some(PixelShape::Default),
            BallShape::Circle(f) => Some(PixelShape::Circle(*f)),
            BallShape::Rhombus => Some(PixelShape::Rhombus),
            BallShape::RoundCorners(rc) => Some(PixelShape::RoundCorners(*rc)),
            BallShape::Custom(c) => Some(PixelShape::Custom(c.clone())),
            BallShape::AsPixelShape(_) => None,
        }
    }

    pub fn contains(&self, x: f32, y: f32, size: f32, cache: &ShapeCache) -> bool {
        if x < 0.0 || y < 0.0 || x >= size || y >= size {
            return false;
        }
        match self {
            BallShape::AsPixelShape(shape) => {
                let (col, row, lx, ly, cell) = grid_cell(x, y, size, BALL_CELLS);
                let n = ball_neighbors(col, row);
                shape.contains(lx, ly, cell, &n, cache)
            }
            other => other
                .as_pixel()
                .map_or(false, |p| p.contains(x, y, size, &Neighbors::default(), cache)),
        }
    }

    pub fn path(&self, size: f32, cache: &ShapeCache) -> Path {
        match self {
            BallShape::AsPixelShape(shape) => {
                let cell = size / BALL_CELLS as f32;
                let mut parts = Vec::with_capacity(BALL_CELLS * BALL_CELLS);
                for row in 0..BALL_CELLS {
                    for col in 0..BALL_CELLS {
                        let n = ball_neighbors(col, row);
                        parts.push(shape.path(cell, &n, cache).translated(col as f32 * cell, row as f32 * cell));
                    }
                }
                Path::union(parts)
            }
            other => other
                .as_pixel()
                .map_or(Path::Empty, |p| p.path(size, &Neighbors::default(), cache)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            BallShape::AsPixelShape(shape) => shape.validate(),
            other => other.as_pixel().map_or(Ok(()), |p| p.validate()),
        }
    }
}

fn ball_neighbors(col: usize, row: usize) -> Neighbors {
    let range = 0..BALL_CELLS as isize;
    Neighbors::from_fn(|dr, dc| range.contains(&(row as isize + dr)) && range.contains(&(col as isize + dc)))
}

/// Shape of an eye's outer 7x7 frame. The ring is one module wide.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum FrameShape {
    /// Square ring.
    #[default]
    Default,
    /// Circular ring.
    Circle,
    /// Square ring with rounded corners; inner corners follow the outer ones.
    RoundCorners(RoundCorners),
    /// The ring drawn as tiles of the given pixel shape.
    AsPixelShape(PixelShape),
    Custom(CustomShape),
}

const FRAME_CELLS: usize = 7;

impl FrameShape {
    pub fn contains(&self, x: f32, y: f32, size: f32, cache: &ShapeCache) -> bool {
        if x < 0.0 || y < 0.0 || x >= size || y >= size {
            return false;
        }
        let m = size / FRAME_CELLS as f32;
        match self {
            FrameShape::Default => x < m || y < m || x >= size - m || y >= size - m,
            FrameShape::Circle => {
                let c = size / 2.0;
                let d = ((x - c) * (x - c) + (y - c) * (y - c)).sqrt();
                d < c && d >= c - m
            }
            FrameShape::RoundCorners(rc) => {
                let (outer, inner) = frame_radii(rc, size, m);
                round_rect_contains(x, y, size, size, &outer)
                    && !round_rect_contains(x - m, y - m, size - 2.0 * m, size - 2.0 * m, &inner)
            }
            FrameShape::AsPixelShape(shape) => {
                let (col, row, lx, ly, cell) = grid_cell(x, y, size, FRAME_CELLS);
                on_ring(col as isize, row as isize) && shape.contains(lx, ly, cell, &ring_neighbors(col, row), cache)
            }
            FrameShape::Custom(shape) => cache.contains(shape, x, y, size),
        }
    }

    pub fn path(&self, size: f32, cache: &ShapeCache) -> Path {
        let m = size / FRAME_CELLS as f32;
        match self {
            FrameShape::Default => {
                Path::rect(0.0, 0.0, size, size).difference(Path::rect(m, m, size - 2.0 * m, size - 2.0 * m))
            }
            FrameShape::Circle => {
                let c = size / 2.0;
                Path::circle(c, c, c).difference(Path::circle(c, c, c - m))
            }
            FrameShape::RoundCorners(rc) => {
                let (outer, inner) = frame_radii(rc, size, m);
                Path::round_rect(0.0, 0.0, size, size, outer)
                    .difference(Path::round_rect(m, m, size - 2.0 * m, size - 2.0 * m, inner))
            }
            FrameShape::AsPixelShape(shape) => {
                let mut parts = Vec::new();
                for row in 0..FRAME_CELLS {
                    for col in 0..FRAME_CELLS {
                        if on_ring(col as isize, row as isize) {
                            let n = ring_neighbors(col, row);
                            parts.push(shape.path(m, &n, cache).translated(col as f32 * m, row as f32 * m));
                        }
                    }
                }
                Path::union(parts)
            }
            FrameShape::Custom(shape) => cache.path(shape, size),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FrameShape::RoundCorners(rc) => rc.validate(),
            FrameShape::AsPixelShape(shape) => shape.validate(),
            _ => Ok(()),
        }
    }
}

fn frame_radii(rc: &RoundCorners, size: f32, m: f32) -> ([f32; 4], [f32; 4]) {
    let outer = rc.radii(size, &Neighbors::default());
    (outer, outer.map(|r| (r - m).max(0.0)))
}

fn on_ring(col: isize, row: isize) -> bool {
    let last = FRAME_CELLS as isize - 1;
    let inside = (0..=last).contains(&col) && (0..=last).contains(&row);
    inside && (col == 0 || row == 0 || col == last || row == last)
}

fn ring_neighbors(col: usize, row: usize) -> Neighbors {
    Neighbors::from_fn(|dr, dc| on_ring(col as isize + dc, row as isize + dr))
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(QrError::config(format!("{} must be in [{}, {}], got {}", name, min, max, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(shape: &PixelShape, size: u32, n: &Neighbors) -> Vec<bool> {
        let cache = ShapeCache::new();
        (0..size)
            .flat_map(|j| (0..size).map(move |i| (i, j)))
            .map(|(i, j)| shape.is_on(i, j, size, n, &cache))
            .collect()
    }

    #[test]
    fn test_default_covers_boundaries() {
        let cache = ShapeCache::new();
        let n = Neighbors::default();
        for &(i, j) in &[(0, 0), (9, 0), (0, 9), (9, 9)] {
            assert!(PixelShape::Default.is_on(i, j, 10, &n, &cache));
        }
    }

    #[test]
    fn test_isolated_round_corners_is_circle() {
        let n = Neighbors::default();
        for size in [7, 10, 16] {
            let rounded = field(&PixelShape::RoundCorners(RoundCorners::new(0.5)), size, &n);
            let circle = field(&PixelShape::Circle(1.0), size, &n);
            assert_eq!(rounded, circle);
        }
    }

    #[test]
    fn test_round_corners_square_off_next_to_neighbors() {
        let cache = ShapeCache::new();
        let shape = PixelShape::RoundCorners(RoundCorners::new(0.5));
        let n = Neighbors { right: true, ..Neighbors::default() };
        // Right-hand corners are squared, left-hand corners stay round.
        assert!(shape.is_on(9, 0, 10, &n, &cache));
        assert!(!shape.is_on(0, 0, 10, &n, &cache));
        let surrounded = Neighbors { top: true, bottom: true, left: true, right: true, ..Neighbors::default() };
        assert!(shape.is_on(0, 0, 10, &surrounded, &cache));
    }

    #[test]
    fn test_rhombus_and_star() {
        let cache = ShapeCache::new();
        let n = Neighbors::default();
        assert!(PixelShape::Rhombus.is_on(5, 5, 10, &n, &cache));
        assert!(!PixelShape::Rhombus.is_on(0, 0, 10, &n, &cache));
        assert!(PixelShape::Star.is_on(5, 5, 10, &n, &cache));
        assert!(!PixelShape::Star.is_on(0, 0, 10, &n, &cache));
        assert!(!PixelShape::Star.is_on(5, 0, 10, &n, &cache));
    }

    #[test]
    fn test_rhombus_samples_pixel_centres() {
        let cache = ShapeCache::new();
        let n = Neighbors::default();
        // (1, 4) sits on the diagonal by its corner but its centre is inside.
        assert!(PixelShape::Rhombus.is_on(1, 4, 10, &n, &cache));
        assert!(!PixelShape::Rhombus.is_on(0, 4, 10, &n, &cache));
        assert!(PixelShape::Rhombus.is_on(8, 5, 10, &n, &cache));
        assert!(!PixelShape::Rhombus.is_on(9, 5, 10, &n, &cache));

        let on = field(&PixelShape::Rhombus, 10, &n);
        for j in 0..10 {
            for i in 0..10 {
                let at = |i: usize, j: usize| on[j * 10 + i];
                assert_eq!(at(i, j), at(9 - i, j), "mirror x at {},{}", i, j);
                assert_eq!(at(i, j), at(i, 9 - j), "mirror y at {},{}", i, j);
                assert_eq!(at(i, j), at(j, i), "transpose at {},{}", i, j);
            }
        }
    }

    #[test]
    fn test_raster_matches_vector() {
        let cache = ShapeCache::new();
        let n = Neighbors { left: true, ..Neighbors::default() };
        let shapes = [
            PixelShape::Default,
            PixelShape::Circle(0.8),
            PixelShape::Rhombus,
            PixelShape::RoundCorners(RoundCorners::new(0.3)),
        ];
        for shape in &shapes {
            let path = shape.path(21.0, &n, &cache);
            for j in 0..21 {
                for i in 0..21 {
                    let (x, y) = (i as f32 + 0.5, j as f32 + 0.5);
                    assert_eq!(shape.contains(x, y, 21.0, &n, &cache), path.contains(x, y), "{:?} at {},{}", shape, i, j);
                }
            }
        }
        for frame in [FrameShape::Default, FrameShape::Circle, FrameShape::RoundCorners(RoundCorners::new(0.4))] {
            let path = frame.path(35.0, &cache);
            for j in 0..35 {
                for i in 0..35 {
                    let (x, y) = (i as f32 + 0.5, j as f32 + 0.5);
                    assert_eq!(frame.contains(x, y, 35.0, &cache), path.contains(x, y));
                }
            }
        }
    }

    #[test]
    fn test_frame_ring_is_one_module_wide() {
        let cache = ShapeCache::new();
        let frame = FrameShape::Default;
        assert!(frame.contains(0.5, 17.5, 35.0, &cache));
        assert!(frame.contains(4.5, 17.5, 35.0, &cache));
        assert!(!frame.contains(5.5, 17.5, 35.0, &cache));
        assert!(!frame.contains(17.5, 17.5, 35.0, &cache));
    }

    #[test]
    fn test_as_pixel_shape_tiles_delegate() {
        let cache = ShapeCache::new();
        let ball = BallShape::AsPixelShape(PixelShape::Circle(0.5));
        // Centre of each 10px tile is on, tile corners are off.
        assert!(ball.contains(15.0, 15.0, 30.0, &cache));
        assert!(!ball.contains(10.5, 10.5, 30.0, &cache));
        let frame = FrameShape::AsPixelShape(PixelShape::Default);
        assert!(frame.contains(5.0, 5.0, 70.0, &cache));
        assert!(!frame.contains(35.0, 35.0, 70.0, &cache));
    }

    #[test]
    fn test_custom_shape_is_cached() {
        let cache = ShapeCache::new();
        let shape = PixelShape::Custom(CustomShape::new(|pixmap: &mut Pixmap| {
            let w = pixmap.width() as f32;
            let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, w / 2.0, w).unwrap();
            let mut paint = tiny_skia::Paint::default();
            paint.set_color_rgba8(0, 0, 0, 255);
            pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
        }));
        let n = Neighbors::default();
        assert!(shape.is_on(1, 5, 10, &n, &cache));
        assert!(!shape.is_on(8, 5, 10, &n, &cache));
        assert_eq!(cache.len(), 1);
        let path = shape.path(10.0, &n, &cache);
        assert!(path.contains(2.0, 2.0));
        assert!(!path.contains(7.0, 2.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_validation_ranges() {
        assert!(PixelShape::Circle(0.4).validate().is_err());
        assert!(PixelShape::Circle(0.75).validate().is_ok());
        assert!(BallShape::RoundCorners(RoundCorners::new(0.7)).validate().is_err());
    }
}
