//! The typed module grid handed to both compositors, and its neighbour model.

/// Classification of one module.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PixelType {
    DarkPixel,
    LightPixel,
    /// Outside the code footprint (envelope margin).
    Background,
    /// Suppressed to make room for the logo.
    Logo,
    EyeBall,
    EyeFrame,
    /// Alignment pattern module kept as a plain square.
    VersionEye,
    /// Timing pattern module kept as a plain square.
    TimingLine,
}

/// One cell of the symbol grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Module {
    pub row: usize,
    pub col: usize,
    pub kind: PixelType,
    /// The encoder bit behind this module (`false` for envelope cells).
    pub dark: bool,
}

/// Adjacency of a module against modules of the same [`PixelType`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Neighbors {
    pub top_left: bool,
    pub top: bool,
    pub top_right: bool,
    pub left: bool,
    pub right: bool,
    pub bottom_left: bool,
    pub bottom: bool,
    pub bottom_right: bool,
}

/// The eight directions of [`Neighbors`], as `(row delta, col delta)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::TopLeft,
        Direction::Top,
        Direction::TopRight,
        Direction::Left,
        Direction::Right,
        Direction::BottomLeft,
        Direction::Bottom,
        Direction::BottomRight,
    ];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::TopLeft => (-1, -1),
            Direction::Top => (-1, 0),
            Direction::TopRight => (-1, 1),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::BottomLeft => (1, -1),
            Direction::Bottom => (1, 0),
            Direction::BottomRight => (1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::TopLeft => Direction::BottomRight,
            Direction::Top => Direction::Bottom,
            Direction::TopRight => Direction::BottomLeft,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::BottomLeft => Direction::TopRight,
            Direction::Bottom => Direction::Top,
            Direction::BottomRight => Direction::TopLeft,
        }
    }
}

impl Neighbors {
    /// All eight neighbours present.
    pub const ALL: Neighbors = Neighbors {
        top_left: true,
        top: true,
        top_right: true,
        left: true,
        right: true,
        bottom_left: true,
        bottom: true,
        bottom_right: true,
    };

    /// Builds neighbours from a predicate over `(row delta, col delta)`.
    pub fn from_fn(mut present: impl FnMut(isize, isize) -> bool) -> Neighbors {
        Neighbors {
            top_left: present(-1, -1),
            top: present(-1, 0),
            top_right: present(-1, 1),
            left: present(0, -1),
            right: present(0, 1),
            bottom_left: present(1, -1),
            bottom: present(1, 0),
            bottom_right: present(1, 1),
        }
    }

    pub fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::TopLeft => self.top_left,
            Direction::Top => self.top,
            Direction::TopRight => self.top_right,
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::BottomLeft => self.bottom_left,
            Direction::Bottom => self.bottom,
            Direction::BottomRight => self.bottom_right,
        }
    }

    pub fn has_any(&self) -> bool {
        Direction::ALL.iter().any(|&d| self.has(d))
    }

    /// `true` when all four edge neighbours (N, S, E, W) are present.
    pub fn has_all_nearest(&self) -> bool {
        self.top && self.bottom && self.left && self.right
    }
}

/// Square grid of typed modules.
///
/// Built once per render by [`crate::builder`], downgraded to [`PixelType::Logo`]
/// by logo masking, then only read.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StyledMatrix {
    size: usize,
    kinds: Vec<PixelType>,
    bits: Vec<bool>,
}

impl StyledMatrix {
    /// Creates a matrix of `size * size` background cells.
    pub fn new(size: usize) -> Self {
        StyledMatrix {
            size,
            kinds: vec![PixelType::Background; size * size],
            bits: vec![false; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the type at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: isize, col: isize) -> Option<PixelType> {
        self.index(row, col).map(|i| self.kinds[i])
    }

    /// Type at an in-bounds position.
    pub fn kind(&self, row: usize, col: usize) -> PixelType {
        self.kinds[row * self.size + col]
    }

    pub fn module(&self, row: usize, col: usize) -> Module {
        let i = row * self.size + col;
        Module { row, col, kind: self.kinds[i], dark: self.bits[i] }
    }

    /// Iterates over every module in row-major order.
    pub fn modules(&self) -> impl Iterator<Item = Module> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| self.module(row, col)))
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, kind: PixelType, dark: bool) {
        let i = row * self.size + col;
        self.kinds[i] = kind;
        self.bits[i] = dark;
    }

    pub(crate) fn set_kind(&mut self, row: usize, col: usize, kind: PixelType) {
        self.kinds[row * self.size + col] = kind;
    }

    /// Suppresses a data module for the logo. Only dark and light modules are
    /// affected; returns whether the module changed.
    pub(crate) fn mark_logo(&mut self, row: usize, col: usize) -> bool {
        let i = row * self.size + col;
        match self.kinds[i] {
            PixelType::DarkPixel | PixelType::LightPixel => {
                self.kinds[i] = PixelType::Logo;
                true
            }
            _ => false,
        }
    }

    /// Same-type adjacency of the module at `(row, col)`. Out-of-bounds cells are absent.
    pub fn neighbors(&self, row: usize, col: usize) -> Neighbors {
        let kind = self.kind(row, col);
        Neighbors::from_fn(|dr, dc| self.get(row as isize + dr, col as isize + dc) == Some(kind))
    }

    /// Number of modules of the given type.
    pub fn count(&self, kind: PixelType) -> usize {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }

    fn index(&self, row: isize, col: isize) -> Option<usize> {
        let range = 0..self.size as isize;
        if range.contains(&row) && range.contains(&col) {
            Some(row as usize * self.size + col as usize)
        } else {
            None
        }
    }
}
