/// 2D vector used for positions, sizes and deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from(value: (f32, f32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle given by its top-left corner and extent.
///
/// Extents are half-open: `[x, x + width)` by `[y, y + height)`.
/// Negative sizes are kept as-is; such a box simply never overlaps anything
/// on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Strict overlap test. Boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.right() > other.position.x
            && self.position.x < other.right()
            && self.bottom() > other.position.y
            && self.position.y < other.bottom()
    }
}
