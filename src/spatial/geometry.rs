use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left anchored)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Strict overlap on both axes; touching edges do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive point containment
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Dimensions of the floor plan
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: f64,
    pub height: f64,
}

impl WorldSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Avatar footprint width
pub const AVATAR_WIDTH: f64 = 36.0;
/// Avatar footprint height
pub const AVATAR_HEIGHT: f64 = 48.0;

/// Door of the meeting scene, in scene percent units
pub const MEETING_SCENE_DOOR: Rect = Rect::new(2.0, 42.0, 12.0, 22.0);

/// Clamp without panicking when `min > max` (`min` wins)
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Bounding box of an avatar whose feet stand at `(x, y)`
pub fn avatar_box(x: f64, y: f64) -> Rect {
    Rect::new(x - 18.0, y - 56.0, AVATAR_WIDTH, AVATAR_HEIGHT)
}

pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.intersects(b)
}

pub fn distance_sq(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

pub fn is_inside_meeting_door(pos: Point) -> bool {
    MEETING_SCENE_DOOR.contains(pos)
}

/// Keep a position inside the walkable part of the meeting scene
pub fn clamp_meeting_pos(pos: Point) -> Point {
    Point::new(clamp(pos.x, 6.0, 94.0), clamp(pos.y, 16.0, 90.0))
}
