//! Collision testing and free-position search on the 2D floor plan.
//!
//! The engine holds no obstacle set: colliders and zones are passed on every
//! call and owned by the caller. All searches are deterministic.

mod geometry;

pub use geometry::{
    avatar_box, clamp, clamp_meeting_pos, distance_sq, intersects, is_inside_meeting_door, Point,
    Rect, WorldSize, AVATAR_HEIGHT, AVATAR_WIDTH, MEETING_SCENE_DOOR,
};

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// How far the avatar box must stay away from the world edge
pub const WORLD_MARGIN: f64 = 6.0;

/// Minimum distance of a search position from the world edge
pub const SAFE_INSET: f64 = 20.0;

/// Inset a point must keep from every zone wall to count as inside
pub const ZONE_INSET: f64 = 8.0;

/// Spiral search radii, searched in this order
pub const SEARCH_RADII: [f64; 8] = [16.0, 24.0, 32.0, 40.0, 56.0, 72.0, 88.0, 104.0];

/// Angle between consecutive spiral samples (degrees)
pub const SEARCH_ANGLE_STEP_DEG: u32 = 18;

/// Named region of the floor plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub rect: Rect,
}

impl Zone {
    pub fn new(id: &str, rect: Rect) -> Self {
        Self {
            id: id.to_string(),
            rect,
        }
    }
}

/// True if an avatar standing at `(x, y)` leaves the world margin or
/// overlaps any obstacle.
pub fn collides_at(x: f64, y: f64, obstacles: &[Rect], world: WorldSize) -> bool {
    let bounds = avatar_box(x, y);
    if bounds.x < WORLD_MARGIN
        || bounds.y < WORLD_MARGIN
        || bounds.right() > world.width - WORLD_MARGIN
        || bounds.bottom() > world.height - WORLD_MARGIN
    {
        return true;
    }

    obstacles.iter().any(|obstacle| bounds.intersects(obstacle))
}

/// Find a free position near `(target_x, target_y)`.
///
/// The target is clamped into `[SAFE_INSET, dim - SAFE_INSET]`. If that point
/// is blocked, samples are taken radius by radius from [`SEARCH_RADII`], and
/// for each radius at angles `0°, 18°, …, 342°`. The first free sample wins.
/// When every sample is blocked the clamped target is returned as is, which
/// may still collide.
pub fn find_valid_spot_around(
    target_x: f64,
    target_y: f64,
    obstacles: &[Rect],
    world: WorldSize,
) -> Point {
    let max_x = SAFE_INSET.max(world.width - SAFE_INSET);
    let max_y = SAFE_INSET.max(world.height - SAFE_INSET);
    let base = Point::new(
        clamp(target_x, SAFE_INSET, max_x),
        clamp(target_y, SAFE_INSET, max_y),
    );

    if !collides_at(base.x, base.y, obstacles, world) {
        return base;
    }

    spiral_samples(base, max_x, max_y)
        .find(|p| !collides_at(p.x, p.y, obstacles, world))
        .unwrap_or(base)
}

/// Candidate positions in search order, each clamped into bounds
fn spiral_samples(base: Point, max_x: f64, max_y: f64) -> impl Iterator<Item = Point> {
    SEARCH_RADII.into_iter().flat_map(move |radius| {
        (0u32..360).step_by(SEARCH_ANGLE_STEP_DEG as usize).map(move |deg| {
            let rad = f64::from(deg).to_radians();
            Point::new(
                clamp(base.x + rad.cos() * radius, SAFE_INSET, max_x),
                clamp(base.y + rad.sin() * radius, SAFE_INSET, max_y),
            )
        })
    })
}

/// Id of the first zone (in slice order) containing `(x, y)` with at least
/// [`ZONE_INSET`] units to every wall.
///
/// Overlapping zones are resolved by slice order, so callers must pass zones
/// in a stable order (e.g. sorted by id, or by z-order).
pub fn detect_zone_id_at(x: f64, y: f64, zones: &[Zone]) -> Option<&str> {
    zones
        .iter()
        .find(|zone| {
            let r = &zone.rect;
            x >= r.x + ZONE_INSET
                && x <= r.right() - ZONE_INSET
                && y >= r.y + ZONE_INSET
                && y <= r.bottom() - ZONE_INSET
        })
        .map(|zone| zone.id.as_str())
}
