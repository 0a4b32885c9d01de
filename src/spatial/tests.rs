use super::*;

const WORLD: WorldSize = WorldSize::new(960.0, 540.0);

fn zones() -> Vec<Zone> {
    vec![
        Zone::new("A", Rect::new(100.0, 100.0, 200.0, 150.0)),
        Zone::new("B", Rect::new(400.0, 100.0, 200.0, 150.0)),
    ]
}

#[test]
fn test_clamp() {
    assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    assert_eq!(clamp(-3.0, 0.0, 10.0), 0.0);
    assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    assert_eq!(clamp(0.0, 0.0, 10.0), 0.0);
    assert_eq!(clamp(10.0, 0.0, 10.0), 10.0);
}

#[test]
fn test_avatar_box_is_anchored_at_feet() {
    assert_eq!(avatar_box(100.0, 200.0), Rect::new(82.0, 144.0, 36.0, 48.0));
    assert_eq!(avatar_box(0.0, 0.0), Rect::new(-18.0, -56.0, 36.0, 48.0));
}

#[test]
fn test_intersects() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let overlapping = Rect::new(5.0, 5.0, 10.0, 10.0);
    let adjacent = Rect::new(10.0, 0.0, 10.0, 10.0);
    let far = Rect::new(100.0, 100.0, 10.0, 10.0);
    let inner = Rect::new(2.0, 2.0, 5.0, 5.0);

    assert!(intersects(&a, &overlapping));
    assert!(intersects(&overlapping, &a));
    assert!(!intersects(&a, &adjacent));
    assert!(!intersects(&a, &far));
    assert!(intersects(&a, &inner));
}

#[test]
fn test_distance_sq() {
    assert_eq!(distance_sq(Point::new(5.0, 5.0), Point::new(5.0, 5.0)), 0.0);
    assert_eq!(distance_sq(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 25.0);
}

#[test]
fn test_collides_in_open_space() {
    assert!(!collides_at(480.0, 300.0, &[], WORLD));
}

#[test]
fn test_collides_at_world_edges() {
    // box.x < 6 <=> x < 24
    assert!(collides_at(20.0, 300.0, &[], WORLD));
    // box.y < 6 <=> y < 62
    assert!(collides_at(480.0, 60.0, &[], WORLD));
    // box right > 954 <=> x > 936
    assert!(collides_at(940.0, 300.0, &[], WORLD));
    // box bottom > 534 <=> y > 542
    assert!(collides_at(480.0, 545.0, &[], WORLD));
    assert!(!collides_at(480.0, 540.0, &[], WORLD));
}

#[test]
fn test_collides_with_obstacle() {
    let blocking = [Rect::new(470.0, 250.0, 40.0, 40.0)];
    let elsewhere = [Rect::new(100.0, 100.0, 20.0, 20.0)];
    assert!(collides_at(480.0, 300.0, &blocking, WORLD));
    assert!(!collides_at(480.0, 300.0, &elsewhere, WORLD));
}

#[test]
fn test_find_spot_returns_free_target() {
    assert_eq!(
        find_valid_spot_around(480.0, 300.0, &[], WORLD),
        Point::new(480.0, 300.0)
    );
}

#[test]
fn test_find_spot_clamps_into_world() {
    let spot = find_valid_spot_around(-100.0, -100.0, &[], WORLD);
    assert!(spot.x >= SAFE_INSET);
    assert!(spot.y >= SAFE_INSET);
    assert!(!collides_at(spot.x, spot.y, &[], WORLD));
}

#[test]
fn test_find_spot_moves_off_obstacle() {
    let colliders = [Rect::new(460.0, 242.0, 40.0, 52.0)];
    assert!(collides_at(480.0, 300.0, &colliders, WORLD));

    let spot = find_valid_spot_around(480.0, 300.0, &colliders, WORLD);
    assert_ne!(spot, Point::new(480.0, 300.0));
    assert!(!collides_at(spot.x, spot.y, &colliders, WORLD));
}

#[test]
fn test_find_spot_is_deterministic() {
    let colliders = [Rect::new(460.0, 242.0, 40.0, 52.0)];
    let first = find_valid_spot_around(480.0, 300.0, &colliders, WORLD);
    let second = find_valid_spot_around(480.0, 300.0, &colliders, WORLD);
    assert_eq!(first, second);
}

#[test]
fn test_find_spot_prefers_smallest_radius() {
    // Wall covering the avatar's right side; the first free samples sit
    // left of the wall on the r=32 ring.
    let colliders = [Rect::new(470.0, 200.0, 60.0, 120.0)];
    let spot = find_valid_spot_around(480.0, 300.0, &colliders, WORLD);
    let dist = distance_sq(spot, Point::new(480.0, 300.0)).sqrt();
    assert!(!collides_at(spot.x, spot.y, &colliders, WORLD));
    assert!(dist <= SEARCH_RADII[3] + 1e-9);
}

#[test]
fn test_find_spot_falls_back_when_fully_blocked() {
    let colliders = [Rect::new(0.0, 0.0, 960.0, 540.0)];
    assert_eq!(
        find_valid_spot_around(480.0, 300.0, &colliders, WORLD),
        Point::new(480.0, 300.0)
    );
    assert_eq!(
        find_valid_spot_around(5000.0, -5.0, &colliders, WORLD),
        Point::new(940.0, 20.0)
    );
}

#[test]
fn test_detect_zone_inside() {
    let zones = zones();
    assert_eq!(detect_zone_id_at(200.0, 175.0, &zones), Some("A"));
    assert_eq!(detect_zone_id_at(500.0, 175.0, &zones), Some("B"));
}

#[test]
fn test_detect_zone_respects_wall_inset() {
    let zones = zones();
    assert_eq!(detect_zone_id_at(105.0, 175.0, &zones), None);
    assert_eq!(detect_zone_id_at(108.0, 175.0, &zones), Some("A"));
    assert_eq!(detect_zone_id_at(292.0, 242.0, &zones), Some("A"));
    assert_eq!(detect_zone_id_at(293.0, 175.0, &zones), None);
}

#[test]
fn test_detect_zone_outside_and_between() {
    let zones = zones();
    assert_eq!(detect_zone_id_at(50.0, 50.0, &zones), None);
    assert_eq!(detect_zone_id_at(350.0, 175.0, &zones), None);
    assert_eq!(detect_zone_id_at(200.0, 175.0, &[]), None);
}

#[test]
fn test_detect_zone_overlap_uses_slice_order() {
    let outer = Zone::new("lobby", Rect::new(0.0, 0.0, 500.0, 500.0));
    let inner = Zone::new("booth", Rect::new(100.0, 100.0, 50.0, 50.0));

    let booth_first = vec![inner.clone(), outer.clone()];
    let lobby_first = vec![outer, inner];

    assert_eq!(detect_zone_id_at(125.0, 125.0, &booth_first), Some("booth"));
    assert_eq!(detect_zone_id_at(125.0, 125.0, &lobby_first), Some("lobby"));
}

#[test]
fn test_meeting_door() {
    let door = MEETING_SCENE_DOOR;
    let center = Point::new(door.x + door.w / 2.0, door.y + door.h / 2.0);
    assert!(is_inside_meeting_door(center));
    assert!(is_inside_meeting_door(Point::new(door.x, door.y)));
    assert!(!is_inside_meeting_door(Point::new(100.0, 100.0)));
    assert!(!is_inside_meeting_door(Point::new(5.0, door.y + door.h + 1.0)));
}

#[test]
fn test_clamp_meeting_pos() {
    assert_eq!(clamp_meeting_pos(Point::new(50.0, 50.0)), Point::new(50.0, 50.0));
    assert_eq!(clamp_meeting_pos(Point::new(0.0, 50.0)), Point::new(6.0, 50.0));
    assert_eq!(clamp_meeting_pos(Point::new(100.0, 50.0)), Point::new(94.0, 50.0));
    assert_eq!(clamp_meeting_pos(Point::new(50.0, 0.0)), Point::new(50.0, 16.0));
    assert_eq!(clamp_meeting_pos(Point::new(-10.0, 200.0)), Point::new(6.0, 90.0));
}
