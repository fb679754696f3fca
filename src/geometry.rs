//! Geometry helpers shared by weapons, collision and the boss engine.
//!
//! Everything here is a plain function over `Vec2` so it can be exercised
//! without a world.  Entity counts are small (tens, occasionally low hundreds),
//! so nearest-neighbour queries are linear squared-distance scans.

use crate::enemy::{Enemy, EntityId};
use bevy::prelude::*;

/// Closest point to `p` on the segment `a`–`b`.
///
/// Degenerate segments (a == b) collapse to `a`.
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let ab_len_sq = ab.length_squared();
    if ab_len_sq <= 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Euclidean distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    closest_point_on_segment(a, b, p).distance(p)
}

/// Index of the active enemy nearest to `origin` within `max_range` of its
/// edge, or `None` when nothing qualifies.
///
/// Range is measured centre-to-centre minus the enemy radius, so large
/// enemies can be targeted as soon as their body enters range.
pub fn nearest_enemy(enemies: &[Enemy], origin: Vec2, max_range: f32) -> Option<usize> {
    nearest_enemy_excluding(enemies, origin, max_range, None)
}

/// As [`nearest_enemy`], skipping the enemy with id `exclude`.
pub fn nearest_enemy_excluding(
    enemies: &[Enemy],
    origin: Vec2,
    max_range: f32,
    exclude: Option<EntityId>,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, enemy) in enemies.iter().enumerate() {
        if !enemy.is_active() || Some(enemy.id) == exclude {
            continue;
        }
        let reach = max_range + enemy.radius;
        let d2 = enemy.position.distance_squared(origin);
        if d2 > reach * reach {
            continue;
        }
        match best {
            Some((_, best_d2)) if d2 >= best_d2 => {}
            _ => best = Some((idx, d2)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Index of the body segment nearest to `p` and the distance to it.
pub fn nearest_segment(segments: &[Vec2], p: Vec2) -> Option<(usize, f32)> {
    segments
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.distance_squared(p)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, d2)| (i, d2.sqrt()))
}

/// `count` angles spread evenly across `spread` radians, centred on `base`.
///
/// A single projectile flies straight along `base`.  A full-circle spread
/// (≥ TAU) distributes the projectiles without doubling up the first and last.
pub fn spread_angles(base: f32, count: u32, spread: f32) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![base],
        n => {
            let full_circle = spread >= std::f32::consts::TAU - 1e-4;
            let divisions = if full_circle { n } else { n - 1 } as f32;
            let step = spread / divisions;
            let start = if full_circle { base } else { base - spread / 2.0 };
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}

/// Rotate `current` toward `desired` by at most `max_turn` radians, keeping
/// its length.  Used to steer homing projectiles.
pub fn steer_toward(current: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let speed = current.length();
    if speed <= 1e-6 || desired.length_squared() <= 1e-12 {
        return current;
    }
    let from = current.to_angle();
    let to = desired.to_angle();
    let diff = (to - from + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
        - std::f32::consts::PI;
    let turned = from + diff.clamp(-max_turn, max_turn);
    Vec2::from_angle(turned) * speed
}

/// True when the axis-aligned rectangle centred on `center` with `half`
/// extents comes within `radius` of the segment `a`–`b`.
///
/// A segment and a rectangle that do not intersect are closest at a segment
/// endpoint or at a rectangle corner, so those six distances are exact.
pub fn rect_touches_segment(center: Vec2, half: Vec2, a: Vec2, b: Vec2, radius: f32) -> bool {
    let (min, max) = (center - half, center + half);
    if segment_crosses_rect(min, max, a, b) {
        return true;
    }
    let r2 = radius * radius;
    let endpoint_near = [a, b]
        .iter()
        .any(|p| p.clamp(min, max).distance_squared(*p) <= r2);
    let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
    endpoint_near
        || corners
            .iter()
            .any(|c| closest_point_on_segment(a, b, *c).distance_squared(*c) <= r2)
}

/// Slab test: does any point of `a`–`b` lie inside the box `min`..`max`?
fn segment_crosses_rect(min: Vec2, max: Vec2, a: Vec2, b: Vec2) -> bool {
    let dir = b - a;
    let (mut enter, mut exit) = (0.0_f32, 1.0_f32);
    for axis in 0..2 {
        if dir[axis].abs() <= 1e-8 {
            if a[axis] < min[axis] || a[axis] > max[axis] {
                return false;
            }
            continue;
        }
        let t_lo = (min[axis] - a[axis]) / dir[axis];
        let t_hi = (max[axis] - a[axis]) / dir[axis];
        enter = enter.max(t_lo.min(t_hi));
        exit = exit.min(t_lo.max(t_hi));
        if enter > exit {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::EnemyKind;

    fn enemy_at(id: EntityId, pos: Vec2) -> Enemy {
        let mut e = Enemy::new(id, EnemyKind::Hunter, pos, 10.0, 0.4, 1.0);
        e.activate();
        e
    }

    #[test]
    fn distance_to_segment_handles_interior_and_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!((distance_to_segment(Vec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-5);
        assert!((distance_to_segment(Vec2::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-5);
        assert!((distance_to_segment(Vec2::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_segment_measures_to_point() {
        let a = Vec2::new(2.0, 2.0);
        assert!((distance_to_segment(Vec2::new(5.0, 6.0), a, a) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn nearest_enemy_skips_inactive_and_out_of_range() {
        let mut removed = enemy_at(1, Vec2::new(1.0, 0.0));
        removed.mark_removed();
        let enemies = vec![
            removed,
            enemy_at(2, Vec2::new(3.0, 0.0)),
            enemy_at(3, Vec2::new(2.0, 0.0)),
            enemy_at(4, Vec2::new(50.0, 0.0)),
        ];
        assert_eq!(nearest_enemy(&enemies, Vec2::ZERO, 5.0), Some(2));
        assert_eq!(
            nearest_enemy_excluding(&enemies, Vec2::ZERO, 5.0, Some(3)),
            Some(1)
        );
        assert_eq!(nearest_enemy(&enemies, Vec2::new(100.0, 100.0), 5.0), None);
    }

    #[test]
    fn spread_angles_are_centred_on_base() {
        let angles = spread_angles(1.0, 3, 0.5);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] - 0.75).abs() < 1e-6);
        assert!((angles[1] - 1.0).abs() < 1e-6);
        assert!((angles[2] - 1.25).abs() < 1e-6);
        assert_eq!(spread_angles(0.3, 1, 2.0), vec![0.3]);
    }

    #[test]
    fn full_circle_spread_does_not_duplicate_first_angle() {
        let angles = spread_angles(0.0, 4, std::f32::consts::TAU);
        let last = angles[3];
        assert!((last - 3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn steer_toward_respects_turn_limit() {
        let v = Vec2::new(10.0, 0.0);
        let steered = steer_toward(v, Vec2::new(0.0, 1.0), 0.1);
        assert!((steered.length() - 10.0).abs() < 1e-4);
        assert!((steered.to_angle() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn rect_segment_overlap() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(0.0, 1.0);
        assert!(rect_touches_segment(Vec2::new(1.0, 0.5), Vec2::splat(0.6), a, b, 0.5));
        assert!(rect_touches_segment(Vec2::new(0.5, 0.5), Vec2::splat(0.6), a, b, 0.0));
        assert!(!rect_touches_segment(Vec2::new(3.0, 0.5), Vec2::splat(0.6), a, b, 0.1));
    }

    #[test]
    fn wide_rect_near_diagonal_segment_touches() {
        // The segment end nearest the rectangle centre is 0.8 away, but the
        // rectangle's left corner sits about 0.21 from the segment.
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 1.0);
        let half = Vec2::new(2.5, 0.2);
        assert!(rect_touches_segment(Vec2::new(3.0, 0.0), half, a, b, 0.5));
        assert!(!rect_touches_segment(Vec2::new(3.0, 0.0), half, a, b, 0.1));
    }

    #[test]
    fn segment_passing_through_rect_touches_at_zero_radius() {
        let a = Vec2::new(-5.0, 0.0);
        let b = Vec2::new(5.0, 0.0);
        assert!(rect_touches_segment(Vec2::ZERO, Vec2::splat(1.0), a, b, 0.0));
        let diagonal_miss = rect_touches_segment(
            Vec2::ZERO,
            Vec2::splat(1.0),
            Vec2::new(1.5, -3.0),
            Vec2::new(5.0, 0.5),
            0.0,
        );
        assert!(!diagonal_miss);
    }
}
