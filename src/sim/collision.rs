//! Collision detection and response for circular bodies
//!
//! Two kinds of contact: a body against the axis-aligned arena walls, and a
//! body against another body. Body-body contact uses an impulse response with
//! inverse mass 1/radius (bigger pieces are heavier, but not by area).

use glam::Vec2;

use super::body::Body;
use crate::consts::*;

/// Result of a body-body overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// Whether the circles overlap
    pub collided: bool,
    /// Unit vector from the first body toward the second
    pub normal: Vec2,
    /// Sum of radii minus center distance
    pub depth: f32,
}

impl CollisionInfo {
    pub fn miss() -> Self {
        Self {
            collided: false,
            normal: Vec2::ZERO,
            depth: 0.0,
        }
    }
}

/// Cheap overlap test
pub fn check_collision(a: &Body, b: &Body) -> bool {
    a.pos.distance(b.pos) < a.radius + b.radius
}

/// Full overlap test with normal and penetration depth
///
/// Coincident centers fall back to +X so the response is still well defined.
pub fn collision_info(a: &Body, b: &Body) -> CollisionInfo {
    let delta = b.pos - a.pos;
    let distance = delta.length();
    let min_distance = a.radius + b.radius;

    if distance >= min_distance {
        return CollisionInfo::miss();
    }

    let normal = if distance > 0.0 { delta / distance } else { Vec2::X };
    CollisionInfo {
        collided: true,
        normal,
        depth: min_distance - distance,
    }
}

/// Apply impulse and positional correction to an overlapping pair
///
/// Does nothing when the pair is already separating along the normal. A pair
/// at rest (zero closing speed) gets no impulse but is still pushed apart.
pub fn resolve_collision(a: &mut Body, b: &mut Body, info: &CollisionInfo) {
    if !info.collided {
        return;
    }

    let relative_vel = b.vel - a.vel;
    let vel_along_normal = relative_vel.dot(info.normal);
    if vel_along_normal > 0.0 {
        return;
    }

    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;

    let impulse = info.normal * (-(1.0 + RESTITUTION) * vel_along_normal / inv_sum);
    a.vel -= impulse * inv_a;
    b.vel += impulse * inv_b;

    let correction =
        info.normal * ((info.depth - PENETRATION_SLOP).max(0.0) / inv_sum * CORRECTION_PERCENT);
    a.pos -= correction * inv_a;
    b.pos += correction * inv_b;
}

/// Which walls a body touched this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub side: bool,
    pub ceiling: bool,
    pub floor: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.side || self.ceiling || self.floor
    }
}

/// Keep a body inside `[radius, arena - radius]` on both axes
///
/// On contact the normal velocity is reflected and scaled by the body's bounce
/// factor times `WALL_BOUNCE_BONUS`. Floor contact also bleeds horizontal
/// speed through the body's friction.
pub fn resolve_walls(body: &mut Body, arena: Vec2, dt: f32) -> WallContact {
    let mut contact = WallContact::default();
    let r = body.radius;
    let wall_bounce = body.bounce * WALL_BOUNCE_BONUS;
    let max_x = (arena.x - r).max(r);
    let max_y = (arena.y - r).max(r);

    if body.pos.x < r {
        body.pos.x = r;
        body.vel.x = body.vel.x.abs() * wall_bounce;
        contact.side = true;
    } else if body.pos.x > max_x {
        body.pos.x = max_x;
        body.vel.x = -body.vel.x.abs() * wall_bounce;
        contact.side = true;
    }

    if body.pos.y < r {
        body.pos.y = r;
        body.vel.y = body.vel.y.abs() * wall_bounce;
        contact.ceiling = true;
    } else if body.pos.y > max_y {
        body.pos.y = max_y;
        body.vel.y = -body.vel.y.abs() * wall_bounce;
        body.vel.x *= (1.0 - body.friction * dt).max(0.0);
        contact.floor = true;
    }

    contact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::test_body;

    #[test]
    fn test_collision_info_overlap() {
        let a = test_body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0), 30.0);
        let b = test_body(2, Vec2::new(140.0, 100.0), Vec2::new(-10.0, 0.0), 20.0);

        assert!(check_collision(&a, &b));
        let info = collision_info(&a, &b);
        assert!(info.collided);
        assert!((info.depth - 10.0).abs() < 1e-4);
        assert!((info.normal - Vec2::X).length() < 1e-6);
    }

    #[test]
    fn test_collision_info_miss() {
        let a = test_body(1, Vec2::new(100.0, 100.0), Vec2::ZERO, 30.0);
        let b = test_body(2, Vec2::new(150.0, 100.0), Vec2::ZERO, 20.0);

        // Touching exactly is not overlapping
        assert!(!check_collision(&a, &b));
        assert!(!collision_info(&a, &b).collided);
    }

    #[test]
    fn test_coincident_centers_use_default_normal() {
        let a = test_body(1, Vec2::splat(50.0), Vec2::ZERO, 10.0);
        let b = test_body(2, Vec2::splat(50.0), Vec2::ZERO, 10.0);

        let info = collision_info(&a, &b);
        assert!(info.collided);
        assert_eq!(info.normal, Vec2::X);
        assert!((info.depth - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_pushes_approaching_pair_apart() {
        let mut a = test_body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0), 30.0);
        let mut b = test_body(2, Vec2::new(140.0, 100.0), Vec2::new(-10.0, 0.0), 20.0);
        let info = collision_info(&a, &b);

        resolve_collision(&mut a, &mut b, &info);

        // Velocities now separate along the normal
        assert!((b.vel - a.vel).dot(info.normal) > 0.0);

        // One pass removes CORRECTION_PERCENT of the penetration beyond slop
        let separation = a.pos.distance(b.pos);
        let remaining = (1.0 - CORRECTION_PERCENT) * (info.depth - PENETRATION_SLOP) + PENETRATION_SLOP;
        assert!(separation > 40.0);
        assert!(separation >= 50.0 - remaining - 1e-3);

        // The lighter-radius body has the larger inverse mass, so it moves further
        let moved_a = (a.pos - Vec2::new(100.0, 100.0)).length();
        let moved_b = (b.pos - Vec2::new(140.0, 100.0)).length();
        assert!(moved_b > moved_a);
    }

    #[test]
    fn test_resolve_conserves_weighted_momentum() {
        // Mass is 1/inv_mass = radius, so radius-weighted velocity is conserved
        let mut a = test_body(1, Vec2::new(0.0, 0.0), Vec2::new(30.0, 5.0), 30.0);
        let mut b = test_body(2, Vec2::new(40.0, 0.0), Vec2::new(-20.0, 0.0), 20.0);
        let before = a.vel * a.radius + b.vel * b.radius;

        let info = collision_info(&a, &b);
        resolve_collision(&mut a, &mut b, &info);

        let after = a.vel * a.radius + b.vel * b.radius;
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn test_resolve_skips_separating_pair() {
        let mut a = test_body(1, Vec2::new(100.0, 100.0), Vec2::new(-10.0, 0.0), 30.0);
        let mut b = test_body(2, Vec2::new(140.0, 100.0), Vec2::new(10.0, 0.0), 20.0);
        let info = collision_info(&a, &b);
        let (a0, b0) = (a.clone(), b.clone());

        resolve_collision(&mut a, &mut b, &info);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_resting_overlap_is_still_corrected() {
        // Zero closing speed: no impulse, but the overlap is pushed out
        let mut a = test_body(1, Vec2::new(100.0, 100.0), Vec2::ZERO, 20.0);
        let mut b = test_body(2, Vec2::new(130.0, 100.0), Vec2::ZERO, 20.0);
        let info = collision_info(&a, &b);

        resolve_collision(&mut a, &mut b, &info);
        assert_eq!(a.vel, Vec2::ZERO);
        assert_eq!(b.vel, Vec2::ZERO);
        assert!(a.pos.distance(b.pos) > 30.0);
        assert!(a.pos.x < 100.0 && b.pos.x > 130.0);
    }

    #[test]
    fn test_floor_contact_reflects_and_applies_friction() {
        let arena = Vec2::new(800.0, 600.0);
        let mut body = test_body(1, Vec2::new(400.0, 590.0), Vec2::new(60.0, 100.0), 20.0);

        let contact = resolve_walls(&mut body, arena, SIM_DT);
        assert!(contact.floor && !contact.side && !contact.ceiling);
        assert_eq!(body.pos.y, 580.0);
        let expected_vy = -100.0 * BASE_BOUNCE * WALL_BOUNCE_BONUS;
        assert!((body.vel.y - expected_vy).abs() < 1e-4);
        let expected_vx = 60.0 * (1.0 - BASE_FRICTION * SIM_DT);
        assert!((body.vel.x - expected_vx).abs() < 1e-4);
    }

    #[test]
    fn test_side_and_ceiling_contact() {
        let arena = Vec2::new(800.0, 600.0);
        let mut body = test_body(1, Vec2::new(5.0, 5.0), Vec2::new(-50.0, -40.0), 20.0);

        let contact = resolve_walls(&mut body, arena, SIM_DT);
        assert!(contact.side && contact.ceiling && !contact.floor);
        assert_eq!(body.pos, Vec2::new(20.0, 20.0));
        assert!(body.vel.x > 0.0 && body.vel.y > 0.0);
        // Ceiling does not apply friction
        assert!((body.vel.x - 50.0 * BASE_BOUNCE * WALL_BOUNCE_BONUS).abs() < 1e-4);
    }
}
