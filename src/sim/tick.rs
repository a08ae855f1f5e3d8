//! Fixed timestep physics
//!
//! Wall-clock time is accumulated and drained in whole `SIM_DT` steps; the
//! fractional remainder carries into the next frame so the simulation does not
//! depend on frame rate. Cleaning progress is the exception and runs on real
//! elapsed time.

use glam::Vec2;

use super::body::{Body, BodyId, BodyStore};
use super::collision::{collision_info, resolve_collision, resolve_walls};
use crate::consts::*;

/// What happened during one `Physics::advance`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsReport {
    /// Fixed steps executed
    pub steps: u32,
    /// Bodies whose cleaning finished (already purged from the store)
    pub retired: Vec<BodyId>,
}

/// Accumulating fixed-step integrator over a rectangular arena
#[derive(Debug, Clone)]
pub struct Physics {
    arena: Vec2,
    accumulator: f32,
}

impl Physics {
    pub fn new(arena: Vec2) -> Self {
        Self {
            arena,
            accumulator: 0.0,
        }
    }

    pub fn arena(&self) -> Vec2 {
        self.arena
    }

    /// Resize the arena (window resized); bodies are pulled back in on the next step
    pub fn set_arena(&mut self, arena: Vec2) {
        self.arena = arena;
    }

    /// Unspent time carried to the next frame
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Advance the store by `elapsed` seconds of wall-clock time
    pub fn advance(&mut self, store: &mut BodyStore, ambient_accel: Vec2, elapsed: f32) -> PhysicsReport {
        let mut report = PhysicsReport::default();
        if elapsed <= 0.0 {
            return report;
        }

        self.accumulator += elapsed;
        while self.accumulator >= SIM_DT && report.steps < MAX_SUBSTEPS {
            step(store, ambient_accel, self.arena, SIM_DT);
            self.accumulator -= SIM_DT;
            report.steps += 1;
        }
        if self.accumulator >= SIM_DT {
            // Fell too far behind; drop the backlog but keep the fraction
            log::debug!("Physics backlog of {:.3}s dropped", self.accumulator);
            self.accumulator %= SIM_DT;
        }

        report.retired = store.advance_cleaning(elapsed);
        if !report.retired.is_empty() {
            store.purge_retired();
        }

        report
    }
}

/// Advance every simulated body by exactly one timestep
pub fn step(store: &mut BodyStore, ambient_accel: Vec2, arena: Vec2, dt: f32) {
    let bodies = store.bodies_mut();

    for body in bodies.iter_mut().filter(|b| b.is_simulated()) {
        integrate(body, ambient_accel, dt);
    }

    resolve_pairs(bodies);

    for body in bodies.iter_mut().filter(|b| b.is_simulated()) {
        resolve_walls(body, arena, dt);
    }
}

fn integrate(body: &mut Body, ambient_accel: Vec2, dt: f32) {
    body.vel.y += GRAVITY * dt;
    body.vel += ambient_accel * AMBIENT_INFLUENCE * dt;
    body.vel *= VELOCITY_DECAY;
    body.pos += body.vel * dt;
}

/// Resolve every unordered pair of simulated bodies, in storage order
fn resolve_pairs(bodies: &mut [Body]) {
    for j in 1..bodies.len() {
        let (head, tail) = bodies.split_at_mut(j);
        let b = &mut tail[0];
        if !b.is_simulated() {
            continue;
        }
        for a in head.iter_mut().filter(|a| a.is_simulated()) {
            let info = collision_info(a, b);
            if info.collided {
                resolve_collision(a, b, &info);
            }
        }
    }
}
