//! Ambient acceleration fed into the physics
//!
//! Dragging the window around should slosh the trash: successive window
//! positions are differentiated twice and the bodies feel the opposite of the
//! window's acceleration. Interruptions add a short random shake on top.

use glam::Vec2;
use rand::Rng;

/// Cap on the inertial acceleration from window motion (pixels/s²)
const MAX_WINDOW_ACCEL: f32 = 4000.0;
/// Shake acceleration per unit of intensity (pixels/s²)
const SHAKE_ACCEL_SCALE: f32 = 120.0;
/// Per-sample shake decay
const SHAKE_DECAY: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shake {
    intensity: f32,
    remaining: f32,
}

/// Samples window motion and shake into one acceleration per frame
#[derive(Debug, Clone, Default)]
pub struct AmbientMotion {
    last_pos: Option<Vec2>,
    last_vel: Vec2,
    shake: Option<Shake>,
}

impl AmbientMotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or strengthen) a shake lasting `duration` seconds
    pub fn trigger_shake(&mut self, intensity: f32, duration: f32) {
        let shake = match self.shake {
            Some(current) => Shake {
                intensity: current.intensity.max(intensity),
                remaining: current.remaining.max(duration),
            },
            None => Shake {
                intensity,
                remaining: duration,
            },
        };
        self.shake = Some(shake);
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Forget the previous window position (e.g. after the window was restored)
    pub fn rebase(&mut self) {
        self.last_pos = None;
        self.last_vel = Vec2::ZERO;
    }

    /// Produce this frame's acceleration sample
    ///
    /// `window_pos` is the window's screen position, if the platform reports one.
    pub fn sample(&mut self, window_pos: Option<Vec2>, elapsed: f32, rng: &mut impl Rng) -> Vec2 {
        if elapsed <= 0.0 {
            return Vec2::ZERO;
        }

        let mut accel = Vec2::ZERO;

        if let Some(pos) = window_pos {
            if let Some(last) = self.last_pos {
                let vel = (pos - last) / elapsed;
                let window_accel = (vel - self.last_vel) / elapsed;
                accel -= window_accel.clamp_length_max(MAX_WINDOW_ACCEL);
                self.last_vel = vel;
            }
            self.last_pos = Some(pos);
        }

        if let Some(shake) = self.shake.as_mut() {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            accel += Vec2::from_angle(angle) * shake.intensity * SHAKE_ACCEL_SCALE;
            shake.intensity *= SHAKE_DECAY;
            shake.remaining -= elapsed;
            if shake.remaining <= 0.0 || shake.intensity < 0.01 {
                self.shake = None;
            }
        }

        accel
    }
}
