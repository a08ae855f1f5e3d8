//! Trash Focus - a focus timer with consequences
//!
//! Core modules:
//! - `sim`: Fixed-timestep physics for the trash bodies (store, collisions, ambient motion)
//! - `timer`: Countdown state machine for focus and cleanup sessions
//! - `achievements`: Milestones, setbacks, streaks and statistics
//! - `persistence`: Versioned binary snapshots of bodies and achievements
//! - `app`: The owning context that ticks everything in order

pub mod achievements;
pub mod app;
pub mod error;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod timer;

pub use achievements::{AchievementEngine, AchievementId, CheckInput, Milestone, Setback, Statistics};
pub use app::{AppEvent, FocusApp, FrameInput};
pub use error::{PersistError, PersistResult, TimerError};
pub use settings::{Preset, Settings};

/// Simulation and rule constants
pub mod consts {
    /// Fixed physics timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default arena (window client area) dimensions
    pub const DEFAULT_ARENA_WIDTH: f32 = 800.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 600.0;

    /// Maximum number of live trash bodies
    pub const MAX_BODIES: usize = 20;
    /// Number of trash categories (derived from session length)
    pub const CATEGORY_COUNT: u8 = 4;
    /// Session seconds per category step
    pub const CATEGORY_STEP_SECS: u32 = 15 * 60;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY: f32 = 196.0;
    /// How strongly window motion pushes the bodies
    pub const AMBIENT_INFLUENCE: f32 = 0.5;
    /// Per-step multiplicative drag
    pub const VELOCITY_DECAY: f32 = 0.99;
    /// Extra energy injected by a wall impact (multiplies the body's bounce factor)
    pub const WALL_BOUNCE_BONUS: f32 = 1.1;

    /// Base restitution multiplier for walls, jittered per body
    pub const BASE_BOUNCE: f32 = 0.3;
    /// Base floor friction, jittered per body
    pub const BASE_FRICTION: f32 = 3.0;
    /// Base body radius before scale jitter
    pub const BASE_RADIUS: f32 = 30.0;

    /// Body-body collision restitution
    pub const RESTITUTION: f32 = 0.8;
    /// Allowed penetration before positional correction kicks in
    pub const PENETRATION_SLOP: f32 = 0.01;
    /// Fraction of the penetration removed per resolution
    pub const CORRECTION_PERCENT: f32 = 0.8;

    /// Seconds a body spends being swept away once cleaning starts
    pub const CLEAN_DURATION_SECS: f32 = 5.0;

    /// Longest session a settings file may ask for
    pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

    /// Canonical preset lengths
    pub const STANDARD_SESSION_SECS: u32 = 25 * 60;
    pub const LONG_SESSION_SECS: u32 = 45 * 60;

    /// Shake applied to the bodies when a session is interrupted
    pub const INTERRUPT_SHAKE_INTENSITY: f32 = 15.0;
    pub const INTERRUPT_SHAKE_SECS: f32 = 0.7;
}

/// Trash category for a session length: one step per 15 minutes, capped at the last category
#[inline]
pub fn category_for_duration(duration_secs: u32) -> u8 {
    let step = duration_secs / consts::CATEGORY_STEP_SECS;
    step.min(consts::CATEGORY_COUNT as u32 - 1) as u8
}
