//! User settings and session presets
//!
//! Persisted as JSON next to the binary snapshots. A missing or unreadable
//! file means defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ARENA_HEIGHT, DEFAULT_ARENA_WIDTH, MAX_BODIES, MAX_SESSION_MINUTES};
use crate::error::PersistResult;
use crate::persistence::write_atomic;

/// A named session length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub minutes: u32,
}

impl Preset {
    pub fn new(name: impl Into<String>, minutes: u32) -> Self {
        Self {
            name: name.into(),
            minutes,
        }
    }

    pub fn secs(&self) -> u32 {
        self.minutes.saturating_mul(60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub presets: Vec<Preset>,
    /// Index into `presets`
    pub selected_preset: usize,
    /// Overrides the selected preset when set
    pub custom_minutes: Option<u32>,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Maximum live bodies, at most `MAX_BODIES`
    pub body_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presets: vec![Preset::new("Pomodoro", 25), Preset::new("Deep Work", 45)],
            selected_preset: 0,
            custom_minutes: None,

            arena_width: DEFAULT_ARENA_WIDTH,
            arena_height: DEFAULT_ARENA_HEIGHT,
            body_capacity: MAX_BODIES,
        }
    }
}

impl Settings {
    pub fn selected(&self) -> Option<&Preset> {
        self.presets.get(self.selected_preset)
    }

    /// Length of the next focus session
    pub fn session_secs(&self) -> u32 {
        match self.custom_minutes {
            Some(minutes) => minutes.saturating_mul(60),
            None => self.selected().map(Preset::secs).unwrap_or(25 * 60),
        }
    }

    pub fn arena(&self) -> Vec2 {
        Vec2::new(self.arena_width, self.arena_height)
    }

    /// Clamp values a hand-edited file could get wrong
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.presets.is_empty() {
            self.presets = defaults.presets;
        }
        self.presets.retain(|p| p.minutes > 0);
        for preset in &mut self.presets {
            preset.minutes = preset.minutes.min(MAX_SESSION_MINUTES);
        }
        if self.selected_preset >= self.presets.len() {
            self.selected_preset = 0;
        }
        self.custom_minutes = match self.custom_minutes {
            Some(0) | None => None,
            Some(minutes) => Some(minutes.min(MAX_SESSION_MINUTES)),
        };
        if !(self.arena_width.is_finite() && self.arena_width > 0.0) {
            self.arena_width = defaults.arena_width;
        }
        if !(self.arena_height.is_finite() && self.arena_height > 0.0) {
            self.arena_height = defaults.arena_height;
        }
        if self.body_capacity == 0 {
            self.body_capacity = defaults.body_capacity;
        }
        self.body_capacity = self.body_capacity.min(MAX_BODIES);
        self
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("Using default settings ({}: {e})", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> PersistResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        log::info!("Settings saved");
        Ok(())
    }
}
