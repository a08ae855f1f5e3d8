//! The owning context
//!
//! `FocusApp` holds the body store, physics, timer and achievement engine and
//! ticks them in a fixed order each frame:
//! 1. ambient acceleration is sampled
//! 2. physics advances (integration, collisions, walls, cleaning)
//! 3. the timer counts down or notices the lost focus
//! 4. completions and interruptions update counters, then achievements are checked

use chrono::{DateTime, TimeZone};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::achievements::{AchievementEngine, AchievementId, CheckInput, Statistics};
use crate::consts::*;
use crate::error::{PersistResult, TimerError};
use crate::persistence::{self, SaveFiles};
use crate::settings::Settings;
use crate::sim::{AmbientMotion, BodyId, BodyStore, Physics};
use crate::timer::{SessionKind, SessionTimer, TimerEvent};

/// What the platform layer reports each frame
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Wall-clock seconds since the previous frame
    pub elapsed: f32,
    /// Window position on screen, if known
    pub window_pos: Option<Vec2>,
    /// Whether the window currently has focus
    pub focused: bool,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            elapsed: SIM_DT,
            window_pos: None,
            focused: true,
        }
    }
}

/// Things the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    SessionCompleted { duration_secs: u32 },
    CleanupCompleted { body: BodyId },
    /// A running session lost focus; `spawned` is `None` when the store was full
    Interrupted { kind: SessionKind, spawned: Option<BodyId> },
    AchievementUnlocked(AchievementId),
    /// A body finished its cleaning sweep and left the store
    BodyRetired(BodyId),
}

pub struct FocusApp {
    store: BodyStore,
    physics: Physics,
    ambient: AmbientMotion,
    timer: SessionTimer,
    achievements: AchievementEngine,
    settings: Settings,
    rng: Pcg32,
}

impl FocusApp {
    /// Fresh state: no bodies, nothing unlocked
    pub fn new(settings: Settings, seed: u64) -> Self {
        let store = BodyStore::new(settings.body_capacity);
        Self::from_parts(settings, store, AchievementEngine::new(), seed)
    }

    fn from_parts(settings: Settings, store: BodyStore, achievements: AchievementEngine, seed: u64) -> Self {
        Self {
            physics: Physics::new(settings.arena()),
            ambient: AmbientMotion::new(),
            timer: SessionTimer::new(),
            store,
            achievements,
            settings,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Hydrate from the save directory; unusable files fall back to fresh state
    pub fn load(files: &SaveFiles, seed: u64) -> Self {
        let settings = Settings::load(&files.settings());
        let store = persistence::load_bodies_or_default(&files.bodies(), settings.body_capacity);
        let achievements = persistence::load_achievements_or_default(&files.achievements());
        Self::from_parts(settings, store, achievements, seed)
    }

    /// Write every snapshot; only call between frames
    pub fn save(&self, files: &SaveFiles) -> PersistResult<()> {
        self.settings.save(&files.settings())?;
        persistence::save_bodies(&files.bodies(), &self.store)?;
        persistence::save_achievements(&files.achievements(), &self.achievements)
    }

    /// Forget every body and every unlock (settings survive)
    pub fn reset_progress(&mut self) {
        self.timer.cancel();
        self.store = BodyStore::new(self.settings.body_capacity);
        self.achievements.reset();
        log::info!("Progress reset");
    }

    pub fn store(&self) -> &BodyStore {
        &self.store
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn statistics(&self) -> Statistics {
        self.achievements.statistics()
    }

    /// The window was resized
    pub fn set_arena(&mut self, arena: Vec2) {
        self.physics.set_arena(arena);
    }

    /// Topmost cleanable body under a screen point
    pub fn hit_test(&self, point: Vec2) -> Option<BodyId> {
        self.store.hit_test(point)
    }

    // === Session control ===

    pub fn start_focus(&mut self, duration_secs: u32) -> Result<(), TimerError> {
        self.timer.start(duration_secs, SessionKind::Focus)
    }

    /// Start a focus session of the selected preset (or custom) length
    pub fn start_preset(&mut self) -> Result<(), TimerError> {
        self.start_focus(self.settings.session_secs())
    }

    /// Start working off `body`; the session lasts as long as the one that produced it
    pub fn start_cleanup(&mut self, body: BodyId) -> Result<(), TimerError> {
        let duration_secs = match self.store.get(body) {
            Some(b) if b.is_simulated() => b.duration_secs,
            _ => return Err(TimerError::NoSuchBody(body)),
        };
        self.timer.start(duration_secs, SessionKind::Cleanup(body))?;
        log::debug!("Cleanup of body {} started ({}s)", body, duration_secs);
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<(), TimerError> {
        self.timer.toggle_pause()
    }

    pub fn reset_timer(&mut self) -> Result<(), TimerError> {
        self.timer.reset()
    }

    /// Abandon the current session; a cleanup target is left as it was
    pub fn cancel(&mut self) {
        if let SessionKind::Cleanup(body) = self.timer.cancel() {
            log::debug!("Cleanup of body {} abandoned", body);
        }
    }

    /// Dismiss the interruption screen
    pub fn acknowledge(&mut self) -> bool {
        self.timer.acknowledge()
    }

    // === Frame ===

    /// Run one frame at local time `now`
    pub fn frame<Tz: TimeZone>(&mut self, input: &FrameInput, now: &DateTime<Tz>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        let accel = self.ambient.sample(input.window_pos, input.elapsed, &mut self.rng);
        let report = self.physics.advance(&mut self.store, accel, input.elapsed);
        events.extend(report.retired.into_iter().map(AppEvent::BodyRetired));

        let timer_event = if input.focused {
            self.timer.tick(input.elapsed)
        } else {
            self.timer.focus_lost()
        };

        let check = match timer_event {
            Some(TimerEvent::Completed {
                kind,
                duration_secs,
                paused,
            }) => Some(self.on_completed(kind, duration_secs, paused, &mut events)),
            Some(TimerEvent::Interrupted { kind, duration_secs }) => {
                Some(self.on_interrupted(kind, duration_secs, &mut events))
            }
            None => None,
        };

        if let Some(check) = check {
            let unlocked = self.achievements.check(&check, now);
            events.extend(unlocked.into_iter().map(AppEvent::AchievementUnlocked));
        }
        events
    }

    fn on_completed(
        &mut self,
        kind: SessionKind,
        duration_secs: u32,
        paused: bool,
        events: &mut Vec<AppEvent>,
    ) -> CheckInput {
        let mut check = CheckInput {
            duration_secs,
            paused,
            ..Default::default()
        };

        match kind {
            SessionKind::Focus => {
                self.achievements.record_session_completed(duration_secs);
                check.session_completed = true;
                events.push(AppEvent::SessionCompleted { duration_secs });
                log::info!("Focus session of {}s completed", duration_secs);
            }
            SessionKind::Cleanup(body) => {
                if self.store.clean(body) {
                    self.achievements.record_cleanup_completed();
                    check.cleanup_completed = true;
                    events.push(AppEvent::CleanupCompleted { body });
                    log::info!("Body {} cleaned", body);
                } else {
                    log::warn!("Cleanup finished but body {} is gone", body);
                }
            }
        }
        check.all_categories_cleaned = self.store.all_categories_cleaned();

        // Completion is fully processed here, nothing waits on the user
        self.timer.acknowledge();
        check
    }

    fn on_interrupted(&mut self, kind: SessionKind, duration_secs: u32, events: &mut Vec<AppEvent>) -> CheckInput {
        self.achievements.record_interruption();
        self.ambient
            .trigger_shake(INTERRUPT_SHAKE_INTENSITY, INTERRUPT_SHAKE_SECS);

        let spawned = self
            .store
            .spawn(duration_secs, self.physics.arena(), &mut self.rng);
        if spawned.is_some() {
            self.achievements.record_body_generated();
        }
        log::info!("Session interrupted, spawned {:?}", spawned);
        events.push(AppEvent::Interrupted { kind, spawned });

        CheckInput {
            duration_secs,
            interrupted: true,
            all_categories_cleaned: self.store.all_categories_cleaned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{Milestone, Setback};
    use crate::timer::TimerPhase;
    use chrono::{Duration, FixedOffset};

    fn noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 5, 4, 12, 0, 0)
            .unwrap()
    }

    fn frames(app: &mut FocusApp, seconds: u32, now: &DateTime<FixedOffset>) -> Vec<AppEvent> {
        let input = FrameInput {
            elapsed: 0.25,
            ..Default::default()
        };
        (0..seconds * 4).flat_map(|_| app.frame(&input, now)).collect()
    }

    fn lose_focus(app: &mut FocusApp, now: &DateTime<FixedOffset>) -> Vec<AppEvent> {
        let input = FrameInput {
            focused: false,
            ..Default::default()
        };
        app.frame(&input, now)
    }

    fn interrupted_body(events: &[AppEvent]) -> BodyId {
        events
            .iter()
            .find_map(|e| match e {
                AppEvent::Interrupted { spawned, .. } => *spawned,
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_focus_session_completes_and_unlocks() {
        let mut app = FocusApp::new(Settings::default(), 1);
        let now = noon();
        app.start_focus(30).unwrap();
        let events = frames(&mut app, 31, &now);

        assert!(events.contains(&AppEvent::SessionCompleted { duration_secs: 30 }));
        assert!(events.contains(&AppEvent::AchievementUnlocked(AchievementId::Milestone(
            Milestone::FirstSession
        ))));
        assert!(events.contains(&AppEvent::AchievementUnlocked(AchievementId::Milestone(
            Milestone::Flawless
        ))));
        assert_eq!(app.timer().phase(), TimerPhase::Idle);
        assert_eq!(app.statistics().counters.total_sessions, 1);
    }

    #[test]
    fn test_paused_session_is_not_flawless() {
        let mut app = FocusApp::new(Settings::default(), 10);
        let now = noon();
        let flawless = AppEvent::AchievementUnlocked(AchievementId::Milestone(Milestone::Flawless));

        app.start_focus(30).unwrap();
        frames(&mut app, 5, &now);
        app.toggle_pause().unwrap();
        frames(&mut app, 5, &now);
        app.toggle_pause().unwrap();
        let events = frames(&mut app, 30, &now);
        assert!(events.contains(&AppEvent::SessionCompleted { duration_secs: 30 }));
        assert!(!events.contains(&flawless));

        app.start_focus(30).unwrap();
        let events = frames(&mut app, 31, &now);
        assert!(events.contains(&flawless));
        assert!(!events.contains(&AppEvent::AchievementUnlocked(AchievementId::Milestone(
            Milestone::FirstSession
        ))));
    }

    #[test]
    fn test_interruption_spawns_body_and_setbacks() {
        let mut app = FocusApp::new(Settings::default(), 2);
        let now = noon();
        app.start_preset().unwrap();
        frames(&mut app, 3, &now);

        let events = lose_focus(&mut app, &now);
        let body = interrupted_body(&events);
        assert_eq!(app.timer().phase(), TimerPhase::Interrupted);
        assert_eq!(app.store().get(body).unwrap().duration_secs, STANDARD_SESSION_SECS);
        assert!(events.contains(&AppEvent::AchievementUnlocked(AchievementId::Setback(
            Setback::FirstInterruption
        ))));
        assert!(events.contains(&AppEvent::AchievementUnlocked(AchievementId::Setback(
            Setback::FirstTrash
        ))));

        // Still unfocused next frame: nothing more happens
        assert!(lose_focus(&mut app, &now).is_empty());
        assert_eq!(app.statistics().counters.interruptions, 1);
        assert!(app.acknowledge());
        assert_eq!(app.timer().phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_full_store_still_counts_interruption() {
        let settings = Settings {
            body_capacity: 1,
            ..Default::default()
        };
        let mut app = FocusApp::new(settings, 3);
        let now = noon();
        for expected in [true, false] {
            app.start_focus(60).unwrap();
            let events = lose_focus(&mut app, &now);
            let spawned = events.iter().any(|e| matches!(e, AppEvent::Interrupted { spawned: Some(_), .. }));
            assert_eq!(spawned, expected);
            app.acknowledge();
        }
        let counters = app.statistics().counters;
        assert_eq!(counters.interruptions, 2);
        assert_eq!(counters.generated_bodies, 1);
    }

    #[test]
    fn test_cleanup_sweeps_body_away() {
        let mut app = FocusApp::new(Settings::default(), 4);
        let now = noon();
        app.start_focus(20).unwrap();
        let body = interrupted_body(&lose_focus(&mut app, &now));
        app.acknowledge();

        app.start_cleanup(body).unwrap();
        assert_eq!(app.timer().cleanup_target(), Some(body));
        let events = frames(&mut app, 21, &now);
        assert!(events.contains(&AppEvent::CleanupCompleted { body }));
        assert!(events.contains(&AppEvent::AchievementUnlocked(AchievementId::Milestone(
            Milestone::FirstCleanup
        ))));
        assert!(app.store().get(body).unwrap().cleaning);
        assert_eq!(app.statistics().counters.total_sessions, 0);
        assert_eq!(app.start_cleanup(body), Err(TimerError::NoSuchBody(body)));

        let events = frames(&mut app, 6, &(now + Duration::seconds(21)));
        assert!(events.contains(&AppEvent::BodyRetired(body)));
        assert!(app.store().is_empty());
        assert_eq!(app.statistics().counters.cleaned_bodies, 1);
    }

    #[test]
    fn test_interrupted_cleanup_leaves_target_alone() {
        let mut app = FocusApp::new(Settings::default(), 5);
        let now = noon();
        app.start_focus(60).unwrap();
        let first = interrupted_body(&lose_focus(&mut app, &now));
        app.acknowledge();

        app.start_cleanup(first).unwrap();
        frames(&mut app, 2, &now);
        let second = interrupted_body(&lose_focus(&mut app, &now));

        assert_ne!(first, second);
        assert!(app.store().get(first).unwrap().is_simulated());
        assert_eq!(app.store().get(second).unwrap().duration_secs, 60);
        app.acknowledge();
        assert_eq!(app.timer().cleanup_target(), None);

        app.start_cleanup(second).unwrap();
        app.cancel();
        assert_eq!(app.timer().phase(), TimerPhase::Idle);
        assert!(app.store().get(second).unwrap().is_simulated());
    }

    #[test]
    fn test_cleanup_of_unknown_body_is_rejected() {
        let mut app = FocusApp::new(Settings::default(), 6);
        assert_eq!(app.start_cleanup(BodyId(42)), Err(TimerError::NoSuchBody(BodyId(42))));
        assert_eq!(app.timer().phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_bodies_stay_inside_arena_while_window_moves() {
        let mut app = FocusApp::new(Settings::default(), 7);
        let now = noon();
        for _ in 0..5 {
            app.start_focus(60).unwrap();
            lose_focus(&mut app, &now);
            app.acknowledge();
        }
        for i in 0..600 {
            let wobble = ((i as f32) * 0.3).sin() * 40.0;
            let input = FrameInput {
                window_pos: Some(Vec2::new(200.0 + wobble, 100.0)),
                ..Default::default()
            };
            app.frame(&input, &now);
        }
        let arena = app.settings().arena();
        for body in app.store().iter_active() {
            assert!(body.pos.x >= body.radius - 1e-3 && body.pos.x <= arena.x - body.radius + 1e-3);
            assert!(body.pos.y >= body.radius - 1e-3 && body.pos.y <= arena.y - body.radius + 1e-3);
        }
    }

    #[test]
    fn test_save_and_load_restore_progress() {
        let dir = tempfile::tempdir().unwrap();
        let files = SaveFiles::new(dir.path());
        let now = noon();

        let mut app = FocusApp::new(Settings::default(), 8);
        app.start_focus(10).unwrap();
        frames(&mut app, 11, &now);
        app.start_focus(60).unwrap();
        lose_focus(&mut app, &now);
        app.save(&files).unwrap();

        let restored = FocusApp::load(&files, 9);
        assert_eq!(restored.store(), app.store());
        assert_eq!(restored.achievements(), app.achievements());
        assert_eq!(restored.settings(), app.settings());
        assert_eq!(restored.timer().phase(), TimerPhase::Idle);

        let mut reset = restored;
        reset.reset_progress();
        assert!(reset.store().is_empty());
        assert_eq!(reset.statistics().counters.total_sessions, 0);
    }
}
