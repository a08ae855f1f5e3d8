//! Achievements, streaks and statistics
//!
//! Two fixed lists: milestones (good habits) and setbacks (bad ones). Unlocks
//! are monotonic and idempotent; an entry records its unlock time once, at
//! the first transition. Counters are bumped by whoever witnesses the event
//! (`record_*`); `check` only reads them, except for the streak/day/run
//! bookkeeping it owns.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::consts::{LONG_SESSION_SECS, STANDARD_SESSION_SECS};

/// Positive achievements, in persisted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Milestone {
    FirstSession,
    FiveSessions,
    TenSessions,
    TwentySessions,
    FirstCleanup,
    FiveCleanups,
    TenCleanups,
    LongSession,
    Marathon,
    WeekStreak,
    Flawless,
    CustomChallenge,
    CleanMaster,
    PerfectDay,
    EarlyRiser,
    NightOwl,
}

impl Milestone {
    pub const ALL: [Milestone; 16] = [
        Milestone::FirstSession,
        Milestone::FiveSessions,
        Milestone::TenSessions,
        Milestone::TwentySessions,
        Milestone::FirstCleanup,
        Milestone::FiveCleanups,
        Milestone::TenCleanups,
        Milestone::LongSession,
        Milestone::Marathon,
        Milestone::WeekStreak,
        Milestone::Flawless,
        Milestone::CustomChallenge,
        Milestone::CleanMaster,
        Milestone::PerfectDay,
        Milestone::EarlyRiser,
        Milestone::NightOwl,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Milestone::FirstSession => "First Focus",
            Milestone::FiveSessions => "Getting There",
            Milestone::TenSessions => "In the Zone",
            Milestone::TwentySessions => "Focus Master",
            Milestone::FirstCleanup => "Janitor",
            Milestone::FiveCleanups => "Eco Guardian",
            Milestone::TenCleanups => "Cleaning Expert",
            Milestone::LongSession => "Long Haul",
            Milestone::Marathon => "Focus Marathon",
            Milestone::WeekStreak => "Seven-Day Streak",
            Milestone::Flawless => "Flawless",
            Milestone::CustomChallenge => "Custom Challenge",
            Milestone::CleanMaster => "Clean Master",
            Milestone::PerfectDay => "Perfect Day",
            Milestone::EarlyRiser => "Early Riser",
            Milestone::NightOwl => "Night Owl",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Milestone::FirstSession => "Complete your first focus session",
            Milestone::FiveSessions => "Complete 5 focus sessions",
            Milestone::TenSessions => "Complete 10 focus sessions",
            Milestone::TwentySessions => "Complete 20 focus sessions",
            Milestone::FirstCleanup => "Clean up your first piece of trash",
            Milestone::FiveCleanups => "Clean up 5 pieces of trash",
            Milestone::TenCleanups => "Clean up 10 pieces of trash",
            Milestone::LongSession => "Complete a 45-minute session",
            Milestone::Marathon => "Complete 3 sessions in a row without an interruption",
            Milestone::WeekStreak => "Complete at least one session a day for 7 days",
            Milestone::Flawless => "Complete a session without pausing or resetting it",
            Milestone::CustomChallenge => "Complete a session of custom length",
            Milestone::CleanMaster => "Clean up every kind of trash",
            Milestone::PerfectDay => "Complete 5 sessions in one day",
            Milestone::EarlyRiser => "Complete a session between 6 and 8 in the morning",
            Milestone::NightOwl => "Complete a session between 10 at night and 1 in the morning",
        }
    }
}

/// Negative achievements, in persisted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setback {
    FirstInterruption,
    FiveInterruptions,
    TenInterruptions,
    FirstTrash,
    FiveTrash,
    TenTrash,
    BrokenStreak,
}

impl Setback {
    pub const ALL: [Setback; 7] = [
        Setback::FirstInterruption,
        Setback::FiveInterruptions,
        Setback::TenInterruptions,
        Setback::FirstTrash,
        Setback::FiveTrash,
        Setback::TenTrash,
        Setback::BrokenStreak,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Setback::FirstInterruption => "First Distraction",
            Setback::FiveInterruptions => "Easily Distracted",
            Setback::TenInterruptions => "Distraction Addict",
            Setback::FirstTrash => "Litterbug",
            Setback::FiveTrash => "Polluter",
            Setback::TenTrash => "Trash King",
            Setback::BrokenStreak => "Broken Streak",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Setback::FirstInterruption => "Interrupt a session",
            Setback::FiveInterruptions => "Interrupt 5 sessions",
            Setback::TenInterruptions => "Interrupt 10 sessions",
            Setback::FirstTrash => "Produce a piece of trash",
            Setback::FiveTrash => "Produce 5 pieces of trash",
            Setback::TenTrash => "Produce 10 pieces of trash",
            Setback::BrokenStreak => "Break a streak of 3 or more days",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    Milestone(Milestone),
    Setback(Setback),
}

impl AchievementId {
    pub fn name(self) -> &'static str {
        match self {
            AchievementId::Milestone(m) => m.name(),
            AchievementId::Setback(s) => s.name(),
        }
    }
}

/// One entry of either list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    /// Position in its list
    pub id: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    /// Unix seconds of the first unlock
    pub unlocked_at: Option<i64>,
}

impl Achievement {
    fn locked(id: usize, name: &'static str, description: &'static str) -> Self {
        Self {
            id: id as u16,
            name,
            description,
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// Returns true only on the first transition to unlocked
    fn unlock(&mut self, timestamp: i64) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(timestamp);
        true
    }
}

/// Event counters, bumped by callers when the event happens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total_sessions: u32,
    pub cleaned_bodies: u32,
    pub generated_bodies: u32,
    pub interruptions: u32,
    pub long_sessions: u32,
}

/// Day and run bookkeeping owned by `check`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Consecutive calendar days with a completed session
    pub days: u32,
    pub last_completion_day: Option<NaiveDate>,
    /// Sessions completed back to back without an interruption
    pub consecutive_sessions: u32,
    /// Completions on `daily_day`
    pub daily_completions: u32,
    pub daily_day: Option<NaiveDate>,
}

/// Completed focus sessions split by length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMix {
    pub standard: u32,
    pub long: u32,
    pub custom: u32,
}

/// Inputs of one evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckInput {
    /// A focus session just reached zero
    pub session_completed: bool,
    /// A cleanup session just reached zero
    pub cleanup_completed: bool,
    /// Length of the session that triggered this check
    pub duration_secs: u32,
    /// One-shot: an interruption happened since the last check
    pub interrupted: bool,
    /// The completed session was paused or reset along the way
    pub paused: bool,
    /// Every trash category has been cleaned at least once
    pub all_categories_cleaned: bool,
}

/// Read-only summary for a statistics screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub counters: Counters,
    pub streak_days: u32,
    pub consecutive_sessions: u32,
    pub daily_completions: u32,
    pub mix: SessionMix,
    pub milestones_unlocked: usize,
    pub setbacks_unlocked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementEngine {
    pub(crate) milestones: Vec<Achievement>,
    pub(crate) setbacks: Vec<Achievement>,
    pub(crate) counters: Counters,
    pub(crate) streak: Streak,
    pub(crate) mix: SessionMix,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementEngine {
    /// Everything locked, every counter at zero
    pub fn new() -> Self {
        Self {
            milestones: Milestone::ALL
                .iter()
                .map(|m| Achievement::locked(m.index(), m.name(), m.description()))
                .collect(),
            setbacks: Setback::ALL
                .iter()
                .map(|s| Achievement::locked(s.index(), s.name(), s.description()))
                .collect(),
            counters: Counters::default(),
            streak: Streak::default(),
            mix: SessionMix::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn milestones(&self) -> &[Achievement] {
        &self.milestones
    }

    pub fn setbacks(&self) -> &[Achievement] {
        &self.setbacks
    }

    /// Milestone by list position; out of range is `None`
    pub fn milestone(&self, index: usize) -> Option<&Achievement> {
        self.milestones.get(index)
    }

    /// Setback by list position; out of range is `None`
    pub fn setback(&self, index: usize) -> Option<&Achievement> {
        self.setbacks.get(index)
    }

    pub fn get(&self, id: AchievementId) -> &Achievement {
        match id {
            AchievementId::Milestone(m) => &self.milestones[m.index()],
            AchievementId::Setback(s) => &self.setbacks[s.index()],
        }
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.get(id).unlocked
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn streak(&self) -> &Streak {
        &self.streak
    }

    pub fn mix(&self) -> &SessionMix {
        &self.mix
    }

    /// A focus session ran to zero
    pub fn record_session_completed(&mut self, duration_secs: u32) {
        self.counters.total_sessions += 1;
        match duration_secs {
            LONG_SESSION_SECS => {
                self.counters.long_sessions += 1;
                self.mix.long += 1;
            }
            STANDARD_SESSION_SECS => self.mix.standard += 1,
            _ => self.mix.custom += 1,
        }
    }

    /// A cleanup session ran to zero
    pub fn record_cleanup_completed(&mut self) {
        self.counters.cleaned_bodies += 1;
    }

    /// A running session lost focus
    pub fn record_interruption(&mut self) {
        self.counters.interruptions += 1;
    }

    /// An interruption actually produced a body
    pub fn record_body_generated(&mut self) {
        self.counters.generated_bodies += 1;
    }

    /// Unlock a single entry; returns true only on the first unlock
    pub fn unlock(&mut self, id: AchievementId, timestamp: i64) -> bool {
        let entry = match id {
            AchievementId::Milestone(m) => &mut self.milestones[m.index()],
            AchievementId::Setback(s) => &mut self.setbacks[s.index()],
        };
        let fresh = entry.unlock(timestamp);
        if fresh {
            log::info!("Achievement unlocked: {}", entry.name);
        }
        fresh
    }

    /// Evaluate every rule at local time `now`
    ///
    /// Returns the entries that became unlocked during this call, in the
    /// order they were unlocked.
    pub fn check<Tz: TimeZone>(&mut self, input: &CheckInput, now: &DateTime<Tz>) -> Vec<AchievementId> {
        let timestamp = now.timestamp();
        let mut unlocked = Vec::new();
        let mut award = |engine: &mut Self, id: AchievementId| {
            if engine.unlock(id, timestamp) {
                unlocked.push(id);
            }
        };

        if input.session_completed && !input.interrupted {
            let today = now.date_naive();
            match self.streak.last_completion_day {
                None => self.streak.days = 1,
                Some(last) => {
                    let gap = (today - last).num_days();
                    if gap == 1 {
                        self.streak.days += 1;
                    } else if gap > 1 {
                        if self.streak.days >= 3 {
                            award(self, AchievementId::Setback(Setback::BrokenStreak));
                        }
                        self.streak.days = 1;
                    }
                }
            }
            self.streak.last_completion_day = Some(today);

            if self.streak.daily_day != Some(today) {
                self.streak.daily_completions = 0;
                self.streak.daily_day = Some(today);
            }
            self.streak.daily_completions += 1;
            self.streak.consecutive_sessions += 1;

            if !input.paused {
                award(self, AchievementId::Milestone(Milestone::Flawless));
            }
        } else if input.interrupted {
            self.streak.consecutive_sessions = 0;
        }

        if input.session_completed {
            let hour = now.hour();
            if (6..8).contains(&hour) {
                award(self, AchievementId::Milestone(Milestone::EarlyRiser));
            } else if hour >= 22 || hour < 1 {
                award(self, AchievementId::Milestone(Milestone::NightOwl));
            }
        }

        let counters = self.counters;
        let streak = self.streak;
        let milestone_rules = [
            (counters.total_sessions >= 1, Milestone::FirstSession),
            (counters.total_sessions >= 5, Milestone::FiveSessions),
            (counters.total_sessions >= 10, Milestone::TenSessions),
            (counters.total_sessions >= 20, Milestone::TwentySessions),
            (counters.cleaned_bodies >= 1, Milestone::FirstCleanup),
            (counters.cleaned_bodies >= 5, Milestone::FiveCleanups),
            (counters.cleaned_bodies >= 10, Milestone::TenCleanups),
            (counters.long_sessions >= 1, Milestone::LongSession),
            (streak.consecutive_sessions >= 3, Milestone::Marathon),
            (streak.days >= 7, Milestone::WeekStreak),
            (streak.daily_completions >= 5, Milestone::PerfectDay),
            (input.all_categories_cleaned, Milestone::CleanMaster),
        ];
        for (met, milestone) in milestone_rules {
            if met {
                award(self, AchievementId::Milestone(milestone));
            }
        }

        let setback_rules = [
            (counters.interruptions >= 1, Setback::FirstInterruption),
            (counters.interruptions >= 5, Setback::FiveInterruptions),
            (counters.interruptions >= 10, Setback::TenInterruptions),
            (counters.generated_bodies >= 1, Setback::FirstTrash),
            (counters.generated_bodies >= 5, Setback::FiveTrash),
            (counters.generated_bodies >= 10, Setback::TenTrash),
        ];
        for (met, setback) in setback_rules {
            if met {
                award(self, AchievementId::Setback(setback));
            }
        }

        let is_custom = input.duration_secs > 0
            && input.duration_secs != STANDARD_SESSION_SECS
            && input.duration_secs != LONG_SESSION_SECS;
        if input.session_completed && is_custom {
            award(self, AchievementId::Milestone(Milestone::CustomChallenge));
        }

        unlocked
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            counters: self.counters,
            streak_days: self.streak.days,
            consecutive_sessions: self.streak.consecutive_sessions,
            daily_completions: self.streak.daily_completions,
            mix: self.mix,
            milestones_unlocked: self.milestones.iter().filter(|a| a.unlocked).count(),
            setbacks_unlocked: self.setbacks.iter().filter(|a| a.unlocked).count(),
        }
    }
}
