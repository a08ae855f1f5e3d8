//! Session countdown
//!
//! One timer drives both focus sessions and cleanup sessions. Time is
//! integerized: fractional seconds accumulate in `carry` and only whole
//! seconds come off `remaining_secs`, so the display never skips a second.

use crate::error::TimerError;
use crate::sim::BodyId;

/// Where the countdown is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerPhase {
    /// Nothing scheduled (main screen)
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Countdown suspended, remaining time preserved
    Paused,
    /// Focus was lost while running; waiting for acknowledgment
    Interrupted,
    /// Reached zero; waiting for the completion to be processed
    Completed,
}

/// What the running session is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKind {
    /// A regular focus session
    #[default]
    Focus,
    /// Working off a specific piece of trash
    Cleanup(BodyId),
}

/// Emitted by the timer on terminal transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// `paused` is set when the session was paused or reset along the way
    Completed { kind: SessionKind, duration_secs: u32, paused: bool },
    Interrupted { kind: SessionKind, duration_secs: u32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTimer {
    phase: TimerPhase,
    kind: SessionKind,
    duration_secs: u32,
    remaining_secs: u32,
    /// Sub-second time not yet taken off `remaining_secs`
    carry: f32,
    /// Paused or reset at least once since start
    paused: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Whether the current session was ever paused or reset
    pub fn was_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Body the current session is cleaning, if any
    pub fn cleanup_target(&self) -> Option<BodyId> {
        match self.kind {
            SessionKind::Cleanup(id) => Some(id),
            SessionKind::Focus => None,
        }
    }

    /// Elapsed fraction of the session in 0..=1
    pub fn progress(&self) -> f32 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        1.0 - self.remaining_secs as f32 / self.duration_secs as f32
    }

    /// Remaining time as `MM:SS`
    pub fn format_remaining(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Begin a session from idle
    pub fn start(&mut self, duration_secs: u32, kind: SessionKind) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Idle {
            return Err(TimerError::AlreadyActive);
        }
        if duration_secs == 0 {
            return Err(TimerError::ZeroDuration);
        }

        *self = Self {
            phase: TimerPhase::Running,
            kind,
            duration_secs,
            remaining_secs: duration_secs,
            carry: 0.0,
            paused: false,
        };
        log::debug!("Session started: {:?} for {}s", kind, duration_secs);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Running {
            return Err(TimerError::NotRunning);
        }
        self.phase = TimerPhase::Paused;
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Paused {
            return Err(TimerError::NotPaused);
        }
        self.phase = TimerPhase::Running;
        Ok(())
    }

    /// Pause if running, resume if paused
    pub fn toggle_pause(&mut self) -> Result<(), TimerError> {
        match self.phase {
            TimerPhase::Running => self.pause(),
            TimerPhase::Paused => self.resume(),
            _ => Err(TimerError::NotRunning),
        }
    }

    /// Abort the countdown and restore the full duration, leaving it paused
    pub fn reset(&mut self) -> Result<(), TimerError> {
        match self.phase {
            TimerPhase::Running | TimerPhase::Paused => {
                self.phase = TimerPhase::Paused;
                self.remaining_secs = self.duration_secs;
                self.carry = 0.0;
                self.paused = true;
                Ok(())
            }
            _ => Err(TimerError::NotRunning),
        }
    }

    /// Drop whatever session exists and go back to idle
    pub fn cancel(&mut self) -> SessionKind {
        let kind = self.kind;
        *self = Self::default();
        kind
    }

    /// Leave the interrupted/completed screen
    pub fn acknowledge(&mut self) -> bool {
        match self.phase {
            TimerPhase::Interrupted | TimerPhase::Completed => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Count down by `elapsed` seconds; emits `Completed` on reaching zero
    pub fn tick(&mut self, elapsed: f32) -> Option<TimerEvent> {
        if self.phase != TimerPhase::Running || elapsed <= 0.0 {
            return None;
        }

        self.carry += elapsed;
        let whole = self.carry.floor();
        if whole >= 1.0 {
            self.carry -= whole;
            self.remaining_secs = self.remaining_secs.saturating_sub(whole as u32);
        }

        if self.remaining_secs == 0 {
            self.phase = TimerPhase::Completed;
            self.carry = 0.0;
            log::debug!("Session completed: {:?}", self.kind);
            return Some(TimerEvent::Completed {
                kind: self.kind,
                duration_secs: self.duration_secs,
                paused: self.paused,
            });
        }
        None
    }

    /// The window lost focus; only a running session counts as interrupted
    pub fn focus_lost(&mut self) -> Option<TimerEvent> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        self.phase = TimerPhase::Interrupted;
        log::debug!("Session interrupted with {}s left", self.remaining_secs);
        Some(TimerEvent::Interrupted {
            kind: self.kind,
            duration_secs: self.duration_secs,
        })
    }
}
