use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::TimerConfig;
use crate::models::{Phase, SessionRecord};

/// Notifications produced by a state transition, in emission order. A
/// finalized record always precedes the phase change that follows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "payload")]
pub enum TimerEvent {
    PhaseChanged(Phase),
    TimeUpdated(u32),
    SessionCompleted(SessionRecord),
}

/// The work/break phase machine. Purely synchronous; the caller supplies the
/// one-second cadence via `tick` and the wall-clock time for record stamps.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    config: TimerConfig,
    phase: Phase,
    remaining_seconds: u32,
    total_seconds: u32,
    completed_work_sessions: u32,
    running: bool,
    current_session: Option<SessionRecord>,
    pause_count: u32,
}

impl PhaseTimer {
    pub fn new(config: TimerConfig) -> Self {
        let total = config.phase_seconds(Phase::Work);
        Self {
            config,
            phase: Phase::Work,
            remaining_seconds: total,
            total_seconds: total,
            completed_work_sessions: 0,
            running: false,
            current_session: None,
            pause_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn has_session_in_progress(&self) -> bool {
        self.current_session.is_some()
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Begin (or resume) the current interval. The first start of an interval
    /// opens its session record; resuming after a pause reuses it.
    pub fn start(&mut self, now: DateTime<Local>) {
        if self.running {
            return;
        }
        if self.current_session.is_none() {
            self.current_session = Some(SessionRecord::begin(self.phase, now, self.total_seconds));
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.pause_count += 1;
        }
    }

    /// Advance the interval by one second. Finalizes the interval as
    /// completed when the countdown reaches zero.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if !self.running || self.remaining_seconds == 0 {
            return events;
        }

        self.remaining_seconds -= 1;
        events.push(TimerEvent::TimeUpdated(self.remaining_seconds));
        if self.remaining_seconds == 0 {
            self.complete(now, &mut events);
        }
        events
    }

    /// Abandon the current interval, sealing its record as skipped with the
    /// elapsed time, then move to the next phase. Skipping with nothing in
    /// progress still advances the phase.
    pub fn skip(&mut self, now: DateTime<Local>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if let Some(mut record) = self.current_session.take() {
            let elapsed = self.total_seconds - self.remaining_seconds;
            record.finalize_skipped(now, elapsed, self.pause_count);
            events.push(TimerEvent::SessionCompleted(record));
        }
        self.pause_count = 0;
        self.advance_phase(&mut events);
        events
    }

    /// Stop and restore the current phase to its full duration. The
    /// in-progress record, if any, is discarded without being emitted.
    pub fn reset(&mut self) -> Vec<TimerEvent> {
        self.running = false;
        self.current_session = None;
        self.pause_count = 0;
        let mut events = Vec::new();
        self.set_phase(self.phase, &mut events);
        events
    }

    /// Swap in a new configuration and reset the current phase to it.
    pub fn set_config(&mut self, config: TimerConfig) -> Vec<TimerEvent> {
        self.config = config;
        self.reset()
    }

    fn complete(&mut self, now: DateTime<Local>, events: &mut Vec<TimerEvent>) {
        self.running = false;
        if let Some(mut record) = self.current_session.take() {
            record.finalize_completed(now, self.pause_count);
            events.push(TimerEvent::SessionCompleted(record));
        }
        self.pause_count = 0;
        self.advance_phase(events);
    }

    fn advance_phase(&mut self, events: &mut Vec<TimerEvent>) {
        let next = if self.phase == Phase::Work {
            self.completed_work_sessions += 1;
            if self.completed_work_sessions % self.config.sessions_before_long_break == 0 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        } else {
            Phase::Work
        };
        self.set_phase(next, events);
    }

    fn set_phase(&mut self, phase: Phase, events: &mut Vec<TimerEvent>) {
        self.phase = phase;
        self.total_seconds = self.config.phase_seconds(phase);
        self.remaining_seconds = self.total_seconds;
        events.push(TimerEvent::PhaseChanged(phase));
        events.push(TimerEvent::TimeUpdated(self.remaining_seconds));
    }
}
