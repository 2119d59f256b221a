use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Work
    }
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::ShortBreak => "SHORT BREAK",
            Phase::LongBreak => "LONG BREAK",
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }
}

/// Display label for a raw stored phase value. Unrecognized values are
/// uppercased as-is instead of being rejected.
pub fn phase_label(raw: &str) -> String {
    match raw {
        "work" => Phase::Work.label().to_string(),
        "short_break" => Phase::ShortBreak.label().to_string(),
        "long_break" => Phase::LongBreak.label().to_string(),
        other => other.to_ascii_uppercase(),
    }
}

/// One executed phase interval. Mutated only at finalization; immutable once
/// `was_completed` or `was_skipped` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_type: Phase,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub planned_duration: u32,
    pub actual_duration: u32,
    pub pause_count: u32,
    pub was_completed: bool,
    pub was_skipped: bool,
    pub task_id: Option<String>,
    pub task_name: Option<String>,
}

impl SessionRecord {
    pub fn begin(session_type: Phase, start_time: DateTime<Local>, planned_duration: u32) -> Self {
        Self {
            session_type,
            start_time,
            end_time: None,
            planned_duration,
            actual_duration: 0,
            pause_count: 0,
            was_completed: false,
            was_skipped: false,
            task_id: None,
            task_name: None,
        }
    }

    /// The interval ran to its full planned length.
    pub(crate) fn finalize_completed(&mut self, end_time: DateTime<Local>, pause_count: u32) {
        self.was_completed = true;
        self.end_time = Some(end_time);
        self.actual_duration = self.planned_duration;
        self.pause_count = pause_count;
    }

    /// The interval was cut short after `elapsed_seconds`.
    pub(crate) fn finalize_skipped(
        &mut self,
        end_time: DateTime<Local>,
        elapsed_seconds: u32,
        pause_count: u32,
    ) {
        self.was_skipped = true;
        self.end_time = Some(end_time);
        self.actual_duration = elapsed_seconds.min(self.planned_duration);
        self.pause_count = pause_count;
    }
}
