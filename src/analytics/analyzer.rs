use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use crate::models::{Phase, SessionRecord};

/// Seconds per planned-duration bucket (5 minutes).
const DURATION_BUCKET_SECONDS: u32 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub total: u32,
    pub completed: u32,
    pub skipped: u32,
}

impl BucketStats {
    fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(self.total)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayAnalysis {
    pub hour_stats: BTreeMap<u32, BucketStats>,
    pub completion_rates: BTreeMap<u32, f64>,
    pub best_hour: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationAnalysis {
    /// Mean actual duration in seconds over all work sessions.
    pub average_duration: f64,
    /// Completion rate keyed by planned-duration bucket (floor to 300 s).
    pub completion_by_bucket: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAnalysis {
    /// Keyed by weekday, Monday = 0 through Sunday = 6.
    pub weekday_stats: BTreeMap<u32, BucketStats>,
    pub completion_by_weekday: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseAnalysis {
    pub average_pauses: f64,
    pub paused_completion_rate: f64,
    pub no_pause_completion_rate: f64,
    /// How much better unpaused sessions complete; negative when pausing
    /// correlates with higher completion.
    pub pause_impact: f64,
}

/// Largest-rate entry; ties resolve to the lowest key.
pub(crate) fn max_entry(map: &BTreeMap<u32, f64>) -> Option<(u32, f64)> {
    let mut best: Option<(u32, f64)> = None;
    for (&key, &rate) in map {
        if best.map_or(true, |(_, current)| rate > current) {
            best = Some((key, rate));
        }
    }
    best
}

/// Smallest-rate entry; ties resolve to the lowest key.
pub(crate) fn min_entry(map: &BTreeMap<u32, f64>) -> Option<(u32, f64)> {
    let mut worst: Option<(u32, f64)> = None;
    for (&key, &rate) in map {
        if worst.map_or(true, |(_, current)| rate < current) {
            worst = Some((key, rate));
        }
    }
    worst
}

/// Batch statistics over session history. Break intervals are excluded up
/// front; every computation runs from scratch over the retained work
/// sessions, and empty input always produces zeroed results.
pub struct FocusAnalyzer {
    work_sessions: Vec<SessionRecord>,
}

impl FocusAnalyzer {
    pub fn new(sessions: Vec<SessionRecord>) -> Self {
        let work_sessions = sessions
            .into_iter()
            .filter(|session| session.session_type == Phase::Work)
            .collect();
        Self { work_sessions }
    }

    pub fn work_session_count(&self) -> usize {
        self.work_sessions.len()
    }

    pub fn analyze_time_of_day(&self) -> TimeOfDayAnalysis {
        let mut hour_stats: BTreeMap<u32, BucketStats> = BTreeMap::new();
        for session in &self.work_sessions {
            let stats = hour_stats.entry(session.start_time.hour()).or_default();
            stats.total += 1;
            if session.was_completed {
                stats.completed += 1;
            } else if session.was_skipped {
                stats.skipped += 1;
            }
        }

        let completion_rates: BTreeMap<u32, f64> = hour_stats
            .iter()
            .map(|(&hour, stats)| (hour, stats.completion_rate()))
            .collect();
        let best_hour = max_entry(&completion_rates).map(|(hour, _)| hour);

        TimeOfDayAnalysis {
            hour_stats,
            completion_rates,
            best_hour,
        }
    }

    pub fn analyze_duration_patterns(&self) -> DurationAnalysis {
        if self.work_sessions.is_empty() {
            return DurationAnalysis {
                average_duration: 0.0,
                completion_by_bucket: BTreeMap::new(),
            };
        }

        let total: u64 = self
            .work_sessions
            .iter()
            .map(|session| u64::from(session.actual_duration))
            .sum();
        let average_duration = total as f64 / self.work_sessions.len() as f64;

        let mut buckets: BTreeMap<u32, BucketStats> = BTreeMap::new();
        for session in &self.work_sessions {
            let bucket = session.planned_duration / DURATION_BUCKET_SECONDS * DURATION_BUCKET_SECONDS;
            let stats = buckets.entry(bucket).or_default();
            stats.total += 1;
            if session.was_completed {
                stats.completed += 1;
            }
        }

        let completion_by_bucket = buckets
            .iter()
            .map(|(&bucket, stats)| (bucket, stats.completion_rate()))
            .collect();

        DurationAnalysis {
            average_duration,
            completion_by_bucket,
        }
    }

    pub fn completion_rate(&self) -> f64 {
        if self.work_sessions.is_empty() {
            return 0.0;
        }
        let completed = self
            .work_sessions
            .iter()
            .filter(|session| session.was_completed)
            .count();
        completed as f64 / self.work_sessions.len() as f64
    }

    pub fn analyze_weekly_pattern(&self) -> WeeklyAnalysis {
        let mut weekday_stats: BTreeMap<u32, BucketStats> = BTreeMap::new();
        for session in &self.work_sessions {
            let weekday = session.start_time.weekday().num_days_from_monday();
            let stats = weekday_stats.entry(weekday).or_default();
            stats.total += 1;
            if session.was_completed {
                stats.completed += 1;
            }
        }

        let completion_by_weekday = weekday_stats
            .iter()
            .map(|(&day, stats)| (day, stats.completion_rate()))
            .collect();

        WeeklyAnalysis {
            weekday_stats,
            completion_by_weekday,
        }
    }

    pub fn analyze_pause_patterns(&self) -> PauseAnalysis {
        if self.work_sessions.is_empty() {
            return PauseAnalysis {
                average_pauses: 0.0,
                paused_completion_rate: 0.0,
                no_pause_completion_rate: 0.0,
                pause_impact: 0.0,
            };
        }

        let total_pauses: u64 = self
            .work_sessions
            .iter()
            .map(|session| u64::from(session.pause_count))
            .sum();
        let average_pauses = total_pauses as f64 / self.work_sessions.len() as f64;

        let paused_completion_rate = subset_completion_rate(
            self.work_sessions
                .iter()
                .filter(|session| session.pause_count > 0),
        );
        let no_pause_completion_rate = subset_completion_rate(
            self.work_sessions
                .iter()
                .filter(|session| session.pause_count == 0),
        );

        PauseAnalysis {
            average_pauses,
            paused_completion_rate,
            no_pause_completion_rate,
            pause_impact: no_pause_completion_rate - paused_completion_rate,
        }
    }
}

fn subset_completion_rate<'a>(sessions: impl Iterator<Item = &'a SessionRecord>) -> f64 {
    let mut total = 0u32;
    let mut completed = 0u32;
    for session in sessions {
        total += 1;
        if session.was_completed {
            completed += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(total)
}
