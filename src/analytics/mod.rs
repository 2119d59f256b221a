pub mod analyzer;
pub mod insights;

pub use analyzer::{
    BucketStats, DurationAnalysis, FocusAnalyzer, PauseAnalysis, TimeOfDayAnalysis, WeeklyAnalysis,
};
pub use insights::SuggestionGenerator;

/// How many recorded sessions the presentation layer should wait for before
/// offering insights. Not enforced here; small inputs are always valid.
pub const MIN_SESSIONS_FOR_ANALYSIS: usize = 5;
