use super::analyzer::{max_entry, min_entry, FocusAnalyzer};

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn weekday_name(day: u32) -> &'static str {
    WEEKDAY_NAMES.get(day as usize).copied().unwrap_or("Unknown")
}

/// Turns aggregate statistics into ordered, human-readable statements.
/// Insights describe what happened; recommendations suggest what to change.
pub struct SuggestionGenerator<'a> {
    analyzer: &'a FocusAnalyzer,
}

impl<'a> SuggestionGenerator<'a> {
    pub fn new(analyzer: &'a FocusAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn generate_insights(&self) -> Vec<String> {
        let mut insights = Vec::new();

        let completion_rate = self.analyzer.completion_rate();
        insights.push(format!(
            "Overall completion rate: {:.1}%",
            completion_rate * 100.0
        ));

        let time_analysis = self.analyzer.analyze_time_of_day();
        if let Some(best_hour) = time_analysis.best_hour {
            let best_rate = time_analysis
                .completion_rates
                .get(&best_hour)
                .copied()
                .unwrap_or_default()
                * 100.0;
            insights.push(format!(
                "Your focus is strongest at {best_hour}:00 ({best_rate:.1}% completion)"
            ));
        }

        let pause_analysis = self.analyzer.analyze_pause_patterns();
        if pause_analysis.pause_impact > 0.1 {
            insights.push(format!(
                "Sessions without pauses have {:.1}% higher completion rate",
                pause_analysis.pause_impact * 100.0
            ));
        } else if pause_analysis.pause_impact < -0.1 {
            insights.push("Taking breaks during sessions may help maintain focus".to_string());
        }

        let weekly_analysis = self.analyzer.analyze_weekly_pattern();
        if let (Some((best_day, best_rate)), Some((worst_day, worst_rate))) = (
            max_entry(&weekly_analysis.completion_by_weekday),
            min_entry(&weekly_analysis.completion_by_weekday),
        ) {
            insights.push(format!(
                "Best day: {} ({:.1}% completion)",
                weekday_name(best_day),
                best_rate * 100.0
            ));
            insights.push(format!(
                "Most challenging day: {} ({:.1}% completion)",
                weekday_name(worst_day),
                worst_rate * 100.0
            ));
        }

        let duration_analysis = self.analyzer.analyze_duration_patterns();
        if duration_analysis.average_duration > 0.0 {
            insights.push(format!(
                "Average session duration: {:.1} minutes",
                duration_analysis.average_duration / 60.0
            ));
        }

        insights
    }

    pub fn generate_recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();

        if self.analyzer.completion_rate() < 0.5 {
            recommendations
                .push("Try shorter work sessions to improve completion rate".to_string());
        }

        let time_analysis = self.analyzer.analyze_time_of_day();
        if let Some(best_hour) = time_analysis.best_hour {
            recommendations.push(format!(
                "Schedule important tasks around {best_hour}:00 for maximum focus"
            ));
        }

        let pause_analysis = self.analyzer.analyze_pause_patterns();
        if pause_analysis.average_pauses > 2.0 {
            recommendations
                .push("High pause frequency detected. Consider removing distractions".to_string());
        }

        if pause_analysis.pause_impact > 0.2 {
            recommendations.push(
                "Minimize interruptions - your uninterrupted sessions are much more successful"
                    .to_string(),
            );
        }

        recommendations
    }
}
