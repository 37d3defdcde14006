//! Result presentation.
//!
//! Pure mapping from a `ScanResult` to display fields: status badge,
//! score tone, severity badges and history rows. Visual metadata lives
//! here, keyed by the finite status/severity enums, never in the records.

pub mod json;
pub mod table;

use serde::Serialize;

use crate::scan::result::{HealthScore, HealthStatus, ScanResult, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Green,
    Amber,
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

pub fn status_badge(status: HealthStatus) -> Badge {
    match status {
        HealthStatus::Healthy => Badge { label: "Healthy", tone: Tone::Green },
        HealthStatus::Warning => Badge { label: "Needs Attention", tone: Tone::Amber },
        HealthStatus::Danger => Badge { label: "Critical Issues", tone: Tone::Red },
    }
}

pub fn severity_badge(severity: Severity) -> Badge {
    match severity {
        Severity::Low => Badge { label: "Low Severity", tone: Tone::Blue },
        Severity::Medium => Badge { label: "Medium Severity", tone: Tone::Amber },
        Severity::High => Badge { label: "High Severity", tone: Tone::Red },
    }
}

/// Score colour, independent of the reported status.
pub fn score_tone(score: HealthScore) -> Tone {
    match score.value() {
        81..=u8::MAX => Tone::Green,
        61..=80 => Tone::Amber,
        _ => Tone::Red,
    }
}

pub fn format_score(score: HealthScore) -> String {
    format!("{}/{}", score.value(), HealthScore::MAX)
}

pub fn issue_count_label(count: usize) -> String {
    if count == 1 {
        "1 issue detected".to_string()
    } else {
        format!("{count} issues detected")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueView {
    pub title: String,
    pub description: String,
    pub badge: Badge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationView {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub id: String,
    pub crop_type: String,
    pub date: String,
    pub status: Badge,
    pub score: String,
    pub score_value: u8,
    pub score_tone: Tone,
    pub image: String,
    pub issues: Vec<IssueView>,
    pub recommendations: Vec<RecommendationView>,
}

pub fn present(result: &ScanResult) -> ResultView {
    ResultView {
        id: result.id.clone(),
        crop_type: result.crop_type.clone(),
        date: result.date_label(),
        status: status_badge(result.health_status),
        score: format_score(result.health_score),
        score_value: result.health_score.value(),
        score_tone: score_tone(result.health_score),
        image: describe_image(result),
        issues: result
            .issues
            .iter()
            .map(|issue| IssueView {
                title: issue.title.clone(),
                description: issue.description.clone(),
                badge: severity_badge(issue.severity),
            })
            .collect(),
        recommendations: result
            .recommendations
            .iter()
            .map(|rec| RecommendationView {
                title: rec.title.clone(),
                description: rec.description.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub id: String,
    pub crop_type: String,
    pub date: String,
    pub score: String,
    pub tone: Tone,
    pub issues: String,
}

pub fn history_row(result: &ScanResult) -> HistoryRow {
    HistoryRow {
        id: result.id.clone(),
        crop_type: result.crop_type.clone(),
        date: result.date_label(),
        score: format_score(result.health_score),
        tone: status_badge(result.health_status).tone,
        issues: issue_count_label(result.issues.len()),
    }
}

fn describe_image(result: &ScanResult) -> String {
    use crate::scan::result::ImageRef;

    match &result.image {
        ImageRef::Artifact(artifact) => format!(
            "{} {}x{} ({})",
            artifact.source.as_str(),
            artifact.width,
            artifact.height,
            artifact.mime
        ),
        ImageRef::Asset { path } => path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed;

    #[test]
    fn status_badges() {
        assert_eq!(status_badge(HealthStatus::Healthy).label, "Healthy");
        assert_eq!(status_badge(HealthStatus::Warning).tone, Tone::Amber);
        assert_eq!(status_badge(HealthStatus::Danger).label, "Critical Issues");
    }

    #[test]
    fn score_tone_thresholds() {
        let tone = |v| score_tone(HealthScore::new(v).unwrap());
        assert_eq!(tone(81), Tone::Green);
        assert_eq!(tone(80), Tone::Amber);
        assert_eq!(tone(61), Tone::Amber);
        assert_eq!(tone(60), Tone::Red);
    }

    #[test]
    fn issue_count_plural() {
        assert_eq!(issue_count_label(0), "0 issues detected");
        assert_eq!(issue_count_label(1), "1 issue detected");
        assert_eq!(issue_count_label(2), "2 issues detected");
    }

    #[test]
    fn present_seed_entry() {
        let seeds = seed::examples();
        let view = present(&seeds[0]);
        assert_eq!(view.status.label, "Needs Attention");
        assert_eq!(view.score, "65/100");
        assert_eq!(view.score_tone, Tone::Amber);
        assert_eq!(view.date, "July 10, 2025");
        assert_eq!(view.image, "/images/crop-spraying.jpeg");
        assert_eq!(view.issues[0].badge.label, "Medium Severity");
        assert_eq!(view.recommendations.len(), 3);
    }

    #[test]
    fn present_is_repeatable() {
        let seeds = seed::examples();
        assert_eq!(present(&seeds[1]), present(&seeds[1]));
    }

    #[test]
    fn history_row_uses_status_tone() {
        let seeds = seed::examples();
        let row = history_row(&seeds[1]);
        assert_eq!(row.score, "92/100");
        assert_eq!(row.tone, Tone::Green);
        assert_eq!(row.issues, "1 issue detected");
    }
}
