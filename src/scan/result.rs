use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::artifact::ImageArtifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Danger,
}

impl HealthStatus {
    /// Fixed thresholds: above 80 is healthy, above 60 needs attention.
    pub fn from_score(score: HealthScore) -> Self {
        match score.value() {
            81..=u8::MAX => HealthStatus::Healthy,
            61..=80 => HealthStatus::Warning,
            _ => HealthStatus::Danger,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Danger => "danger",
        }
    }
}

/// Integer score in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HealthScore(u8);

impl HealthScore {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(HealthScore(value))
    }

    pub fn saturating(value: i64) -> Self {
        HealthScore(value.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Issue {
    pub fn new(title: &str, description: &str, severity: Severity) -> Self {
        Issue {
            title: title.to_string(),
            description: description.to_string(),
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

impl Recommendation {
    pub fn new(title: &str, description: &str) -> Self {
        Recommendation {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Image shown alongside a result: a captured artifact, or a bundled
/// asset path for the seeded examples.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageRef {
    Artifact(ImageArtifact),
    Asset { path: String },
}

/// Output of the analysis step. The orchestrator adds id, timestamp and image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub crop_type: String,
    pub health_status: HealthStatus,
    pub health_score: HealthScore,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub image: ImageRef,
    pub crop_type: String,
    pub health_status: HealthStatus,
    pub health_score: HealthScore,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
}

impl ScanResult {
    pub fn from_analysis(id: String, timestamp: DateTime<Utc>, image: ImageRef, analysis: Analysis) -> Self {
        ScanResult {
            id,
            timestamp,
            image,
            crop_type: analysis.crop_type,
            health_status: analysis.health_status,
            health_score: analysis.health_score,
            issues: analysis.issues,
            recommendations: analysis.recommendations,
        }
    }

    /// e.g. "July 10, 2025"
    pub fn date_label(&self) -> String {
        self.timestamp.format("%B %-d, %Y").to_string()
    }
}
