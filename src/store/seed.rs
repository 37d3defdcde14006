//! Example scans shown in a fresh session.

use chrono::{TimeZone, Utc};

use crate::scan::result::{
    HealthScore, HealthStatus, ImageRef, Issue, Recommendation, ScanResult, Severity,
};

/// Seed entries, newest first.
pub fn examples() -> Vec<ScanResult> {
    vec![
        ScanResult {
            id: "scan-001".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 7, 10, 0, 0, 0).single().unwrap_or_default(),
            image: ImageRef::Asset { path: "/images/crop-spraying.jpeg".to_string() },
            crop_type: "Rice".to_string(),
            health_status: HealthStatus::Warning,
            health_score: HealthScore::saturating(65),
            issues: vec![
                Issue::new(
                    "Leaf Discoloration",
                    "Yellow patches detected on leaves indicating possible nutrient deficiency",
                    Severity::Medium,
                ),
                Issue::new(
                    "Early Stage Pest",
                    "Signs of stem borer infestation detected",
                    Severity::Medium,
                ),
            ],
            recommendations: vec![
                Recommendation::new(
                    "Apply Nitrogen Fertilizer",
                    "Recommended application: 5kg/acre of urea within 3-5 days",
                ),
                Recommendation::new(
                    "Pest Management",
                    "Apply neem-based organic pesticide to control early stage infestation",
                ),
                Recommendation::new(
                    "Adjust Irrigation",
                    "Maintain consistent moisture levels to support recovery",
                ),
            ],
        },
        ScanResult {
            id: "scan-002".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).single().unwrap_or_default(),
            image: ImageRef::Asset { path: "/images/farmer-harvesting.jpeg".to_string() },
            crop_type: "Wheat".to_string(),
            health_status: HealthStatus::Healthy,
            health_score: HealthScore::saturating(92),
            issues: vec![Issue::new(
                "Minor Water Stress",
                "Slight signs of water stress detected in some areas",
                Severity::Low,
            )],
            recommendations: vec![
                Recommendation::new(
                    "Maintain Current Practices",
                    "Continue with current management as crop is in excellent condition",
                ),
                Recommendation::new(
                    "Slight Irrigation Adjustment",
                    "Consider 5% increase in irrigation frequency during hot days",
                ),
            ],
        },
    ]
}
