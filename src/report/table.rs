//! Plain-text rendering for scan results and history.

use super::{HistoryRow, ResultView};

pub fn render_result(view: &ResultView) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{} [{}]\n", view.crop_type, view.status.label));
    output.push_str(&"-".repeat(50));
    output.push('\n');
    output.push_str(&format!("  {:<16} {}\n", "Health score:", view.score));
    output.push_str(&format!("  {:<16} {}\n", "Crop type:", view.crop_type));
    output.push_str(&format!("  {:<16} {}\n", "Scan date:", view.date));
    output.push_str(&format!("  {:<16} {}\n", "Image:", view.image));
    output.push_str(&format!("  {:<16} {}\n", "Scan id:", view.id));

    output.push_str("\nDetected Issues\n");
    if view.issues.is_empty() {
        output.push_str("  none\n");
    }
    for issue in &view.issues {
        output.push_str(&format!("  * {} ({})\n", issue.title, issue.badge.label));
        output.push_str(&format!("    {}\n", issue.description));
    }

    output.push_str("\nRecommendations\n");
    if view.recommendations.is_empty() {
        output.push_str("  none\n");
    }
    for rec in &view.recommendations {
        output.push_str(&format!("  * {}\n", rec.title));
        output.push_str(&format!("    {}\n", rec.description));
    }

    output
}

pub fn render_history(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return String::from("No scan history yet. Your previous scans will appear here.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<24} {:<12} {:<16} {:>8}  {}\n",
        "ID", "Crop", "Date", "Score", "Issues"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for row in rows {
        output.push_str(&format!(
            "{:<24} {:<12} {:<16} {:>8}  {}\n",
            truncate(&row.id, 24),
            truncate(&row.crop_type, 12),
            row.date,
            row.score,
            row.issues
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
