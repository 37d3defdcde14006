//! JSON output for scan results and history.
//!
//! Serializes the raw records for scripting and piping. Image bytes are
//! never included, only artifact metadata.

use std::sync::Arc;

use serde::Serialize;

use crate::scan::result::ScanResult;

pub fn render_result(result: &ScanResult) -> String {
    to_json(result)
}

pub fn render_history(entries: &[Arc<ScanResult>]) -> String {
    to_json(&entries)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HistoryStore;

    #[test]
    fn history_renders_as_array() {
        let store = HistoryStore::seeded();
        let json: serde_json::Value = serde_json::from_str(&render_history(&store.to_vec())).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["id"], "scan-001");
        assert_eq!(entries[0]["health_status"], "warning");
        assert_eq!(entries[1]["issues"][0]["severity"], "low");
    }

    #[test]
    fn result_timestamp_is_rfc3339() {
        let store = HistoryStore::seeded();
        let json: serde_json::Value =
            serde_json::from_str(&render_result(store.get("scan-002").unwrap())).unwrap();
        assert_eq!(json["timestamp"], "2025-07-05T00:00:00Z");
    }
}
