//! Types for the diagnosis channel

use serde::{Deserialize, Serialize};

/// The only message type the bridge acts on
pub const DIAGNOSIS_TYPE: &str = "diagnosis";

/// Inbound instruction to navigate to one or more file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub recipient: String,
    pub payload: DiagnosisPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisPayload {
    /// Navigation order
    pub files: Vec<FileTarget>,
}

/// One file path plus the lines to visit in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTarget {
    pub path: String,
    /// 1-based line numbers, visited in order
    pub lines: Vec<u32>,
}

impl DiagnosisEvent {
    pub fn files(&self) -> &[FileTarget] {
        &self.payload.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event: DiagnosisEvent = serde_json::from_str(
            r#"{"type":"diagnosis","recipient":"Cursor","payload":{"files":[{"path":"/a.txt","lines":[5,7]}]}}"#,
        )
        .unwrap();

        assert_eq!(event.event_type, DIAGNOSIS_TYPE);
        assert_eq!(event.recipient, "Cursor");
        assert_eq!(
            event.files(),
            &[FileTarget {
                path: "/a.txt".to_string(),
                lines: vec![5, 7],
            }]
        );
    }

    #[test]
    fn test_negative_line_rejected() {
        let result = serde_json::from_str::<FileTarget>(r#"{"path":"/a.txt","lines":[-1]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_lines_rejected() {
        let result = serde_json::from_str::<FileTarget>(r#"{"path":"/a.txt"}"#);
        assert!(result.is_err());
    }
}
