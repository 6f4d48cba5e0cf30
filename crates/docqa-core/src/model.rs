//! Wire and display types for the document backend
//!
//! These mirror the JSON the backend returns. Only the fields the client
//! uses are required; everything else is optional and unknown fields are
//! ignored so the client keeps working when the backend grows.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Placeholder shown when the backend answers without any text
pub const EMPTY_ANSWER: &str = "No response generated.";

/// A document tracked by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u32>,
    /// Only present in the upload response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_created: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Document {
    /// Upload timestamp rendered in local time, or the raw value when it
    /// does not parse.
    pub fn uploaded_at_local(&self) -> String {
        let raw = self.uploaded_at.trim();
        if raw.is_empty() {
            return String::new();
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
        }

        // The backend writes naive isoformat() timestamps
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return dt.format("%Y-%m-%d %H:%M:%S").to_string();
        }

        raw.to_string()
    }

    /// Number of chunks the backend reports for this document, from
    /// whichever response carried it.
    pub fn chunks(&self) -> Option<u32> {
        self.chunk_count.or(self.chunks_created)
    }
}

/// Envelope of the document list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Byte progress of an in-flight upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadProgress {
    pub percent: u8,
}

impl UploadProgress {
    pub fn from_bytes(sent: u64, total: u64) -> Self {
        if total == 0 {
            return Self { percent: 100 };
        }
        let sent = sent.min(total);
        let percent = ((sent as f64 * 100.0) / total as f64).round() as u8;
        Self { percent: percent.min(100) }
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }
}

/// A previously asked question and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    /// Seconds, as reported by the backend. Display-only.
    #[serde(default)]
    pub time: Option<f64>,
}

impl HistoryEntry {
    pub fn time_label(&self) -> Option<String> {
        self.time.map(|t| format!("{:.2}s", t))
    }
}

/// Supporting excerpt returned with an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    #[serde(default)]
    pub chunk_text: String,
}

/// Response of the query endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceChunk>,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
}

impl QueryResult {
    pub fn answer_text(&self) -> &str {
        match self.answer.as_deref() {
            Some(a) if !a.is_empty() => a,
            _ => EMPTY_ANSWER,
        }
    }
}

/// Leading text of a document, as extracted by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentPreview {
    pub document_id: String,
    #[serde(default)]
    pub preview_text: String,
}
