use serde::{Deserialize, Serialize};

/// Backend message meaning "job accepted but not finished yet".
///
/// The backend reports in-progress jobs as a soft failure with exactly this
/// text; any other failure message on a status query is final.
pub const TASK_NOT_READY_MESSAGE: &str = "Task is not completed yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    AiDetection,
    Manipulation,
    FindSources,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::AiDetection,
        AnalysisKind::Manipulation,
        AnalysisKind::FindSources,
    ];

    /// Path segment shared by the submit and poll endpoints.
    pub fn endpoint(self) -> &'static str {
        match self {
            AnalysisKind::AiDetection => "ai",
            AnalysisKind::Manipulation => "manipulation",
            AnalysisKind::FindSources => "find_sources",
        }
    }

    pub fn submit_path(self) -> String {
        format!("/analysis/{}", self.endpoint())
    }

    /// Human label used in default error messages.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisKind::AiDetection => "AI detection",
            AnalysisKind::Manipulation => "manipulation",
            AnalysisKind::FindSources => "source",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ai" | "ai_detection" | "ai-detection" => Some(AnalysisKind::AiDetection),
            "manipulation" => Some(AnalysisKind::Manipulation),
            "sources" | "find_sources" | "find-sources" => Some(AnalysisKind::FindSources),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// What the user asked to analyse. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    Text(String),
    File(UploadFile),
}

impl AnalysisRequest {
    pub fn text(value: impl Into<String>) -> Self {
        AnalysisRequest::Text(value.into())
    }

    pub fn file(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        AnalysisRequest::File(UploadFile {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        })
    }

    /// Blank text and empty files carry nothing to analyse.
    pub fn is_empty(&self) -> bool {
        match self {
            AnalysisRequest::Text(t) => t.trim().is_empty(),
            AnalysisRequest::File(f) => f.bytes.is_empty(),
        }
    }

    /// Short description for logs and local history.
    pub fn summary(&self, max_chars: usize) -> String {
        match self {
            AnalysisRequest::Text(t) => truncate_chars(t.trim(), max_chars),
            AnalysisRequest::File(f) => format!("file:{} ({} bytes)", f.filename, f.bytes.len()),
        }
    }
}

/// Identifies a job the backend accepted. Dropped once polling ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: TaskId,
    pub kind: AnalysisKind,
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_paths_follow_backend_layout() {
        assert_eq!(AnalysisKind::AiDetection.submit_path(), "/analysis/ai");
        assert_eq!(
            AnalysisKind::FindSources.submit_path(),
            "/analysis/find_sources"
        );
    }

    #[test]
    fn parses_kind_aliases() {
        assert_eq!(AnalysisKind::parse("AI"), Some(AnalysisKind::AiDetection));
        assert_eq!(
            AnalysisKind::parse("sources"),
            Some(AnalysisKind::FindSources)
        );
        assert_eq!(AnalysisKind::parse("image"), None);
    }

    #[test]
    fn blank_text_and_empty_file_are_empty() {
        assert!(AnalysisRequest::text("   \n\t").is_empty());
        assert!(AnalysisRequest::file("a.txt", "text/plain", vec![]).is_empty());
        assert!(!AnalysisRequest::text(" hi ").is_empty());
        assert!(!AnalysisRequest::file("a.txt", "text/plain", vec![b'x']).is_empty());
    }

    #[test]
    fn summary_truncates_long_text() {
        let req = AnalysisRequest::text("abcdefgh");
        assert_eq!(req.summary(4), "abcd...");
        assert_eq!(req.summary(20), "abcdefgh");
    }
}
