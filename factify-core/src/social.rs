use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One of the signed-in user's stored analyses, offered as a post attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: String,
    #[serde(default)]
    pub text_preview: String,
    #[serde(default = "unknown_label")]
    pub label: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Analysis attached to a feed post, resolved by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedAnalysis {
    #[serde(default = "unknown_label")]
    pub label: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub text_preview: String,
    #[serde(default)]
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default = "unknown_label")]
    pub username: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<AttachedAnalysis>,
    /// User ids that liked the post.
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Post {
    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    #[serde(default = "unknown_label")]
    pub username: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A post to share. Needs text, an analysis reference, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub content: Option<String>,
    pub analysis_id: Option<String>,
}

impl NewPost {
    /// Blank fields are dropped, so `{content: "  "}` is not a post.
    pub fn new(content: Option<String>, analysis_id: Option<String>) -> Result<Self, AnalysisError> {
        let post = Self {
            content: non_blank(content),
            analysis_id: non_blank(analysis_id),
        };
        if post.content.is_none() && post.analysis_id.is_none() {
            return Err(AnalysisError::Validation(
                "Post must contain content or analysis reference.".into(),
            ));
        }
        Ok(post)
    }
}

/// Rejects empty post edits and comment bodies before any request is made.
pub fn require_text(value: &str, what: &str) -> Result<(), AnalysisError> {
    if value.trim().is_empty() {
        return Err(AnalysisError::Validation(format!("{what} cannot be empty.")));
    }
    Ok(())
}

pub fn require_id(value: &str, what: &str) -> Result<(), AnalysisError> {
    if value.trim().is_empty() {
        return Err(AnalysisError::Validation(format!("{what} id is required.")));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn unknown_label() -> String {
    "Unknown".to_string()
}
