use anyhow::Context;
use factify_core::payload::{
    ImageDetection, JobStatus, PredictionRecord, ResultPayload, UserProfile,
};
use factify_core::social::{AnalysisSummary, Comment, Post};
use factify_core::types::{AnalysisKind, TASK_NOT_READY_MESSAGE};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "taskId")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn parse_start_response(body: &[u8]) -> anyhow::Result<StartResponse> {
    serde_json::from_slice(body).context("decode job start JSON")
}

pub fn parse_status_response(body: &[u8]) -> anyhow::Result<StatusResponse> {
    serde_json::from_slice(body).context("decode job status JSON")
}

/// Maps one status response onto the job state machine.
///
/// Only a `success=false` carrying a message other than the not-ready
/// sentinel is a failure. Missing or empty `data` keeps the job pending.
/// Errors only when `data` is present but does not fit `kind`.
pub fn interpret_status(kind: AnalysisKind, resp: StatusResponse) -> anyhow::Result<JobStatus> {
    if resp.success {
        return match resp.data {
            Some(data) if !is_empty_payload(&data) => {
                let payload = ResultPayload::from_value(kind, data)
                    .with_context(|| format!("decode {kind} result payload"))?;
                Ok(JobStatus::Completed(payload))
            }
            _ => Ok(JobStatus::Pending),
        };
    }

    match resp.message {
        Some(msg) if msg != TASK_NOT_READY_MESSAGE => Ok(JobStatus::Failed(msg)),
        _ => Ok(JobStatus::Pending),
    }
}

pub fn is_empty_payload(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(m) => m.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub fn parse_image_detection(body: &[u8]) -> anyhow::Result<ImageDetection> {
    serde_json::from_slice(body).context("decode image detection JSON")
}

pub fn parse_user_profile(body: &[u8]) -> anyhow::Result<UserProfile> {
    serde_json::from_slice(body).context("decode user profile JSON")
}

/// The history endpoint is loosely typed; anything that is not a list reads
/// as no history.
pub fn parse_predictions(body: &[u8]) -> anyhow::Result<Vec<PredictionRecord>> {
    let value: serde_json::Value =
        serde_json::from_slice(body).context("decode predictions JSON")?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).context("decode prediction record"))
            .collect(),
        _ => Ok(vec![]),
    }
}

/// Acknowledgement returned by every social write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SocialAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "postId")]
    pub post_id: Option<String>,
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn parse_social_ack(body: &[u8]) -> anyhow::Result<SocialAck> {
    serde_json::from_slice(body).context("decode social response JSON")
}

pub fn parse_feed(body: &[u8]) -> anyhow::Result<Vec<Post>> {
    parse_list(body, "feed")
}

pub fn parse_comments(body: &[u8]) -> anyhow::Result<Vec<Comment>> {
    parse_list(body, "comments")
}

pub fn parse_my_analyses(body: &[u8]) -> anyhow::Result<Vec<AnalysisSummary>> {
    parse_list(body, "analysis summaries")
}

fn parse_list<T: DeserializeOwned>(body: &[u8], what: &str) -> anyhow::Result<Vec<T>> {
    serde_json::from_slice(body).with_context(|| format!("decode {what} JSON"))
}

/// Best-effort extraction of a human message from an error body.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "description"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
