use crate::types::AnalysisKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub prob_generated: f64,
    pub prob_human: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDetectionResult {
    pub text: String,
    pub ai_probability: f64,
    pub human_probability: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// category -> flagged fragment -> reasons
pub type ManipulationFindings = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManipulationResult {
    pub text: String,
    pub result: ManipulationFindings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ManipulationResult {
    pub fn flagged_fragments(&self) -> usize {
        self.result.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFinding {
    pub citation: String,
    pub status: String,
    pub category: String,
    pub analysis: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindSourcesResult {
    pub text: String,
    pub result: Vec<SourceFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Completed job data, tagged by the kind that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ResultPayload {
    AiDetection(AiDetectionResult),
    Manipulation(ManipulationResult),
    FindSources(FindSourcesResult),
}

impl ResultPayload {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            ResultPayload::AiDetection(_) => AnalysisKind::AiDetection,
            ResultPayload::Manipulation(_) => AnalysisKind::Manipulation,
            ResultPayload::FindSources(_) => AnalysisKind::FindSources,
        }
    }

    /// Decodes the backend's `data` object into the shape expected for `kind`.
    pub fn from_value(kind: AnalysisKind, data: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            AnalysisKind::AiDetection => ResultPayload::AiDetection(serde_json::from_value(data)?),
            AnalysisKind::Manipulation => {
                ResultPayload::Manipulation(serde_json::from_value(data)?)
            }
            AnalysisKind::FindSources => ResultPayload::FindSources(serde_json::from_value(data)?),
        })
    }
}

/// What one status query told us about a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Failed(String),
    Completed(ResultPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePredictions {
    pub ai: f64,
    pub real: f64,
    #[serde(flatten)]
    pub other: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDetection {
    pub filename: String,
    pub predictions: ImagePredictions,
    pub is_ai: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Entry of the server-side prediction history. The backend keeps these
/// loosely shaped, so only the commonly present fields are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

impl PredictionRecord {
    pub fn when(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.timestamp.as_deref())
    }
}
