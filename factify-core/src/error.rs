use thiserror::Error;

/// Everything that can end a submit-and-poll operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("{0}")]
    Submission(String),

    #[error("malformed backend response: {0}")]
    Protocol(String),

    #[error("{0}")]
    PollFailure(String),

    #[error("analysis timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("request failed: {0}")]
    Transport(String),

    /// A newer submission of the same kind (or teardown) replaced this one.
    #[error("superseded by a newer submission")]
    Superseded,
}

impl AnalysisError {
    /// Errors the UI answers with a sign-in prompt instead of a banner.
    pub fn needs_sign_in(&self) -> bool {
        matches!(
            self,
            AnalysisError::AuthRequired | AnalysisError::SessionExpired
        )
    }

    /// Short stable tag for logs.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::AuthRequired => "auth_required",
            AnalysisError::Submission(_) => "submission",
            AnalysisError::Protocol(_) => "protocol",
            AnalysisError::PollFailure(_) => "poll_failure",
            AnalysisError::Timeout { .. } => "timeout",
            AnalysisError::SessionExpired => "session_expired",
            AnalysisError::Transport(_) => "transport",
            AnalysisError::Superseded => "superseded",
        }
    }

    /// Message shown to the end user. Timeouts and backend failures read alike
    /// here; `code` keeps them apart.
    pub fn user_message(&self, kind_label: &str) -> String {
        match self {
            AnalysisError::Timeout { .. } => {
                format!("{} analysis timed out. Please try again.", capitalize(kind_label))
            }
            other => other.to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
