use crate::dispatcher::Dispatch;
use crate::poller::PollState;
use factify_core::error::AnalysisError;
use factify_core::payload::ResultPayload;
use factify_core::types::{AnalysisKind, TaskId};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisTimings {
    pub submit_ms: Option<u64>,
    pub poll_ms: Option<u64>,
}

/// Everything one submit-and-poll run produced, already routed to the board.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub kind: AnalysisKind,
    pub task_id: Option<TaskId>,
    pub result: Result<ResultPayload, AnalysisError>,
    pub dispatch: Dispatch,
    pub final_state: Option<PollState>,
    pub timings: AnalysisTimings,
}

impl AnalysisOutcome {
    pub(crate) fn rejected(kind: AnalysisKind, error: AnalysisError, dispatch: Dispatch) -> Self {
        Self {
            kind,
            task_id: None,
            result: Err(error),
            dispatch,
            final_state: None,
            timings: AnalysisTimings::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn needs_sign_in(&self) -> bool {
        matches!(self.dispatch, Dispatch::LoginPrompt)
    }

    /// Stable label for UI display and history.
    pub fn stage_label(&self) -> &'static str {
        match (&self.result, &self.dispatch) {
            (_, Dispatch::Stale) => "superseded",
            (Ok(_), _) => "done",
            (Err(AnalysisError::Timeout { .. }), _) => "timed_out",
            (Err(_), Dispatch::LoginPrompt) => "sign_in",
            (Err(_), _) => "failed",
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.result {
            Ok(_) => None,
            Err(e) => Some(e.user_message(self.kind.label())),
        }
    }
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
