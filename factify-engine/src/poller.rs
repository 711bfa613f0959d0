use crate::dispatcher::CancelToken;
use crate::transport::{ApiTransport, unbuildable};
use factify_core::config::PollPolicy;
use factify_core::error::AnalysisError;
use factify_core::payload::{JobStatus, ResultPayload};
use factify_core::session::AuthContext;
use factify_core::types::JobHandle;
use factify_providers::endpoints::build_status_request;
use factify_providers::parse::{interpret_status, parse_status_response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl PollState {
    /// Terminal state a finished poll loop ended in. `None` for loops that
    /// were abandoned or never reached the status endpoint.
    pub fn of(outcome: &Result<ResultPayload, AnalysisError>) -> Option<PollState> {
        match outcome {
            Ok(_) => Some(PollState::Completed),
            Err(AnalysisError::Timeout { .. }) => Some(PollState::TimedOut),
            Err(AnalysisError::Superseded) => None,
            Err(_) => Some(PollState::Failed),
        }
    }
}

/// Issues one status query and classifies the answer.
pub async fn query_status(
    transport: &ApiTransport,
    handle: &JobHandle,
    auth: AuthContext,
) -> Result<JobStatus, AnalysisError> {
    let req = build_status_request(transport.base_url(), handle).map_err(unbuildable)?;
    let resp = transport
        .send(req, auth)
        .await
        .map_err(|e| e.into_analysis(AnalysisError::PollFailure))?;

    let status =
        parse_status_response(&resp.body).map_err(|e| AnalysisError::Protocol(format!("{e:#}")))?;
    interpret_status(handle.kind, status).map_err(|e| AnalysisError::Protocol(format!("{e:#}")))
}

/// Polls `handle` until the backend reports a terminal status, the attempt
/// budget runs out, or `cancel` fires.
///
/// Attempts run strictly one after another; the sleep between them is the
/// only suspension point besides the request itself.
pub async fn poll_until_done(
    transport: &ApiTransport,
    handle: &JobHandle,
    auth: AuthContext,
    policy: PollPolicy,
    cancel: &mut CancelToken,
) -> Result<ResultPayload, AnalysisError> {
    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            log::debug!("{} task {} abandoned", handle.kind, handle.job_id);
            return Err(AnalysisError::Superseded);
        }

        match query_status(transport, handle, auth).await {
            Ok(JobStatus::Completed(payload)) => {
                log::info!(
                    "{} task {} completed after {attempt} status checks",
                    handle.kind,
                    handle.job_id
                );
                return Ok(payload);
            }
            Ok(JobStatus::Failed(message)) => {
                log::warn!("{} task {} failed: {message}", handle.kind, handle.job_id);
                return Err(AnalysisError::PollFailure(message));
            }
            Ok(JobStatus::Pending) => {}
            Err(e) => {
                log::warn!(
                    "{} task {} status check failed ({}): {e}",
                    handle.kind,
                    handle.job_id,
                    e.code()
                );
                return Err(e);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = cancel.cancelled() => {
                log::debug!("{} task {} abandoned while waiting", handle.kind, handle.job_id);
                return Err(AnalysisError::Superseded);
            }
        }
    }

    log::warn!(
        "{} task {} timed out after {} status checks",
        handle.kind,
        handle.job_id,
        policy.max_attempts
    );
    Err(AnalysisError::Timeout {
        attempts: policy.max_attempts,
    })
}
