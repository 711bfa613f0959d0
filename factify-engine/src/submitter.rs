use crate::transport::ApiTransport;
use factify_core::error::AnalysisError;
use factify_core::session::AuthContext;
use factify_core::types::{AnalysisKind, AnalysisRequest, JobHandle, TaskId};
use factify_providers::endpoints::build_submit_request;
use factify_providers::parse::parse_start_response;

pub const EMPTY_REQUEST_MESSAGE: &str = "Please enter some text or upload a file to analyze";

/// Rejects empty payloads before anything touches the network.
pub fn validate(request: &AnalysisRequest) -> Result<(), AnalysisError> {
    if request.is_empty() {
        return Err(AnalysisError::Validation(EMPTY_REQUEST_MESSAGE.into()));
    }
    Ok(())
}

/// Starts a backend job. Performs at most one network call.
pub async fn submit(
    transport: &ApiTransport,
    kind: AnalysisKind,
    request: &AnalysisRequest,
    auth: AuthContext,
) -> Result<JobHandle, AnalysisError> {
    validate(request)?;

    let req = build_submit_request(transport.base_url(), kind, request);
    let resp = transport
        .send(req, auth)
        .await
        .map_err(|e| e.into_analysis(AnalysisError::Submission))?;

    let start = parse_start_response(&resp.body)
        .map_err(|e| AnalysisError::Protocol(format!("{e:#}")))?;

    if !start.success {
        let message = start
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Failed to start {} analysis", kind.label()));
        return Err(AnalysisError::Submission(message));
    }

    let task_id = start
        .task_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AnalysisError::Protocol("job accepted without a taskId".into()))?;

    log::info!("{kind} job submitted: task_id={task_id}");
    Ok(JobHandle {
        job_id: TaskId::new(task_id),
        kind,
    })
}
