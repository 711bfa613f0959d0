use crate::transport::{ApiTransport, unbuildable};
use factify_core::error::AnalysisError;
use factify_core::payload::{ImageDetection, PredictionRecord, UserProfile};
use factify_core::session::AuthContext;
use factify_core::types::UploadFile;
use factify_providers::endpoints::{
    USER_PROFILE_PATH, build_get, build_image_detect_request, build_predictions_request,
};
use factify_providers::parse::{parse_image_detection, parse_predictions, parse_user_profile};

pub(crate) fn protocol(e: anyhow::Error) -> AnalysisError {
    AnalysisError::Protocol(format!("{e:#}"))
}

/// Synchronous image check; the backend answers in the same request.
pub async fn detect_image(
    transport: &ApiTransport,
    image: &UploadFile,
    auth: AuthContext,
) -> Result<ImageDetection, AnalysisError> {
    if image.bytes.is_empty() {
        return Err(AnalysisError::Validation(
            "Please select an image to analyze".into(),
        ));
    }
    let req = build_image_detect_request(transport.base_url(), image);
    let resp = transport
        .send(req, auth)
        .await
        .map_err(|e| e.into_analysis(AnalysisError::Submission))?;
    parse_image_detection(&resp.body).map_err(protocol)
}

pub async fn fetch_profile(transport: &ApiTransport) -> Result<UserProfile, AnalysisError> {
    let req = build_get(transport.base_url(), USER_PROFILE_PATH);
    let resp = transport
        .send(req, AuthContext::REQUIRED)
        .await
        .map_err(|e| e.into_analysis(AnalysisError::Submission))?;
    parse_user_profile(&resp.body).map_err(protocol)
}

/// Server-side prediction history of the signed-in user.
pub async fn fetch_predictions(
    transport: &ApiTransport,
) -> Result<Vec<PredictionRecord>, AnalysisError> {
    let user_id = transport
        .identity()
        .session()
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or(AnalysisError::AuthRequired)?;

    let req = build_predictions_request(transport.base_url(), &user_id).map_err(unbuildable)?;
    let resp = transport
        .send(req, AuthContext::REQUIRED)
        .await
        .map_err(|e| e.into_analysis(AnalysisError::Submission))?;
    parse_predictions(&resp.body).map_err(protocol)
}
