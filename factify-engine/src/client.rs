use crate::account;
use crate::dispatcher::{CancelToken, Dispatch, ResultBoard, ResultSlots};
use crate::outcome::{AnalysisOutcome, AnalysisTimings, ms};
use crate::poller::{PollState, poll_until_done};
use crate::social::SocialFeed;
use crate::submitter::{submit, validate};
use crate::traits::{HttpTransport, IdentityProvider};
use crate::transport::ApiTransport;
use factify_core::config::PollPolicy;
use factify_core::error::AnalysisError;
use factify_core::payload::{ImageDetection, PredictionRecord, ResultPayload, UserProfile};
use factify_core::session::{AuthContext, SessionContext};
use factify_core::types::{AnalysisKind, AnalysisRequest, JobHandle, UploadFile};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub const STAGE_SUBMITTING: &str = "submitting";
pub const STAGE_POLLING: &str = "polling";
pub const STAGE_DONE: &str = "done";
pub const STAGE_FAILED: &str = "failed";

/// One client per hosting context. Every analysis kind shares the same
/// submit/poll/dispatch path; only the endpoint and payload shape differ.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    transport: ApiTransport,
    policy: PollPolicy,
    board: Arc<ResultBoard>,
}

impl AnalysisClient {
    pub fn new(
        http: Arc<dyn HttpTransport>,
        identity: Arc<dyn IdentityProvider>,
        base_url: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            transport: ApiTransport::new(http, identity, base_url),
            policy,
            board: Arc::new(ResultBoard::new()),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn session(&self) -> SessionContext {
        self.transport.identity().session()
    }

    pub fn board(&self) -> &ResultBoard {
        &self.board
    }

    pub fn results(&self) -> ResultSlots {
        self.board.snapshot()
    }

    pub async fn submit(
        &self,
        kind: AnalysisKind,
        request: &AnalysisRequest,
        auth: AuthContext,
    ) -> Result<JobHandle, AnalysisError> {
        submit(&self.transport, kind, request, auth).await
    }

    pub async fn poll(
        &self,
        handle: &JobHandle,
        auth: AuthContext,
        cancel: &mut CancelToken,
    ) -> Result<ResultPayload, AnalysisError> {
        poll_until_done(&self.transport, handle, auth, self.policy, cancel).await
    }

    /// Submits, polls and routes the result. Never fails; every error ends up
    /// in the returned outcome and on the board.
    pub async fn analyze(&self, kind: AnalysisKind, request: AnalysisRequest) -> AnalysisOutcome {
        self.analyze_with_hook(kind, request, |_stage| async {})
            .await
    }

    /// Same as `analyze`, but reports stage changes for progress display.
    ///
    /// The hook must be fast.
    pub async fn analyze_with_hook<F, Fut>(
        &self,
        kind: AnalysisKind,
        request: AnalysisRequest,
        on_stage: F,
    ) -> AnalysisOutcome
    where
        F: Fn(&'static str) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Err(e) = validate(&request) {
            let msg = e.to_string();
            self.board.show_error(msg.clone());
            on_stage(STAGE_FAILED).await;
            return AnalysisOutcome::rejected(kind, e, Dispatch::Error(msg));
        }

        let auth = self.session().auth();
        let ticket = self.board.begin(kind);
        let mut cancel = ticket.cancel_token();
        let mut timings = AnalysisTimings::default();

        on_stage(STAGE_SUBMITTING).await;
        let t0 = Instant::now();
        let submitted = submit(&self.transport, kind, &request, auth).await;
        timings.submit_ms = Some(ms(t0.elapsed()));

        let handle = match submitted {
            Ok(h) => h,
            Err(e) => {
                let result = Err(e);
                let dispatch = self.board.dispatch(&ticket, &result);
                on_stage(STAGE_FAILED).await;
                return AnalysisOutcome {
                    kind,
                    task_id: None,
                    result,
                    dispatch,
                    final_state: None,
                    timings,
                };
            }
        };

        on_stage(STAGE_POLLING).await;
        let p0 = Instant::now();
        let result =
            poll_until_done(&self.transport, &handle, auth, self.policy, &mut cancel).await;
        timings.poll_ms = Some(ms(p0.elapsed()));

        let dispatch = self.board.dispatch(&ticket, &result);
        match &dispatch {
            Dispatch::Shown(_) => on_stage(STAGE_DONE).await,
            Dispatch::Stale => {}
            _ => on_stage(STAGE_FAILED).await,
        }
        if let Err(e) = &result {
            if !matches!(e, AnalysisError::Superseded) {
                log::warn!("{kind} analysis ended with {}: {e}", e.code());
            }
        }

        AnalysisOutcome {
            kind,
            task_id: Some(handle.job_id),
            final_state: PollState::of(&result),
            result,
            dispatch,
            timings,
        }
    }

    pub async fn detect_image(&self, image: &UploadFile) -> Result<ImageDetection, AnalysisError> {
        account::detect_image(&self.transport, image, self.session().auth()).await
    }

    pub async fn profile(&self) -> Result<UserProfile, AnalysisError> {
        account::fetch_profile(&self.transport).await
    }

    pub async fn predictions(&self) -> Result<Vec<PredictionRecord>, AnalysisError> {
        account::fetch_predictions(&self.transport).await
    }

    pub fn social(&self) -> SocialFeed {
        SocialFeed::new(self.transport.clone())
    }

    /// Stops every in-flight poll loop without letting it write results.
    pub fn shutdown(&self) {
        self.board.cancel_all();
    }
}
