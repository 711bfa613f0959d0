use crate::traits::{HttpTransport, IdentityProvider};
use factify_core::error::AnalysisError;
use factify_core::session::AuthContext;
use factify_providers::parse::error_message;
use factify_providers::request::HttpRequest;
use factify_providers::runtime::HttpResponse;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Minimum remaining lifetime requested when refreshing after a 401.
const REFRESH_MIN_VALIDITY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("session expired")]
    SessionExpired,

    #[error("HTTP {status}")]
    Http {
        status: u16,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Maps onto the analysis taxonomy. `on_http` decides what a plain non-2xx
    /// means at the call site (submission vs. status query).
    pub fn into_analysis(self, on_http: fn(String) -> AnalysisError) -> AnalysisError {
        match self {
            TransportError::NotAuthenticated => AnalysisError::AuthRequired,
            TransportError::SessionExpired => AnalysisError::SessionExpired,
            TransportError::Http { status: 401, .. } => AnalysisError::AuthRequired,
            TransportError::Http { status, message } => {
                on_http(message.unwrap_or_else(|| format!("HTTP {status}")))
            }
            TransportError::Network(msg) => AnalysisError::Transport(msg),
        }
    }
}

/// A request that could not be built, e.g. an unusable base URL.
pub fn unbuildable(e: anyhow::Error) -> AnalysisError {
    AnalysisError::Transport(format!("{e:#}"))
}

/// Backend transport: base URL, bearer attachment and the single
/// refresh-then-retry on 401.
#[derive(Clone)]
pub struct ApiTransport {
    http: Arc<dyn HttpTransport>,
    identity: Arc<dyn IdentityProvider>,
    base_url: String,
}

impl std::fmt::Debug for ApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiTransport {
    pub fn new(
        http: Arc<dyn HttpTransport>,
        identity: Arc<dyn IdentityProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            identity,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub async fn send(
        &self,
        mut req: HttpRequest,
        auth: AuthContext,
    ) -> Result<HttpResponse, TransportError> {
        if auth.require_auth {
            let session = self.identity.session();
            let token = self
                .identity
                .token()
                .filter(|t| session.is_authenticated && !t.trim().is_empty())
                .ok_or(TransportError::NotAuthenticated)?;
            req.set_bearer(&token);
        }

        let resp = self.execute(&req).await?;

        if resp.status == 401 && self.identity.session().is_authenticated {
            log::info!("{} {} returned 401; refreshing credentials", req.method, req.url);
            match self.identity.refresh(REFRESH_MIN_VALIDITY).await {
                Ok(true) => {
                    if let Some(token) = self.identity.token() {
                        req.set_bearer(&token);
                        let retry = self.execute(&req).await?;
                        return check_status(retry);
                    }
                    log::warn!("refresh reported success but no token is available");
                }
                Ok(false) => log::warn!("credential refresh refused"),
                Err(e) => log::warn!("credential refresh failed: {e:#}"),
            }
            return Err(TransportError::SessionExpired);
        }

        check_status(resp)
    }

    async fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        log::debug!("-> {:?}", req);
        let resp = self.http.execute(req).await.map_err(|e| {
            log::warn!("request failed: {} {}: {e:#}", req.method, req.url);
            TransportError::Network(format!("{e:#}"))
        })?;
        log::debug!("<- {} {} status={}", req.method, req.url, resp.status);
        Ok(resp)
    }
}

fn check_status(resp: HttpResponse) -> Result<HttpResponse, TransportError> {
    if resp.is_success() {
        return Ok(resp);
    }
    Err(TransportError::Http {
        status: resp.status,
        message: error_message(&resp.body),
    })
}
