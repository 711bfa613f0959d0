use async_trait::async_trait;
use factify_core::session::SessionContext;
use factify_providers::request::HttpRequest;
use factify_providers::runtime::HttpResponse;
use std::time::Duration;

/// Raw request execution. Production uses reqwest; tests plug in fakes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse>;
}

/// The identity collaborator. It owns the credential; the engine only reads it
/// and asks for a refresh after a 401.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn session(&self) -> SessionContext;

    fn token(&self) -> Option<String>;

    /// Refreshes the credential if it expires within `min_validity`.
    ///
    /// `Ok(true)` means a fresh token is now available from `token()`.
    async fn refresh(&self, min_validity: Duration) -> anyhow::Result<bool>;
}

/// Identity for callers that never sign in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl IdentityProvider for Anonymous {
    fn session(&self) -> SessionContext {
        SessionContext::anonymous()
    }

    fn token(&self) -> Option<String> {
        None
    }

    async fn refresh(&self, _min_validity: Duration) -> anyhow::Result<bool> {
        Ok(false)
    }
}
