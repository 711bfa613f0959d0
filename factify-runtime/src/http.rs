use async_trait::async_trait;
use factify_engine::traits::HttpTransport;
use factify_providers::request::HttpRequest;
use factify_providers::runtime::{HttpExecutor, HttpResponse};

/// reqwest-backed transport used outside of tests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    executor: HttpExecutor,
}

impl ReqwestTransport {
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        log::debug!("{} {}", req.method, req.url);
        let resp = self.executor.execute(req).await?;
        log::debug!("{} {} -> {}", req.method, req.url, resp.status);
        Ok(resp)
    }
}
