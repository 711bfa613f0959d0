use std::sync::Arc;

use anyhow::Context;
use factify_core::config::ClientConfig;
use factify_engine::client::AnalysisClient;
use factify_engine::traits::IdentityProvider;
use factify_providers::endpoints::validate_base_url;
use factify_providers::runtime::HttpExecutor;

use crate::http::ReqwestTransport;

/// Build a ready client from config and an identity.
pub fn build_client_from_config(
    cfg: &ClientConfig,
    identity: Arc<dyn IdentityProvider>,
) -> anyhow::Result<AnalysisClient> {
    let base_url = validate_base_url(&cfg.base_url)
        .with_context(|| format!("configured base_url is unusable: {}", cfg.base_url))?;
    let executor = HttpExecutor::new(cfg.connect_timeout(), cfg.request_timeout())?;
    let policy = cfg.poll_policy();

    log::info!(
        "analysis client for {base_url} (poll every {:?}, at most {} attempts)",
        policy.interval,
        policy.max_attempts
    );

    Ok(AnalysisClient::new(
        Arc::new(ReqwestTransport::new(executor)),
        identity,
        base_url,
        policy,
    ))
}
