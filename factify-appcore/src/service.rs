use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use factify_core::config::ClientConfig;
use factify_core::error::AnalysisError;
use factify_core::payload::{ImageDetection, PredictionRecord, UserProfile};
use factify_core::session::SessionContext;
use factify_core::types::{AnalysisKind, AnalysisRequest, UploadFile};
use factify_engine::client::AnalysisClient;
use factify_engine::dispatcher::{Dispatch, ResultSlots};
use factify_engine::outcome::AnalysisOutcome;
use factify_engine::social::SocialFeed;
use factify_engine::traits::IdentityProvider;
use factify_runtime::client_factory::build_client_from_config;
use factify_runtime::config_store::ConfigStore;
use factify_runtime::history::{HistoryEntry, HistoryStore};
use factify_runtime::identity::{StoredSession, TokenClaims, env_token};
use factify_runtime::paths::history_path_for;
use factify_runtime::secrets::{SecretStore, secret_store_for};

const SUMMARY_CHARS: usize = 80;

/// Everything a front end needs: config, identity, one analysis client and
/// the local history.
#[derive(Clone)]
pub struct AnalysisService {
    config_store: ConfigStore,
    history: HistoryStore,
    config: ClientConfig,
    client: AnalysisClient,
    secrets: Arc<dyn SecretStore>,
}

impl AnalysisService {
    /// Loads config (with environment overrides) and builds the client.
    pub fn open(
        config_path: PathBuf,
        identity: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let secrets = secret_store_for(&config_path);
        Self::open_with_store(config_path, identity, secrets)
    }

    /// Same as `open` with the stored access token as identity. An unusable
    /// keyring leaves the session anonymous instead of failing.
    pub fn open_with_keyring(config_path: PathBuf) -> anyhow::Result<Self> {
        let secrets = secret_store_for(&config_path);
        let identity = Arc::new(StoredSession::load(secrets.as_ref()));
        Self::open_with_store(config_path, identity, secrets)
    }

    pub fn open_with_store(
        config_path: PathBuf,
        identity: Arc<dyn IdentityProvider>,
        secrets: Arc<dyn SecretStore>,
    ) -> anyhow::Result<Self> {
        let config_store = ConfigStore::at_path(config_path);
        let config = config_store.load_effective()?;
        let history = HistoryStore::at_path(history_path_for(config_store.path()))
            .with_max_entries(config.history_max_entries);
        let client = build_client_from_config(&config, identity)?;
        Ok(Self {
            config_store,
            history,
            config,
            client,
            secrets,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    pub fn session(&self) -> SessionContext {
        self.client.session()
    }

    pub fn results(&self) -> ResultSlots {
        self.client.results()
    }

    pub fn sign_in(&self, token: &str) -> anyhow::Result<TokenClaims> {
        StoredSession::sign_in(self.secrets.as_ref(), token)
    }

    /// Returns whether `FACTIFY_TOKEN` still supplies a token afterwards.
    pub fn sign_out(&self) -> anyhow::Result<bool> {
        StoredSession::sign_out(self.secrets.as_ref())?;
        Ok(env_token().is_some())
    }

    pub async fn analyze(&self, kind: AnalysisKind, request: AnalysisRequest) -> AnalysisOutcome {
        self.analyze_with_hook(kind, request, |_stage| async {})
            .await
    }

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
        let summary = request.summary(SUMMARY_CHARS);
        let outcome = self.client.analyze_with_hook(kind, request, on_stage).await;

        if self.config.history_enabled && should_record(&outcome) {
            let entry = HistoryEntry {
                ts_unix_ms: now_unix_ms(),
                kind,
                task_id: outcome.task_id.as_ref().map(|t| t.as_str().to_string()),
                input_summary: summary,
                outcome: outcome.stage_label().to_string(),
                error: outcome.error_message(),
            };
            // History is a convenience; a write failure must not hide the result.
            if let Err(e) = self.history.append(entry) {
                log::warn!("failed to record history: {e:#}");
            }
        }

        outcome
    }

    pub async fn detect_image(&self, image: &UploadFile) -> Result<ImageDetection, AnalysisError> {
        self.client.detect_image(image).await
    }

    pub async fn profile(&self) -> Result<UserProfile, AnalysisError> {
        self.client.profile().await
    }

    pub async fn predictions(&self) -> Result<Vec<PredictionRecord>, AnalysisError> {
        self.client.predictions().await
    }

    pub fn social(&self) -> SocialFeed {
        self.client.social()
    }

    pub fn history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        self.history.load()
    }

    pub fn clear_history(&self) -> anyhow::Result<()> {
        self.history.clear()
    }

    pub fn shutdown(&self) {
        self.client.shutdown();
    }
}

/// Input that never left the machine, and loops a newer request replaced,
/// are not worth remembering.
fn should_record(outcome: &AnalysisOutcome) -> bool {
    !matches!(outcome.dispatch, Dispatch::Stale)
        && !matches!(outcome.result, Err(AnalysisError::Validation(_)))
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
