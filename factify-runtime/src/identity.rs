use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use factify_core::session::SessionContext;
use factify_engine::traits::IdentityProvider;
use serde::Deserialize;

use crate::secrets::{SecretKey, SecretStore};

pub const ENV_TOKEN: &str = "FACTIFY_TOKEN";

/// The claims the client reads from an access token. The signature is not
/// checked here; the backend does that on every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn decode(token: &str) -> anyhow::Result<Self> {
        let mut parts = token.trim().split('.');
        let payload = match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_)) => payload,
            _ => anyhow::bail!("access token is not a JWT"),
        };
        let raw = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .context("decode token payload")?;
        serde_json::from_slice(&raw).context("parse token claims")
    }

    pub fn is_expired_at(&self, now_unix_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_unix_secs)
    }
}

fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Non-blank `FACTIFY_TOKEN`, if set.
pub fn env_token() -> Option<String> {
    std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty())
}

/// Identity backed by a stored bearer token.
///
/// There is no token exchange, so `refresh` never succeeds and a rejected
/// token surfaces as "sign in again".
#[derive(Default)]
pub struct StoredSession {
    token: Option<String>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl StoredSession {
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// `FACTIFY_TOKEN` wins over the store so scripts can run without one.
    pub fn load(store: &dyn SecretStore) -> Self {
        Self::load_with(env_token(), store)
    }

    /// A store that cannot be read leaves the session anonymous; commands
    /// that need no account keep working.
    pub fn load_with(env_token: Option<String>, store: &dyn SecretStore) -> Self {
        if let Some(t) = env_token {
            log::debug!("using access token from {ENV_TOKEN}");
            return Self::with_token(Some(t));
        }
        match store.get(SecretKey::AccessToken) {
            Ok(token) => Self::with_token(token),
            Err(e) => {
                log::warn!("cannot read the stored access token, continuing signed out: {e:#}");
                Self::default()
            }
        }
    }

    /// Validates the token shape and persists it.
    pub fn sign_in(store: &dyn SecretStore, token: &str) -> anyhow::Result<TokenClaims> {
        let token = token.trim();
        let claims = TokenClaims::decode(token)?;
        anyhow::ensure!(
            !claims.is_expired_at(now_unix_secs()),
            "access token has already expired"
        );
        store.set(SecretKey::AccessToken, token)?;
        Ok(claims)
    }

    /// Forgets the stored token. A token from `FACTIFY_TOKEN` stays in effect.
    pub fn sign_out(store: &dyn SecretStore) -> anyhow::Result<()> {
        store.delete(SecretKey::AccessToken)
    }

    fn valid_claims(&self, now: i64) -> Option<(String, TokenClaims)> {
        let token = self.token.clone()?;
        match TokenClaims::decode(&token) {
            Ok(claims) if !claims.is_expired_at(now) => Some((token, claims)),
            Ok(_) => {
                log::debug!("stored access token has expired");
                None
            }
            Err(e) => {
                log::warn!("ignoring unreadable access token: {e:#}");
                None
            }
        }
    }

    pub fn session_at(&self, now: i64) -> SessionContext {
        match self.valid_claims(now) {
            Some((_, claims)) => SessionContext::signed_in(claims.sub, claims.preferred_username),
            None => SessionContext::anonymous(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StoredSession {
    fn session(&self) -> SessionContext {
        self.session_at(now_unix_secs())
    }

    fn token(&self) -> Option<String> {
        self.valid_claims(now_unix_secs()).map(|(token, _)| token)
    }

    async fn refresh(&self, _min_validity: Duration) -> anyhow::Result<bool> {
        Ok(false)
    }
}
