use serde::{Deserialize, Serialize};

/// Read-only view of the signed-in user, supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub is_authenticated: bool,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>, username: Option<String>) -> Self {
        Self {
            is_authenticated: true,
            user_id: Some(user_id.into()),
            username,
        }
    }

    /// Requests carry credentials whenever the user is signed in.
    pub fn auth(&self) -> AuthContext {
        AuthContext {
            require_auth: self.is_authenticated,
        }
    }
}

/// Per-request auth intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthContext {
    pub require_auth: bool,
}

impl AuthContext {
    pub const ANONYMOUS: AuthContext = AuthContext {
        require_auth: false,
    };
    pub const REQUIRED: AuthContext = AuthContext { require_auth: true };
}
