use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthProviderConfig;

/// Identity as verified by the managed auth provider, independent of any
/// application role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    /// Transport failure or timeout. Must never be conflated with
    /// "not logged in".
    #[error("auth provider unreachable: {0}")]
    Unreachable(String),
    #[error("auth provider error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    /// `Ok(None)` is the expected no-session outcome for a missing,
    /// invalid or expired token.
    async fn verify_token(&self, token: &str) -> Result<Option<Principal>, AuthProviderError>;
    /// Invalidates the provider-side session. Idempotent: signing out a
    /// token that no longer exists is a success.
    async fn sign_out(&self, token: &str) -> Result<(), AuthProviderError>;
    async fn list_users(&self) -> Result<Vec<Principal>, AuthProviderError>;
    async fn health_check(&self) -> Result<(), AuthProviderError>;
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: String,
    email_confirmed_at: Option<String>,
}

impl From<ProviderUser> for Principal {
    fn from(u: ProviderUser) -> Self {
        Self {
            id: u.id,
            email: u.email.to_lowercase(),
            verified: u.email_confirmed_at.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderUserList {
    users: Vec<ProviderUser>,
}

/// HTTP client for the managed auth provider's REST surface.
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl HttpAuthClient {
    pub fn new(cfg: &AuthProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            anon_key: cfg.anon_key.clone(),
            service_key: cfg.service_key.clone(),
        })
    }

    fn unreachable(e: reqwest::Error) -> AuthProviderError {
        AuthProviderError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn verify_token(&self, token: &str) -> Result<Option<Principal>, AuthProviderError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!("token rejected by auth provider");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthProviderError::Provider(format!(
                "verify_token returned {status}"
            )));
        }
        let user: ProviderUser = resp
            .json()
            .await
            .map_err(|e| AuthProviderError::Provider(e.to_string()))?;
        Ok(Some(user.into()))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::unreachable)?;
        // An already-dead session is a success: logout is idempotent.
        let status = resp.status();
        if status.is_success()
            || status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::NOT_FOUND
        {
            Ok(())
        } else {
            Err(AuthProviderError::Provider(format!(
                "sign_out returned {status}"
            )))
        }
    }

    async fn list_users(&self) -> Result<Vec<Principal>, AuthProviderError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/admin/users", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(Self::unreachable)?;
        if !resp.status().is_success() {
            return Err(AuthProviderError::Provider(format!(
                "list_users returned {}",
                resp.status()
            )));
        }
        let list: ProviderUserList = resp
            .json()
            .await
            .map_err(|e| AuthProviderError::Provider(e.to_string()))?;
        Ok(list.users.into_iter().map(Principal::from).collect())
    }

    async fn health_check(&self) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/health", self.base_url))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(Self::unreachable)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AuthProviderError::Provider(format!(
                "health returned {}",
                resp.status()
            )))
        }
    }
}

/// In-memory sessions for tests and local development.
#[derive(Default, Clone)]
pub struct StaticAuthClient {
    sessions: std::collections::HashMap<String, Principal>,
}

impl StaticAuthClient {
    pub fn with_session(mut self, token: &str, principal: Principal) -> Self {
        self.sessions.insert(token.to_string(), principal);
        self
    }
}

#[async_trait]
impl AuthClient for StaticAuthClient {
    async fn verify_token(&self, token: &str) -> Result<Option<Principal>, AuthProviderError> {
        Ok(self.sessions.get(token).cloned())
    }

    async fn sign_out(&self, _token: &str) -> Result<(), AuthProviderError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<Principal>, AuthProviderError> {
        Ok(self.sessions.values().cloned().collect())
    }

    async fn health_check(&self) -> Result<(), AuthProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_client_distinguishes_known_and_unknown_tokens() {
        let principal = Principal {
            id: Uuid::new_v4(),
            email: "ansel@example.com".into(),
            verified: true,
        };
        let client = StaticAuthClient::default().with_session("tok-1", principal.clone());

        let found = client.verify_token("tok-1").await.unwrap().unwrap();
        assert_eq!(found.id, principal.id);
        assert!(client.verify_token("tok-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_sign_out_is_idempotent() {
        let client = StaticAuthClient::default();
        client.sign_out("never-existed").await.unwrap();
        client.sign_out("never-existed").await.unwrap();
    }

    #[test]
    fn provider_user_maps_verified_flag() {
        let confirmed = ProviderUser {
            id: Uuid::new_v4(),
            email: "A@Example.COM".into(),
            email_confirmed_at: Some("2026-01-01T00:00:00Z".into()),
        };
        let p: Principal = confirmed.into();
        assert!(p.verified);
        assert_eq!(p.email, "a@example.com");

        let unconfirmed = ProviderUser {
            id: Uuid::new_v4(),
            email: "b@example.com".into(),
            email_confirmed_at: None,
        };
        assert!(!Principal::from(unconfirmed).verified);
    }
}
