//! OAuth client-credentials token lifecycle.
//!
//! The gateway hands out short-lived bearer tokens, one permission scope
//! per order operation. The manager keeps the most recent token per scope
//! and refreshes behind a per-scope lock, so concurrent callers either
//! share a cached token or wait for exactly one refresh.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::domain::Scope;
use crate::error::{Result, SberQrError};
use crate::rquid;
use crate::transport::{GatewayRequest, Transport};

/// A scoped bearer token. Owned by the token manager; never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub scope: Scope,
    pub issued_at: DateTime<Utc>,
    /// Absent when the gateway did not advertise a validity window
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// A token with an unknown validity window is never considered valid
    /// for reuse.
    pub fn is_valid(&self, safety_margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + safety_margin < expires_at,
            None => false,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub struct TokenManager {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn Transport>,
    cache: HashMap<Scope, Mutex<Option<AccessToken>>>,
}

impl TokenManager {
    pub fn new(config: Arc<GatewayConfig>, transport: Arc<dyn Transport>) -> Self {
        let cache = Scope::ALL
            .iter()
            .map(|scope| (*scope, Mutex::new(None)))
            .collect();

        Self {
            config,
            transport,
            cache,
        }
    }

    /// Return a token authorizing `scope`, reusing the cached one while it
    /// is still inside its validity window.
    pub async fn token(&self, scope: Scope) -> Result<AccessToken> {
        let slot = self.cache.get(&scope).ok_or_else(|| {
            SberQrError::Internal(format!("no cache slot for scope {scope}"))
        })?;

        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.is_valid(self.config.auth.token_safety_margin()) {
                debug!(%scope, "reusing cached access token");
                return Ok(cached.clone());
            }
        }

        let fresh = self.fetch(scope).await?;
        *guard = fresh.expires_at.is_some().then(|| fresh.clone());
        Ok(fresh)
    }

    fn basic_header(&self) -> String {
        let credentials = &self.config.credentials;
        format!(
            "Basic {}",
            BASE64_STANDARD.encode(format!(
                "{}:{}",
                credentials.client_id, credentials.client_secret
            ))
        )
    }

    async fn fetch(&self, scope: Scope) -> Result<AccessToken> {
        let rq_uid = rquid::rq_uid();
        debug!(%scope, %rq_uid, "requesting access token");

        let request = GatewayRequest::form(
            self.config.endpoints.token.clone(),
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("authorization".to_string(), self.basic_header()),
                ("rquid".to_string(), rq_uid),
                (
                    "x-ibm-client-id".to_string(),
                    self.config.credentials.client_id.clone(),
                ),
            ],
            vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("scope".to_string(), scope.permission().to_string()),
            ],
        );

        let issued_at = Utc::now();
        let reply = self.transport.send(request).await?;

        if (400..500).contains(&reply.status) {
            return Err(SberQrError::Auth(format!(
                "authorization endpoint rejected {scope} token request: status={} body={}",
                reply.status, reply.body
            )));
        }
        if !reply.is_success() {
            return Err(SberQrError::Transport(format!(
                "authorization endpoint unavailable: status={}",
                reply.status
            )));
        }

        let token = reply
            .body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SberQrError::Auth(format!(
                    "token response missing access_token: {}",
                    reply.body
                ))
            })?
            .to_string();

        let expires_at = reply
            .body
            .get("expires_in")
            .and_then(Value::as_i64)
            .map(|secs| issued_at + Duration::seconds(secs));

        info!(%scope, cached = expires_at.is_some(), "acquired access token");
        Ok(AccessToken {
            token,
            scope,
            issued_at,
            expires_at,
        })
    }
}
