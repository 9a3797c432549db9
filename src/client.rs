//! Order orchestration over the QR payment gateway.
//!
//! Composes the repository lookup, payload building, token acquisition and
//! transport into the five gateway operations. Creation, revocation and
//! cancellation are monetary writes and are never retried automatically;
//! status and registry reads are retried with bounded backoff on
//! transport-level failures only.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::domain::{ApplicationRepository, Scope};
use crate::error::{Result, SberQrError};
use crate::payload;
use crate::rquid;
use crate::token::{AccessToken, TokenManager};
use crate::transport::{GatewayReply, GatewayRequest, Transport};

pub struct SberQrClient {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn Transport>,
    tokens: TokenManager,
    applications: Arc<dyn ApplicationRepository>,
}

impl std::fmt::Debug for SberQrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SberQrClient").finish_non_exhaustive()
    }
}

impl SberQrClient {
    /// Build a client. Fails fast on invalid configuration rather than at
    /// the first gateway call.
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        applications: Arc<dyn ApplicationRepository>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| SberQrError::Validation(errors.join("; ")))?;

        let config = Arc::new(config);
        let tokens = TokenManager::new(config.clone(), transport.clone());

        Ok(Self {
            config,
            transport,
            tokens,
            applications,
        })
    }

    /// Create a payment order for a stored application.
    ///
    /// Not retried automatically: a retry after an ambiguous timeout could
    /// create two orders for one logical request.
    pub async fn create_order(&self, application_id: i64) -> Result<Value> {
        self.create_order_with_rquid(application_id, rquid::rq_uid())
            .await
    }

    /// Create a payment order reusing a caller-supplied correlation id.
    ///
    /// A caller retrying after an ambiguous timeout passes the same rq_uid
    /// so the gateway sees the replay instead of a second order.
    pub async fn create_order_with_rquid(
        &self,
        application_id: i64,
        rq_uid: String,
    ) -> Result<Value> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(SberQrError::NotFound { application_id })?;

        // Validation happens before any network traffic.
        let payload =
            payload::build_create_order(&self.config, &application, &rq_uid, chrono::Utc::now())?;

        let token = self.tokens.token(Scope::Create).await?;
        info!(
            application_id,
            order_number = %payload.order_number,
            order_sum = payload.order_sum,
            "creating order"
        );

        let body = serde_json::to_value(&payload)?;
        self.dispatch(&self.config.endpoints.create, &token, &rq_uid, body)
            .await
    }

    /// Poll the remote state of an order.
    pub async fn order_status(&self, order_id: &str) -> Result<Value> {
        self.action_with_retry(Scope::Status, self.config.endpoints.status.clone(), order_id)
            .await
    }

    /// Revoke an unpaid order. The gateway is authoritative on whether the
    /// order is still revocable; its rejection is surfaced, not pre-empted.
    pub async fn revoke_order(&self, order_id: &str) -> Result<Value> {
        self.action(Scope::Revoke, &self.config.endpoints.revoke, order_id)
            .await
    }

    /// Cancel a paid order (refund path). Same contract as revocation.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Value> {
        self.action(Scope::Cancel, &self.config.endpoints.cancel, order_id)
            .await
    }

    /// Query the order registry. Parameters are passed through opaquely;
    /// only the correlation fields are added.
    pub async fn order_registry(&self, params: Value) -> Result<Value> {
        let mut attempts = 0u8;
        loop {
            attempts += 1;

            let result = async {
                let rq_uid = rquid::rq_uid();
                let body =
                    payload::build_registry_query(&rq_uid, chrono::Utc::now(), params.clone())?;
                let token = self.tokens.token(Scope::Registry).await?;
                self.dispatch(&self.config.endpoints.registry, &token, &rq_uid, body)
                    .await
            }
            .await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts < self.config.http.max_retries => {
                    warn!(attempt = attempts, error = %e, "registry query failed, retrying");
                    sleep(backoff_delay(attempts)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn action(&self, scope: Scope, url: &str, order_id: &str) -> Result<Value> {
        let rq_uid = rquid::rq_uid();
        let request = payload::build_order_action(&rq_uid, chrono::Utc::now(), order_id);
        let token = self.tokens.token(scope).await?;
        let body = serde_json::to_value(&request)?;
        self.dispatch(url, &token, &rq_uid, body).await
    }

    async fn action_with_retry(&self, scope: Scope, url: String, order_id: &str) -> Result<Value> {
        let mut attempts = 0u8;
        loop {
            attempts += 1;

            match self.action(scope, &url, order_id).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts < self.config.http.max_retries => {
                    warn!(
                        attempt = attempts,
                        %scope,
                        order_id,
                        error = %e,
                        "order read failed, retrying"
                    );
                    sleep(backoff_delay(attempts)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn dispatch(
        &self,
        url: &str,
        token: &AccessToken,
        rq_uid: &str,
        body: Value,
    ) -> Result<Value> {
        let request = GatewayRequest::json(
            url,
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("authorization".to_string(), token.bearer()),
                (
                    "x-ibm-client-id".to_string(),
                    self.config.credentials.client_id.clone(),
                ),
                ("x-Introspect-RqUID".to_string(), rq_uid.to_string()),
            ],
            body,
        );

        let reply = self.transport.send(request).await?;
        classify_reply(reply)
    }
}

fn backoff_delay(attempt: u8) -> Duration {
    Duration::from_millis(100 * (1u64 << attempt))
}

/// A code of all zeros ("0", "00", "000000") is the gateway's success
/// marker; anything else is a business rejection.
fn is_success_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b == b'0')
}

fn error_code(body: &Value) -> Option<String> {
    let raw = body.get("error_code")?;
    raw.as_str()
        .map(str::to_string)
        .or_else(|| raw.as_i64().map(|n| n.to_string()))
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error_description")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Turn a decoded reply into the caller-facing result. The gateway reports
/// business failures both as HTTP errors and as `error_code` fields inside
/// 200 bodies; both become `GatewayRejected` with the remote code intact.
fn classify_reply(reply: GatewayReply) -> Result<Value> {
    if reply.status == 401 || reply.status == 403 {
        return Err(SberQrError::Auth(format!(
            "gateway refused the bearer token: status={} body={}",
            reply.status, reply.body
        )));
    }

    let code = error_code(&reply.body);
    let message = error_message(&reply.body);

    if reply.is_success() {
        return match code {
            Some(code) if !is_success_code(&code) => Err(SberQrError::GatewayRejected {
                code,
                message: message.unwrap_or_default(),
            }),
            _ => Ok(reply.body),
        };
    }

    if reply.body.is_null() {
        return Err(SberQrError::Transport(format!(
            "gateway returned status {} with an empty body",
            reply.status
        )));
    }

    Err(SberQrError::GatewayRejected {
        code: code.unwrap_or_else(|| reply.status.to_string()),
        message: message.unwrap_or_else(|| reply.body.to_string()),
    })
}
