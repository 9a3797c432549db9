//! Reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Result, SberQrError};
use crate::transport::{GatewayReply, GatewayRequest, RequestBody, Transport};

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("sberqr/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SberQrError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(config.connect_timeout(), config.request_timeout())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: GatewayRequest) -> Result<GatewayReply> {
        let mut req = self.http.post(&request.url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        req = match request.body {
            RequestBody::Json(ref body) => req.header(CONTENT_TYPE, "application/json").json(body),
            RequestBody::Form(ref fields) => req.form(fields),
        };

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        debug!(url = %request.url, status, "gateway call completed");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                SberQrError::Transport(format!("invalid JSON from gateway: {e}: {text}"))
            })?
        };

        Ok(GatewayReply { status, body })
    }
}
