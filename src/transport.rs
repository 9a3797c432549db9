//! Wire contract between the orchestration layer and the HTTP stack.
//!
//! Every gateway call is a POST that comes back as decoded JSON; the trait
//! keeps the orchestrator testable without a network and keeps reqwest out
//! of the rest of the crate.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Request body encoding, matching the two shapes the gateway accepts
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// One outbound gateway call
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl GatewayRequest {
    pub fn json(url: impl Into<String>, headers: Vec<(String, String)>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers,
            body: RequestBody::Json(body),
        }
    }

    pub fn form(
        url: impl Into<String>,
        headers: Vec<(String, String)>,
        fields: Vec<(String, String)>,
    ) -> Self {
        Self {
            url: url.into(),
            headers,
            body: RequestBody::Form(fields),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decoded gateway reply. An empty body decodes to JSON null.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub status: u16,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Send a signed request, get JSON back. Implementations must enforce
/// bounded connect and total timeouts; a call may never hang.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: GatewayRequest) -> Result<GatewayReply>;
}
