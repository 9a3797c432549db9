use thiserror::Error;

/// Main error type for the QR payment gateway client
#[derive(Error, Debug)]
pub enum SberQrError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Domain input errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Application not found: {application_id}")]
    NotFound { application_id: i64 },

    // Authorization endpoint rejected the credentials or scope.
    // Kept distinct from Transport so callers can alert on credential rot.
    #[error("Authentication error: {0}")]
    Auth(String),

    // Network/timeout/decoding failures. Eligible for bounded retry on
    // idempotent reads only.
    #[error("Transport error: {0}")]
    Transport(String),

    // The gateway returned a well-formed error payload for a business
    // reason; code and message are preserved verbatim.
    #[error("Gateway rejected request: code={code} message={message}")]
    GatewayRejected { code: String, message: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for SberQrError {
    fn from(err: reqwest::Error) -> Self {
        SberQrError::Transport(err.to_string())
    }
}

/// Result type alias for SberQrError
pub type Result<T> = std::result::Result<T, SberQrError>;

impl SberQrError {
    /// Transport-level failures are the only errors worth retrying, and
    /// only for idempotent reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SberQrError::Transport(_))
    }
}
