use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SberQrError};

/// Gateway permission scope, one per order operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Create,
    Status,
    Revoke,
    Cancel,
    Registry,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Create,
        Scope::Status,
        Scope::Revoke,
        Scope::Cancel,
        Scope::Registry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Status => "status",
            Self::Revoke => "revoke",
            Self::Cancel => "cancel",
            Self::Registry => "registry",
        }
    }

    /// Remote permission string requested in the `scope` form field of the
    /// client-credentials grant
    pub fn permission(&self) -> &'static str {
        match self {
            Self::Create => "https://api.sberbank.ru/order.create",
            Self::Status => "https://api.sberbank.ru/order.status",
            Self::Revoke => "https://api.sberbank.ru/qr/order.revoke",
            Self::Cancel => "https://api.sberbank.ru/qr/order.cancel",
            Self::Registry => "auth://qr/order.registry",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scope {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "status" => Ok(Self::Status),
            "revoke" => Ok(Self::Revoke),
            "cancel" => Ok(Self::Cancel),
            "registry" => Ok(Self::Registry),
            _ => Err("invalid scope; expected create|status|revoke|cancel|registry"),
        }
    }
}

pub fn parse_scope(raw: &str) -> Result<Scope> {
    Scope::from_str(raw).map_err(|e| SberQrError::Validation(e.to_string()))
}

/// Remote order lifecycle state, as reported in status responses.
/// The gateway is authoritative; this client only parses what it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Registered with the gateway, waiting for the payer
    Created,
    /// Payer has scanned the code, payment in flight
    OnPayment,
    Paid,
    Declined,
    Expired,
    Revoked,
}

impl OrderState {
    pub fn from_remote(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Some(Self::Created),
            "ON_PAYMENT" => Some(Self::OnPayment),
            "PAID" => Some(Self::Paid),
            "DECLINED" => Some(Self::Declined),
            "EXPIRED" => Some(Self::Expired),
            "REVOKED" => Some(Self::Revoked),
            _ => None,
        }
    }

    /// Pull the order state out of a decoded status response
    pub fn from_response(response: &serde_json::Value) -> Option<Self> {
        response
            .get("order_state")
            .and_then(serde_json::Value::as_str)
            .and_then(Self::from_remote)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Paid | OrderState::Declined | OrderState::Expired | OrderState::Revoked
        )
    }
}

/// Quantity of a line item, with its unit label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionCount {
    pub value: u32,
    pub measure: String,
}

/// One order line item on the wire. Amounts are integer minor units
/// (kopecks); no floating point anywhere near money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionItem {
    pub position_name: String,
    pub position_count: PositionCount,
    pub position_sum: i64,
    pub position_description: String,
}

/// Order creation payload sent to the creation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub rq_uid: String,
    pub rq_tm: String,
    pub member_id: String,
    pub order_number: String,
    pub order_create_date: String,
    pub order_params_type: Vec<PositionItem>,
    pub id_qr: String,
    pub order_sum: i64,
    pub currency: String,
    pub description: String,
}

/// Shared payload shape of the status, revocation and cancellation calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderActionRequest {
    pub rq_uid: String,
    pub rq_tm: String,
    pub order_id: String,
}
