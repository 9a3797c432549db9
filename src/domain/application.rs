use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Read-only view of an application (customer order) owned by the
/// persistence layer. This crate never mutates applications; it only turns
/// them into gateway payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    /// Merchant-side payment identifier, used as the gateway order number
    pub payment_id: String,
    pub created_at: DateTime<Utc>,
    /// Ordered line items; order is preserved on the wire
    pub products: Vec<ApplicationProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationProduct {
    pub name: String,
    pub quantity: u32,
    /// Unit label shown on the receipt (default "шт")
    pub unit: String,
    /// Price in major currency units (rubles)
    pub tariff_price: Decimal,
}

impl ApplicationProduct {
    pub fn new(name: impl Into<String>, tariff_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            unit: "шт".to_string(),
            tariff_price,
        }
    }
}

/// Lookup seam into the external persistence layer.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Application>>;
}
