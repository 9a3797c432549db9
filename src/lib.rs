//! Client for the Sberbank QR payment gateway.
//!
//! Authenticates with OAuth2 client-credentials grants (one permission
//! scope per operation, tokens cached per scope), creates payment orders
//! from stored applications, polls order status, revokes/cancels orders
//! and queries the order registry. Responses are passed through as decoded
//! JSON; failures are typed (`SberQrError`).

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod payload;
pub mod rquid;
pub mod token;
pub mod transport;

pub use adapters::{HttpTransport, InMemoryApplications};
pub use client::SberQrClient;
pub use config::{AuthConfig, Credentials, Endpoints, GatewayConfig, HttpConfig};
pub use domain::{
    Application, ApplicationProduct, ApplicationRepository, CreateOrderRequest, OrderActionRequest,
    OrderState, PositionCount, PositionItem, Scope,
};
pub use error::{Result, SberQrError};
pub use token::{AccessToken, TokenManager};
pub use transport::{GatewayReply, GatewayRequest, RequestBody, Transport};
