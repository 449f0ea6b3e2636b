// Spine backend client module
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod tls;

pub use client::SpineClient;

use crate::error::Result;
use crate::models::{BackendResponse, OutboundRequest};
use async_trait::async_trait;

/// Performs the outbound call for one exchange.
///
/// Takes ownership of the request: it is sent once and dropped. A
/// connection-level failure is returned as `GatewayError::Transport`, and
/// a status line whose body could not be read as
/// `GatewayError::ResponseBody`. Any complete HTTP reply, error statuses
/// included, is a `BackendResponse`.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse>;
}
