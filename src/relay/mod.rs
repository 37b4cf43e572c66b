//! The push relay: a small JSON endpoint that takes `{title, message}` and
//! forwards it to the push provider with the server-held credential. One
//! attempt per call, no queue and no retries.

mod handler;
mod onesignal;

pub use handler::send_notification;
pub use onesignal::OneSignal;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// What the provider said, kept raw so it can be echoed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("push provider is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("push provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("push provider answered {status} with an unreadable body")]
    UnreadableBody { status: StatusCode },
}

#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Broadcast one notification to every subscriber.
    async fn broadcast(
        &self,
        title: &str,
        message: &str,
    ) -> Result<ProviderResponse, ProviderError>;
}
