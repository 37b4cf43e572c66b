//! Client side of the push relay: the store calls this after a note is
//! created or edited, and we post the request to the relay endpoint.

use super::config::HTTP_TIMEOUT;
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

pub const CREATED_HEADING: &str = "🐼 Yeni Not Eklendi!";
pub const CREATED_FALLBACK: &str = "Yeni Not";
pub const UPDATED_HEADING: &str = "✏️ Not Güncellendi!";
pub const UPDATED_FALLBACK: &str = "Bir Not";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, message: &str) -> Result<()>;
}

/// Fire and forget. The store doesn't wait on notifications and nothing
/// retries them.
pub fn dispatch(notifier: &Arc<dyn Notifier>, title: &str, message: &str) {
    let notifier = Arc::clone(notifier);
    let title = title.to_string();
    let message = message.to_string();
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&title, &message).await {
            tracing::warn!(error = ?e, %title, "push notification not sent");
        }
    });
}

/// Use the note title as the notification body, unless there isn't one.
pub fn message_for<'a>(note_title: &'a str, fallback: &'a str) -> &'a str {
    if note_title.is_empty() {
        fallback
    } else {
        note_title
    }
}

#[derive(Serialize)]
struct RelayBody<'a> {
    title: &'a str,
    message: &'a str,
}

pub struct RelayNotifier {
    client: reqwest::Client,
    url: String,
}

impl RelayNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<()> {
        let res = self
            .client
            .post(&self.url)
            .json(&RelayBody { title, message })
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("relay answered {status}: {body}");
        }
        tracing::debug!(%title, "push notification relayed");

        Ok(())
    }
}

/// Used when no relay is configured.
pub struct Disabled;

#[async_trait]
impl Notifier for Disabled {
    async fn send(&self, title: &str, _message: &str) -> Result<()> {
        tracing::debug!(%title, "notifications disabled; dropping");
        Ok(())
    }
}
