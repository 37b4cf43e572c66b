use super::{ProviderError, ProviderResponse, PushProvider};
use crate::config::{PushConfig, HTTP_TIMEOUT, ONESIGNAL_URL};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, PartialEq)]
struct Localized<'a> {
    en: &'a str,
    tr: &'a str,
}

impl<'a> Localized<'a> {
    /// The app only ever sends the same text in both languages.
    fn same(text: &'a str) -> Self {
        Self { en: text, tr: text }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct Broadcast<'a> {
    app_id: &'a str,
    included_segments: [&'static str; 1],
    contents: Localized<'a>,
    headings: Localized<'a>,
    chrome_web_icon: &'a str,
    firefox_icon: &'a str,
}

pub struct OneSignal {
    client: reqwest::Client,
    config: PushConfig,
    url: String,
}

impl OneSignal {
    pub fn new(config: PushConfig) -> Result<Self, ProviderError> {
        Self::with_url(config, ONESIGNAL_URL)
    }

    pub fn with_url(
        config: PushConfig,
        url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            config,
            url: url.into(),
        })
    }

    fn body<'a>(&'a self, title: &'a str, message: &'a str) -> Broadcast<'a> {
        Broadcast {
            app_id: &self.config.app_id,
            included_segments: ["All"],
            contents: Localized::same(message),
            headings: Localized::same(title),
            chrome_web_icon: &self.config.icon_url,
            firefox_icon: &self.config.icon_url,
        }
    }
}

#[async_trait]
impl PushProvider for OneSignal {
    async fn broadcast(
        &self,
        title: &str,
        message: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("ONESIGNAL_API_KEY"))?;

        let res = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Key {key}"))
            .json(&self.body(title, message))
            .send()
            .await?;
        let status = res.status();
        let body = res
            .json::<Value>()
            .await
            .map_err(|_| ProviderError::UnreadableBody { status })?;

        Ok(ProviderResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(api_key: Option<&str>) -> PushConfig {
        PushConfig {
            app_id: "app-123".to_string(),
            api_key: api_key.map(str::to_string),
            icon_url: "https://example.com/panda.jpg".to_string(),
        }
    }

    #[test]
    fn test_broadcast_body_shape() {
        let provider = OneSignal::new(config(Some("k"))).unwrap();
        let body = serde_json::to_value(provider.body("Başlık", "Mesaj")).unwrap();
        assert_eq!(
            body,
            json!({
                "app_id": "app-123",
                "included_segments": ["All"],
                "contents": { "en": "Mesaj", "tr": "Mesaj" },
                "headings": { "en": "Başlık", "tr": "Başlık" },
                "chrome_web_icon": "https://example.com/panda.jpg",
                "firefox_icon": "https://example.com/panda.jpg",
            })
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let provider = OneSignal::new(config(None)).unwrap();
        let err = provider.broadcast("t", "m").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let provider =
            OneSignal::with_url(config(Some("k")), "http://127.0.0.1:9/notifications")
                .unwrap();
        let err = provider.broadcast("t", "m").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
