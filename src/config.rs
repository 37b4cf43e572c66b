//! We can have a little hard-coded config, [as a
//! snack](https://knowyourmeme.com/memes/cats-can-have-a-little-salami).
//! Everything deployment-specific comes from the environment (and `.env`,
//! via dotenvy in `main`).

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};
use thiserror::Error;

/// Postgres default max connections is 100; this app is one small process
/// sitting next to other clients of the same database.
pub const MAX_DB_CONNECTIONS: u32 = 10;

/// Applies to every outbound HTTP call: the notifier and the push provider.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of content shown on a note card.
pub const PREVIEW_CHARS: usize = 100;

/// Tags shown on a note card before collapsing into "+N".
pub const VISIBLE_TAGS: usize = 3;

/// Name of the Postgres NOTIFY channel our trigger publishes to.
pub const CHANGES_CHANNEL: &str = "notes_changes";

/// Wait between attempts to (re)connect the change listener. Every attempt
/// reloads the note set, which is also how an offline store comes back.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

pub const ONESIGNAL_URL: &str = "https://api.onesignal.com/notifications";
const DEFAULT_ONESIGNAL_APP_ID: &str = "4778b65c-8b4b-433c-b6e1-95c5aa83c23f";
const DEFAULT_ICON_URL: &str = "https://pandanotesa.netlify.app/panda.jpg";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_SNAPSHOT_PATH: &str = "notes_backup.json";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} to be defined in environment")]
    Missing(&'static str),
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub snapshot_path: PathBuf,
    /// `None` turns notifications off entirely.
    pub relay_url: Option<String>,
    pub push: PushConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PushConfig {
    pub app_id: String,
    /// Without a key the relay still answers, but every forward fails.
    pub api_key: Option<String>,
    pub icon_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Split out from `from_env` so tests don't have to mutate the process
    /// environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let require = |key: &'static str| {
                    lookup(key).ok_or(ConfigError::Missing(key))
                };
                let pg_usr = require("POSTGRES_USER")?;
                let pg_pw = require("POSTGRES_PASSWORD")?;
                let pg_db = require("POSTGRES_DB")?;
                let pg_host = lookup("POSTGRES_HOST")
                    .unwrap_or_else(|| "localhost".to_string());
                format!("postgres://{pg_usr}:{pg_pw}@{pg_host}:5432/{pg_db}")
            }
        };

        let raw_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr =
            raw_addr.parse().map_err(|_| ConfigError::Invalid {
                name: "LISTEN_ADDR",
                value: raw_addr.clone(),
            })?;

        let relay_url = match lookup("RELAY_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url),
            None => Some(format!("http://{listen_addr}/api/send-notification")),
        };

        Ok(Config {
            database_url,
            listen_addr,
            snapshot_path: lookup("SNAPSHOT_PATH")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string())
                .into(),
            relay_url,
            push: PushConfig {
                app_id: lookup("ONESIGNAL_APP_ID")
                    .unwrap_or_else(|| DEFAULT_ONESIGNAL_APP_ID.to_string()),
                api_key: lookup("ONESIGNAL_API_KEY")
                    .filter(|k| !k.trim().is_empty()),
                icon_url: lookup("NOTIFICATION_ICON_URL")
                    .unwrap_or_else(|| DEFAULT_ICON_URL.to_string()),
            },
        })
    }
}
