use std::path::PathBuf;

use url::Url;

use crate::errors::{Result, WatchError};

const DEFAULT_SNAPSHOT_FILE: &str = "last_snapshot.txt";

/// Login credentials for the watched site.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of debug output and logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub credentials: Credentials,
    pub login_url: Url,
    pub target_url: Url,
    /// CSS selector of the page fragment whose text is watched.
    pub selector: String,
    pub bot_token: String,
    pub chat_id: String,
    pub snapshot_file: PathBuf,
    pub headless: bool,
}

impl WatchConfig {
    /// Read configuration from the process environment. Any missing required
    /// variable is fatal; the monitor must not start half-configured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(WatchError::Config(format!(
                    "required environment variable {} is not set",
                    name
                ))),
            }
        };

        let parse_url = |name: &str, raw: &str| -> Result<Url> {
            Url::parse(raw)
                .map_err(|e| WatchError::Config(format!("{} is not a valid URL: {}", name, e)))
        };

        let login_raw = required("PAGEWATCH_LOGIN_URL")?;
        let target_raw = required("PAGEWATCH_TARGET_URL")?;

        Ok(Self {
            credentials: Credentials {
                username: required("PAGEWATCH_USER")?,
                password: required("PAGEWATCH_PASS")?,
            },
            login_url: parse_url("PAGEWATCH_LOGIN_URL", &login_raw)?,
            target_url: parse_url("PAGEWATCH_TARGET_URL", &target_raw)?,
            selector: required("PAGEWATCH_SELECTOR")?,
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("TELEGRAM_CHAT_ID")?,
            snapshot_file: lookup("PAGEWATCH_SNAPSHOT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
            headless: lookup("PAGEWATCH_HEADLESS")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
