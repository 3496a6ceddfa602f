//! Configuration for the relay.
//!
//! Secrets and addresses come from a TOML file:
//!
//! ```toml
//! [spotify]
//! client_id = "..."
//! client_secret = "..."
//! redirect_uri = "http://localhost:3000/callback"
//!
//! [telegram]
//! bot_token = "..."
//! channel_id = "@my_channel"
//! message_id = 42
//! ```
//!
//! Timing knobs live in [`Settings`] and are set from the command line.

use std::{fmt, fs, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;
use veil::Redact;

use crate::{
    detector::CommitPolicy,
    error::{Error, Result},
};

/// Spotify application credentials.
#[derive(Clone, Deserialize, Redact, PartialEq, Eq)]
pub struct SpotifyConfig {
    pub client_id: String,

    #[redact]
    pub client_secret: String,

    /// Must match the redirect URI registered for the application.
    pub redirect_uri: Url,
}

/// Telegram bot and the message it keeps up to date.
#[derive(Clone, Deserialize, Redact, PartialEq, Eq)]
pub struct TelegramConfig {
    #[redact]
    pub bot_token: String,

    pub channel_id: ChatId,

    /// The message must already exist and carry a photo.
    pub message_id: i64,
}

/// Telegram chat identifier: numeric id or `@channelusername`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => write!(f, "{name}"),
        }
    }
}

/// On-disk layout of the configuration file.
#[derive(Deserialize)]
struct File {
    spotify: SpotifyConfig,
    telegram: TelegramConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    pub user_agent: String,

    pub spotify: SpotifyConfig,
    pub telegram: TelegramConfig,
}

impl Config {
    /// Configuration files are small; anything larger is a mistake.
    const MAX_FILE_SIZE: u64 = 16 * 1024;

    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the file cannot be read, is too large, or
    /// does not contain valid `[spotify]` and `[telegram]` sections.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |e: std::io::Error| {
            Error::invalid_argument(format!("cannot read {}: {e}", path.display()))
        };

        // Prevent out-of-memory condition: the file should be small.
        let file_size = fs::metadata(path).map_err(unreadable)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).map_err(unreadable)?;
        contents.parse()
    }

    fn with_file(file: File) -> Self {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        let os_name = std::env::consts::OS;
        let os_version = sysinfo::System::os_version().unwrap_or_else(|| String::from("0"));
        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version})");
        trace!("user agent: {user_agent}");

        Self {
            app_name,
            app_version,
            user_agent,
            spotify: file.spotify,
            telegram: file.telegram,
        }
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let file = toml::from_str::<File>(s)?;

        if file.spotify.client_id.is_empty() || file.spotify.client_secret.is_empty() {
            return Err(Error::invalid_argument(
                "spotify client id and secret must not be empty",
            ));
        }
        if file.telegram.bot_token.is_empty() {
            return Err(Error::invalid_argument("telegram bot token must not be empty"));
        }

        Ok(Self::with_file(file))
    }
}

/// Timing and policy of the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Cadence of now-playing polls while armed.
    pub poll_interval: Duration,

    /// Cadence of credential re-validation, for the process lifetime.
    pub validate_interval: Duration,

    /// Wait between the media edit and the caption edit.
    pub settle_delay: Duration,

    /// Upper bound for any single HTTP call.
    pub request_timeout: Duration,

    pub commit_policy: CommitPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            validate_interval: Duration::from_secs(60 * 60),
            settle_delay: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(10),
            commit_policy: CommitPolicy::default(),
        }
    }
}
