//! Configuration management for the sporlweb front-end.
//!
//! Configuration is read exactly once at startup and turned into an immutable
//! [`Config`] value that is handed to the components that need it. Nothing
//! reads the environment after that point.
//!
//! Values are looked up in this order:
//! 1. Process environment variables (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/sporlweb/.env`)
//! 4. Application defaults (for optional values)

use std::{env, fmt, net::SocketAddr, path::PathBuf, time::Duration};

use reqwest::Url;
use thiserror::Error;

use crate::types::Scopes;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_API_REDIRECT_URI";
pub const ENV_SCOPE: &str = "SPOTIFY_API_AUTH_SCOPE";
pub const ENV_SHOW_DIALOG: &str = "SPOTIFY_API_SHOW_DIALOG";
pub const ENV_AUTH_URL: &str = "SPOTIFY_API_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "SPOTIFY_API_TOKEN_URL";
pub const ENV_API_URL: &str = "SPOTIFY_API_URL";
pub const ENV_SERVER_ADDRESS: &str = "SERVER_ADDRESS";
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_SESSION_TTL: &str = "SESSION_TTL_SECS";

pub const DEFAULT_SCOPE: &str = "playlist-read-private,ugc-image-upload,streaming,user-top-read,user-read-recently-played,user-library-modify,user-library-read";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Startup configuration failures. Both variants are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// The client identity and endpoints used for the authorization-code grant.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: Scopes,
    pub show_dialog: bool,
    pub auth_url: Url,
    pub token_url: Url,
}

// client_secret stays out of logs
impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("show_dialog", &self.show_dialog)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub api_url: String,
    pub server_address: SocketAddr,
    pub http_timeout: Duration,
    /// Idle time after which a session record is forgotten.
    pub session_ttl: Duration,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Call [`load_env`] first if `.env` files should be taken into account.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when one of the client credentials or
    /// the redirect URI is absent or empty, and [`ConfigError::Invalid`] when
    /// an optional value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Lets tests supply values without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let client_id = require(ENV_CLIENT_ID)?;
        let client_secret = require(ENV_CLIENT_SECRET)?;
        let redirect_uri = require(ENV_REDIRECT_URI)?;
        parse_url(ENV_REDIRECT_URI, &redirect_uri)?;

        let scope: Scopes = get(ENV_SCOPE)
            .as_deref()
            .unwrap_or(DEFAULT_SCOPE)
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                name: ENV_SCOPE,
                reason,
            })?;

        let show_dialog = match get(ENV_SHOW_DIALOG) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                name: ENV_SHOW_DIALOG,
                reason: format!("expected true or false, got '{}'", raw),
            })?,
            None => true,
        };

        let server_address = get(ENV_SERVER_ADDRESS)
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: ENV_SERVER_ADDRESS,
                reason: e.to_string(),
            })?;

        let http_timeout = parse_secs(
            ENV_HTTP_TIMEOUT,
            get(ENV_HTTP_TIMEOUT),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let session_ttl = parse_secs(
            ENV_SESSION_TTL,
            get(ENV_SESSION_TTL),
            DEFAULT_SESSION_TTL_SECS,
        )?;

        Ok(Self {
            oauth: OAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
                scope,
                show_dialog,
                auth_url: parse_url(
                    ENV_AUTH_URL,
                    get(ENV_AUTH_URL).as_deref().unwrap_or(DEFAULT_AUTH_URL),
                )?,
                token_url: parse_url(
                    ENV_TOKEN_URL,
                    get(ENV_TOKEN_URL).as_deref().unwrap_or(DEFAULT_TOKEN_URL),
                )?,
            },
            api_url: get(ENV_API_URL)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            server_address,
            http_timeout,
            session_ttl,
        })
    }
}

/// Loads `.env` files into the process environment.
///
/// Reads `.env` from the working directory and then
/// `<data_local_dir>/sporlweb/.env`. Variables that are already set are never
/// overwritten, so the process environment wins over both files and the
/// working directory wins over the data directory.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/sporlweb/.env`
/// - macOS: `~/Library/Application Support/sporlweb/.env`
/// - Windows: `%LOCALAPPDATA%/sporlweb/.env`
///
/// # Errors
///
/// Missing files are fine. A file that exists but cannot be read or parsed is
/// reported as an error string.
pub fn load_env() -> Result<(), String> {
    if let Err(e) = dotenv::dotenv() {
        if !e.not_found() {
            return Err(format!("failed to load .env: {}", e));
        }
    }

    let path = env_file_path();
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
    }
    Ok(())
}

fn env_file_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlweb/.env");
    path
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

/// Parses a positive number of seconds, falling back to `default` when unset.
fn parse_secs(
    name: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match raw {
        Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
