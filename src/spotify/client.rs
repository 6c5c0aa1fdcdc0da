use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    types::{ApiErrorResponse, Paging, Playlist, Track},
    warning,
};

/// Gateway errors are retried this many times before giving up.
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Failure of a Web API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited by the Spotify API (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("Spotify API returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("request to the Spotify API failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Period over which top items are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    /// Value of the `time_range` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

/// Minimal client for the Spotify Web API endpoints the pages use.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
}

impl SpotifyClient {
    /// Creates a client for the Web API at `api_url`.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client; its timeout applies to every call
    /// * `api_url` - Base URL including the version, e.g.
    ///   `https://api.spotify.com/v1`. A trailing slash is ignored.
    pub fn new(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Playlists owned or followed by the current user (`GET /me/playlists`).
    ///
    /// # Arguments
    ///
    /// * `token` - Access token of the signed-in user
    /// * `limit` - Page size (1-50)
    /// * `offset` - Index of the first playlist to return
    pub async fn current_user_playlists(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Playlist>, ApiError> {
        self.get_json(
            "/me/playlists",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
            token,
        )
        .await
    }

    /// The current user's most played tracks (`GET /me/top/tracks`).
    pub async fn current_user_top_tracks(
        &self,
        token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Paging<Track>, ApiError> {
        self.get_json(
            "/me/top/tracks",
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.as_str().to_string()),
            ],
            token,
        )
        .await
    }

    /// Performs an authenticated GET and decodes the JSON body.
    ///
    /// # Retry Logic
    ///
    /// 502 Bad Gateway and 503 Service Unavailable are retried up to
    /// [`MAX_RETRIES`] times with [`RETRY_DELAY`] between attempts. A 429 is
    /// reported as [`ApiError::RateLimited`] with the `Retry-After` value and
    /// not retried.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt = 0;

        loop {
            let response = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(token)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.json::<T>().await?);
            }

            if matches!(
                status,
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE
            ) && attempt < MAX_RETRIES
            {
                attempt += 1;
                warning!(
                    "{} returned {}, retrying ({}/{})",
                    path,
                    status,
                    attempt,
                    MAX_RETRIES
                );
                sleep(RETRY_DELAY).await;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());
                return Err(ApiError::RateLimited { retry_after });
            }

            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected response")
                        .to_string()
                });
            return Err(ApiError::Status { status, message });
        }
    }
}
