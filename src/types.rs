use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Tokens expiring within this many seconds are treated as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// The token set cached per browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) after which the access token is rejected.
    pub expires_at: i64,
    pub scope: Scopes,
}

impl Token {
    /// True when the access token is expired or about to expire at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.saturating_sub(now) < EXPIRY_MARGIN_SECS
    }
}

/// A set of OAuth scopes.
///
/// Parses comma and/or whitespace separated lists and renders them space
/// separated, which is what the authorize endpoint expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    /// True when `scope` is one of the scopes in the set.
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// True when every scope in `required` is also in `self`.
    pub fn contains_all(&self, required: &Scopes) -> bool {
        required.0.is_subset(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the scopes in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromStr for Scopes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let set: BTreeSet<String> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();

        if set.is_empty() {
            return Err("scope cannot be empty".to_string());
        }
        Ok(Self(set))
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(" "))
    }
}

/// Successful response of the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error response of the token endpoint (RFC 6749 §5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Error envelope of the Web API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

/// One page of a Web API list endpoint.
///
/// `null` entries, which Spotify sends for items that are no longer
/// available, are dropped while decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paging<T> {
    #[serde(deserialize_with = "skip_nulls")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Vec<Option<T>> = Vec::deserialize(deserializer)?;
    Ok(items.into_iter().flatten().collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
}

impl Track {
    /// Name of the first credited artist, or an empty string if none is listed.
    pub fn first_artist(&self) -> &str {
        self.artists.first().map_or("", |a| a.name.as_str())
    }
}

/// A playlist as shown on the results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRow {
    pub name: String,
    pub url: String,
}

/// A top track as shown on the results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub name: String,
    pub artist: String,
}

impl From<&Playlist> for PlaylistRow {
    fn from(pl: &Playlist) -> Self {
        Self {
            name: pl.name.clone(),
            url: pl.external_urls.spotify.clone().unwrap_or_default(),
        }
    }
}

impl From<&Track> for TrackRow {
    fn from(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            artist: track.first_artist().to_string(),
        }
    }
}
