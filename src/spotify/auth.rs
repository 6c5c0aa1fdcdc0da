use std::sync::Arc;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::{
    config::OAuthConfig,
    info,
    session::TokenCache,
    types::{Scopes, Token, TokenErrorResponse, TokenResponse},
    utils, warning,
};

/// Failure of a request against the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The authorization server answered with an error, e.g. `invalid_grant`
    /// for a code that is unknown, expired or already used.
    #[error("authorization server rejected the request ({status}): {error}")]
    Rejected {
        status: StatusCode,
        error: String,
        description: Option<String>,
    },
    #[error("authorization server unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// Outcome of [`AuthManager::validate_and_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// The cached token is usable as is.
    Valid(Token),
    /// The cached token had expired; a refreshed one was written to the cache.
    Refreshed(Token),
    /// No usable token; the visitor has to go through the authorize redirect.
    Anonymous,
}

impl TokenState {
    /// True for [`TokenState::Valid`] and [`TokenState::Refreshed`].
    pub fn is_valid(&self) -> bool {
        !matches!(self, TokenState::Anonymous)
    }

    /// Borrows the usable token, if any.
    pub fn token(&self) -> Option<&Token> {
        match self {
            TokenState::Valid(t) | TokenState::Refreshed(t) => Some(t),
            TokenState::Anonymous => None,
        }
    }

    /// Consumes the state, yielding the usable token if there is one.
    pub fn into_token(self) -> Option<Token> {
        match self {
            TokenState::Valid(t) | TokenState::Refreshed(t) => Some(t),
            TokenState::Anonymous => None,
        }
    }
}

/// Drives the OAuth2 authorization-code grant against Spotify's accounts service.
///
/// Holds the immutable client configuration and a shared HTTP client. Token
/// storage is passed in per call as a [`TokenCache`], which keeps the manager
/// itself free of per-session state.
#[derive(Debug, Clone)]
pub struct AuthManager {
    config: Arc<OAuthConfig>,
    http: Client,
}

impl AuthManager {
    /// Creates a manager for `config`, sending requests through `http`.
    ///
    /// # Arguments
    ///
    /// * `config` - Client credentials, redirect URI, scope and endpoints
    /// * `http` - Shared client; its timeout bounds every token request
    pub fn new(config: OAuthConfig, http: Client) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    /// Builds the URL the visitor is sent to for granting access.
    ///
    /// `state` is echoed back by Spotify on the callback and must be checked
    /// there against the value stored in the session.
    ///
    /// # Example
    ///
    /// ```
    /// let url = auth.authorize_url("Xk2...state");
    /// // https://accounts.spotify.com/authorize?client_id=...&response_type=code&...
    /// ```
    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("scope", &self.config.scope.to_string())
                .append_pair("state", state);
            if self.config.show_dialog {
                query.append_pair("show_dialog", "true");
            }
        }
        url.into()
    }

    /// Checks the cached token and refreshes it when it has expired.
    ///
    /// This is a validate-and-mutate operation: an expired token with a
    /// working refresh token is replaced in `cache` before the method returns
    /// [`TokenState::Refreshed`].
    ///
    /// # Returns
    ///
    /// - [`TokenState::Anonymous`] when there is no token, when it was granted
    ///   for fewer scopes than configured, or when refreshing failed. A refresh
    ///   token the server rejected is removed from the cache.
    /// - [`TokenState::Valid`] for a token that is not about to expire.
    /// - [`TokenState::Refreshed`] for a token that was renewed.
    pub async fn validate_and_refresh<C: TokenCache>(&self, cache: &C) -> TokenState {
        let Some(token) = cache.get().await else {
            return TokenState::Anonymous;
        };

        if !token.scope.contains_all(&self.config.scope) {
            info!(
                "Cached token lacks requested scope (granted: {}), re-authorizing",
                token.scope
            );
            return TokenState::Anonymous;
        }

        if !token.is_expired(utils::now_timestamp()) {
            return TokenState::Valid(token);
        }

        match self.refresh(&token).await {
            Ok(fresh) => {
                cache.save(fresh.clone()).await;
                info!("Access token refreshed");
                TokenState::Refreshed(fresh)
            }
            Err(e) => {
                warning!("Token refresh failed: {}", e);
                if matches!(e, AuthError::Rejected { .. }) {
                    cache.clear().await;
                }
                TokenState::Anonymous
            }
        }
    }

    /// Exchanges an authorization code for a token set and caches it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] for an invalid, expired or already consumed code
    /// - [`AuthError::Http`] when the accounts service cannot be reached
    /// - [`AuthError::Malformed`] when the response lacks required fields
    ///
    /// Nothing is written to `cache` on error.
    pub async fn exchange_code<C: TokenCache>(
        &self,
        code: &str,
        cache: &C,
    ) -> Result<Token, AuthError> {
        let res = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        let refresh_token = res
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Malformed("refresh_token missing".to_string()))?;

        let token = build_token(res, refresh_token, &self.config.scope);
        cache.save(token.clone()).await;
        Ok(token)
    }

    /// Trades the refresh token of `token` for a new access token.
    ///
    /// The refresh token and scope of `token` are carried over when the
    /// response does not contain new ones.
    pub async fn refresh(&self, token: &Token) -> Result<Token, AuthError> {
        let res = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.as_str()),
            ])
            .await?;

        let refresh_token = res
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| token.refresh_token.clone());

        Ok(build_token(res, refresh_token, &token.scope))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let res = self
            .http
            .post(self.config.token_url.clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<TokenErrorResponse>(&body).ok();
            return Err(AuthError::Rejected {
                status,
                error: parsed
                    .as_ref()
                    .map_or_else(|| "unknown_error".to_string(), |e| e.error.clone()),
                description: parsed.and_then(|e| e.error_description),
            });
        }

        let res: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if res.access_token.is_empty() {
            return Err(AuthError::Malformed("access_token missing".to_string()));
        }
        Ok(res)
    }
}

fn build_token(res: TokenResponse, refresh_token: String, fallback_scope: &Scopes) -> Token {
    Token {
        access_token: res.access_token,
        refresh_token,
        expires_at: utils::now_timestamp().saturating_add(res.expires_in),
        scope: granted_scope(res.scope.as_deref(), fallback_scope),
    }
}

/// An omitted `scope` means the requested scope was granted (RFC 6749 §5.1).
fn granted_scope(raw: Option<&str>, fallback: &Scopes) -> Scopes {
    match raw {
        None => fallback.clone(),
        Some(raw) => raw.parse().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_scope_falls_back() {
        let requested: Scopes = "a b".parse().unwrap();
        assert_eq!(granted_scope(None, &requested), requested);
        assert_eq!(granted_scope(Some("c"), &requested), "c".parse().unwrap());
        assert!(granted_scope(Some(""), &requested).is_empty());
    }

    #[test]
    fn huge_expires_in_saturates() {
        let res = TokenResponse {
            access_token: "a".into(),
            token_type: None,
            expires_in: i64::MAX,
            refresh_token: None,
            scope: None,
        };
        let token = build_token(res, "r".into(), &Scopes::default());
        assert_eq!(token.expires_at, i64::MAX);
        assert!(!token.is_expired(utils::now_timestamp()));
    }

    #[test]
    fn token_state_views() {
        let token = Token {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 0,
            scope: Scopes::default(),
        };
        assert!(TokenState::Valid(token.clone()).is_valid());
        assert!(TokenState::Refreshed(token.clone()).is_valid());
        assert!(!TokenState::Anonymous.is_valid());
        assert_eq!(TokenState::Valid(token.clone()).into_token(), Some(token));
        assert!(TokenState::Anonymous.token().is_none());
    }
}
