//! # Spotify Integration Module
//!
//! Everything that talks to Spotify over HTTP.
//!
//! ## Core Modules
//!
//! ### Authorization
//!
//! [`auth`] - The OAuth 2.0 authorization-code grant:
//! - **Authorize URL**: builds the redirect target with client id, redirect
//!   URI, scopes, anti-forgery `state` and the optional `show_dialog` flag
//! - **Code Exchange**: trades the callback's code for an access/refresh token
//!   pair, authenticating with the client secret
//! - **Validate and Refresh**: checks a cached token for scope and expiry and
//!   transparently renews it with the refresh token
//!
//! ### Web API
//!
//! [`client`] - A thin client for the two read-only endpoints the pages need:
//! - `GET /me/playlists`
//! - `GET /me/top/tracks`
//!
//! ## Token Storage
//!
//! Neither module stores tokens itself. [`auth::AuthManager`] reads and writes
//! through a [`crate::session::TokenCache`] supplied by the caller, which in
//! the running server is the visitor's session.
//!
//! ## Error Types
//!
//! - [`auth::AuthError`] - token endpoint failures (rejected code, unreachable
//!   server, malformed response)
//! - [`client::ApiError`] - Web API failures (rate limiting, error status,
//!   transport errors)

pub mod auth;
pub mod client;

pub use auth::AuthError;
pub use auth::AuthManager;
pub use auth::TokenState;
pub use client::ApiError;
pub use client::SpotifyClient;
pub use client::TimeRange;
