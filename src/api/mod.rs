//! # API Module
//!
//! HTTP route handlers of the sporlweb front-end.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`home`] - `GET /`, landing page; sends anonymous visitors to Spotify
//! - [`callback`] - `GET /callback`, completes the authorization-code grant
//! - [`logout`] - `GET /logout`, forgets the session
//!
//! ### Account data
//!
//! - [`get_playlists`] - `GET /get_playlists`, playlists plus top tracks
//! - [`get_top_tracks`] - `GET /get_top_tracks`, top tracks as plain HTML
//!
//! ### Monitoring
//!
//! - [`health`] - `GET /health`, status and version as JSON
//!
//! ## Access Pattern
//!
//! Every protected handler starts with [`authorized`]: it validates (and if
//! needed refreshes) the session's token and, when there is none, answers
//! with a `302 Found` to Spotify's authorize page. A fresh anti-forgery
//! `state` is stored in the session for each such redirect.

mod callback;
mod health;
mod home;
mod logout;
pub mod pages;
mod playlists;
mod top_tracks;

pub use callback::callback;
pub use health::health;
pub use home::home;
pub use logout::logout;
pub use playlists::get_playlists;
pub use top_tracks::get_top_tracks;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{server::AppState, session::Session, types::Token, utils};

/// Playlists requested for the results page (the API maximum).
pub const PLAYLIST_LIMIT: u32 = 50;
/// Top tracks shown on both result pages.
pub const TOP_TRACKS_LIMIT: u32 = 5;

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Returns a usable token for the session or the redirect that starts sign-in.
///
/// An expired token is refreshed on the way. When no usable token remains,
/// a new anti-forgery `state` is stored in the session and the `Err` holds
/// the `302 Found` to Spotify's authorize page, ready to return as is.
///
/// # Example
///
/// ```
/// let token = match authorized(&state, &session).await {
///     Ok(token) => token,
///     Err(redirect) => return redirect,
/// };
/// ```
pub async fn authorized(state: &AppState, session: &Session) -> Result<Token, Response> {
    match state.auth.validate_and_refresh(session).await.into_token() {
        Some(token) => Ok(token),
        None => Err(redirect_to_authorize(state, session).await),
    }
}

async fn redirect_to_authorize(state: &AppState, session: &Session) -> Response {
    let csrf = utils::generate_state();
    session.set_csrf_state(csrf.clone()).await;
    found(&state.auth.authorize_url(&csrf))
}
