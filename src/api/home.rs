use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::{
    api::{authorized, pages},
    server::AppState,
    session::Session,
};

/// `GET /`: a short welcome page for signed-in visitors.
///
/// Anonymous visitors are redirected to Spotify's authorize page.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    match authorized(&state, &session).await {
        Ok(_) => Html(pages::index(None, None)).into_response(),
        Err(redirect) => redirect,
    }
}
