use axum::{
    Extension,
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::{api::found, error::AppError, server::AppState, session::Session, success, utils};

/// Query parameters Spotify appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Completes sign-in: checks `state`, exchanges `code`, stores the token.
///
/// # Responses
///
/// - `302` to `/get_playlists` once the token is stored
/// - `400` when the visitor declined, the code is missing, the state does not
///   match the one issued to this session, or Spotify rejects the code
/// - `502` when the token endpoint cannot be reached
///
/// No token is written on any error path. The pending state is consumed by
/// the first callback that carries a code, so a replayed callback fails.
pub async fn callback(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    if let Some(reason) = params.error {
        session.take_csrf_state().await;
        return Err(AppError::AccessDenied(reason));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AppError::MissingCode)?;

    match (session.take_csrf_state().await, params.state) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(AppError::StateMismatch),
    }

    state.auth.exchange_code(&code, &session).await?;
    success!("Session {} signed in", utils::short_id(session.id()));

    Ok(found("/get_playlists"))
}
