use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::{
    api::{TOP_TRACKS_LIMIT, authorized, pages},
    error::AppError,
    server::AppState,
    session::Session,
    spotify::TimeRange,
    types::TrackRow,
};

/// The visitor's five top tracks as bare `name - artist` lines.
pub async fn get_top_tracks(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let token = match authorized(&state, &session).await {
        Ok(token) => token,
        Err(redirect) => return Ok(redirect),
    };

    let tracks = state
        .spotify
        .current_user_top_tracks(&token.access_token, TOP_TRACKS_LIMIT, TimeRange::default())
        .await?;
    let rows: Vec<TrackRow> = tracks.items.iter().map(TrackRow::from).collect();

    Ok(Html(pages::top_tracks_plain(&rows)).into_response())
}
