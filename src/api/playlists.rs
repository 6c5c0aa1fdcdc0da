use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::{
    api::{PLAYLIST_LIMIT, TOP_TRACKS_LIMIT, authorized, pages},
    error::AppError,
    server::AppState,
    session::Session,
    spotify::TimeRange,
    types::{PlaylistRow, TrackRow},
};

/// Results page: the visitor's playlists and their five top tracks.
pub async fn get_playlists(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let token = match authorized(&state, &session).await {
        Ok(token) => token,
        Err(redirect) => return Ok(redirect),
    };

    let (playlists, top_tracks) = tokio::try_join!(
        state
            .spotify
            .current_user_playlists(&token.access_token, PLAYLIST_LIMIT, 0),
        state.spotify.current_user_top_tracks(
            &token.access_token,
            TOP_TRACKS_LIMIT,
            TimeRange::default()
        ),
    )?;

    let playlists: Vec<PlaylistRow> = playlists.items.iter().map(PlaylistRow::from).collect();
    let top_tracks: Vec<TrackRow> = top_tracks.items.iter().map(TrackRow::from).collect();

    Ok(Html(pages::index(Some(playlists.as_slice()), Some(top_tracks.as_slice()))).into_response())
}
