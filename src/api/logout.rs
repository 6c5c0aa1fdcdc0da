use axum::{Extension, response::Response};

use crate::{api::found, info, session::Session, utils};

/// Drops the whole session, signed in or not, and goes back to `/`.
pub async fn logout(Extension(session): Extension<Session>) -> Response {
    session.destroy().await;
    info!("Session {} logged out", utils::short_id(session.id()));
    found("/")
}
