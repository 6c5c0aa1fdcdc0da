use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    api::pages,
    spotify::{ApiError, AuthError},
    warning,
};

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing authorization code")]
    MissingCode,
    #[error("authorization was not granted: {0}")]
    AccessDenied(String),
    #[error("authorization state does not match this session")]
    StateMismatch,
    #[error("token exchange failed: {0}")]
    AuthExchange(#[from] AuthError),
    #[error("remote API call failed: {0}")]
    RemoteApi(#[from] ApiError),
}

impl AppError {
    /// HTTP status of the error page: `400` for problems with the callback
    /// request or a rejected code, `503` while rate limited, `502` for any
    /// other failure on Spotify's side.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCode | AppError::AccessDenied(_) | AppError::StateMismatch => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthExchange(AuthError::Rejected { .. }) => StatusCode::BAD_REQUEST,
            AppError::AuthExchange(_) => StatusCode::BAD_GATEWAY,
            AppError::RemoteApi(ApiError::RateLimited { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RemoteApi(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text shown to the visitor. Remote failures stay generic.
    fn public_message(&self) -> String {
        match self {
            AppError::MissingCode => "The sign-in callback did not include a code.".to_string(),
            AppError::AccessDenied(reason) => {
                format!("Spotify sign-in was cancelled ({}).", reason)
            }
            AppError::StateMismatch => {
                "This sign-in link is not valid for your session. Please start again.".to_string()
            }
            AppError::AuthExchange(AuthError::Rejected { .. }) => {
                "Spotify did not accept the sign-in code. Please sign in again.".to_string()
            }
            AppError::AuthExchange(_) => "Could not reach Spotify to complete sign-in.".to_string(),
            AppError::RemoteApi(ApiError::RateLimited { .. }) => {
                "Spotify is rate limiting requests right now. Please try again shortly.".to_string()
            }
            AppError::RemoteApi(_) => "Something went wrong while talking to Spotify.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        warning!("{}", self);

        let status = self.status();
        let mut response = (status, Html(pages::error_page(status, &self.public_message())))
            .into_response();

        if let AppError::RemoteApi(ApiError::RateLimited {
            retry_after: Some(secs),
        }) = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}
