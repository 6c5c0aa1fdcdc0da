use std::time::Duration;

use axum::{Router, middleware, routing::get};
use reqwest::Client;

use crate::{
    Res, api,
    config::Config,
    info,
    session::{SessionStore, session_layer},
    spotify::{AuthManager, SpotifyClient},
};

/// How often expired sessions are dropped from memory.
pub const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: AuthManager,
    pub spotify: SpotifyClient,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wires the components from configuration, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            auth: AuthManager::new(config.oauth.clone(), http.clone()),
            spotify: SpotifyClient::new(http, config.api_url.clone()),
            sessions: SessionStore::with_ttl(config.session_ttl),
        })
    }
}

/// Builds the router with every route and the session middleware.
///
/// `/health` is added after the session layer so health checks never create
/// sessions.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::home))
        .route("/callback", get(api::callback))
        .route("/get_playlists", get(api::get_playlists))
        .route("/get_top_tracks", get(api::get_top_tracks))
        .route("/logout", get(api::logout))
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_layer,
        ))
        .route("/health", get(api::health))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn start_api_server(config: Config) -> Res<()> {
    let state = AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(config.server_address).await?;

    spawn_session_pruner(state.sessions.clone(), SESSION_PRUNE_INTERVAL);

    info!("Listening on http://{}", listener.local_addr()?);
    info!(
        "Redirect URI registered with Spotify must be {}",
        config.oauth.redirect_uri
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically removes expired records from `sessions`.
///
/// The task runs for the lifetime of the runtime; the first sweep happens
/// one `every` after start.
pub fn spawn_session_pruner(sessions: SessionStore, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = sessions.prune().await;
            if removed > 0 {
                info!("Pruned {} expired session(s)", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
