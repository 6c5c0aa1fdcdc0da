#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::{Url, redirect::Policy};
use serde_json::json;
use sporlweb::{
    config::Config,
    server::{self, AppState},
    session::{SESSION_COOKIE, SessionStore},
    types::Token,
};
use tokio::{net::TcpListener, sync::Mutex};

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
pub const SCOPE: &str = "playlist-read-private,user-top-read";

/// In-process stand-in for the Spotify accounts service and Web API.
#[derive(Debug, Default)]
pub struct FakeSpotify {
    codes: Mutex<HashSet<String>>,
    refresh_tokens: Mutex<HashSet<String>>,
    access_tokens: Mutex<HashSet<String>>,
    api_failure: Mutex<Option<(StatusCode, Option<u64>)>>,
    counter: AtomicU32,
    pub token_requests: AtomicU32,
    pub api_requests: AtomicU32,
}

impl FakeSpotify {
    /// Registers a one-shot authorization code.
    pub async fn add_code(&self, code: &str) {
        self.codes.lock().await.insert(code.to_string());
    }

    /// Registers a token pair as if it had been issued earlier.
    pub async fn issue(&self, access: &str, refresh: &str) {
        self.access_tokens.lock().await.insert(access.to_string());
        self.refresh_tokens.lock().await.insert(refresh.to_string());
    }

    pub async fn revoke_refresh(&self, refresh: &str) {
        self.refresh_tokens.lock().await.remove(refresh);
    }

    /// Makes every Web API call answer with `status`.
    pub async fn fail_api(&self, status: StatusCode, retry_after: Option<u64>) {
        *self.api_failure.lock().await = Some((status, retry_after));
    }

    fn next_id(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn invalid_grant(description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_grant", "error_description": description })),
    )
        .into_response()
}

async fn token_endpoint(
    State(fake): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.token_requests.fetch_add(1, Ordering::SeqCst);

    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !basic {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            let code = form.get("code").cloned().unwrap_or_default();
            if form.get("redirect_uri").map(String::as_str) != Some(REDIRECT_URI) {
                return invalid_grant("Invalid redirect URI");
            }
            if !fake.codes.lock().await.remove(&code) {
                return invalid_grant("Invalid authorization code");
            }
            let n = fake.next_id();
            let access = format!("access-{}", n);
            let refresh = format!("refresh-{}", n);
            fake.issue(&access, &refresh).await;
            Json(json!({
                "access_token": access,
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": refresh,
                "scope": "user-top-read playlist-read-private",
            }))
            .into_response()
        }
        Some("refresh_token") => {
            let refresh = form.get("refresh_token").cloned().unwrap_or_default();
            if !fake.refresh_tokens.lock().await.contains(&refresh) {
                return invalid_grant("Refresh token revoked");
            }
            let access = format!("access-{}", fake.next_id());
            fake.access_tokens.lock().await.insert(access.clone());
            // like Spotify, no new refresh token and no scope on refresh
            Json(json!({
                "access_token": access,
                "token_type": "Bearer",
                "expires_in": 3600,
            }))
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response(),
    }
}

async fn check_api_call(fake: &FakeSpotify, headers: &HeaderMap) -> Option<Response> {
    fake.api_requests.fetch_add(1, Ordering::SeqCst);

    if let Some((status, retry_after)) = *fake.api_failure.lock().await {
        let mut response = (
            status,
            Json(json!({ "error": { "status": status.as_u16(), "message": "Simulated failure" } })),
        )
            .into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, secs.into());
        }
        return Some(response);
    }

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .unwrap_or_default();
    if !fake.access_tokens.lock().await.contains(&bearer) {
        return Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "status": 401, "message": "Invalid access token" } })),
            )
                .into_response(),
        );
    }
    None
}

async fn playlists_endpoint(State(fake): State<Arc<FakeSpotify>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = check_api_call(&fake, &headers).await {
        return rejection;
    }
    // Spotify returns null for playlists that are no longer available
    Json(json!({
        "items": [
            null,
            {
                "id": "pl1",
                "name": "Road Trip",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl1" }
            },
            {
                "id": "pl2",
                "name": "Rock & Roll <Live>",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl2" }
            }
        ],
        "total": 3,
        "next": null
    }))
    .into_response()
}

async fn top_tracks_endpoint(
    State(fake): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = check_api_call(&fake, &headers).await {
        return rejection;
    }
    let limit: usize = query
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(20);
    let items: Vec<_> = (1..=8)
        .take(limit)
        .map(|i| {
            json!({
                "id": format!("t{}", i),
                "name": format!("Track {}", i),
                "artists": [
                    { "id": format!("a{}", i), "name": format!("Artist {}", i) },
                    { "id": "feat", "name": "Featured" }
                ]
            })
        })
        .collect();
    Json(json!({ "items": items, "total": 8 })).into_response()
}

pub async fn spawn_fake_spotify() -> (Arc<FakeSpotify>, String) {
    let fake = Arc::new(FakeSpotify::default());
    let app = Router::new()
        .route("/authorize", get(|| async { "authorize page" }))
        .route("/api/token", post(token_endpoint))
        .route("/v1/me/playlists", get(playlists_endpoint))
        .route("/v1/me/top/tracks", get(top_tracks_endpoint))
        .with_state(Arc::clone(&fake));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (fake, base)
}

pub fn test_config(spotify_base: &str) -> Config {
    let values: HashMap<&str, String> = HashMap::from([
        ("SPOTIFY_API_AUTH_CLIENT_ID", CLIENT_ID.to_string()),
        ("SPOTIFY_API_AUTH_CLIENT_SECRET", CLIENT_SECRET.to_string()),
        ("SPOTIFY_API_REDIRECT_URI", REDIRECT_URI.to_string()),
        ("SPOTIFY_API_AUTH_SCOPE", SCOPE.to_string()),
        ("SPOTIFY_API_AUTH_URL", format!("{}/authorize", spotify_base)),
        ("SPOTIFY_API_TOKEN_URL", format!("{}/api/token", spotify_base)),
        ("SPOTIFY_API_URL", format!("{}/v1", spotify_base)),
        ("SERVER_ADDRESS", "127.0.0.1:0".to_string()),
        ("HTTP_TIMEOUT_SECS", "5".to_string()),
        ("SESSION_TTL_SECS", "600".to_string()),
    ]);
    Config::from_lookup(|name| values.get(name).cloned()).unwrap()
}

/// The front-end under test, wired to a fresh fake Spotify.
pub struct TestApp {
    pub url: String,
    pub client: reqwest::Client,
    pub sessions: SessionStore,
    pub spotify: Arc<FakeSpotify>,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let (spotify, base) = spawn_fake_spotify().await;
        let config = test_config(&base);
        let state = AppState::from_config(&config).unwrap();
        let sessions = state.sessions.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, server::router(state)).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            url,
            client,
            sessions,
            spotify,
            config,
        }
    }

    /// GET `path`, optionally presenting a session cookie.
    pub async fn get(&self, path: &str, session: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{}", self.url, path));
        if let Some(id) = session {
            req = req.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, id));
        }
        req.send().await.unwrap()
    }

    /// Creates a server-side session already holding `token`.
    pub async fn session_with_token(&self, id: &str, token: Token) {
        self.sessions
            .update(id, |data| data.token = Some(token))
            .await;
    }

    /// Makes the session look idle for two hours, well past its time-to-live.
    pub async fn expire_session(&self, id: &str) {
        self.sessions
            .update(id, |data| data.last_seen -= 2 * 3600)
            .await;
    }

    /// Runs the whole sign-in dance and returns the session id.
    pub async fn sign_in(&self) -> String {
        let res = self.get("/", None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let session = session_cookie(&res).expect("session cookie on first redirect");
        let state = query_param(&location(&res), "state").expect("state in authorize url");

        self.spotify.add_code("good-code").await;
        let res = self
            .get(
                &format!("/callback?code=good-code&state={}", state),
                Some(&session),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/get_playlists");
        session
    }
}

pub fn location(res: &reqwest::Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Value of the session cookie set by `res`, if any.
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn token(access: &str, refresh: &str, expires_at: i64) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
        scope: "playlist-read-private user-top-read".parse().unwrap(),
    }
}
