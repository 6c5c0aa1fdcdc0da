use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::{config::DEFAULT_SESSION_TTL_SECS, session::TokenCache, types::Token, utils, warning};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sporlweb_session";

/// Everything remembered about one browser between requests.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub token: Option<Token>,
    /// `state` value of the authorize redirect still waiting for its callback.
    pub csrf_state: Option<String>,
    /// Unix timestamp (seconds) of the last request that used this session.
    pub last_seen: i64,
}

/// Server-side session records keyed by session id.
///
/// A record that has not been used for longer than the store's time-to-live
/// is treated as absent by every accessor. [`SessionStore::prune`] drops such
/// records from memory; the server runs it periodically.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionData>>>,
    ttl_secs: i64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

impl SessionStore {
    /// Creates an empty store with the default time-to-live of one hour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose records expire after `ttl` without use.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Idle time after which a session is forgotten. Sub-second
    ///   parts are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// let store = SessionStore::with_ttl(Duration::from_secs(15 * 60));
    /// ```
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    fn is_live(&self, data: &SessionData, now: i64) -> bool {
        now.saturating_sub(data.last_seen) <= self.ttl_secs
    }

    /// Returns a copy of the record for `id` unless it is unknown or expired.
    pub async fn load(&self, id: &str) -> Option<SessionData> {
        let now = utils::now_timestamp();
        self.sessions
            .lock()
            .await
            .get(id)
            .filter(|data| self.is_live(data, now))
            .cloned()
    }

    /// True when a live record exists for `id`.
    pub async fn contains(&self, id: &str) -> bool {
        let now = utils::now_timestamp();
        self.sessions
            .lock()
            .await
            .get(id)
            .is_some_and(|data| self.is_live(data, now))
    }

    /// Marks the record for `id` as used now.
    ///
    /// # Returns
    ///
    /// `true` when a live record existed. Expired or unknown ids are left
    /// untouched and yield `false`.
    pub async fn touch(&self, id: &str) -> bool {
        let now = utils::now_timestamp();
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(data) if self.is_live(data, now) => {
                data.last_seen = now;
                true
            }
            _ => false,
        }
    }

    /// Applies `f` to the record for `id`, creating an empty one first if needed.
    ///
    /// An expired record is replaced by an empty one, so nothing from a
    /// stale session leaks into the new one. The record is marked as used
    /// before `f` runs.
    ///
    /// # Example
    ///
    /// ```
    /// store.update(&id, |data| data.csrf_state = Some(state)).await;
    /// ```
    pub async fn update<F, R>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let now = utils::now_timestamp();
        let mut sessions = self.sessions.lock().await;
        let data = sessions.entry(id.to_string()).or_default();
        if !self.is_live(data, now) {
            *data = SessionData::default();
        }
        data.last_seen = now;
        f(data)
    }

    /// Applies `f` only when a live record for `id` already exists.
    pub async fn update_existing<F, R>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let now = utils::now_timestamp();
        let mut sessions = self.sessions.lock().await;
        let data = sessions.get_mut(id).filter(|data| self.is_live(data, now))?;
        data.last_seen = now;
        Some(f(data))
    }

    /// Deletes the record for `id` and returns it, expired or not.
    pub async fn remove(&self, id: &str) -> Option<SessionData> {
        self.sessions.lock().await.remove(id)
    }

    /// Drops every expired record.
    ///
    /// # Returns
    ///
    /// The number of records removed.
    pub async fn prune(&self) -> usize {
        let now = utils::now_timestamp();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, data| self.is_live(data, now));
        before - sessions.len()
    }

    /// Number of records held in memory, including expired ones not yet pruned.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Handle on the session of the request being served.
///
/// Inserted into request extensions by [`session_layer`]. The id always
/// exists; the record behind it is only created on first write.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    /// Binds `id` to `store`. No record is created until something is written.
    pub fn new(id: String, store: SessionStore) -> Self {
        Self { id, store }
    }

    /// The session id as carried in the cookie. Log it through
    /// [`utils::short_id`] only.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remembers the `state` sent with the authorize redirect, replacing any
    /// earlier one.
    pub async fn set_csrf_state(&self, state: String) {
        self.store
            .update(&self.id, |data| data.csrf_state = Some(state))
            .await;
    }

    /// Returns the pending `state` value and forgets it, so it matches at most once.
    pub async fn take_csrf_state(&self) -> Option<String> {
        self.store
            .update_existing(&self.id, |data| data.csrf_state.take())
            .await
            .flatten()
    }

    /// Drops the whole session record.
    pub async fn destroy(&self) {
        self.store.remove(&self.id).await;
    }
}

impl TokenCache for Session {
    async fn get(&self) -> Option<Token> {
        self.store.load(&self.id).await.and_then(|data| data.token)
    }

    async fn save(&self, token: Token) {
        self.store
            .update(&self.id, |data| data.token = Some(token))
            .await;
    }

    async fn clear(&self) {
        self.store
            .update_existing(&self.id, |data| data.token = None)
            .await;
    }
}

/// Middleware attaching a [`Session`] to every request.
///
/// Sets the session cookie when a new session record was created while
/// handling the request, and expires it when the record was destroyed. A
/// cookie naming an expired session is treated like no cookie at all.
pub async fn session_layer(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let known = match session_id_from_headers(req.headers()) {
        Some(id) if store.touch(&id).await => Some(id),
        _ => None,
    };
    let id = known.clone().unwrap_or_else(utils::generate_session_id);

    req.extensions_mut()
        .insert(Session::new(id.clone(), store.clone()));

    let mut response = next.run(req).await;

    let cookie = match (known.is_some(), store.contains(&id).await) {
        (false, true) => Some(format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, id
        )),
        (true, false) => Some(format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE
        )),
        _ => None,
    };

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warning!("Could not build session cookie: {}", e),
        }
    }

    response
}

/// Finds the session id among the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
