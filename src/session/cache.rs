use std::{future::Future, sync::Arc};

use tokio::sync::Mutex;

use crate::types::Token;

/// Storage for the token set of one browser session.
///
/// Writes are whole-record overwrites, so a reader never observes a partially
/// updated token.
pub trait TokenCache {
    /// Returns the cached token, if any. No side effects.
    fn get(&self) -> impl Future<Output = Option<Token>> + Send;

    /// Replaces the cached token.
    fn save(&self, token: Token) -> impl Future<Output = ()> + Send;

    /// Forgets the cached token.
    fn clear(&self) -> impl Future<Output = ()> + Send;
}

/// A token cache that lives only in memory, detached from any HTTP session.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenCache {
    token: Arc<Mutex<Option<Token>>>,
}

impl MemoryTokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that already holds `token`.
    ///
    /// # Example
    ///
    /// ```
    /// let cache = MemoryTokenCache::with_token(token);
    /// let state = auth.validate_and_refresh(&cache).await;
    /// ```
    pub fn with_token(token: Token) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token))),
        }
    }
}

impl TokenCache for MemoryTokenCache {
    async fn get(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    async fn save(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    async fn clear(&self) {
        *self.token.lock().await = None;
    }
}
