//! # Session Module
//!
//! Browser sessions and the token cache bound to them.
//!
//! A session is identified by an opaque random id carried in the
//! `sporlweb_session` cookie; the data itself stays on the server in a
//! [`SessionStore`]. Handlers see the current session as a [`Session`] handle,
//! which implements [`TokenCache`] so the authorization flow can read and
//! write the token set without knowing where it lives.
//!
//! [`MemoryTokenCache`] is a standalone [`TokenCache`] for code that runs
//! outside a request, tests in particular.

mod cache;
mod store;

pub use cache::MemoryTokenCache;
pub use cache::TokenCache;
pub use store::SESSION_COOKIE;
pub use store::Session;
pub use store::SessionData;
pub use store::SessionStore;
pub use store::session_id_from_headers;
pub use store::session_layer;
