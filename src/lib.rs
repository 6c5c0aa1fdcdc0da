//! Sporlweb Library
//!
//! A small web front-end that signs a visitor in with Spotify using the OAuth2
//! authorization-code grant and renders a few pieces of account data
//! (playlists, top tracks) fetched from the Spotify Web API.
//!
//! # Modules
//!
//! - `api` - HTTP route handlers
//! - `config` - Configuration loaded once at startup from environment and `.env`
//! - `error` - Error types and their HTTP rendering
//! - `server` - Router assembly and the HTTP listener
//! - `session` - Cookie sessions and the session-bound token cache
//! - `spotify` - Authorization flow and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - Small helpers (random values, HTML escaping, time)
//!
//! # Example
//!
//! ```
//! use sporlweb::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> sporlweb::Res<()> {
//!     config::load_env()?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for process-level operations that may fail.
///
/// Uses a boxed dynamic error trait object with Send + Sync bounds so it can
/// cross await points. Request handling code uses the typed errors in
/// [`error`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Session {} signed in", short_id);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for unrecoverable startup failures, such as missing client
/// credentials. Request handlers never call it.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems: rejected callbacks, failed refreshes, remote
/// API errors that end up on an error page.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
