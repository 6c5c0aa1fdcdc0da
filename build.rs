//! Build script for the sporlweb front-end.
//!
//! Copies the `.env.example` template into the user's local data directory so
//! that a fresh install has a configuration skeleton next to the place where
//! the server looks for its `.env` file.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root to the local data directory.
///
/// # File Operations
///
/// Templates are copied to the platform-specific local data directory:
/// - Linux: `~/.local/share/sporlweb/.env.example`
/// - macOS: `~/Library/Application Support/sporlweb/.env.example`
/// - Windows: `%LOCALAPPDATA%/sporlweb/.env.example`
///
/// Nothing here is fatal: a missing template or an unwritable data directory
/// only produces a cargo warning.
///
/// # Environment Variables Used
///
/// - `CARGO_MANIFEST_DIR` - Path to the crate root directory (provided by cargo)
fn main() {
    println!("cargo:rerun-if-changed=.env.example");

    if let Err(e) = copy_env_template() {
        println!("cargo:warning=could not install .env.example: {}", e);
    }
}

fn copy_env_template() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("sporlweb");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
