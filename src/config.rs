//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), with per-key defaults suited to the
//! demo deployment.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level matcher configuration.
///
/// Loaded once at startup via [`MatcherConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Socket address to bind the server to (default `0.0.0.0:5005`).
    pub listen_addr: SocketAddr,

    /// Delay before a requested booking reminder fires, in seconds.
    pub remind_delay_secs: u64,

    /// Lower bound of the randomized arrival estimate, in minutes.
    pub arrival_min_minutes: u32,

    /// Upper bound (inclusive) of the randomized arrival estimate.
    pub arrival_max_minutes: u32,

    /// Optional JSON seed file replacing the built-in sample profiles.
    pub profile_path: Option<PathBuf>,
}

impl MatcherConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5005".to_string())
            .parse()?;

        let remind_delay_secs = parse_env("REMIND_DELAY_SECS", 30);
        let arrival_min_minutes = parse_env("ARRIVAL_MIN_MINUTES", 3);
        let arrival_max_minutes = parse_env("ARRIVAL_MAX_MINUTES", 8);
        let profile_path = std::env::var("PROFILE_PATH").ok().map(PathBuf::from);

        Ok(Self {
            listen_addr,
            remind_delay_secs,
            arrival_min_minutes,
            arrival_max_minutes,
            profile_path,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
