//! Environment configuration, loaded once at startup (§6, §4.5).
//!
//! Every required variable's absence produces a clear diagnostic and a
//! non-zero exit — the Rust-idiomatic equivalent of the original system's
//! `log.Fatal("missing environment variable: ...")`.

use anyhow::{Context, Result};

const DEFAULT_LISTEN_ADDR: &str = ":1323";

/// Process-wide configuration, assembled from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP listener. A bare `:PORT` form (the
    /// original Echo server's convention) binds all interfaces.
    pub listen_addr: String,

    /// SQLite database file path. Repurposes the distilled spec's
    /// `MONGODB_CONNECTION_STRING` variable name as the *store wiring*
    /// variable, adapted to the chosen backend rather than dropped — see
    /// `SPEC_FULL.md` §6.
    pub database_path: String,

    /// Logical namespace label, retained for startup log output only; the
    /// SQLite backend has no separate database-namespace concept to
    /// create.
    pub database_name: String,

    pub admin_api_key: String,
    pub nodes_api_key: String,
}

impl Config {
    /// Load configuration from the process environment. `FOODTRUCK_LISTEN_ADDR`
    /// defaults to `:1323`; every other variable is required.
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("FOODTRUCK_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        let database_path = require_env("MONGODB_CONNECTION_STRING")?;
        let database_name = require_env("MONGODB_DATABASE_NAME")?;
        let admin_api_key = require_env("ADMIN_API_KEY")?;
        let nodes_api_key = require_env("NODES_API_KEY")?;

        Ok(Self {
            listen_addr: normalize_listen_addr(&listen_addr),
            database_path,
            database_name,
            admin_api_key,
            nodes_api_key,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing environment variable: {name}"))
}

/// A bare `:PORT` form binds all interfaces, matching the original's Echo
/// server convention; anything else (already a `host:port`) passes through.
fn normalize_listen_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}
