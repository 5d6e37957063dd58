use crate::auth::jwt::JwtConfig;

/// Runtime settings for the admin API process, read from the environment.
///
/// Defaults target a local toolkit run against a dev database; a deployed
/// instance overrides them per host. `DATABASE_URL` is deliberately not
/// here -- the pool reads it directly at startup, before any of this.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Origins the operator console may call from, comma-separated in
    /// `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Per-request deadline in seconds. Covers the long table walks
    /// (backup, import), so it runs looser than a CRUD default.
    pub request_timeout_secs: u64,
    /// Bearer-token verification settings (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read the environment, falling back to dev defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
        }
    }
}
