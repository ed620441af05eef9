use std::env;

/// Runtime settings for the HTTP server, read once at startup.
///
/// Every variable has a local-development default; deployments override
/// through the environment. `DATABASE_URL` is not part of this struct:
/// the binary reads it directly while wiring the pool.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, `HOST` (default `0.0.0.0`).
    pub host: String,
    /// Bind port, `PORT` (default `3000`).
    pub port: u16,
    /// Allowed CORS origins, `CORS_ORIGINS` as a comma-separated list
    /// (default `http://localhost:5173`, the Vite dev server).
    pub cors_origins: Vec<String>,
    /// Per-request timeout in seconds, `REQUEST_TIMEOUT_SECS` (default `30`).
    pub request_timeout_secs: u64,
    /// Drain window in seconds once a shutdown signal arrives,
    /// `SHUTDOWN_TIMEOUT_SECS` (default `30`). Reserved: the server
    /// currently drains without a deadline.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Read the full configuration from the environment.
    ///
    /// Malformed numeric values abort startup.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parsed_env_or("PORT", "3000"),
            cors_origins: split_csv(&env_or("CORS_ORIGINS", "http://localhost:5173")),
            request_timeout_secs: parsed_env_or("REQUEST_TIMEOUT_SECS", "30"),
            shutdown_timeout_secs: parsed_env_or("SHUTDOWN_TIMEOUT_SECS", "30"),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_env_or<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
{
    env_or(name, default)
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid number"))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
