//! Service configuration.

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/habit-tracker").
    pub data_dir: String,

    /// Expected JWT issuer (default: `<https://auth.example.com>`).
    pub auth_issuer: String,

    /// JWKS endpoint used to verify JWT signatures.
    ///
    /// Defaults to `<issuer>/.well-known/jwks.json`.
    pub auth_jwks_url: String,

    /// Expected JWT audience (default: "habit-tracker").
    pub auth_audience: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "/data/habit-tracker";
const DEFAULT_AUTH_ISSUER: &str = "https://auth.example.com";
const DEFAULT_AUTH_AUDIENCE: &str = "habit-tracker";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let auth_issuer = env_or("AUTH_ISSUER", DEFAULT_AUTH_ISSUER);
        let auth_jwks_url =
            std::env::var("AUTH_JWKS_URL").unwrap_or_else(|_| default_jwks_url(&auth_issuer));

        Self {
            listen_addr: env_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR),
            data_dir: env_or("DATA_DIR", DEFAULT_DATA_DIR),
            auth_issuer,
            auth_jwks_url,
            auth_audience: env_or("AUTH_AUDIENCE", DEFAULT_AUTH_AUDIENCE),
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", "*")),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn default_jwks_url(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            data_dir: DEFAULT_DATA_DIR.into(),
            auth_issuer: DEFAULT_AUTH_ISSUER.into(),
            auth_jwks_url: default_jwks_url(DEFAULT_AUTH_ISSUER),
            auth_audience: DEFAULT_AUTH_AUDIENCE.into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}
