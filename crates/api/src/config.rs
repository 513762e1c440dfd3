use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Sync-path
    /// submissions stream the finished video inside this window.
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Externally reachable base URL; the provider posts callbacks here.
    pub public_base_url: String,
    /// How long finished or abandoned tasks stay in the registry (default: `3600`).
    pub task_retention_secs: u64,
    /// Apply bundled migrations at startup (default: `false`).
    pub run_migrations: bool,
    /// Access-token verification settings.
    pub jwt: JwtConfig,
    /// Kie AI provider settings.
    pub provider: ProviderConfig,
}

/// Settings for the Kie AI provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider API key. Unset means demo mode.
    pub api_key: Option<String>,
    /// Explicit opt-in to real processing (`USE_REAL_API=true`).
    pub use_real_api: bool,
    /// Provider API base URL.
    pub api_url: String,
    /// Link shown to users when a task outlives the client's polling budget.
    pub dashboard_url: String,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var             | Default                     |
    /// |---------------------|-----------------------------|
    /// | `KIE_API_KEY`       | unset (demo mode)           |
    /// | `USE_REAL_API`      | `false`                     |
    /// | `KIE_API_URL`       | `https://api.kie.ai`        |
    /// | `KIE_DASHBOARD_URL` | `https://kie.ai/dashboard`  |
    pub fn from_env() -> Self {
        let api_key = std::env::var("KIE_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let use_real_api = std::env::var("USE_REAL_API")
            .map(|v| v.trim() == "true")
            .unwrap_or(false);

        let api_url = std::env::var("KIE_API_URL")
            .unwrap_or_else(|_| soraclean_kie::api::DEFAULT_API_URL.into());

        let dashboard_url = std::env::var("KIE_DASHBOARD_URL")
            .unwrap_or_else(|_| soraclean_kie::api::DASHBOARD_URL.into());

        Self {
            api_key,
            use_real_api,
            api_url,
            dashboard_url,
        }
    }

    /// Whether submissions go to the provider. Otherwise the server runs in
    /// demo mode and refuses to process.
    pub fn processing_enabled(&self) -> bool {
        self.use_real_api && self.api_key.is_some()
    }

    /// `"live"` or `"demo"`, as reported by the health endpoint.
    pub fn mode(&self) -> &'static str {
        if self.processing_enabled() {
            "live"
        } else {
            "demo"
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:{PORT}`  |
    /// | `TASK_RETENTION_SECS`  | `3600`                     |
    /// | `RUN_MIGRATIONS`       | `false`                    |
    ///
    /// See [`JwtConfig::from_env`] and [`ProviderConfig::from_env`] for the
    /// remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let task_retention_secs: u64 = std::env::var("TASK_RETENTION_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("TASK_RETENTION_SECS must be a valid u64");

        let run_migrations = std::env::var("RUN_MIGRATIONS")
            .map(|v| v.trim() == "true")
            .unwrap_or(false);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            public_base_url,
            task_retention_secs,
            run_migrations,
            jwt: JwtConfig::from_env(),
            provider: ProviderConfig::from_env(),
        }
    }

    /// Absolute URL the provider should post job completions to.
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.public_base_url.trim_end_matches('/'))
    }
}
