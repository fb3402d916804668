use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services.
/// It is pulled into the application state via FromRef, embodying the "immutable AppConfig"
/// part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // MongoDB connection string.
    pub mongo_uri: String,
    // Name of the database holding the `users` and `blogs` collections.
    pub db_name: String,
    // Secret key used to sign and validate bearer tokens.
    pub jwt_secret: String,
    // Lifetime of issued tokens in seconds (default: one day).
    pub token_ttl_secs: i64,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // Runtime environment marker. Controls the logging output format.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, permissive fallbacks) and production-grade settings (JSON logs,
/// mandatory secrets).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            db_name: "visafastbd".to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_secs: 86_400,
            port: 5000,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime environment
    /// (especially Production) is not found. This prevents the application from starting
    /// with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Token Secret Resolution
        // The production secret is mandatory and must be explicitly set.
        let jwt_secret = match env {
            Env::Production => env::var("ACCESS_TOKEN_SECRET")
                .expect("FATAL: ACCESS_TOKEN_SECRET must be set in production."),
            // In local, we provide a fallback, though the developer should ideally use a real secret.
            _ => env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
        };

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let db_name = env::var("MONGO_DB_NAME").unwrap_or_else(|_| "visafastbd".to_string());

        let mongo_uri = match env {
            // The connection string must be explicitly set in production.
            Env::Production => {
                env::var("MONGODB_URI").expect("FATAL: MONGODB_URI required in prod")
            }
            // Local development falls back to a default standalone instance.
            Env::Local => {
                env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
            }
        };

        Self {
            mongo_uri,
            db_name,
            jwt_secret,
            token_ttl_secs,
            port,
            env,
        }
    }
}
