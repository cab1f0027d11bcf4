use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed
/// to be immutable once loaded, ensuring consistency across all requests. It is
/// pulled into the application state via FromRef, so the guard middleware and
/// any future handlers read the same snapshot.
#[derive(Clone)]
pub struct AppConfig {
    // Listen address for the standalone binary.
    pub bind_addr: String,
    // Runtime environment marker. Controls log formatting and the default scheme.
    pub env: Env,
    // Scheme assumed for the same-origin identity call when the request carries
    // no `x-forwarded-proto` header. Local traffic is plain HTTP; production
    // traffic always arrives through a TLS-terminating proxy.
    pub default_scheme: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, plain-HTTP origins) and production-grade behavior (JSON logs,
/// HTTPS origins).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for
    /// test setup. This allows tests to instantiate the configuration without
    /// touching process environment variables.
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            env: Env::Local,
            default_scheme: "http".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at
    /// startup. It reads all parameters from environment variables; every
    /// variable has a safe default, so the guard can start with no environment
    /// at all and behave like a local deployment.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let default_scheme = match env {
            Env::Local => "http".to_string(),
            Env::Production => "https".to_string(),
        };

        Self {
            bind_addr,
            env,
            default_scheme,
        }
    }
}
