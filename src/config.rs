use std::{env, time::Duration};

/// AppConfig
///
/// Holds the portal's entire configuration state. Loaded once at startup and
/// shared immutably through the application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Database connection string (Postgres). `None` runs against the in-memory user store.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the local `x-user-id` bypass and log format.
    pub env: Env,
    // Secret key used to decode and validate incoming JWTs.
    pub jwt_secret: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Upper bound for session hydration before a guard gives up and treats the
    // session as unauthenticated. `None` waits for hydration indefinitely.
    pub hydration_timeout: Option<Duration>,
}

/// Env
///
/// Defines the runtime context, used to switch between development utilities
/// (header bypass, pretty logs) and production behaviour (strict auth, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "local-development-jwt-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_HYDRATION_TIMEOUT_MS: u64 = 5_000;

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            hydration_timeout: Some(Duration::from_millis(DEFAULT_HYDRATION_TIMEOUT_MS)),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` or `DATABASE_URL` is missing, or when
    /// `HYDRATION_TIMEOUT_MS` is set but not a number. The service must not start
    /// with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL must be set in production."),
            ),
            Env::Local => env::var("DATABASE_URL").ok(),
        };

        // 0 disables the bound entirely.
        let hydration_timeout = match env::var("HYDRATION_TIMEOUT_MS") {
            Ok(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .expect("FATAL: HYDRATION_TIMEOUT_MS must be a whole number of milliseconds.");
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            Err(_) => Some(Duration::from_millis(DEFAULT_HYDRATION_TIMEOUT_MS)),
        };

        Self {
            db_url,
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            hydration_timeout,
        }
    }
}
