//! Application settings and configuration structures.

use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// JWT verification for optional user identity
    pub jwt: JwtSettings,

    /// CSRF token lifecycle
    pub csrf: CsrfSettings,

    /// Rate limiting policy table
    pub rate_limit: RateLimitSettings,

    /// Request size ceilings
    pub limits: RequestLimitSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,

    /// Take the client address from X-Forwarded-For / X-Real-IP. Only safe
    /// behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins; empty allows any
    pub allowed_origins: Vec<String>,
}

/// JWT configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtSettings {
    /// HS256 secret shared with the auth provider. Without it no request
    /// carries a user identity and `user_or_ip` keys fall back to the IP.
    pub secret: Option<String>,
}

/// CSRF token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfSettings {
    /// Reject state-changing requests without a valid token
    pub enabled: bool,

    /// Token lifetime in seconds (default: 1800)
    pub token_ttl_secs: u64,

    /// Expired token sweep period in seconds (default: 300)
    pub sweep_interval_secs: u64,

    /// Header carrying the session identifier
    pub session_header: String,

    /// Header carrying the presented token
    pub token_header: String,

    /// Path prefixes never checked
    pub exempt_paths: Vec<String>,
}

/// How a rate limit counter key is derived from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Client IP address
    Ip,
    /// Client IP address joined with the User-Agent
    IpUserAgent,
    /// Authenticated user id, falling back to the client IP
    UserOrIp,
}

/// One row of the rate limit table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Path prefixes this policy guards
    pub paths: Vec<String>,
    /// Window duration in seconds
    pub window_secs: u64,
    /// Requests admitted per window
    pub max_requests: u32,
    /// Counter key derivation
    pub key: KeyStrategy,
    /// Path prefixes that bypass counting entirely
    pub skip_paths: Vec<String>,
    /// Give back the slot of requests that end with a status below 400
    pub skip_successful_requests: bool,
    /// Message returned with 429 responses
    pub message: String,
}

impl RateLimitPolicy {
    pub fn general() -> Self {
        Self {
            paths: vec!["/".to_string()],
            window_secs: 15 * 60,
            max_requests: 100,
            key: KeyStrategy::Ip,
            skip_paths: vec!["/health".to_string()],
            skip_successful_requests: false,
            message: "Too many requests from this IP, please try again later.".to_string(),
        }
    }

    pub fn auth() -> Self {
        Self {
            paths: vec!["/api/v1/auth".to_string()],
            window_secs: 15 * 60,
            max_requests: 5,
            key: KeyStrategy::IpUserAgent,
            skip_paths: Vec::new(),
            skip_successful_requests: true,
            message: "Too many authentication attempts, please try again later.".to_string(),
        }
    }

    pub fn search() -> Self {
        Self {
            paths: vec!["/api/v1/search".to_string()],
            window_secs: 60,
            max_requests: 30,
            key: KeyStrategy::Ip,
            skip_paths: Vec::new(),
            skip_successful_requests: false,
            message: "Too many search requests, please slow down.".to_string(),
        }
    }

    pub fn payment() -> Self {
        Self {
            paths: vec!["/api/v1/payments".to_string()],
            window_secs: 15 * 60,
            max_requests: 3,
            key: KeyStrategy::UserOrIp,
            skip_paths: Vec::new(),
            skip_successful_requests: false,
            message: "Too many payment requests, please try again later.".to_string(),
        }
    }

    /// Whether this policy guards `path`.
    pub fn guards(&self, path: &str) -> bool {
        self.paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Window duration as a chrono duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs as i64)
    }
}

/// Rate limiting configuration: one policy per endpoint class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub general: RateLimitPolicy,
    pub auth: RateLimitPolicy,
    pub search: RateLimitPolicy,
    pub payment: RateLimitPolicy,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            general: RateLimitPolicy::general(),
            auth: RateLimitPolicy::auth(),
            search: RateLimitPolicy::search(),
            payment: RateLimitPolicy::payment(),
        }
    }
}

/// Request size ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLimitSettings {
    /// Largest accepted request body in bytes (default: 10 MiB)
    pub max_body_bytes: usize,
}

/// Minimum required length for a configured JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                trust_proxy: false,
            },
            cors: CorsSettings {
                allowed_origins: vec!["http://localhost:8081".to_string()],
            },
            jwt: JwtSettings::default(),
            csrf: CsrfSettings {
                enabled: true,
                token_ttl_secs: 30 * 60,
                sweep_interval_secs: 5 * 60,
                session_header: "x-session-id".to_string(),
                token_header: "x-csrf-token".to_string(),
                exempt_paths: Vec::new(),
            },
            rate_limit: RateLimitSettings::default(),
            limits: RequestLimitSettings {
                max_body_bytes: 10 * 1024 * 1024,
            },
            environment: "development".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if [`Settings::validate`] rejects the result.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let defaults = Settings {
            environment: environment.clone(),
            ..Settings::default()
        };

        Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__RATE_LIMIT__AUTH__MAX_REQUESTS=10 -> rate_limit.auth.max_requests = 10
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("csrf.exempt_paths")
                    .with_list_parse_key("rate_limit.general.skip_paths")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secret) = &self.jwt.secret {
            if secret.len() < MIN_JWT_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "JWT secret must be at least {} characters. Current length: {}",
                    MIN_JWT_SECRET_LENGTH,
                    secret.len()
                )));
            }
        }

        if self.csrf.token_ttl_secs == 0 {
            return Err(ConfigError::Message("csrf.token_ttl_secs must be positive".into()));
        }
        if self.csrf.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "csrf.sweep_interval_secs must be positive".into(),
            ));
        }

        for (name, policy) in self.rate_limit.policies() {
            if policy.window_secs == 0 {
                return Err(ConfigError::Message(format!(
                    "rate_limit.{}.window_secs must be positive",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Whether production-only hardening applies.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl RateLimitSettings {
    /// Iterate the policy table with its names.
    pub fn policies(&self) -> [(&'static str, &RateLimitPolicy); 4] {
        [
            ("general", &self.general),
            ("auth", &self.auth),
            ("search", &self.search),
            ("payment", &self.payment),
        ]
    }
}

impl ServerSettings {
    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
