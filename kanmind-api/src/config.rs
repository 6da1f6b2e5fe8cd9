/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file loaded
/// first when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 chars)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for text
/// - `RUST_LOG`: Log filter (default: kanmind_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use kanmind_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub log: LogConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_cors_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - a numeric variable doesn't parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins =
            parse_cors_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let log_format = env::var("LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            log: LogConfig { format: log_format },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.is_empty() || self.api.cors_origins.iter().any(|o| o == "*")
    }
}
