use crate::errors::config_error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for both listeners and the store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the control channel binds to
    pub host: String,
    /// Control channel port, 0 picks a free one
    pub port: u16,
    /// Host the file side-channel binds to
    pub http_host: String,
    /// File side-channel port, 0 picks a free one
    pub http_port: u16,
    /// Base URL advertised to clients for the side-channel
    pub public_http_url: Option<String>,
    /// SQLite database file
    pub database_url: String,
    pub database_pool_size: u32,
    /// Maximum number of messages returned by GET_MESSAGES
    pub history_limit: i64,
    /// Maximum size of a single control record
    pub max_frame_bytes: usize,
    /// Maximum upload body size
    pub max_upload_bytes: usize,
    /// Time a new connection has to send its name
    pub handshake_timeout: Duration,
    /// Events buffered per session before new ones are dropped
    pub outbound_queue_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 5555,
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            public_http_url: None,
            database_url: "chat_history.db".to_string(),
            database_pool_size: 8,
            history_limit: 50,
            max_frame_bytes: 4 * 1024 * 1024,
            max_upload_bytes: 50 * 1024 * 1024,
            handshake_timeout: Duration::from_secs(30),
            outbound_queue_len: 256,
        }
    }
}

impl Config {
    /// Loads the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let host = env::var("CHAT_HOST").unwrap_or(defaults.host);
        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| host.clone());

        Ok(Config {
            port: parse_var("CHAT_PORT", defaults.port)?,
            http_port: parse_var("HTTP_PORT", defaults.http_port)?,
            public_http_url: env::var("PUBLIC_HTTP_URL").ok(),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_pool_size: parse_var("DATABASE_POOL_SIZE", defaults.database_pool_size)?,
            history_limit: parse_var("HISTORY_LIMIT", defaults.history_limit)?,
            max_frame_bytes: parse_var("MAX_FRAME_BYTES", defaults.max_frame_bytes)?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            handshake_timeout: Duration::from_secs(parse_var(
                "HANDSHAKE_TIMEOUT_SECS",
                defaults.handshake_timeout.as_secs(),
            )?),
            outbound_queue_len: parse_var("OUTBOUND_QUEUE_LEN", defaults.outbound_queue_len)?,
            host,
            http_host,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .or(Err(ConfigError::InvalidValue { key, value })),
        Err(_) => Ok(default),
    }
}
