use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub inbox: InboxConfig,

    #[command(flatten)]
    pub retention: RetentionConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "SPAMME_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public inbox and ingestion endpoints
    #[arg(long, env = "SPAMME_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for health probes and the sweep trigger
    #[arg(long, env = "SPAMME_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for background tasks on shutdown
    #[arg(long, env = "SPAMME_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout
    #[arg(long, env = "SPAMME_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Which message store to use
    #[arg(long = "storage", env = "SPAMME_STORAGE", value_enum, default_value_t = StorageBackend::Postgres)]
    pub backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    #[arg(long = "database-url", env = "SPAMME_DATABASE_URL")]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[arg(long = "db-max-connections", env = "SPAMME_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections to keep
    #[arg(long = "db-min-connections", env = "SPAMME_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long = "db-acquire-timeout-secs", env = "SPAMME_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Seconds before an idle connection is closed
    #[arg(long = "db-idle-timeout-secs", env = "SPAMME_DB_IDLE_TIMEOUT_SECS", default_value_t = 600)]
    pub idle_timeout_secs: u64,

    /// Maximum lifetime of a pooled connection
    #[arg(long = "db-max-lifetime-secs", env = "SPAMME_DB_MAX_LIFETIME_SECS", default_value_t = 1800)]
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct InboxConfig {
    /// Domain that local parts are appended to
    #[arg(long, env = "SPAMME_DOMAIN", default_value = "spam-me.appspotmail.com")]
    pub domain: String,

    /// Maximum number of messages shown for one inbox
    #[arg(long, env = "SPAMME_LIST_LIMIT", default_value_t = 100)]
    pub list_limit: i64,

    /// Largest raw message accepted at the ingestion endpoint
    #[arg(long, env = "SPAMME_MAX_MESSAGE_BYTES", default_value_t = 10_485_760)]
    pub max_message_bytes: usize,
}

#[derive(Clone, Debug, Args)]
pub struct RetentionConfig {
    /// How long a message lives after receipt or after its last pin
    #[arg(long, env = "SPAMME_TTL_SECS", default_value_t = 7200)]
    pub ttl_secs: i64,

    /// How often the background sweep runs (0 disables it)
    #[arg(long, env = "SPAMME_SWEEP_INTERVAL_SECS", default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    /// Number of ids deleted per statement during a sweep
    #[arg(long, env = "SPAMME_DELETE_BATCH_SIZE", default_value_t = 500)]
    pub delete_batch_size: usize,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the store readiness check
    #[arg(long, env = "SPAMME_HEALTH_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "SPAMME_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "SPAMME_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
