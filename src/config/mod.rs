use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

/// Prefix for environment overrides, e.g. `TICKET_WATCH_SCHEDULER__MAX_WORKERS=8`
pub const ENV_PREFIX: &str = "TICKET_WATCH_";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

/// Settings for the remote left-ticket endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_base_url")]
    pub base_url: String,
    /// Route segment used until the endpoint hands out a corrected one
    #[serde(default = "default_query_route")]
    pub default_route: String,
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
    /// The endpoint has historically served certificates that fail verification
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Firings executing at once across every job
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Firings of a single job executing at once
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    #[serde(default = "default_job_interval", with = "duration_serde")]
    pub default_interval: Duration,
    /// How often the store is scanned for due jobs
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,
    /// Run times older than this are skipped instead of fired late
    #[serde(default = "default_misfire_grace_time", with = "duration_serde")]
    pub misfire_grace_time: Duration,
    /// Collapse a backlog of missed run times into a single firing
    #[serde(default)]
    pub coalesce: bool,
    /// How long shutdown waits for in-flight firings
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
    /// Leave trains without any available seat class out of digests. Off by
    /// default: every parsed train is mailed.
    #[serde(default)]
    pub notify_only_with_seats: bool,
}

/// Outbound mail. Credentials come from `SMTP_USERNAME` / `SMTP_PASSWORD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default = "default_mail_from")]
    pub from: String,
}

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_web_host() -> String {
    DEFAULT_WEB_HOST.to_string()
}

fn default_web_port() -> u16 {
    DEFAULT_WEB_PORT
}

fn default_query_base_url() -> String {
    DEFAULT_QUERY_BASE_URL.to_string()
}

fn default_query_route() -> String {
    DEFAULT_QUERY_ROUTE.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_max_instances() -> u32 {
    DEFAULT_MAX_INSTANCES
}

fn default_job_interval() -> Duration {
    DEFAULT_JOB_INTERVAL
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_misfire_grace_time() -> Duration {
    DEFAULT_MISFIRE_GRACE_TIME
}

fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_mail_from() -> String {
    DEFAULT_MAIL_FROM.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: default_query_base_url(),
            default_route: default_query_route(),
            request_timeout: default_request_timeout(),
            accept_invalid_certs: true,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_instances: default_max_instances(),
            default_interval: default_job_interval(),
            poll_interval: default_poll_interval(),
            misfire_grace_time: default_misfire_grace_time(),
            coalesce: false,
            shutdown_timeout: default_shutdown_timeout(),
            notify_only_with_seats: false,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            tls: true,
            from: default_mail_from(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load `config_file` (writing the defaults there first if it is missing)
    /// and layer `TICKET_WATCH_*` environment overrides on top.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config to {config_file}"))?;
            info!("Created default config file: {}", config_file);
        }

        let config: Config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {config_file}"))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.max_workers == 0 {
            anyhow::bail!("scheduler.max_workers must be at least 1");
        }
        if self.scheduler.max_instances == 0 {
            anyhow::bail!("scheduler.max_instances must be at least 1");
        }
        if self.scheduler.default_interval.as_millis() == 0 {
            anyhow::bail!("scheduler.default_interval must be at least 1ms");
        }
        if self.scheduler.poll_interval.is_zero() {
            anyhow::bail!("scheduler.poll_interval must be greater than zero");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_polling_policy() {
        let config = Config::default();
        assert_eq!(config.scheduler.max_workers, 20);
        assert_eq!(config.scheduler.max_instances, 3);
        assert_eq!(config.scheduler.default_interval, Duration::from_secs(60));
        assert!(!config.scheduler.coalesce);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(2));
        assert_eq!(config.query.default_route, "leftTicket/query");
        assert!(!config.scheduler.notify_only_with_seats);
    }

    #[test]
    fn test_load_writes_default_file_and_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let config = Config::load_from_file(path).unwrap();
        assert!(Path::new(path).exists());
        assert_eq!(config.web.port, DEFAULT_WEB_PORT);

        std::fs::write(
            path,
            "[query]\nrequest_timeout = \"3s\"\naccept_invalid_certs = false\n\n[retry]\nmax_attempts = 5\n",
        )
        .unwrap();
        let config = Config::load_from_file(path).unwrap();
        assert_eq!(config.query.request_timeout, Duration::from_secs(3));
        assert!(!config.query.accept_invalid_certs);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay, DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.scheduler.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.scheduler.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval_in_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\npoll_interval = 0\n").unwrap();
        assert!(Config::load_from_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_sub_second_interval_is_accepted() {
        let mut config = Config::default();
        config.scheduler.default_interval = Duration::from_millis(500);
        assert!(config.validate().is_ok());
        config.scheduler.default_interval = Duration::from_micros(500);
        assert!(config.validate().is_err());
    }
}
