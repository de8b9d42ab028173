//! Default values shared by the configuration structs and the CLI.

use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/ticket-watch.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_WEB_HOST: &str = "0.0.0.0";
pub const DEFAULT_WEB_PORT: u16 = 8080;

pub const DEFAULT_QUERY_BASE_URL: &str = "https://kyfw.12306.cn/otn";
pub const DEFAULT_QUERY_ROUTE: &str = "leftTicket/query";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("ticket-watch/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

pub const DEFAULT_MAX_WORKERS: usize = 20;
pub const DEFAULT_MAX_INSTANCES: u32 = 3;
pub const DEFAULT_JOB_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MISFIRE_GRACE_TIME: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_SMTP_HOST: &str = "localhost";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_MAIL_FROM: &str = "ticket-watch@localhost";
