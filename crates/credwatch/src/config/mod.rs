use std::env;
use std::fmt;
use std::time::Duration;

use crate::workflows::expiry::{AuditSettings, GraphSettings, NotificationTemplate};

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_TICKET_URL: &str = "https://tickets.example.com/new";
const MAX_WINDOW_DAYS: i64 = 36_500;

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the audit job.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub directory: DirectoryConfig,
    pub audit: AuditConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("CREDWATCH_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let directory = DirectoryConfig {
            tenant_id: required("CREDWATCH_TENANT_ID")?,
            client_id: required("CREDWATCH_CLIENT_ID")?,
            client_secret: required("CREDWATCH_CLIENT_SECRET")?,
            graph_base_url: env::var("CREDWATCH_GRAPH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string()),
            authority_url: env::var("CREDWATCH_AUTHORITY_URL")
                .unwrap_or_else(|_| DEFAULT_AUTHORITY_URL.to_string()),
            timeout_secs: parse_number("CREDWATCH_HTTP_TIMEOUT_SECS", 20)?,
        };

        let audit = AuditConfig {
            window_days: parse_number("CREDWATCH_WINDOW_DAYS", 30)?,
            alert_days: parse_number("CREDWATCH_ALERT_DAYS", 30)?,
            operations_mailbox: required("CREDWATCH_OPS_MAILBOX")?,
            sender: required("CREDWATCH_SENDER")?,
            ticket_url: env::var("CREDWATCH_TICKET_URL")
                .unwrap_or_else(|_| DEFAULT_TICKET_URL.to_string()),
        };
        audit.validate()?;

        let log_level = env::var("CREDWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            directory,
            audit,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Service principal and endpoints used to reach the directory.
#[derive(Clone)]
pub struct DirectoryConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub graph_base_url: String,
    pub authority_url: String,
    pub timeout_secs: u64,
}

impl DirectoryConfig {
    pub fn graph_settings(&self) -> GraphSettings {
        GraphSettings {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            graph_base_url: self.graph_base_url.clone(),
            authority_url: self.authority_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("graph_base_url", &self.graph_base_url)
            .field("authority_url", &self.authority_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Look-ahead window, alert point, and notification addressing.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub window_days: i64,
    pub alert_days: i64,
    pub operations_mailbox: String,
    pub sender: String,
    pub ticket_url: String,
}

impl AuditConfig {
    /// The alert point must sit inside the window, otherwise nothing could fire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days < 0 || self.alert_days < 0 {
            return Err(ConfigError::NegativeDays);
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::WindowTooLarge {
                window_days: self.window_days,
                max_days: MAX_WINDOW_DAYS,
            });
        }
        if self.alert_days > self.window_days {
            return Err(ConfigError::AlertOutsideWindow {
                alert_days: self.alert_days,
                window_days: self.window_days,
            });
        }
        Ok(())
    }

    pub fn settings(&self, dry_run: bool) -> AuditSettings {
        AuditSettings {
            window_days: self.window_days,
            alert_days: self.alert_days,
            operations_mailbox: self.operations_mailbox.clone(),
            sender: self.sender.clone(),
            template: NotificationTemplate {
                ticket_url: self.ticket_url.clone(),
            },
            dry_run,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidNumber { name: &'static str, value: String },
    NegativeDays,
    WindowTooLarge { window_days: i64, max_days: i64 },
    AlertOutsideWindow { alert_days: i64, window_days: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} must be set"),
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a whole number, got '{value}'")
            }
            ConfigError::NegativeDays => {
                write!(f, "window and alert day counts must not be negative")
            }
            ConfigError::WindowTooLarge {
                window_days,
                max_days,
            } => write!(
                f,
                "window of {window_days} days exceeds the {max_days}-day maximum"
            ),
            ConfigError::AlertOutsideWindow {
                alert_days,
                window_days,
            } => write!(
                f,
                "alert point of {alert_days} days lies outside the {window_days}-day window"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
