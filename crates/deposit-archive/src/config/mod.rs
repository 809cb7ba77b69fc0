use std::env;
use std::fmt;
use std::time::Duration;

use crate::workflows::archival::SchedulePolicy;

/// Distinguishes runtime behavior for different stages of the worker.
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

/// Top-level configuration for the worker.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub archive: ArchiveConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let job_name = env::var("ARCHIVE_JOB_NAME").unwrap_or_else(|_| "system-archive".to_string());
        if job_name.trim().is_empty() {
            return Err(ConfigError::EmptyJobName);
        }

        let schedule = match env::var("ARCHIVE_SCHEDULE")
            .unwrap_or_else(|_| "window".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "window" => ScheduleKind::Window,
            "midnight" => ScheduleKind::Midnight,
            other => return Err(ConfigError::UnknownSchedule(other.to_string())),
        };

        let window_start_hour = read_number("ARCHIVE_WINDOW_START_HOUR", 1)?;
        let window_end_hour = read_number("ARCHIVE_WINDOW_END_HOUR", 2)?;
        if window_start_hour >= window_end_hour || window_end_hour > 24 {
            return Err(ConfigError::InvalidWindow {
                start: window_start_hour,
                end: window_end_hour,
            });
        }

        let poll_seconds = read_interval("ARCHIVE_POLL_SECONDS", 60)?;
        let retry_seconds = read_interval("ARCHIVE_RETRY_SECONDS", 300)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            archive: ArchiveConfig {
                job_name: job_name.trim().to_string(),
                schedule,
                window_start_hour,
                window_end_hour,
                poll_interval: Duration::from_secs(poll_seconds.into()),
                retry_backoff: Duration::from_secs(retry_seconds.into()),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn read_number(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn read_interval(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match read_number(name, default)? {
        0 => Err(ConfigError::InvalidInterval { name }),
        seconds => Ok(seconds),
    }
}

/// Which scheduling policy drives the archival job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Window,
    Midnight,
}

/// Settings for the archival job and its scheduler.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub job_name: String,
    pub schedule: ScheduleKind,
    pub window_start_hour: u32,
    pub window_end_hour: u32,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
}

impl ArchiveConfig {
    pub fn policy(&self) -> SchedulePolicy {
        match self.schedule {
            ScheduleKind::Window => SchedulePolicy::Window {
                start_hour: self.window_start_hour,
                end_hour: self.window_end_hour,
                poll_interval: self.poll_interval,
            },
            ScheduleKind::Midnight => SchedulePolicy::Midnight {
                retry_backoff: self.retry_backoff,
            },
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyJobName,
    UnknownSchedule(String),
    InvalidNumber { name: &'static str, value: String },
    InvalidWindow { start: u32, end: u32 },
    InvalidInterval { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyJobName => write!(f, "ARCHIVE_JOB_NAME must not be empty"),
            ConfigError::UnknownSchedule(value) => {
                write!(f, "ARCHIVE_SCHEDULE must be 'window' or 'midnight' (got '{value}')")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer (got '{value}')")
            }
            ConfigError::InvalidWindow { start, end } => write!(
                f,
                "archive window {start}:00-{end}:00 is invalid; start must precede end and end must not exceed 24"
            ),
            ConfigError::InvalidInterval { name } => {
                write!(f, "{name} must be at least one second")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
