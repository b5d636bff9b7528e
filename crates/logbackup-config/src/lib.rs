// logbackup-config - Runtime configuration for the subscriber Lambda
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from LOGBACKUP_CONFIG env var
// 3. Config file contents from LOGBACKUP_CONFIG_CONTENT env var
// 4. Default config file location (./logbackup.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use validation::DestinationArn;

/// Log group that Control Tower already ships to the log archive account
pub const DEFAULT_AGGREGATED_LOG_GROUP: &str = "aws-controltower/CloudTrailLogs";

/// Hourly sweep
pub const DEFAULT_SCHEDULE_EXPRESSION: &str = "rate(1 hour)";

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// CloudWatch Logs destination ARN receiving every subscription
    #[serde(default)]
    pub destination_arn: String,

    /// Only log groups starting with this prefix are subscribed (empty = all)
    #[serde(default)]
    pub log_group_prefix: String,

    /// Schedule of the periodic sweep rule
    #[serde(default = "default_schedule_expression")]
    pub schedule_expression: String,

    /// Name of the deploying stack; its Lambda log groups are never subscribed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,

    /// Name of this function; its own log group is never subscribed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// Additional log group prefixes that are never subscribed
    #[serde(default)]
    pub excluded_prefixes: Vec<String>,

    /// Log group already collected centrally by another mechanism
    #[serde(default = "default_aggregated_log_group")]
    pub aggregated_log_group: String,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_schedule_expression() -> String {
    DEFAULT_SCHEDULE_EXPRESSION.to_string()
}

fn default_aggregated_log_group() -> String {
    DEFAULT_AGGREGATED_LOG_GROUP.to_string()
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            destination_arn: String::new(),
            log_group_prefix: String::new(),
            schedule_expression: default_schedule_expression(),
            stack_name: None,
            function_name: None,
            excluded_prefixes: Vec::new(),
            aggregated_log_group: default_aggregated_log_group(),
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The parsed destination ARN. Only meaningful after `validate`.
    pub fn destination(&self) -> Result<DestinationArn> {
        self.destination_arn.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("plain".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.log_group_prefix, "");
        assert_eq!(config.schedule_expression, "rate(1 hour)");
        assert_eq!(config.aggregated_log_group, "aws-controltower/CloudTrailLogs");
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.excluded_prefixes.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReconcilerConfig::from_toml(
            r#"
            destination_arn = "arn:aws:logs:eu-west-1:111122223333:destination:archive"
            log_group_prefix = "/svc/"

            [log]
            level = "debug"
            format = "text"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_group_prefix, "/svc/");
        assert_eq!(config.schedule_expression, DEFAULT_SCHEDULE_EXPRESSION);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.validate().is_ok());

        let destination = config.destination().unwrap();
        assert_eq!(destination.region, "eu-west-1");
        assert_eq!(destination.account_id, "111122223333");
        assert_eq!(destination.name, "archive");
    }
}
