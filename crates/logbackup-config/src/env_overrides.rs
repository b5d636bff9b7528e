use super::ReconcilerConfig;
use anyhow::{Context, Result};

pub const ENV_PREFIX: &str = "LOGBACKUP_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the LOGBACKUP_ prefix
    /// Used for variables set by the Lambda runtime (AWS_LAMBDA_FUNCTION_NAME)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut ReconcilerConfig, env: &E) -> Result<()> {
    if let Some(arn) = get_env_string(env, "DESTINATION_ARN") {
        config.destination_arn = arn.trim().to_string();
    }

    // An explicitly empty prefix is meaningful: subscribe everything
    if let Some(prefix) = get_env_string(env, "LOG_GROUP_PREFIX") {
        config.log_group_prefix = prefix;
    }

    if let Some(schedule) = get_env_string(env, "SCHEDULE_EXPRESSION") {
        config.schedule_expression = schedule.trim().to_string();
    }

    if let Some(stack) = non_empty(get_env_string(env, "STACK_NAME")) {
        config.stack_name = Some(stack);
    }

    // Set by the Lambda runtime
    if let Some(function) = non_empty(env.get_raw("AWS_LAMBDA_FUNCTION_NAME")) {
        config.function_name = Some(function);
    }

    if let Some(prefixes) = get_env_string(env, "EXCLUDED_PREFIXES") {
        config.excluded_prefixes = split_list(&prefixes);
    }

    if let Some(name) = non_empty(get_env_string(env, "AGGREGATED_LOG_GROUP")) {
        config.aggregated_log_group = name;
    }

    // Logging
    if let Some(level) = non_empty(get_env_string(env, "LOG_LEVEL")) {
        config.log.level = level;
    }
    if let Some(format) = non_empty(get_env_string(env, "LOG_FORMAT")) {
        config.log.format = format
            .parse()
            .with_context(|| format!("Invalid {}LOG_FORMAT value", ENV_PREFIX))?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0
                .get(format!("{}{}", ENV_PREFIX, key).as_str())
                .map(|v| v.to_string())
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_env_overrides_apply() {
        let env = MapEnv(HashMap::from([
            (
                "LOGBACKUP_DESTINATION_ARN",
                " arn:aws:logs:us-east-1:111122223333:destination:central ",
            ),
            ("LOGBACKUP_LOG_GROUP_PREFIX", "/svc/"),
            ("LOGBACKUP_STACK_NAME", "log-backup"),
            ("AWS_LAMBDA_FUNCTION_NAME", "log-backup-Subscriber-XYZ"),
            ("LOGBACKUP_EXCLUDED_PREFIXES", "/aws/rds/, ,/aws/vpc/flow"),
            ("LOGBACKUP_LOG_FORMAT", "text"),
        ]));

        let mut config = ReconcilerConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(
            config.destination_arn,
            "arn:aws:logs:us-east-1:111122223333:destination:central"
        );
        assert_eq!(config.log_group_prefix, "/svc/");
        assert_eq!(config.stack_name.as_deref(), Some("log-backup"));
        assert_eq!(
            config.function_name.as_deref(),
            Some("log-backup-Subscriber-XYZ")
        );
        assert_eq!(config.excluded_prefixes, vec!["/aws/rds/", "/aws/vpc/flow"]);
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_blank_stack_name_is_ignored() {
        let env = MapEnv(HashMap::from([("LOGBACKUP_STACK_NAME", "  ")]));
        let mut config = ReconcilerConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();
        assert!(config.stack_name.is_none());
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        let env = MapEnv(HashMap::from([("LOGBACKUP_LOG_FORMAT", "xml")]));
        let mut config = ReconcilerConfig::default();
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
