// Configuration source loading.
//
// Priority order:
// 1. Environment variables (LOGBACKUP_* prefix, plus AWS_LAMBDA_FUNCTION_NAME)
// 2. Config file path from LOGBACKUP_CONFIG
// 3. Inline config content from LOGBACKUP_CONFIG_CONTENT
// 4. Default config file (./logbackup.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::ReconcilerConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "./logbackup.toml";

/// Load configuration using the process environment and any config file.
pub fn load_config() -> Result<ReconcilerConfig> {
    let file_config = load_from_file()?;
    resolve(file_config, &StdEnvSource)
}

/// Layer env overrides on top of the file (or defaults), then validate.
pub(crate) fn resolve<E: EnvSource>(
    file_config: Option<ReconcilerConfig>,
    env: &E,
) -> Result<ReconcilerConfig> {
    let mut config = file_config.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<ReconcilerConfig>> {
    if let Ok(path) = env::var(format!("{}CONFIG", ENV_PREFIX)) {
        return read_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var(format!("{}CONFIG_CONTENT", ENV_PREFIX)) {
        let config: ReconcilerConfig = toml::from_str(&content)
            .context("Failed to parse inline config from LOGBACKUP_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        return read_file(default_path).map(Some);
    }

    Ok(None)
}

fn read_file(path: &Path) -> Result<ReconcilerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct NoEnv;

    impl EnvSource for NoEnv {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn get_raw(&self, _key: &str) -> Option<String> {
            None
        }
    }

    struct DestinationOnly;

    impl EnvSource for DestinationOnly {
        fn get(&self, key: &str) -> Option<String> {
            (key == "DESTINATION_ARN")
                .then(|| "arn:aws:logs:us-east-1:111122223333:destination:from-env".to_string())
        }

        fn get_raw(&self, _key: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn defaults_without_destination_fail_validation() {
        let err = resolve(None, &NoEnv).unwrap_err();
        assert!(err.to_string().contains("destination_arn"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
destination_arn = "arn:aws:logs:us-east-1:111122223333:destination:from-file"
log_group_prefix = "/svc/"
"#
        )
        .unwrap();

        let file_config = read_file(file.path()).unwrap();
        let config = resolve(Some(file_config), &DestinationOnly).unwrap();

        assert!(config.destination_arn.ends_with("destination:from-env"));
        assert_eq!(config.log_group_prefix, "/svc/");
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = read_file(Path::new("/nonexistent/logbackup.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/logbackup.toml"));
    }
}
