// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::ReconcilerConfig;
use anyhow::{anyhow, bail, Result};
use tracing::warn;

pub fn validate_config(config: &ReconcilerConfig) -> Result<()> {
    if config.destination_arn.is_empty() {
        bail!("destination_arn is required (set LOGBACKUP_DESTINATION_ARN)");
    }
    config.destination_arn.parse::<DestinationArn>()?;

    validate_schedule_expression(&config.schedule_expression)?;

    if config.excluded_prefixes.iter().any(|p| p.is_empty()) {
        bail!("excluded_prefixes must not contain empty entries");
    }

    if config.aggregated_log_group.is_empty() {
        bail!("aggregated_log_group must not be empty");
    }

    if config.stack_name.is_none() && config.function_name.is_none() {
        warn!("Neither stack_name nor function_name is set; own log groups are not excluded");
    }

    Ok(())
}

fn validate_schedule_expression(expression: &str) -> Result<()> {
    let inner = expression
        .strip_prefix("rate(")
        .or_else(|| expression.strip_prefix("cron("))
        .and_then(|rest| rest.strip_suffix(')'));

    match inner {
        Some(body) if !body.trim().is_empty() => Ok(()),
        _ => bail!(
            "schedule_expression must be rate(...) or cron(...), got '{}'",
            expression
        ),
    }
}

/// A parsed CloudWatch Logs destination ARN:
/// `arn:<partition>:logs:<region>:<account>:destination:<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub name: String,
}

impl std::str::FromStr for DestinationArn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            anyhow!(
                "destination_arn '{}' is not a CloudWatch Logs destination ARN",
                s
            )
        };

        let parts: Vec<&str> = s.splitn(7, ':').collect();
        let [arn, partition, service, region, account_id, resource, name] = parts[..] else {
            return Err(invalid());
        };

        if arn != "arn" || service != "logs" || resource != "destination" {
            return Err(invalid());
        }
        if !partition.starts_with("aws") {
            bail!("destination_arn has unknown partition '{}'", partition);
        }
        if region.is_empty() {
            bail!("destination_arn is missing a region");
        }
        if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
            bail!("destination_arn account '{}' must be 12 digits", account_id);
        }
        if name.is_empty() {
            bail!("destination_arn is missing a destination name");
        }

        Ok(Self {
            partition: partition.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(arn: &str) -> ReconcilerConfig {
        ReconcilerConfig {
            destination_arn: arn.to_string(),
            stack_name: Some("log-backup".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_destination_arn_parses() {
        let arn: DestinationArn = "arn:aws:logs:eu-central-1:111122223333:destination:archive"
            .parse()
            .unwrap();
        assert_eq!(arn.region, "eu-central-1");
        assert_eq!(arn.account_id, "111122223333");
        assert_eq!(arn.name, "archive");

        let gov: DestinationArn = "arn:aws-us-gov:logs:us-gov-west-1:111122223333:destination:a"
            .parse()
            .unwrap();
        assert_eq!(gov.partition, "aws-us-gov");
    }

    #[test]
    fn test_destination_arn_rejects_other_resources() {
        for arn in [
            "arn:aws:logs:us-east-1:111122223333:log-group:/aws/lambda/x",
            "arn:aws:kinesis:us-east-1:111122223333:stream/archive",
            "arn:aws:logs:us-east-1:1234:destination:archive",
            "arn:aws:logs::111122223333:destination:archive",
            "arn:aws:logs:us-east-1:111122223333:destination:",
            "central-archive",
        ] {
            assert!(arn.parse::<DestinationArn>().is_err(), "{}", arn);
        }
    }

    #[test]
    fn test_validate_config() {
        let valid = config_with("arn:aws:logs:us-east-1:111122223333:destination:central");
        assert!(validate_config(&valid).is_ok());

        assert!(validate_config(&config_with("")).is_err());

        let bad_schedule = ReconcilerConfig {
            schedule_expression: "every hour".to_string(),
            ..valid.clone()
        };
        assert!(validate_config(&bad_schedule).is_err());

        let empty_exclusion = ReconcilerConfig {
            excluded_prefixes: vec![String::new()],
            ..valid
        };
        assert!(validate_config(&empty_exclusion).is_err());
    }

    #[test]
    fn test_schedule_expressions() {
        assert!(validate_schedule_expression("rate(1 hour)").is_ok());
        assert!(validate_schedule_expression("cron(0 * * * ? *)").is_ok());
        assert!(validate_schedule_expression("rate()").is_err());
        assert!(validate_schedule_expression("1h").is_err());
    }
}
