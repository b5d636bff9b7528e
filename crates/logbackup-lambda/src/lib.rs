// AWS Lambda runtime adapter
//
// Wires the reconciler to CloudWatch Logs and CloudFormation, then serves
// every trigger (lifecycle, schedule, CreateLogGroup) through one handler.
//
// Philosophy: Use lambda_runtime's provided tokio

use lambda_runtime::{service_fn, Error, LambdaEvent};
use logbackup_config::ReconcilerConfig;
use logbackup_core::{ReconcileEvent, Reconciler, SubscriptionPolicy};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, Instrument};

mod cloudwatch;
mod init;
mod response;

pub use cloudwatch::CloudWatchLogs;
pub use init::init_tracing;
pub use response::CloudFormationResponder;

type LambdaReconciler = Reconciler<CloudWatchLogs, CloudWatchLogs, CloudFormationResponder>;

/// Lambda handler: classify the payload once, then dispatch
async fn handle_request(
    event: LambdaEvent<Value>,
    reconciler: Arc<LambdaReconciler>,
) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let span = tracing::info_span!("invocation", request_id = %context.request_id);

    async move {
        let event = ReconcileEvent::from_value(payload);
        info!(kind = event.kind(), "Received event");

        let report = reconciler.handle(event).await?;
        Ok::<_, Error>(json!({ "status": "ok", "report": report.to_value() }))
    }
    .instrument(span)
    .await
}

/// Build the subscription policy from resolved configuration
pub fn build_policy(config: &ReconcilerConfig) -> SubscriptionPolicy {
    SubscriptionPolicy::new(config.destination_arn.clone())
        .with_prefix_filter(config.log_group_prefix.clone())
        .with_own_identity(config.stack_name.as_deref(), config.function_name.as_deref())
        .with_excluded_prefixes(config.excluded_prefixes.iter().cloned())
        .with_aggregated_log_group(config.aggregated_log_group.clone())
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = ReconcilerConfig::load()
        .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    init_tracing(&config.log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        "Starting log backup subscriber"
    );

    let destination = config
        .destination()
        .map_err(|e| Error::from(format!("Invalid destination: {:#}", e)))?;
    let policy = build_policy(&config);
    info!(
        destination = policy.destination_arn(),
        destination_region = %destination.region,
        destination_account = %destination.account_id,
        prefix = policy.prefix_filter(),
        excluded = ?policy.excluded_prefixes(),
        schedule = %config.schedule_expression,
        "Subscription policy resolved"
    );

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let logs = CloudWatchLogs::new(aws_sdk_cloudwatchlogs::Client::new(&sdk_config));

    let log_stream =
        std::env::var("AWS_LAMBDA_LOG_STREAM_NAME").unwrap_or_else(|_| "unknown".to_string());
    let responder = CloudFormationResponder::new(log_stream)
        .map_err(|e| Error::from(format!("{:#}", e)))?;

    let reconciler = Arc::new(Reconciler::new(logs.clone(), logs, responder, policy));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let reconciler = reconciler.clone();
        async move { handle_request(event, reconciler).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbackup_core::SkipReason;

    fn config() -> ReconcilerConfig {
        ReconcilerConfig {
            destination_arn: "arn:aws:logs:us-east-1:111122223333:destination:central".to_string(),
            log_group_prefix: "/svc/".to_string(),
            stack_name: Some("log-backup".to_string()),
            function_name: Some("log-backup-Subscriber-1AB".to_string()),
            excluded_prefixes: vec!["/aws/rds/".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn policy_reflects_configuration() {
        let policy = build_policy(&config());

        assert_eq!(
            policy.destination_arn(),
            "arn:aws:logs:us-east-1:111122223333:destination:central"
        );
        assert!(policy.in_scope("/svc/api"));
        assert!(!policy.in_scope("/other/api"));
        assert_eq!(
            policy.excluded_prefixes(),
            &[
                "/aws/lambda/log-backup".to_string(),
                "/aws/kinesisfirehose/log-backup".to_string(),
                "/aws/lambda/log-backup-Subscriber-1AB".to_string(),
                "/aws/rds/".to_string(),
            ]
        );
        assert!(policy.exclusion("/aws/rds/instance/db/error").is_some());
        assert_eq!(
            policy.exclusion("aws-controltower/CloudTrailLogs"),
            Some(SkipReason::Aggregated)
        );
    }

    #[test]
    fn aggregated_log_group_is_configurable() {
        let config = ReconcilerConfig {
            aggregated_log_group: "org-trail/CloudTrail".to_string(),
            ..config()
        };
        let policy = build_policy(&config);

        assert_eq!(
            policy.exclusion("org-trail/CloudTrail"),
            Some(SkipReason::Aggregated)
        );
        assert!(policy.exclusion("aws-controltower/CloudTrailLogs").is_none());
    }
}
