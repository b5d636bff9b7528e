//! CloudWatch Logs client adapter
//!
//! Implements the directory and subscription seams on top of the AWS SDK.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::Client;
use logbackup_core::{
    ClientError, LogGroupDirectory, LogGroupPage, SubscriptionFilter, SubscriptionService,
};

#[derive(Clone, Debug)]
pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogGroupDirectory for CloudWatchLogs {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, ClientError> {
        let output = self
            .client
            .describe_log_groups()
            .set_log_group_name_prefix(prefix.map(str::to_string))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| {
                ClientError::service("DescribeLogGroups", DisplayErrorContext(&err).to_string())
            })?;

        let names = output
            .log_groups()
            .iter()
            .filter_map(|group| group.log_group_name())
            .map(str::to_string)
            .collect();

        Ok(LogGroupPage {
            names,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl SubscriptionService for CloudWatchLogs {
    async fn put_filter(&self, filter: &SubscriptionFilter) -> Result<(), ClientError> {
        self.client
            .put_subscription_filter()
            .log_group_name(&filter.log_group_name)
            .filter_name(&filter.filter_name)
            .filter_pattern(&filter.filter_pattern)
            .destination_arn(&filter.destination_arn)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| {
                let limit_exceeded = err
                    .as_service_error()
                    .is_some_and(|e| e.is_limit_exceeded_exception());
                let message = DisplayErrorContext(&err).to_string();
                if limit_exceeded {
                    ClientError::LimitExceeded(message)
                } else {
                    ClientError::service("PutSubscriptionFilter", message)
                }
            })
    }

    async fn delete_filter(
        &self,
        log_group_name: &str,
        filter_name: &str,
    ) -> Result<(), ClientError> {
        self.client
            .delete_subscription_filter()
            .log_group_name(log_group_name)
            .filter_name(filter_name)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception());
                let message = DisplayErrorContext(&err).to_string();
                if not_found {
                    ClientError::NotFound(message)
                } else {
                    ClientError::service("DeleteSubscriptionFilter", message)
                }
            })
    }
}
