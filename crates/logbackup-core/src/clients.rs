// Client seams for the reconciler
//
// The reconciler only talks to CloudWatch Logs and the lifecycle callback
// through these traits. The Lambda crate provides SDK-backed implementations,
// tests provide in-memory fakes.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::event::{LifecycleRequest, LifecycleResponse};

/// Name of the subscription filter this system owns on every log group
pub const FILTER_NAME: &str = "BucketBackupFilter";

/// One page of a log group listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupPage {
    pub names: Vec<String>,
    pub next_token: Option<String>,
}

/// A subscription filter to create or overwrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub log_group_name: String,
    pub filter_name: String,
    pub filter_pattern: String,
    pub destination_arn: String,
}

impl SubscriptionFilter {
    /// The catch-all backup filter for `log_group_name`
    pub fn backup(log_group_name: &str, destination_arn: &str) -> Self {
        Self {
            log_group_name: log_group_name.to_string(),
            filter_name: FILTER_NAME.to_string(),
            filter_pattern: String::new(),
            destination_arn: destination_arn.to_string(),
        }
    }
}

/// Paginated log group listing
#[async_trait]
pub trait LogGroupDirectory: Send + Sync {
    /// Fetch a single page. `prefix` of `None` lists every log group.
    async fn list_page(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, ClientError>;
}

/// Subscription filter management
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn put_filter(&self, filter: &SubscriptionFilter) -> Result<(), ClientError>;

    async fn delete_filter(&self, log_group_name: &str, filter_name: &str)
        -> Result<(), ClientError>;
}

/// Sink for lifecycle completion responses
#[async_trait]
pub trait LifecycleResponder: Send + Sync {
    async fn respond(
        &self,
        request: &LifecycleRequest,
        response: &LifecycleResponse,
    ) -> Result<(), ClientError>;
}
