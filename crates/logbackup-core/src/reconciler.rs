// Subscription reconciler
//
// Maps the current set of log groups onto the set of backup subscriptions.
// Nothing is cached between calls: every pass re-lists the directory.

use std::panic::AssertUnwindSafe;
use std::pin::pin;

use futures_util::stream::{self, Stream, TryStreamExt};
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clients::{
    LifecycleResponder, LogGroupDirectory, SubscriptionFilter, SubscriptionService, FILTER_NAME,
};
use crate::error::{ClientError, ReconcileError, Result};
use crate::event::{LifecycleRequest, LifecycleResponse, ReconcileEvent, RequestType};
use crate::policy::{SkipReason, SubscriptionPolicy};

/// Result of a single `subscribe` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    Skipped(SkipReason),
    LimitExceeded,
}

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub subscribed: usize,
    pub skipped: usize,
    pub limit_exceeded: usize,
    pub removed: usize,
    pub not_found: usize,
    pub remove_failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: &SubscribeOutcome) {
        match outcome {
            SubscribeOutcome::Subscribed => self.subscribed += 1,
            SubscribeOutcome::Skipped(_) => self.skipped += 1,
            SubscribeOutcome::LimitExceeded => self.limit_exceeded += 1,
        }
    }

    /// JSON form used for callback data and invocation output
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

pub struct Reconciler<D, S, R> {
    directory: D,
    subscriptions: S,
    responder: R,
    policy: SubscriptionPolicy,
}

impl<D, S, R> Reconciler<D, S, R>
where
    D: LogGroupDirectory,
    S: SubscriptionService,
    R: LifecycleResponder,
{
    pub fn new(directory: D, subscriptions: S, responder: R, policy: SubscriptionPolicy) -> Self {
        Self {
            directory,
            subscriptions,
            responder,
            policy,
        }
    }

    pub fn policy(&self) -> &SubscriptionPolicy {
        &self.policy
    }

    /// Put the backup filter on `name` unless the policy excludes it.
    ///
    /// A full filter slot on the log group is reported as
    /// `SubscribeOutcome::LimitExceeded` rather than an error so batch
    /// callers keep going.
    pub async fn subscribe(&self, name: &str) -> Result<SubscribeOutcome> {
        if let Some(reason) = self.policy.exclusion(name) {
            info!(log_group = name, %reason, "Skipping log group");
            return Ok(SubscribeOutcome::Skipped(reason));
        }

        let filter = SubscriptionFilter::backup(name, self.policy.destination_arn());
        match self.subscriptions.put_filter(&filter).await {
            Ok(()) => {
                info!(log_group = name, filter = FILTER_NAME, "Subscribed log group");
                Ok(SubscribeOutcome::Subscribed)
            }
            Err(ClientError::LimitExceeded(message)) => {
                warn!(
                    log_group = name,
                    %message,
                    "Cannot subscribe log group: subscription filter limit reached"
                );
                Ok(SubscribeOutcome::LimitExceeded)
            }
            Err(err) => Err(ReconcileError::subscribe(name, err)),
        }
    }

    /// Lazily list log group names starting with `prefix`.
    ///
    /// An empty prefix lists everything. Pages are fetched on demand and only
    /// the current page is held; calling again starts a fresh listing.
    pub fn matched_log_groups<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Stream<Item = Result<String>> + Send + 'a {
        let filter = (!prefix.is_empty()).then_some(prefix);

        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let token = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            let page = self
                .directory
                .list_page(filter, token)
                .await
                .map_err(|err| ReconcileError::directory(prefix, err))?;
            debug!(prefix, count = page.names.len(), "Fetched log group page");

            let next = match page.next_token {
                Some(token) if !token.is_empty() => Cursor::Next(token),
                _ => Cursor::Done,
            };
            Ok::<_, ReconcileError>(Some((page.names, next)))
        })
        .map_ok(|names| stream::iter(names.into_iter().map(Ok::<_, ReconcileError>)))
        .try_flatten()
    }

    /// Subscribe every log group matching the configured prefix filter
    pub async fn subscribe_all(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut names = pin!(self.matched_log_groups(self.policy.prefix_filter()));

        while let Some(name) = names.try_next().await? {
            let outcome = self.subscribe(&name).await?;
            report.record(&outcome);
        }

        info!(
            prefix = self.policy.prefix_filter(),
            subscribed = report.subscribed,
            skipped = report.skipped,
            limit_exceeded = report.limit_exceeded,
            "Subscription sweep complete"
        );
        Ok(report)
    }

    /// Remove the backup filter from every log group, regardless of prefix.
    ///
    /// Delete failures never abort the pass. Missing filters are expected;
    /// anything else is logged at warn level.
    pub async fn unsubscribe_all(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut names = pin!(self.matched_log_groups(""));

        while let Some(name) = names.try_next().await? {
            match self.subscriptions.delete_filter(&name, FILTER_NAME).await {
                Ok(()) => {
                    debug!(log_group = %name, "Removed subscription filter");
                    report.removed += 1;
                }
                Err(ClientError::NotFound(_)) => {
                    debug!(log_group = %name, "No subscription filter to remove");
                    report.not_found += 1;
                }
                Err(err) => {
                    warn!(log_group = %name, error = %err, "Failed to remove subscription filter");
                    report.remove_failed += 1;
                }
            }
        }

        info!(
            removed = report.removed,
            not_found = report.not_found,
            remove_failed = report.remove_failed,
            "Unsubscribe sweep complete"
        );
        Ok(report)
    }

    /// Dispatch one invocation event
    pub async fn handle(&self, event: ReconcileEvent) -> Result<SweepReport> {
        debug!(kind = event.kind(), "Handling event");

        match event {
            ReconcileEvent::Lifecycle(request) => self.handle_lifecycle(request).await,
            ReconcileEvent::ChangeNotification {
                log_group_name: None,
            } => {
                warn!("CreateLogGroup notification has bad parameters; ignoring");
                Ok(SweepReport::default())
            }
            ReconcileEvent::ChangeNotification {
                log_group_name: Some(name),
            } => {
                let mut report = SweepReport::default();
                if self.policy.in_scope(&name) {
                    let outcome = self.subscribe(&name).await?;
                    report.record(&outcome);
                } else {
                    info!(
                        log_group = %name,
                        prefix = self.policy.prefix_filter(),
                        "Skipping new log group: prefix mismatch"
                    );
                    report.skipped += 1;
                }
                Ok(report)
            }
            ReconcileEvent::Scheduled => self.subscribe_all().await,
            ReconcileEvent::Unknown => {
                info!("Unrecognized event shape; running a full sweep");
                self.subscribe_all().await
            }
        }
    }

    /// Run the lifecycle action and answer the callback exactly once,
    /// whatever the action did.
    async fn handle_lifecycle(&self, request: LifecycleRequest) -> Result<SweepReport> {
        info!(
            request_type = %request.request_type,
            logical_resource_id = %request.logical_resource_id,
            "Handling lifecycle request"
        );

        let outcome = AssertUnwindSafe(self.apply_lifecycle(&request.request_type))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ReconcileError::Panicked(panic_message(panic))));

        let (response, report) = match outcome {
            Ok(report) => (LifecycleResponse::success(report.to_value()), report),
            Err(err) => {
                error!(
                    request_type = %request.request_type,
                    error = ?err,
                    "Lifecycle request failed"
                );
                (LifecycleResponse::failed(err.to_string()), SweepReport::default())
            }
        };

        self.responder
            .respond(&request, &response)
            .await
            .map_err(|err| ReconcileError::Callback(err.to_string()))?;
        info!(status = ?response.status, "Lifecycle response sent");

        Ok(report)
    }

    async fn apply_lifecycle(&self, request_type: &RequestType) -> Result<SweepReport> {
        match request_type {
            RequestType::Create | RequestType::Update => self.subscribe_all().await,
            RequestType::Delete => self.unsubscribe_all().await,
            RequestType::Other(other) => Err(ReconcileError::UnsupportedRequestType(other.clone())),
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
