//! Core of the log group backup subscriber.
//!
//! `Reconciler` keeps a `BucketBackupFilter` subscription on every in-scope
//! CloudWatch log group. It is driven by three triggers, all decoded into
//! [`ReconcileEvent`]: CloudFormation lifecycle requests, a scheduled sweep,
//! and CreateLogGroup notifications. CloudWatch Logs and the lifecycle
//! callback are reached through the traits in [`clients`].

pub mod clients;
pub mod error;
pub mod event;
pub mod policy;
pub mod reconciler;

pub use clients::{
    LifecycleResponder, LogGroupDirectory, LogGroupPage, SubscriptionFilter, SubscriptionService,
    FILTER_NAME,
};
pub use error::{ClientError, ReconcileError, Result};
pub use event::{LifecycleRequest, LifecycleResponse, ReconcileEvent, RequestType, ResponseStatus};
pub use policy::{SkipReason, SubscriptionPolicy, AGGREGATED_TRAIL_LOG_GROUP};
pub use reconciler::{Reconciler, SubscribeOutcome, SweepReport};
