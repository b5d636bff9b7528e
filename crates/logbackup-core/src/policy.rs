// Subscription policy
//
// Decides, per log group name, whether the backup filter should be applied.

/// Log group that Control Tower already ships to the central log archive
pub const AGGREGATED_TRAIL_LOG_GROUP: &str = "aws-controltower/CloudTrailLogs";

/// Why a log group was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Under one of this deployment's own namespaces
    SelfReferential { prefix: String },
    /// Already collected centrally through another mechanism
    Aggregated,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::SelfReferential { prefix } => {
                write!(f, "own log group (prefix '{}')", prefix)
            }
            SkipReason::Aggregated => write!(f, "already aggregated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    destination_arn: String,
    prefix_filter: String,
    excluded_prefixes: Vec<String>,
    aggregated_log_group: String,
}

impl SubscriptionPolicy {
    pub fn new(destination_arn: impl Into<String>) -> Self {
        Self {
            destination_arn: destination_arn.into(),
            prefix_filter: String::new(),
            excluded_prefixes: Vec::new(),
            aggregated_log_group: AGGREGATED_TRAIL_LOG_GROUP.to_string(),
        }
    }

    pub fn with_prefix_filter(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_filter = prefix.into();
        self
    }

    /// Exclude the namespaces written by the deploying stack and function:
    /// their Lambda logs and the stack's Firehose delivery error logs.
    /// Empty identities are ignored.
    pub fn with_own_identity(
        mut self,
        stack_name: Option<&str>,
        function_name: Option<&str>,
    ) -> Self {
        let stack_name = stack_name.filter(|name| !name.is_empty());
        let function_name = function_name.filter(|name| !name.is_empty());

        if let Some(stack) = stack_name {
            self.excluded_prefixes.push(format!("/aws/lambda/{}", stack));
            self.excluded_prefixes.push(format!("/aws/kinesisfirehose/{}", stack));
        }
        if let Some(function) = function_name {
            self.excluded_prefixes.push(format!("/aws/lambda/{}", function));
        }
        self
    }

    pub fn with_excluded_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_aggregated_log_group(mut self, name: impl Into<String>) -> Self {
        self.aggregated_log_group = name.into();
        self
    }

    pub fn destination_arn(&self) -> &str {
        &self.destination_arn
    }

    pub fn prefix_filter(&self) -> &str {
        &self.prefix_filter
    }

    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }

    /// True when `name` starts with the configured prefix filter
    pub fn in_scope(&self, name: &str) -> bool {
        name.starts_with(&self.prefix_filter)
    }

    /// Returns the reason `name` must never be subscribed, if any
    pub fn exclusion(&self, name: &str) -> Option<SkipReason> {
        if let Some(prefix) = self
            .excluded_prefixes
            .iter()
            .find(|prefix| name.starts_with(prefix.as_str()))
        {
            return Some(SkipReason::SelfReferential {
                prefix: prefix.clone(),
            });
        }
        if name == self.aggregated_log_group {
            return Some(SkipReason::Aggregated);
        }
        None
    }
}
