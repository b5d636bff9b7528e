// Invocation event classification
//
// Every invocation payload is parsed once into `ReconcileEvent` and then
// dispatched with an exhaustive match. Shapes that match none of the known
// triggers become `Unknown`, which the reconciler treats as a sweep.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// EventBridge detail-type of a CloudTrail-recorded API call
pub const CLOUDTRAIL_DETAIL_TYPE: &str = "AWS API Call via CloudTrail";
/// EventBridge detail-type of a schedule rule
pub const SCHEDULED_DETAIL_TYPE: &str = "Scheduled Event";
/// CloudTrail event name emitted when a log group is created
pub const CREATE_LOG_GROUP_EVENT: &str = "CreateLogGroup";

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileEvent {
    /// CloudFormation custom resource request; must be answered exactly once
    Lifecycle(LifecycleRequest),
    /// CreateLogGroup API call. `None` when the request parameters are missing.
    ChangeNotification { log_group_name: Option<String> },
    /// Periodic sweep from the schedule rule
    Scheduled,
    /// Anything else
    Unknown,
}

impl ReconcileEvent {
    /// Classify a raw invocation payload
    pub fn from_value(value: Value) -> Self {
        if is_lifecycle_shape(&value) {
            return match LifecycleRequest::deserialize(&value) {
                Ok(request) => ReconcileEvent::Lifecycle(request),
                Err(err) => {
                    tracing::warn!(error = %err, "Lifecycle-shaped event could not be decoded");
                    // Still owed a response whenever there is somewhere to send it
                    match malformed_lifecycle_request(&value) {
                        Some(request) => ReconcileEvent::Lifecycle(request),
                        None => ReconcileEvent::Unknown,
                    }
                }
            };
        }

        match value.get("detail-type").and_then(Value::as_str) {
            Some(SCHEDULED_DETAIL_TYPE) => ReconcileEvent::Scheduled,
            Some(CLOUDTRAIL_DETAIL_TYPE) if is_create_log_group(&value) => {
                ReconcileEvent::ChangeNotification {
                    log_group_name: created_log_group_name(&value),
                }
            }
            _ => ReconcileEvent::Unknown,
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileEvent::Lifecycle(_) => "lifecycle",
            ReconcileEvent::ChangeNotification { .. } => "change_notification",
            ReconcileEvent::Scheduled => "scheduled",
            ReconcileEvent::Unknown => "unknown",
        }
    }
}

fn is_lifecycle_shape(value: &Value) -> bool {
    value.get("ResponseURL").is_some() && value.get("RequestType").is_some()
}

/// Answerable remains of a lifecycle payload that failed to decode. The
/// request type becomes `Other` so it is answered FAILED without side effects.
fn malformed_lifecycle_request(value: &Value) -> Option<LifecycleRequest> {
    let text = |key: &str| value.get(key).and_then(Value::as_str);
    let response_url = text("ResponseURL").filter(|url| !url.is_empty())?;
    let raw_request_type = value
        .get("RequestType")
        .map(Value::to_string)
        .unwrap_or_default();

    Some(LifecycleRequest {
        request_type: RequestType::Other(raw_request_type),
        response_url: response_url.to_string(),
        stack_id: text("StackId").unwrap_or_default().to_string(),
        request_id: text("RequestId").unwrap_or_default().to_string(),
        logical_resource_id: text("LogicalResourceId").unwrap_or_default().to_string(),
        physical_resource_id: text("PhysicalResourceId").map(str::to_string),
    })
}

fn is_create_log_group(value: &Value) -> bool {
    value
        .pointer("/detail/eventName")
        .and_then(Value::as_str)
        .is_some_and(|name| name == CREATE_LOG_GROUP_EVENT)
}

fn created_log_group_name(value: &Value) -> Option<String> {
    let params = value.pointer("/detail/requestParameters")?;
    if params.as_object().map_or(true, |obj| obj.is_empty()) {
        return None;
    }
    params
        .get("logGroupName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// CloudFormation custom resource request type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Create,
    Update,
    Delete,
    Other(String),
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Create" => RequestType::Create,
            "Update" => RequestType::Update,
            "Delete" => RequestType::Delete,
            _ => RequestType::Other(value),
        }
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::Create => write!(f, "Create"),
            RequestType::Update => write!(f, "Update"),
            RequestType::Delete => write!(f, "Delete"),
            RequestType::Other(other) => write!(f, "{}", other),
        }
    }
}

/// The fields of a custom resource request needed to answer it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Outcome of a lifecycle request, before it is rendered for the callback
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    pub reason: Option<String>,
    pub data: Value,
}

impl LifecycleResponse {
    pub fn success(data: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            data,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            data: Value::Object(Default::default()),
        }
    }
}
