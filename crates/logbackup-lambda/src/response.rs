// CloudFormation custom resource responses
//
// Renders a lifecycle outcome into the response document CloudFormation
// expects and PUTs it to the pre-signed ResponseURL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use logbackup_core::{
    ClientError, LifecycleRequest, LifecycleResponder, LifecycleResponse, ResponseStatus,
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// CloudFormation rejects response bodies over 4096 bytes
const MAX_REASON_LEN: usize = 1024;

/// Response body sent to the ResponseURL
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResponseDocument<'a> {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: &'a str,
    pub request_id: &'a str,
    pub logical_resource_id: &'a str,
    pub no_echo: bool,
    pub data: &'a Value,
}

/// Build the response document for `request`.
///
/// The physical resource id is kept stable across updates: an id already
/// assigned by a previous response is echoed back, otherwise the log stream
/// name is used.
pub(crate) fn build_document<'a>(
    request: &'a LifecycleRequest,
    response: &'a LifecycleResponse,
    log_stream: &str,
) -> ResponseDocument<'a> {
    let details = format!("See the details in CloudWatch Log Stream: {}", log_stream);
    let reason = match response.reason.as_deref() {
        Some(reason) => format!("{}. {}", truncate(reason, MAX_REASON_LEN), details),
        None => details,
    };

    ResponseDocument {
        status: response.status,
        reason,
        physical_resource_id: request
            .physical_resource_id
            .clone()
            .unwrap_or_else(|| log_stream.to_string()),
        stack_id: &request.stack_id,
        request_id: &request.request_id,
        logical_resource_id: &request.logical_resource_id,
        no_echo: false,
        data: &response.data,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Sends lifecycle responses over HTTPS
pub struct CloudFormationResponder {
    http: reqwest::Client,
    log_stream: String,
}

impl CloudFormationResponder {
    pub fn new(log_stream: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client for CloudFormation responses")?;

        Ok(Self {
            http,
            log_stream: log_stream.into(),
        })
    }
}

#[async_trait]
impl LifecycleResponder for CloudFormationResponder {
    async fn respond(
        &self,
        request: &LifecycleRequest,
        response: &LifecycleResponse,
    ) -> Result<(), ClientError> {
        let document = build_document(request, response, &self.log_stream);
        let body = serde_json::to_vec(&document)
            .map_err(|e| ClientError::service("LifecycleCallback", e.to_string()))?;

        // The pre-signed URL is signed without a content type
        let reply = self
            .http
            .put(&request.response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .and_then(|reply| reply.error_for_status())
            .map_err(|e| ClientError::service("LifecycleCallback", e.to_string()))?;

        info!(status_code = reply.status().as_u16(), "CloudFormation response delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbackup_core::{ReconcileEvent, RequestType};
    use serde_json::json;

    fn request(physical_resource_id: Option<&str>) -> LifecycleRequest {
        LifecycleRequest {
            request_type: RequestType::Update,
            response_url: "https://example.com/response".to_string(),
            stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/log-backup/1"
                .to_string(),
            request_id: "req-42".to_string(),
            logical_resource_id: "SubscribeExisting".to_string(),
            physical_resource_id: physical_resource_id.map(str::to_string),
        }
    }

    #[test]
    fn success_document_matches_cloudformation_shape() {
        let request = request(None);
        let response = LifecycleResponse::success(json!({ "subscribed": 3 }));

        let document =
            build_document(&request, &response, "2026/10/19/[$LATEST]abc");
        let document = serde_json::to_value(document).unwrap();

        assert_eq!(
            document,
            json!({
                "Status": "SUCCESS",
                "Reason": "See the details in CloudWatch Log Stream: 2026/10/19/[$LATEST]abc",
                "PhysicalResourceId": "2026/10/19/[$LATEST]abc",
                "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/log-backup/1",
                "RequestId": "req-42",
                "LogicalResourceId": "SubscribeExisting",
                "NoEcho": false,
                "Data": { "subscribed": 3 }
            })
        );
    }

    #[test]
    fn failed_document_keeps_physical_id_and_reason() {
        let request = request(Some("existing-id"));
        let response = LifecycleResponse::failed("failed to list log groups");

        let document = build_document(&request, &response, "stream");

        assert_eq!(document.status, ResponseStatus::Failed);
        assert_eq!(document.physical_resource_id, "existing-id");
        assert!(document.reason.starts_with("failed to list log groups. "));
        assert!(document.reason.ends_with("stream"));
    }

    #[test]
    fn long_reasons_are_truncated_on_char_boundary() {
        let reason = "é".repeat(MAX_REASON_LEN);
        let truncated = truncate(&reason, MAX_REASON_LEN);
        assert!(truncated.len() <= MAX_REASON_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn decoded_event_round_trips_into_document() {
        let event = ReconcileEvent::from_value(json!({
            "RequestType": "Delete",
            "ResponseURL": "https://example.com/response",
            "StackId": "stack",
            "RequestId": "req",
            "LogicalResourceId": "SubscribeExisting",
            "PhysicalResourceId": "2026/10/01/[$LATEST]first"
        }));
        let ReconcileEvent::Lifecycle(request) = event else {
            panic!("expected lifecycle event");
        };

        let response = LifecycleResponse::success(json!({}));
        let document = build_document(&request, &response, "2026/10/19/[$LATEST]second");
        assert_eq!(document.physical_resource_id, "2026/10/01/[$LATEST]first");
    }
}
