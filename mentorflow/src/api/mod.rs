//! The A/B test endpoint, independent of any HTTP framework.
//!
//! A host server decodes the request body, hands it to
//! [`AbTestService::handle`] and writes back the returned status and JSON body.
//! Failures inside the pipeline are logged and reported with a generic message.

use crate::core::Message;
use crate::pipeline::MentorshipWorkflow;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Body returned when `task` or `threadId` is absent.
pub const MISSING_FIELDS: &str = "Missing task or threadId";
/// Body returned when the pipeline fails.
pub const RUN_FAILED: &str = "Failed to run AB test.";
/// Body returned for any method other than POST.
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Incoming A/B test request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestRequest {
    /// The user's task text.
    #[serde(default)]
    pub task: Option<String>,
    /// Conversation thread id.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Selects the mentor arm; absent means off.
    #[serde(default)]
    pub is_mentor_enabled: Option<bool>,
}

impl AbTestRequest {
    /// Creates a complete request.
    #[must_use]
    pub fn new(task: impl Into<String>, thread_id: impl Into<String>, mentor_enabled: bool) -> Self {
        Self {
            task: Some(task.into()),
            thread_id: Some(thread_id.into()),
            is_mentor_enabled: Some(mentor_enabled),
        }
    }

    /// Reads a request leniently from an arbitrary JSON body.
    ///
    /// Fields are read one by one: a `task` or `threadId` that is not a string
    /// counts as absent, and `isMentorEnabled` is coerced by truthiness
    /// (`false`, `0`, `""` and `null` are off; any other value is on).
    #[must_use]
    pub fn from_json(body: &serde_json::Value) -> Self {
        let text = |field: &str| body.get(field).and_then(serde_json::Value::as_str).map(str::to_string);
        Self {
            task: text("task"),
            thread_id: text("threadId"),
            is_mentor_enabled: body.get("isMentorEnabled").map(is_truthy),
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// One message of the final transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// `human`, `system` or `ai`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message text.
    pub text: String,
}

impl From<&Message> for TranscriptEntry {
    fn from(message: &Message) -> Self {
        Self {
            kind: message.role().transcript_type().to_string(),
            text: message.text().to_string(),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestResponse {
    /// The full transcript after the run.
    pub final_messages: Vec<TranscriptEntry>,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error.
    pub error: String,
}

/// A status code paired with a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: serde_json::Value,
}

impl ApiResponse {
    fn json(status: u16, body: &impl Serialize) -> Self {
        let body = serde_json::to_value(body)
            .unwrap_or_else(|err| serde_json::json!({ "error": err.to_string() }));
        Self { status, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: message.to_string(),
            },
        )
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Serves A/B test requests over a shared mentorship workflow.
#[derive(Debug, Clone)]
pub struct AbTestService {
    workflow: MentorshipWorkflow,
}

impl AbTestService {
    /// Creates a service around `workflow`.
    #[must_use]
    pub fn new(workflow: MentorshipWorkflow) -> Self {
        Self { workflow }
    }

    /// Returns the workflow.
    #[must_use]
    pub fn workflow(&self) -> &MentorshipWorkflow {
        &self.workflow
    }

    /// Handles a decoded request.
    pub async fn handle(&self, request: AbTestRequest) -> ApiResponse {
        let (Some(task), Some(thread_id)) = (
            non_blank(request.task.as_deref()),
            non_blank(request.thread_id.as_deref()),
        ) else {
            return ApiResponse::error(400, MISSING_FIELDS);
        };
        let mentor_enabled = request.is_mentor_enabled.unwrap_or(false);

        info!(thread_id, mentor_enabled, "running A/B test");
        match self
            .workflow
            .run(thread_id, vec![Message::user(task)], mentor_enabled)
            .await
        {
            Ok(state) => ApiResponse::json(
                200,
                &AbTestResponse {
                    final_messages: state.messages().iter().map(TranscriptEntry::from).collect(),
                },
            ),
            Err(err) => {
                error!(thread_id, kind = err.kind(), error = %err, "A/B test run failed");
                ApiResponse::error(500, RUN_FAILED)
            }
        }
    }

    /// Handles a raw request as a host server would receive it.
    ///
    /// Only POST is accepted. A body that is not JSON is treated as having no
    /// fields; see [`AbTestRequest::from_json`] for how fields are read.
    pub async fn handle_raw(&self, method: &str, body: &[u8]) -> ApiResponse {
        if !method.eq_ignore_ascii_case("POST") {
            return ApiResponse::error(405, METHOD_NOT_ALLOWED);
        }
        let body = serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
        self.handle(AbTestRequest::from_json(&body)).await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{MockTextCompletion, StaticCompletion};
    use crate::errors::CompletionError;
    use crate::knowledge::KnowledgeStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn service(reply: &str) -> (AbTestService, Arc<StaticCompletion>) {
        let backend = Arc::new(StaticCompletion::new(reply));
        let workflow =
            MentorshipWorkflow::new(Arc::new(KnowledgeStore::new()), backend.clone()).unwrap();
        (AbTestService::new(workflow), backend)
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request: AbTestRequest =
            serde_json::from_value(json!({"task": "t", "threadId": "x", "isMentorEnabled": true}))
                .unwrap();
        assert_eq!(request, AbTestRequest::new("t", "x", true));
    }

    #[tokio::test]
    async fn test_success_returns_transcript() {
        let (service, _) = service("<App />");

        let response = service
            .handle(AbTestRequest::new("Tell me about React", "thread-1", false))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({
                "finalMessages": [
                    {"type": "human", "text": "Tell me about React"},
                    {"type": "system", "text": "System: Oracle recognized the user might want to use React for coding."},
                    {"type": "ai", "text": "<App />"},
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_mentor_arm_adds_message() {
        let (service, _) = service("ok");

        let response = service
            .handle(AbTestRequest::new("Tell me about React", "thread-2", true))
            .await;

        let messages = response.body["finalMessages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["type"], "system");
        assert!(messages[1]["text"].as_str().unwrap().starts_with("Mentor:"));
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let (service, backend) = service("ok");

        for request in [
            AbTestRequest::default(),
            AbTestRequest {
                task: Some("React".into()),
                ..AbTestRequest::default()
            },
            AbTestRequest {
                thread_id: Some("x".into()),
                ..AbTestRequest::default()
            },
            AbTestRequest::new("", "x", true),
            AbTestRequest::new("React", "  ", true),
        ] {
            let response = service.handle(request).await;
            assert_eq!(response.status, 400);
            assert_eq!(response.body, json!({"error": MISSING_FIELDS}));
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_generic() {
        let mut mock = MockTextCompletion::new();
        mock.expect_generate()
            .returning(|_| Err(CompletionError::Status { status: 401, body: "invalid key sk-123".into() }));
        let workflow =
            MentorshipWorkflow::new(Arc::new(KnowledgeStore::new()), Arc::new(mock)).unwrap();
        let service = AbTestService::new(workflow);

        let response = service.handle(AbTestRequest::new("React", "x", false)).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({"error": RUN_FAILED}));
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_raw_requests() {
        let (service, _) = service("ok");

        let response = service.handle_raw("GET", b"{}").await;
        assert_eq!(response.status, 405);

        let response = service.handle_raw("POST", b"not json").await;
        assert_eq!(response.status, 400);

        let response = service
            .handle_raw("post", br#"{"task": "Node.js server", "threadId": "t"}"#)
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["finalMessages"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_raw_flag_with_wrong_type_is_coerced() {
        let (service, backend) = service("ok");

        let response = service
            .handle_raw(
                "POST",
                br#"{"task": "Tell me about React", "threadId": "t", "isMentorEnabled": "true"}"#,
            )
            .await;

        assert_eq!(response.status, 200);
        let messages = response.body["finalMessages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert!(messages[1]["text"].as_str().unwrap().starts_with("Mentor:"));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_from_json_truthiness() {
        let cases = [
            (json!(true), true),
            (json!(false), false),
            (json!(1), true),
            (json!(0), false),
            (json!("yes"), true),
            (json!(""), false),
            (json!(null), false),
            (json!({}), true),
        ];
        for (flag, expected) in cases {
            let request = AbTestRequest::from_json(&json!({"task": "t", "threadId": "x", "isMentorEnabled": flag}));
            assert_eq!(request.is_mentor_enabled, Some(expected), "flag {flag}");
        }

        let request = AbTestRequest::from_json(&json!({"task": 42, "threadId": "x"}));
        assert_eq!(request.task, None);
        assert_eq!(request.is_mentor_enabled, None);
    }
}
