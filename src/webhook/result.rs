//! Outcome reported to dispatch callers.

use serde::Serialize;
use serde_json::Value;

use crate::history::EventId;

/// How the caller observes a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Status and body are inspected; non-2xx responses are retried.
    #[default]
    Observed,
    /// Fire-and-forget: any completed HTTP exchange counts as delivered,
    /// and the response is neither inspected nor exposed.
    Blind,
}

/// Result of a dispatch. Dispatching never fails outright; every failure
/// mode ends up here with `success == false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// Whether the payload was delivered.
    pub success: bool,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP status of the last observed response: the 2xx code on success,
    /// the last non-2xx code on failure. Always `None` for blind delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Body of a successful observed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    /// Error of the final attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// History record of this dispatch, if it could be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Attempts made, including the first.
    pub attempts: u32,
}

impl DispatchResult {
    /// Short summary suitable for a notification line.
    ///
    /// Failure messages longer than `max_chars` are cut with an ellipsis.
    #[must_use]
    pub fn summary(&self, max_chars: usize) -> String {
        if self.success {
            return match self.status_code {
                Some(code) => format!("Webhook delivered ({code})"),
                None => "Webhook delivered".to_string(),
            };
        }
        let message = self.message.as_deref().unwrap_or("Unknown error");
        if message.chars().count() <= max_chars {
            return format!("Webhook failed: {message}");
        }
        let truncated: String = message.chars().take(max_chars).collect();
        format!("Webhook failed: {truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> DispatchResult {
        DispatchResult {
            success: false,
            message: Some(message.to_string()),
            status_code: None,
            response_data: None,
            error: Some(message.to_string()),
            event_id: None,
            attempts: 6,
        }
    }

    #[test]
    fn success_mentions_status() {
        let result = DispatchResult {
            success: true,
            status_code: Some(204),
            ..failed("")
        };
        assert_eq!(result.summary(100), "Webhook delivered (204)");
    }

    #[test]
    fn blind_success_has_no_status() {
        let result = DispatchResult {
            success: true,
            ..failed("")
        };
        assert_eq!(result.summary(100), "Webhook delivered");
    }

    #[test]
    fn long_failure_is_truncated() {
        assert_eq!(failed("abcdefgh").summary(3), "Webhook failed: abc…");
        assert_eq!(failed("abc").summary(3), "Webhook failed: abc");
    }

    #[test]
    fn missing_message_is_unknown() {
        let result = DispatchResult {
            message: None,
            ..failed("")
        };
        assert_eq!(result.summary(100), "Webhook failed: Unknown error");
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let json = serde_json::to_value(failed("boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "boom",
                "error": "boom",
                "attempts": 6,
            })
        );
    }
}
