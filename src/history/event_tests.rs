//! Tests for history records and patches.

use super::{EventId, EventPatch, EventStatus, WebhookEvent};
use crate::webhook::WebhookKind;
use chrono::{DateTime, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn pending_event() -> WebhookEvent {
    WebhookEvent::pending(
        EventId::from("wh_1_1"),
        at(1_700_000_000),
        WebhookKind::Slack,
        "lead_converted",
        "https://hooks.slack.com/services/T000/B000/XXXX",
        json!({"text": "hi"}),
    )
}

mod event_id {
    use super::*;

    #[test]
    fn has_prefix_millis_and_bounded_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = EventId::generate(at(1_700_000_000), &mut rng);

        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "wh");
        assert_eq!(parts[1], "1700000000000");
        let suffix: u32 = parts[2].parse().unwrap();
        assert!(suffix < 1_000_000);
    }

    #[test]
    fn consecutive_ids_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = EventId::generate(at(5), &mut rng);
        let b = EventId::generate(at(5), &mut rng);

        assert_ne!(a, b);
    }

    #[test]
    fn display_matches_as_str() {
        let id = EventId::from("wh_10_20");
        assert_eq!(id.to_string(), "wh_10_20");
    }
}

mod webhook_event {
    use super::*;

    #[test]
    fn pending_masks_target_url() {
        let event = pending_event();

        assert_eq!(event.target_url, "https://hooks.slack.com/***");
        assert!(!event.target_url.contains("XXXX"));
        assert_eq!(event.status, EventStatus::Pending);
        assert!(event.response_code.is_none());
        assert!(event.duration.is_none());
    }

    #[test]
    fn serializes_camel_case_and_omits_unset_fields() {
        let value = serde_json::to_value(pending_event()).unwrap();

        assert_eq!(value["webhookType"], "slack");
        assert_eq!(value["eventType"], "lead_converted");
        assert_eq!(value["targetUrl"], "https://hooks.slack.com/***");
        assert_eq!(value["status"], "pending");
        assert!(value.get("responseCode").is_none());
        assert!(value.get("retryCount").is_none());
    }

    #[test]
    fn legacy_error_status_reads_as_failed() {
        let mut value = serde_json::to_value(pending_event()).unwrap();
        value["status"] = json!("error");

        let event: WebhookEvent = serde_json::from_value(value).unwrap();
        assert_eq!(event.status, EventStatus::Failed);
    }

    #[test]
    fn status_parses_from_cli_strings() {
        assert_eq!("Success".parse::<EventStatus>(), Ok(EventStatus::Success));
        assert_eq!("error".parse::<EventStatus>(), Ok(EventStatus::Failed));
        assert!("done".parse::<EventStatus>().is_err());
    }
}

mod event_patch {
    use super::*;

    #[test]
    fn merges_only_set_fields() {
        let mut event = pending_event();
        let patch = EventPatch::default()
            .with_error_message("Retry 1 scheduled")
            .with_retry_count(1)
            .with_duration(12);

        assert!(patch.apply_to(&mut event));
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.error_message.as_deref(), Some("Retry 1 scheduled"));
        assert_eq!(event.retry_count, Some(1));
        assert_eq!(event.duration, Some(12));
        assert!(event.response_code.is_none());
    }

    #[test]
    fn error_message_can_be_cleared() {
        let mut event = pending_event();
        EventPatch::default()
            .with_error_message("Retry 1 scheduled")
            .apply_to(&mut event);

        EventPatch::default().apply_to(&mut event);
        assert_eq!(event.error_message.as_deref(), Some("Retry 1 scheduled"));

        EventPatch::status(EventStatus::Success)
            .without_error_message()
            .apply_to(&mut event);
        assert!(event.error_message.is_none());
    }

    #[test]
    fn terminal_patch_sets_status_and_response() {
        let mut event = pending_event();
        let patch = EventPatch::status(EventStatus::Success)
            .with_response_code(201)
            .with_response(Some(json!({"ok": true})));

        assert!(patch.apply_to(&mut event));
        assert_eq!(event.status, EventStatus::Success);
        assert_eq!(event.response_code, Some(201));
        assert_eq!(event.response, Some(json!({"ok": true})));
    }

    #[test]
    fn terminal_event_is_never_changed_again() {
        let mut event = pending_event();
        assert!(EventPatch::status(EventStatus::Failed).apply_to(&mut event));

        let late = EventPatch::status(EventStatus::Success).with_response_code(200);
        assert!(!late.apply_to(&mut event));
        assert_eq!(event.status, EventStatus::Failed);
        assert!(event.response_code.is_none());
    }
}
