//! Tests for `RetentionPolicy`.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use super::{EventId, RetentionPolicy, WebhookEvent};
use crate::webhook::WebhookKind;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn events_at(times: &[i64]) -> Vec<WebhookEvent> {
    times
        .iter()
        .map(|&secs| {
            WebhookEvent::pending(
                EventId::from(format!("wh_{secs}").as_str()),
                at(secs),
                WebhookKind::Custom,
                "x",
                "https://example.com",
                json!(null),
            )
        })
        .collect()
}

#[test]
fn unbounded_keeps_everything() {
    let mut events = events_at(&[5, 4, 3, 2, 1]);

    let dropped = RetentionPolicy::unbounded().apply(&mut events, at(1_000_000));

    assert_eq!(dropped, 0);
    assert_eq!(events.len(), 5);
}

#[test]
fn max_events_keeps_newest() {
    let mut events = events_at(&[5, 4, 3, 2, 1]);

    let dropped = RetentionPolicy::unbounded()
        .with_max_events(3)
        .apply(&mut events, at(10));

    assert_eq!(dropped, 2);
    let kept: Vec<i64> = events.iter().map(|e| e.timestamp.timestamp()).collect();
    assert_eq!(kept, [5, 4, 3]);
}

#[test]
fn max_age_boundary_is_kept() {
    let mut events = events_at(&[100, 50, 49]);

    RetentionPolicy::unbounded()
        .with_max_age(Duration::from_secs(50))
        .apply(&mut events, at(100));

    let kept: Vec<i64> = events.iter().map(|e| e.timestamp.timestamp()).collect();
    assert_eq!(kept, [100, 50]);
}

#[test]
fn both_limits_combine() {
    let mut events = events_at(&[100, 90, 80, 10]);

    let dropped = RetentionPolicy::unbounded()
        .with_max_events(2)
        .with_max_age(Duration::from_secs(50))
        .apply(&mut events, at(100));

    assert_eq!(dropped, 2);
    assert_eq!(events.len(), 2);
}

#[test]
fn default_caps_without_age_limit() {
    let policy = RetentionPolicy::default();

    assert_eq!(policy.max_events, Some(RetentionPolicy::DEFAULT_MAX_EVENTS));
    assert!(policy.max_age.is_none());
}
