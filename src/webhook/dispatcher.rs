//! Webhook dispatcher: delivery under a retry policy, recorded in history.

use serde_json::Value;
use tokio::time::Instant;

use super::{
    AttemptError, Delivered, DeliveryError, DeliveryMode, DispatchResult, HttpClient, HttpError,
    HttpRequest, HttpResponse, RetryNotice, RetryPolicy, WebhookKind, mask_url,
};
use crate::history::{
    EventId, EventPatch, EventStatus, HistoryLog, Storage, UpdateOutcome, WebhookEvent,
};
use crate::time::{Clock, Sleeper, SystemClock, TokioSleeper};

/// Response code recorded in history for a blind success.
const DEFAULT_SUCCESS_CODE: u16 = 200;

/// Sends JSON payloads to webhook endpoints and keeps a history of each
/// dispatch.
///
/// A dispatch creates one pending history record, runs the delivery under
/// the [`RetryPolicy`], then records exactly one terminal outcome. History
/// writes are best-effort: failures are logged and never affect delivery.
///
/// # Type Parameters
///
/// - `H`: the HTTP client
/// - `St`: the history storage backend
/// - `C`: the clock used for history timestamps
/// - `S`: the sleeper used between retries
///
/// # Example
///
/// ```no_run
/// use hookledger::history::{HistoryLog, MemoryStorage};
/// use hookledger::webhook::{Dispatcher, ReqwestClient, WebhookKind};
///
/// # async fn example() {
/// let dispatcher = Dispatcher::new(ReqwestClient::new(), HistoryLog::new(MemoryStorage::new()));
/// let result = dispatcher
///     .dispatch(
///         "https://hooks.example.com/incoming",
///         serde_json::json!({"event": "ping"}),
///         WebhookKind::Custom,
///         "test_webhook",
///     )
///     .await;
/// println!("delivered: {}", result.success);
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher<H, St, C = SystemClock, S = TokioSleeper> {
    client: H,
    history: HistoryLog<St, C>,
    retry_policy: RetryPolicy,
    sleeper: S,
}

impl<H, St, C> Dispatcher<H, St, C, TokioSleeper> {
    /// Creates a dispatcher with the default retry policy and real sleeps.
    #[must_use]
    pub fn new(client: H, history: HistoryLog<St, C>) -> Self {
        Self {
            client,
            history,
            retry_policy: RetryPolicy::default(),
            sleeper: TokioSleeper,
        }
    }
}

impl<H, St, C, S> Dispatcher<H, St, C, S> {
    /// Replaces the sleeper used between retries.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Dispatcher<H, St, C, S2> {
        Dispatcher {
            client: self.client,
            history: self.history,
            retry_policy: self.retry_policy,
            sleeper,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Returns the history log.
    #[must_use]
    pub const fn history(&self) -> &HistoryLog<St, C> {
        &self.history
    }
}

impl<H, St, C, S> Dispatcher<H, St, C, S>
where
    H: HttpClient,
    St: Storage,
    C: Clock,
    S: Sleeper,
{
    /// Records a pending history event for a dispatch about to start.
    ///
    /// Returns `None` if the history could not be written; the error is
    /// logged, never returned.
    pub fn record_pending_event(
        &self,
        url: &str,
        payload: &Value,
        kind: WebhookKind,
        event_type: &str,
    ) -> Option<EventId> {
        let now = self.history.now();
        let id = EventId::generate(now, &mut rand::rng());
        let event = WebhookEvent::pending(id.clone(), now, kind, event_type, url, payload.clone());

        match self.history.append(event) {
            Ok(()) => Some(id),
            Err(e) => {
                tracing::error!("Error logging webhook call: {e}");
                None
            }
        }
    }

    /// Merges `patch` into the event with `event_id`.
    ///
    /// Silently does nothing if the history or the event is missing.
    /// Persistence errors are logged, never returned.
    pub fn update_event(&self, event_id: &EventId, patch: &EventPatch) {
        match self.history.update(event_id, patch) {
            Ok(UpdateOutcome::Applied) => {}
            Ok(outcome) => {
                tracing::debug!(event_id = %event_id, ?outcome, "Webhook history update skipped");
            }
            Err(e) => tracing::error!("Error updating webhook log: {e}"),
        }
    }

    /// Delivers `payload` to `url`, inspecting the response.
    ///
    /// Non-2xx responses are retried like transport failures.
    pub async fn dispatch(
        &self,
        url: &str,
        payload: Value,
        kind: WebhookKind,
        event_type: &str,
    ) -> DispatchResult {
        self.dispatch_with(DeliveryMode::Observed, url, payload, kind, event_type)
            .await
    }

    /// Delivers `payload` to `url` without inspecting the response.
    ///
    /// Only transport failures are retried; the result never carries a
    /// status code or response body.
    pub async fn dispatch_blind(
        &self,
        url: &str,
        payload: Value,
        kind: WebhookKind,
        event_type: &str,
    ) -> DispatchResult {
        self.dispatch_with(DeliveryMode::Blind, url, payload, kind, event_type)
            .await
    }

    /// Delivers `payload` to `url` in the given mode.
    pub async fn dispatch_with(
        &self,
        mode: DeliveryMode,
        url: &str,
        payload: Value,
        kind: WebhookKind,
        event_type: &str,
    ) -> DispatchResult {
        let started = Instant::now();
        let event_id = self.record_pending_event(url, &payload, kind, event_type);

        let outcome = match url::Url::parse(url) {
            Ok(target) => {
                let request = HttpRequest::post_json(target, &payload);
                let request = &request;
                self.retry_policy
                    .execute(
                        &self.sleeper,
                        move |_| self.attempt(mode, request),
                        |notice| self.note_retry(event_id.as_ref(), started, kind, &notice),
                    )
                    .await
            }
            Err(e) => Err(DeliveryError::Rejected {
                attempts: 1,
                error: AttemptError::Http(HttpError::InvalidUrl(e.to_string())),
            }),
        };

        let duration = elapsed_millis(started);

        match outcome {
            Ok(delivered) => self.finish_success(event_id, &delivered, duration, kind, event_type),
            Err(error) => self.finish_failure(event_id, &error, duration, url, kind, event_type),
        }
    }

    /// Runs one attempt. `Ok(None)` is a blind delivery.
    async fn attempt(
        &self,
        mode: DeliveryMode,
        request: &HttpRequest,
    ) -> Result<Option<HttpResponse>, AttemptError> {
        let response = self.client.request(request.clone()).await?;

        match mode {
            DeliveryMode::Blind => Ok(None),
            DeliveryMode::Observed if response.is_success() => Ok(Some(response)),
            DeliveryMode::Observed => Err(AttemptError::NonSuccessStatus {
                status: response.status,
                body: response.body_text().map(ToString::to_string),
            }),
        }
    }

    fn note_retry(
        &self,
        event_id: Option<&EventId>,
        started: Instant,
        kind: WebhookKind,
        notice: &RetryNotice<'_>,
    ) {
        let delay_ms = u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(
            webhook_type = %kind,
            attempt = notice.attempt,
            delay_ms,
            error = %notice.error,
            "Webhook attempt failed, retrying"
        );

        if let Some(id) = event_id {
            let patch = EventPatch::default()
                .with_error_message(format!(
                    "Retry {} scheduled after {delay_ms}ms. Error: {}",
                    notice.attempt, notice.error
                ))
                .with_duration(elapsed_millis(started))
                .with_retry_count(notice.attempt);
            self.update_event(id, &patch);
        }
    }

    /// Records the success and builds the caller's result.
    ///
    /// History always gets a response code, [`DEFAULT_SUCCESS_CODE`] when
    /// delivery was blind; the result only carries an observed one. Retry
    /// diagnostics are cleared from the event.
    fn finish_success(
        &self,
        event_id: Option<EventId>,
        delivered: &Delivered<Option<HttpResponse>>,
        duration: u64,
        kind: WebhookKind,
        event_type: &str,
    ) -> DispatchResult {
        let response = delivered.value.as_ref();
        let status_code = response.map(|r| r.status.as_u16());
        let response_data = response.and_then(HttpResponse::body_json);

        if let Some(ref id) = event_id {
            let patch = EventPatch::status(EventStatus::Success)
                .with_response_code(status_code.unwrap_or(DEFAULT_SUCCESS_CODE))
                .with_response(response_data.clone())
                .without_error_message()
                .with_duration(duration)
                .with_retry_count(delivered.retries());
            self.update_event(id, &patch);
        }

        tracing::info!(
            webhook_type = %kind,
            event_type,
            duration_ms = duration,
            attempts = delivered.attempts,
            "Webhook execution completed successfully in {duration}ms"
        );

        DispatchResult {
            success: true,
            message: Some("Webhook delivered".to_string()),
            status_code,
            response_data,
            error: None,
            event_id,
            attempts: delivered.attempts,
        }
    }

    /// Records the failure and builds the caller's result.
    ///
    /// The response code is the status of the last non-2xx answer. It is
    /// left unset when the final attempt got no response at all.
    fn finish_failure(
        &self,
        event_id: Option<EventId>,
        error: &DeliveryError,
        duration: u64,
        url: &str,
        kind: WebhookKind,
        event_type: &str,
    ) -> DispatchResult {
        let message = error.to_string();
        let status_code = error.last_error().status().map(|s| s.as_u16());

        if let Some(ref id) = event_id {
            let mut patch = EventPatch::status(EventStatus::Failed)
                .with_error_message(message.clone())
                .with_duration(duration)
                .with_retry_count(error.attempts().saturating_sub(1));
            if let Some(code) = status_code {
                patch = patch.with_response_code(code);
            }
            self.update_event(id, &patch);
        }

        tracing::error!(
            url = %mask_url(url),
            webhook_type = %kind,
            event_type,
            duration_ms = duration,
            "Webhook execution failed: {message}"
        );

        DispatchResult {
            success: false,
            message: Some(message),
            status_code,
            response_data: None,
            error: Some(error.last_error().to_string()),
            event_id,
            attempts: error.attempts(),
        }
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
