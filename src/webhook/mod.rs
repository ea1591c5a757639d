//! Webhook delivery.
//!
//! This module provides:
//! - HTTP request/response types and the client seam ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Retry policy with exponential backoff and jitter ([`RetryPolicy`])
//! - The dispatcher that delivers and records history ([`Dispatcher`])
//! - Target URL masking and validation helpers ([`mask_url`])

mod client;
mod dispatcher;
mod error;
mod http;
mod kind;
mod result;
mod retry;
mod target;

#[cfg(test)]
mod client_tests;

pub use client::ReqwestClient;
pub use dispatcher::Dispatcher;
pub use error::{AttemptError, DeliveryError, HttpError, InvalidMultiplier};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use kind::{UnknownKind, WebhookKind};
pub use result::{DeliveryMode, DispatchResult};
pub use retry::{Delivered, RetryNotice, RetryPolicy};
pub use target::{MASK, is_valid_url, mask_url, sanitize_url, validate_url_format};
