//! Error types for webhook delivery.

use thiserror::Error;

/// Error type for HTTP operations.
///
/// Describes what went wrong at the transport level without dictating
/// recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// Nothing can be sent to an unparseable URL, so this is never retried.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error from a single delivery attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The HTTP exchange itself failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered, but not with a 2xx status.
    #[error("Server returned {status}")]
    NonSuccessStatus {
        /// HTTP status code received
        status: http::StatusCode,
        /// Response body, if valid UTF-8
        body: Option<String>,
    },
}

impl AttemptError {
    /// Returns true if another attempt could succeed.
    ///
    /// Transport failures and non-2xx responses are both retryable;
    /// only an invalid URL is not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Http(HttpError::InvalidUrl(_)))
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::NonSuccessStatus { status, .. } => Some(*status),
            Self::Http(_) => None,
        }
    }
}

/// Terminal failure of a delivery run under a retry policy.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// All attempts failed.
    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Total number of attempts made (initial attempt plus retries)
        attempts: u32,
        /// The error from the final attempt
        #[source]
        last_error: AttemptError,
    },

    /// An attempt failed in a way retrying cannot fix.
    #[error("Delivery rejected after {attempts} attempt(s): {error}")]
    Rejected {
        /// Number of attempts made, including the rejected one
        attempts: u32,
        /// The non-retryable error
        #[source]
        error: AttemptError,
    },
}

impl DeliveryError {
    /// Returns the number of attempts that were made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::MaxRetriesExceeded { attempts, .. } | Self::Rejected { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Returns the error from the last attempt.
    #[must_use]
    pub const fn last_error(&self) -> &AttemptError {
        match self {
            Self::MaxRetriesExceeded { last_error, .. } => last_error,
            Self::Rejected { error, .. } => error,
        }
    }
}

/// A backoff multiplier that is zero, negative, NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("multiplier must be a positive finite number, got {0}")]
pub struct InvalidMultiplier(pub f64);
