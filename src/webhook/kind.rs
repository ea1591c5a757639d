//! Webhook integration kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The integration a webhook targets.
///
/// Closed set; serialized in lowercase (`"stripe"`, `"zapier"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookKind {
    /// Stripe payment events
    Stripe,
    /// Zapier catch hooks
    Zapier,
    /// GitHub repository hooks
    Github,
    /// Slack incoming webhooks
    Slack,
    /// Any other HTTP endpoint
    Custom,
    /// Notion integrations
    Notion,
}

impl WebhookKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Stripe,
        Self::Zapier,
        Self::Github,
        Self::Slack,
        Self::Custom,
        Self::Notion,
    ];

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Zapier => "zapier",
            Self::Github => "github",
            Self::Slack => "slack",
            Self::Custom => "custom",
            Self::Notion => "notion",
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown webhook kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown webhook kind '{0}': expected stripe, zapier, github, slack, custom, or notion")]
pub struct UnknownKind(pub String);

impl FromStr for WebhookKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
