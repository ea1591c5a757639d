//! Business event payloads.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Business events that can be announced to the automation webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessEvent {
    /// A marketing strategy was approved.
    StrategyApproved,
    /// A campaign was created.
    CampaignCreated,
    /// A lead turned into a customer.
    LeadConverted,
}

impl BusinessEvent {
    /// Returns the wire name used as `event_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrategyApproved => "strategy_approved",
            Self::CampaignCreated => "campaign_created",
            Self::LeadConverted => "lead_converted",
        }
    }

    /// Human-readable label for log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StrategyApproved => "Strategy approval",
            Self::CampaignCreated => "Campaign creation",
            Self::LeadConverted => "Lead conversion",
        }
    }
}

impl fmt::Display for BusinessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body posted for every business event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Which event happened.
    pub event_type: BusinessEvent,
    /// ISO-8601 creation time with millisecond precision.
    pub timestamp: String,
    /// Event details.
    pub data: T,
}

impl<T> EventEnvelope<T> {
    /// Wraps `data` for `event_type`, stamped at `at`.
    pub fn new(event_type: BusinessEvent, at: DateTime<Utc>, data: T) -> Self {
        Self {
            event_type,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        }
    }
}

/// Details of an approved strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyApprovalData {
    pub strategy_id: String,
    pub strategy_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// Details of a new campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignCreationData {
    pub campaign_id: String,
    pub campaign_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

/// Details of a converted lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadConversionData {
    pub lead_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}
