//! Business event triggers.
//!
//! Announces domain events (strategy approvals, new campaigns, converted
//! leads) to a Zapier catch hook. Deliveries are blind: the hook is
//! typically called cross-origin, so only transport failures are visible.

mod envelope;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use envelope::{
    BusinessEvent, CampaignCreationData, EventEnvelope, LeadConversionData, StrategyApprovalData,
};

use serde::Serialize;

use crate::history::Storage;
use crate::time::{Clock, Sleeper};
use crate::webhook::{Dispatcher, HttpClient, WebhookKind};

/// Sends business events through a [`Dispatcher`].
///
/// Without a configured URL every trigger logs a warning and returns
/// `false`; nothing is sent or recorded.
#[derive(Debug)]
pub struct EventTrigger<'d, H, St, C, S> {
    dispatcher: &'d Dispatcher<H, St, C, S>,
    zapier_url: Option<String>,
}

impl<'d, H, St, C, S> EventTrigger<'d, H, St, C, S>
where
    H: HttpClient,
    St: Storage,
    C: Clock,
    S: Sleeper,
{
    /// Creates a trigger posting to `zapier_url`, if any.
    #[must_use]
    pub const fn new(dispatcher: &'d Dispatcher<H, St, C, S>, zapier_url: Option<String>) -> Self {
        Self {
            dispatcher,
            zapier_url,
        }
    }

    /// Returns the configured hook URL.
    #[must_use]
    pub fn zapier_url(&self) -> Option<&str> {
        self.zapier_url.as_deref()
    }

    /// Announces an approved strategy.
    pub async fn on_strategy_approved(&self, data: StrategyApprovalData) -> bool {
        self.fire(BusinessEvent::StrategyApproved, data).await
    }

    /// Announces a created campaign.
    pub async fn on_campaign_created(&self, data: CampaignCreationData) -> bool {
        self.fire(BusinessEvent::CampaignCreated, data).await
    }

    /// Announces a converted lead.
    pub async fn on_lead_converted(&self, data: LeadConversionData) -> bool {
        self.fire(BusinessEvent::LeadConverted, data).await
    }

    async fn fire<T: Serialize>(&self, event: BusinessEvent, data: T) -> bool {
        let Some(url) = self.zapier_url.as_deref() else {
            tracing::warn!("No Zapier webhook URL configured");
            return false;
        };

        let envelope = EventEnvelope::new(event, self.dispatcher.history().now(), data);
        let payload = match serde_json::to_value(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to trigger {event} webhook: {e}");
                return false;
            }
        };

        let result = self
            .dispatcher
            .dispatch_blind(url, payload, WebhookKind::Zapier, event.as_str())
            .await;

        if result.success {
            tracing::info!("{} event sent to Zapier", event.label());
        } else {
            tracing::error!(
                "Failed to trigger {event} webhook: {}",
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        result.success
    }
}
