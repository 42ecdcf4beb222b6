//! Notification dispatcher.
//!
//! Renders a tracker decision into a JSON payload and POSTs it to the
//! pattern's webhook. Fire-and-forget: delivery failures are logged, never
//! returned, never retried, so a broken webhook cannot stall a cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tileguard_core::{Metadata, NotifyDecision, Pattern, PixelPos, TileCoord};
use tracing::{debug, error};

/// Consumes tracker decisions. The watcher awaits dispatch so a cycle's
/// notifications finish before the next timer event is handled.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver one decision, best effort
    async fn dispatch(&self, decision: &NotifyDecision, pattern: &Pattern);
}

/// The JSON body delivered to the webhook.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    pattern_name: &'a str,
    errors: u32,
    errors_before: u32,
    tile: TileCoord,
    position: PixelPos,
    defaced_since: DateTime<Utc>,
    info: &'a Metadata,
}

/// Dispatcher POSTing `application/json` to a webhook URL.
///
/// A pattern's `metadata.webhook_url` overrides the configured default.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    default_url: String,
}

impl WebhookDispatcher {
    /// Create a dispatcher with the configured default target
    #[must_use]
    pub fn new(client: reqwest::Client, default_url: impl Into<String>) -> Self {
        Self {
            client,
            default_url: default_url.into(),
        }
    }

    fn target_url<'a>(&'a self, metadata: &'a Metadata) -> &'a str {
        metadata.webhook_url.as_deref().unwrap_or(&self.default_url)
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn dispatch(&self, decision: &NotifyDecision, pattern: &Pattern) {
        let placement = pattern.placement();
        let payload = WebhookPayload {
            pattern_name: pattern.name(),
            errors: decision.errors_now,
            errors_before: decision.errors_before,
            tile: placement.tile,
            position: placement.offset,
            defaced_since: decision.defaced_since,
            info: pattern.metadata(),
        };
        let url = self.target_url(pattern.metadata());

        match self.client.post(url).json(&payload).send().await {
            Err(err) => {
                error!(pattern = %decision.id, error = %err, "unable to send webhook");
            }
            Ok(response) if !response.status().is_success() => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(pattern = %decision.id, %status, body, "webhook rejected");
            }
            Ok(_) => {
                debug!(pattern = %decision.id, url, "webhook delivered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};
    use tileguard_core::{Placement, TileGrid};

    fn sample() -> (NotifyDecision, Pattern) {
        let grid = TileGrid::STANDARD;
        let placement = Placement::new(TileCoord::new(5, 5), PixelPos::new(980, 980));
        let metadata: Metadata =
            serde_json::from_str(r##"{"owner": "ops", "channel": "#canvas"}"##).unwrap();
        let pattern = Pattern::new(
            &grid,
            "flag",
            RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])),
            placement,
            metadata,
        )
        .unwrap();
        let decision = NotifyDecision {
            id: pattern.id(),
            errors_before: 0,
            errors_now: 3,
            defaced_since: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        (decision, pattern)
    }

    #[test]
    fn payload_carries_counts_placement_and_metadata() {
        let (decision, pattern) = sample();
        let placement = pattern.placement();
        let payload = WebhookPayload {
            pattern_name: pattern.name(),
            errors: decision.errors_now,
            errors_before: decision.errors_before,
            tile: placement.tile,
            position: placement.offset,
            defaced_since: decision.defaced_since,
            info: pattern.metadata(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["pattern_name"], "flag");
        assert_eq!(value["errors"], 3);
        assert_eq!(value["errors_before"], 0);
        assert_eq!(value["tile"]["x"], 5);
        assert_eq!(value["position"]["y"], 980);
        assert_eq!(value["info"]["owner"], "ops");
        assert_eq!(value["info"]["channel"], "#canvas");
    }

    #[test]
    fn metadata_webhook_overrides_default() {
        let dispatcher = WebhookDispatcher::new(reqwest::Client::new(), "https://hooks.example/default");

        let plain = Metadata::default();
        assert_eq!(dispatcher.target_url(&plain), "https://hooks.example/default");

        let with_override = Metadata {
            webhook_url: Some("https://hooks.example/flag".to_string()),
            ..Metadata::default()
        };
        assert_eq!(dispatcher.target_url(&with_override), "https://hooks.example/flag");
    }
}
