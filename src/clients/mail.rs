use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::config::MailConfig;

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Whether a message actually left the building. Callers treat `Skipped`
/// and delivery failures the same way: warn the user, keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped,
}

/// Outbound mail via an HTTP relay. Delivery failure never aborts the
/// flow that triggered the mail; it degrades to a user-visible warning.
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    enabled: bool,
    relay_url: String,
    from_address: String,
}

impl MailClient {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .user_agent("NewsBin/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build mail HTTP client: {e}"))?;

        Ok(Self {
            client,
            enabled: config.enabled,
            relay_url: config.relay_url.clone(),
            from_address: config.from_address.clone(),
        })
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Delivery {
        if !self.enabled {
            return Delivery::Skipped;
        }

        let message = OutboundMessage {
            from: &self.from_address,
            to,
            subject,
            body,
        };

        match self.client.post(&self.relay_url).json(&message).send().await {
            Ok(response) if response.status().is_success() => Delivery::Sent,
            Ok(response) => {
                warn!(
                    "Mail relay rejected message to {}: {}",
                    to,
                    response.status()
                );
                Delivery::Skipped
            }
            Err(e) => {
                warn!("Failed to reach mail relay for {}: {}", to, e);
                Delivery::Skipped
            }
        }
    }
}
